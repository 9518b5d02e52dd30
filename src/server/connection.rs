//! One TCP connection: codec, keepalive, sequential request pipeline.
//!
//! Each accepted socket is split into a read half driven by the connection
//! task and a write half drained by a dedicated writer task fed through an
//! unbounded channel. The connection task multiplexes socket reads with the
//! keepalive interval; decoded ember roots are dispatched strictly one
//! after another, which gives the per-client ordering guarantee. Keepalive
//! responses are written straight from the codec event and are never queued
//! behind dispatch work.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{EmberError, Result};
use crate::glow::{self, Root};
use crate::s101::{S101Codec, S101Event};

use super::config::ServerConfig;
use super::dispatcher;
use super::events::{EventSink, ServerEvent};
use super::ServerState;

/// Identifier of one client session.
pub type ClientId = u64;

/// Size of the socket read buffer.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Message to the writer task.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// Write these frames in order.
    Frames(Vec<Bytes>),
    /// Flush, shut the socket down and stop.
    Shutdown,
}

/// Cheaply cloneable handle to a live client session.
///
/// Held by the live-client set and by subscription entries; sending through
/// a handle enqueues frames on the client's writer task.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    remote: SocketAddr,
    tx: mpsc::UnboundedSender<Outbound>,
    connected: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    closed: watch::Receiver<bool>,
    max_frame_payload: usize,
}

impl ClientHandle {
    /// Session identifier, unique for the server's lifetime.
    #[inline]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Peer address.
    #[inline]
    pub fn remote_address(&self) -> SocketAddr {
        self.remote
    }

    /// Whether the session is still live.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Encode a detached root and enqueue it for sending.
    pub fn queue_message(&self, root: &Root) -> Result<()> {
        let payload = glow::encode(root);
        let frames = crate::s101::encode_ember(&payload, self.max_frame_payload);
        self.send_frames(frames)
    }

    /// Enqueue pre-encoded frames for sending.
    pub fn send_frames(&self, frames: Vec<Bytes>) -> Result<()> {
        self.tx
            .send(Outbound::Frames(frames))
            .map_err(|_| EmberError::ConnectionClosed)
    }

    /// Close the connection and resolve once the session has ended.
    ///
    /// Pending dispatch for this client may still complete, but its queue is
    /// discarded with the socket.
    pub async fn disconnect(&self) {
        self.shutdown.notify_one();
        let mut closed = self.closed.clone();
        while !*closed.borrow() {
            if closed.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Spawn the connection and writer tasks for an accepted socket.
///
/// Returns the client handle and the connection task's join handle.
pub(crate) fn spawn(
    socket: TcpStream,
    id: ClientId,
    remote: SocketAddr,
    state: Arc<Mutex<ServerState>>,
    events: EventSink,
    config: &ServerConfig,
) -> (ClientHandle, JoinHandle<()>) {
    let (read_half, write_half) = socket.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = watch::channel(false);
    let connected = Arc::new(AtomicBool::new(true));

    let handle = ClientHandle {
        id,
        remote,
        tx,
        connected: connected.clone(),
        shutdown: Arc::new(Notify::new()),
        closed: closed_rx,
        max_frame_payload: config.max_frame_payload,
    };

    tokio::spawn(writer_loop(write_half, rx));

    let task_handle = handle.clone();
    let keepalive_interval = config.keepalive_interval;
    let task = tokio::spawn(async move {
        connection_loop(read_half, &task_handle, state, &events, keepalive_interval).await;

        // Session teardown: mark dead, stop the writer, wake disconnect().
        connected.store(false, Ordering::Release);
        let _ = task_handle.tx.send(Outbound::Shutdown);
        let _ = closed_tx.send(true);
        debug!(client = id, %remote, "connection closed");
    });

    (handle, task)
}

/// Read loop: socket bytes -> codec events -> sequential dispatch.
async fn connection_loop(
    mut reader: tokio::net::tcp::OwnedReadHalf,
    handle: &ClientHandle,
    state: Arc<Mutex<ServerState>>,
    events: &EventSink,
    keepalive_interval: Duration,
) {
    let mut codec = S101Codec::with_max_payload(handle.max_frame_payload);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    let start = tokio::time::Instant::now() + keepalive_interval;
    let mut keepalive = tokio::time::interval_at(start, keepalive_interval);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = handle.shutdown.notified() => {
                return;
            }
            _ = keepalive.tick() => {
                trace!(client = handle.id, "sending keepalive request");
                if handle.send_frames(vec![codec.encode_keepalive_request()]).is_err() {
                    return;
                }
            }
            read = reader.read(&mut buf) => {
                let n = match read {
                    Ok(0) => return,
                    Ok(n) => n,
                    Err(error) => {
                        events.emit(ServerEvent::ClientError {
                            remote: handle.remote,
                            error: error.to_string(),
                        });
                        return;
                    }
                };

                for event in codec.feed(&buf[..n]) {
                    match event {
                        S101Event::KeepaliveRequest => {
                            // Out-of-band: must not be starved behind dispatch.
                            let _ = handle.send_frames(vec![codec.encode_keepalive_response()]);
                        }
                        S101Event::KeepaliveResponse => {
                            trace!(client = handle.id, "peer is alive");
                        }
                        S101Event::EmberPacket(payload) => {
                            if payload.is_empty() {
                                continue;
                            }
                            match glow::decode(&payload) {
                                Ok(root) => {
                                    dispatcher::handle_root(&state, events, handle, &root);
                                }
                                Err(error) => {
                                    // Protocol error, not transport: surfaced
                                    // as a plain error event and the
                                    // connection stays up.
                                    warn!(client = handle.id, %error, "undecodable ember payload");
                                    events.error(error.to_string());
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Writer loop: drains the outbound channel onto the socket.
async fn writer_loop(mut writer: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Frames(frames) => {
                for frame in frames {
                    if writer.write_all(&frame).await.is_err() {
                        return;
                    }
                }
                if writer.flush().await.is_err() {
                    return;
                }
            }
            Outbound::Shutdown => {
                let _ = writer.flush().await;
                let _ = writer.shutdown().await;
                return;
            }
        }
    }
}

/// Open an outbound connection (client mode) with a connect timeout.
pub async fn connect(remote: SocketAddr, timeout: Duration) -> Result<TcpStream> {
    match tokio::time::timeout(timeout, TcpStream::connect(remote)).await {
        Ok(Ok(socket)) => Ok(socket),
        Ok(Err(error)) => Err(EmberError::Io(error)),
        Err(_) => Err(EmberError::ConnectTimeout),
    }
}
