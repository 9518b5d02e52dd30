//! TCP listener and server lifecycle.
//!
//! [`EmberServer`] binds the configured endpoint, accepts sockets, spawns a
//! connection per client and maintains the live-client set. A
//! [`ServerHandle`] obtained before [`EmberServer::listen`] allows a clean
//! shutdown: the accept loop stops and every active socket is closed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::glow::Tree;

use super::config::ServerConfig;
use super::connection::{self, ClientHandle, ClientId};
use super::events::{EventSink, ServerEvent};
use super::ServerState;

/// Live-client set shared between the accept loop and the reapers.
type ClientSet = Arc<Mutex<HashMap<ClientId, ClientHandle>>>;

/// An Ember+ S101 server publishing one tree.
pub struct EmberServer {
    config: ServerConfig,
    state: Arc<Mutex<ServerState>>,
    clients: ClientSet,
    events: EventSink,
    events_rx: Option<mpsc::UnboundedReceiver<ServerEvent>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl EmberServer {
    /// Create a server publishing `tree` under the given configuration.
    pub fn new(config: ServerConfig, tree: Tree) -> Self {
        let (events, events_rx) = EventSink::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            state: Arc::new(ServerState::new(tree)),
            clients: Arc::new(Mutex::new(HashMap::new())),
            events,
            events_rx: Some(events_rx),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Take the event stream. May be called once; later calls get `None`.
    ///
    /// Events emitted with no receiver taken (or after it is dropped) are
    /// discarded.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<ServerEvent>> {
        self.events_rx.take()
    }

    /// A handle for shutting the server down from another task.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            clients: self.clients.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }

    /// Bind and run the accept loop until [`ServerHandle::shutdown`].
    pub async fn listen(mut self) -> Result<()> {
        let listener =
            TcpListener::bind((self.config.address.as_str(), self.config.port)).await?;
        let local = listener.local_addr()?;
        info!(%local, "listening");
        self.events.emit(ServerEvent::Listening { local });

        // Unconsumed event receivers would buffer forever.
        drop(self.events_rx.take());

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut next_id: ClientId = 1;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((socket, remote)) => {
                            let id = next_id;
                            next_id += 1;
                            self.accept_client(socket, id, remote);
                        }
                        Err(error) => {
                            warn!(%error, "accept failed");
                            self.events.emit(ServerEvent::Error {
                                message: format!("accept failed: {error}"),
                            });
                        }
                    }
                }
            }
        }

        self.close_all().await;
        info!(%local, "listener stopped");
        Ok(())
    }

    fn accept_client(&self, socket: tokio::net::TcpStream, id: ClientId, remote: SocketAddr) {
        if let Err(error) = socket.set_nodelay(true) {
            debug!(%error, "set_nodelay failed");
        }

        let (handle, task) = connection::spawn(
            socket,
            id,
            remote,
            self.state.clone(),
            self.events.clone(),
            &self.config,
        );

        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, handle);
        self.events.emit(ServerEvent::Connection { remote });
        debug!(client = id, %remote, "client connected");

        // Reaper: when the connection task ends, drop the client from the
        // live set and from every subscription.
        let clients = self.clients.clone();
        let state = self.state.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = task.await;
            clients
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&id);
            state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .subscriptions
                .remove_client(id);
            events.emit(ServerEvent::Disconnect { remote });
        });
    }

    async fn close_all(&self) {
        let handles: Vec<ClientHandle> = {
            let clients = self
                .clients
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            clients.values().cloned().collect()
        };
        for handle in handles {
            handle.disconnect().await;
        }
    }
}

/// Cloneable handle for stopping a running server.
#[derive(Clone)]
pub struct ServerHandle {
    clients: ClientSet,
    shutdown_tx: watch::Sender<bool>,
}

impl ServerHandle {
    /// Stop the accept loop; `listen()` then closes all active sockets and
    /// returns.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
