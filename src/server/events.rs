//! Events surfaced to the embedding application.
//!
//! Components deliver events through a single channel handed out once by
//! [`EmberServer::events`](super::EmberServer::events). The sink is
//! fire-and-forget: if the consumer is gone the send is dropped, and every
//! event is also traced.

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tracing::debug;

use crate::glow::Value;

/// Notification emitted by the server.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// The listener is bound and accepting.
    Listening { local: SocketAddr },
    /// A client connected.
    Connection { remote: SocketAddr },
    /// A client disconnected.
    Disconnect { remote: SocketAddr },
    /// A transport error on one client; only that client is affected.
    ClientError { remote: SocketAddr, error: String },
    /// A request was dispatched for a client.
    Request { remote: SocketAddr, path: String },
    /// A parameter value changed; carries the previous value.
    ValueChange {
        path: String,
        previous: Option<Value>,
    },
    /// A matrix target was replaced (absolute operation).
    MatrixChange {
        path: String,
        target: u32,
        sources: Vec<u32>,
        remote: SocketAddr,
    },
    /// Sources were connected to a matrix target.
    MatrixConnect {
        path: String,
        target: u32,
        sources: Vec<u32>,
        remote: SocketAddr,
    },
    /// Sources were disconnected from a matrix target.
    MatrixDisconnect {
        path: String,
        target: u32,
        sources: Vec<u32>,
        remote: SocketAddr,
    },
    /// A protocol or semantic error outside any single transport.
    Error { message: String },
}

/// Cloneable sender side of the event channel.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl EventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event; drops it if the consumer is gone.
    pub fn emit(&self, event: ServerEvent) {
        debug!(?event, "server event");
        let _ = self.tx.send(event);
    }

    /// Emit a semantic error.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(ServerEvent::Error {
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_delivers() {
        let (sink, mut rx) = EventSink::new();
        sink.error("boom");
        match rx.try_recv().unwrap() {
            ServerEvent::Error { message } => assert_eq!(message, "boom"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_emit_without_consumer_is_silent() {
        let (sink, rx) = EventSink::new();
        drop(rx);
        sink.error("nobody listens");
    }
}
