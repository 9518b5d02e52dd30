//! Server module - listener, per-connection pipeline and dispatcher.
//!
//! Control flow: socket bytes -> S101 codec -> decoded Ember+ root ->
//! dispatcher (per client, strictly sequential) -> tree mutation ->
//! response to the requesting client plus fan-out to other subscribers.

mod config;
mod connection;
mod dispatcher;
mod events;
mod listener;
mod subscriptions;

pub use config::ServerConfig;
pub use connection::{connect, ClientHandle, ClientId};
pub use events::ServerEvent;
pub use listener::{EmberServer, ServerHandle};
pub use subscriptions::SubscriptionRegistry;

use std::sync::Mutex;

use crate::glow::Tree;

/// Tree and subscriptions guarded together by one coarse lock.
///
/// Dispatcher work for any client locks this for the whole
/// mutate-and-build-responses step, giving the single-writer discipline the
/// shared tree requires. The lock is synchronous and is never held across
/// an await point; all sends go through unbounded channels.
pub(crate) struct ServerState {
    pub tree: Tree,
    pub subscriptions: SubscriptionRegistry,
}

impl ServerState {
    pub fn new(tree: Tree) -> Mutex<Self> {
        Mutex::new(Self {
            tree,
            subscriptions: SubscriptionRegistry::new(),
        })
    }
}
