//! Subscription registry: tree path -> subscribed client sessions.
//!
//! Cleanup is lazy: a disconnected client is dropped from a path's set the
//! next time a fan-out touches that path. Eager removal on disconnect is
//! also supported for the live-client reaper.

use std::collections::HashMap;

use tracing::trace;

use crate::glow::Root;

use super::connection::{ClientHandle, ClientId};

/// Maps tree paths to the sessions subscribed to them.
#[derive(Default)]
pub struct SubscriptionRegistry {
    by_path: HashMap<String, HashMap<ClientId, ClientHandle>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a client to a path. Re-subscribing is a no-op.
    pub fn subscribe(&mut self, path: impl Into<String>, client: &ClientHandle) {
        let path = path.into();
        trace!(client = client.id(), %path, "subscribe");
        self.by_path
            .entry(path)
            .or_default()
            .insert(client.id(), client.clone());
    }

    /// Remove a client from a path's set; absence is a no-op.
    pub fn unsubscribe(&mut self, path: &str, client: ClientId) {
        if let Some(set) = self.by_path.get_mut(path) {
            set.remove(&client);
            if set.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    /// Drop every subscription held by a client (used on disconnect).
    pub fn remove_client(&mut self, client: ClientId) {
        self.by_path.retain(|_, set| {
            set.remove(&client);
            !set.is_empty()
        });
    }

    /// Number of live subscribers of a path.
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.by_path.get(path).map(HashMap::len).unwrap_or(0)
    }

    /// Whether a client is subscribed to a path.
    pub fn is_subscribed(&self, path: &str, client: ClientId) -> bool {
        self.by_path
            .get(path)
            .is_some_and(|set| set.contains_key(&client))
    }

    /// Deliver a response to every subscriber of `path` except `origin`,
    /// dropping entries whose session is gone.
    ///
    /// Returns the number of clients the response was queued for.
    pub fn update_subscribers(&mut self, path: &str, response: &Root, origin: ClientId) -> usize {
        let Some(set) = self.by_path.get_mut(path) else {
            return 0;
        };

        let mut delivered = 0;
        set.retain(|&id, handle| {
            if id == origin {
                return true;
            }
            if !handle.is_connected() || handle.queue_message(response).is_err() {
                trace!(client = id, %path, "reaping stale subscriber");
                return false;
            }
            delivered += 1;
            true
        });

        if set.is_empty() {
            self.by_path.remove(path);
        }
        delivered
    }
}
