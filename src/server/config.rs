//! Server configuration.

use std::time::Duration;

use crate::s101::MAX_FRAME_PAYLOAD;

/// Default keepalive interval.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Default outbound connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for an [`EmberServer`](super::EmberServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub address: String,
    /// Bind port.
    pub port: u16,
    /// Interval between keepalive requests on every connection.
    pub keepalive_interval: Duration,
    /// Timeout for outbound connects (client mode).
    pub connect_timeout: Duration,
    /// Per-frame BER payload cap; larger messages are split.
    pub max_frame_payload: usize,
}

impl ServerConfig {
    /// A configuration with the given bind endpoint and defaults elsewhere.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_frame_payload: MAX_FRAME_PAYLOAD,
        }
    }

    /// Override the keepalive interval.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Override the outbound connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the per-frame payload cap.
    pub fn max_frame_payload(mut self, cap: usize) -> Self {
        self.max_frame_payload = cap;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 9000)
    }
}
