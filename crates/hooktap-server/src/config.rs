//! Server configuration.

use std::time::Duration;

use hooktap_settings::{DEFAULT_MAX_BODY_BYTES, ServerSettings};

/// Runtime configuration for [`HooktapServer`](crate::server::HooktapServer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Frames queued per viewer before it is disconnected.
    pub mailbox_capacity: usize,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Interval between server-initiated pings.
    pub heartbeat_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            mailbox_capacity: 256,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(s: &ServerSettings) -> Self {
        Self {
            host: s.host.clone(),
            port: s.port,
            mailbox_capacity: s.mailbox_capacity.max(1),
            max_body_bytes: s.max_body_bytes,
            heartbeat_interval: Duration::from_millis(s.heartbeat_interval_ms.max(1)),
        }
    }
}
