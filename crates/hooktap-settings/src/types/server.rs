//! Listener and viewer connection settings.

use serde::{Deserialize, Serialize};

/// Default request body cap: 32 MiB, the multipart limit webhook senders expect.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 << 20;

/// Server network and runtime settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port. `0` picks an ephemeral port.
    pub port: u16,
    /// Outbound frames queued per viewer before it is disconnected.
    pub mailbox_capacity: usize,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Interval between server pings to viewers, in milliseconds.
    pub heartbeat_interval_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            mailbox_capacity: 256,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            heartbeat_interval_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8080);
        assert_eq!(s.mailbox_capacity, 256);
        assert_eq!(s.max_body_bytes, 33_554_432);
        assert_eq!(s.heartbeat_interval_ms, 30_000);
    }

    #[test]
    fn roundtrips_through_json() {
        let s = ServerSettings {
            port: 9999,
            ..ServerSettings::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: ServerSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
