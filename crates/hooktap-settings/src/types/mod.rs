//! Settings type definitions.
//!
//! Field names are camelCase on disk. Every struct is `#[serde(default)]`, so
//! a settings file only needs the keys it wants to change.

mod logging;
mod server;

pub use logging::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 9000, "mailboxCapacity": 512 },
///   "logging": { "level": "debug", "format": "json" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HooktapSettings {
    /// Listener and connection settings.
    pub server: ServerSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

impl HooktapSettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let s = &self.server;
        if s.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue("server.host must not be empty".into()));
        }
        if s.mailbox_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "server.mailboxCapacity must be at least 1".into(),
            ));
        }
        if s.max_body_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxBodyBytes must be at least 1".into(),
            ));
        }
        if s.heartbeat_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "server.heartbeatIntervalMs must be at least 1".into(),
            ));
        }
        if hooktap_core::logging::LogFormat::parse(&self.logging.format).is_none() {
            return Err(SettingsError::InvalidValue(format!(
                "logging.format must be \"compact\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
