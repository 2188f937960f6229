//! # hooktap-settings
//!
//! Settings are resolved from three layers, lowest priority first:
//! 1. **Compiled defaults**: [`HooktapSettings::default()`]
//! 2. **Settings file**: `~/.hooktap/settings.json`, or an explicit path,
//!    deep-merged over the defaults
//! 3. **Environment**: `PORT` and `HOOKTAP_*` overrides
//!
//! The binary applies CLI flags on top of the result.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
