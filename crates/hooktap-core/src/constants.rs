//! Package-level constants.

/// Current version of hooktap (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name, reported by `/health`.
pub const NAME: &str = "hooktap";

/// URL prefix under which stored attachments are served.
pub const DOWNLOAD_PREFIX: &str = "/download/";
