//! Store error types.

use thiserror::Error;

/// Errors returned by the blob store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No blob was ever stored under this filename.
    #[error("blob not found: {filename}")]
    BlobNotFound {
        /// Requested key.
        filename: String,
    },
    /// Filenames must be non-empty.
    #[error("invalid blob filename: {0:?}")]
    InvalidFilename(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
