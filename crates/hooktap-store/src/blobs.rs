//! Attachment bytes keyed by filename.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use crate::errors::{Result, StoreError};

/// Filename-keyed byte store.
///
/// A later `put` under the same filename replaces the earlier bytes. There is
/// no eviction and no size cap, so memory grows with every distinct filename
/// uploaded until the process exits.
#[derive(Default)]
pub struct BlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl BlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `filename`, returning the size of any blob it
    /// replaced.
    pub fn put(&self, filename: &str, bytes: Bytes) -> Result<Option<usize>> {
        if filename.is_empty() {
            return Err(StoreError::InvalidFilename(filename.to_owned()));
        }
        let size = bytes.len();
        let previous = self.blobs.write().insert(filename.to_owned(), bytes);
        let replaced = previous.map(|b| b.len());
        debug!(filename, size, replaced = ?replaced, "blob stored");
        Ok(replaced)
    }

    /// Fetch the bytes stored under `filename`.
    ///
    /// The returned [`Bytes`] is a cheap reference-counted handle; a later
    /// overwrite does not affect it.
    pub fn get(&self, filename: &str) -> Result<Bytes> {
        self.blobs
            .read()
            .get(filename)
            .cloned()
            .ok_or_else(|| StoreError::BlobNotFound {
                filename: filename.to_owned(),
            })
    }

    /// Whether a blob exists under `filename`.
    pub fn contains(&self, filename: &str) -> bool {
        self.blobs.read().contains_key(filename)
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Sum of all stored blob sizes.
    pub fn total_bytes(&self) -> usize {
        self.blobs.read().values().map(Bytes::len).sum()
    }
}
