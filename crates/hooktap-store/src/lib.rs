//! # hooktap-store
//!
//! The shared in-memory state behind the server:
//!
//! - [`Ledger`]: newest-first history of captured calls, capped at
//!   [`LEDGER_CAPACITY`], with a single fan-out feed published in append order
//! - [`BlobStore`]: attachment bytes keyed by filename, last write wins
//!
//! Nothing here survives a restart.

#![deny(unsafe_code)]

pub mod blobs;
pub mod errors;
pub mod ledger;

pub use blobs::BlobStore;
pub use errors::{Result, StoreError};
pub use ledger::{LEDGER_CAPACITY, Ledger, LedgerSnapshot, StoredRecord};
