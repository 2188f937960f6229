//! # hooktap-core
//!
//! Foundation types shared by every hooktap crate:
//!
//! - **Branded IDs**: [`RecordId`] and [`ViewerId`] as newtypes for type safety
//! - **Records**: [`CanonicalRecord`], [`FileMeta`], and the three-way [`RecordBody`]
//! - **Multimaps**: [`MultiMap`] for headers and query strings, insertion-ordered
//! - **Content types**: extension table used when serving attachments
//! - **Logging**: `tracing` subscriber bootstrap and log-capture test utilities

#![deny(unsafe_code)]

pub mod constants;
pub mod content_type;
pub mod ids;
pub mod logging;
pub mod multimap;
pub mod record;

pub use ids::{RecordId, ViewerId};
pub use multimap::MultiMap;
pub use record::{CanonicalRecord, FileMeta, RecordBody};
