//! Canonical representation of one captured webhook call.
//!
//! A [`CanonicalRecord`] is built once at ingestion and never mutated; the
//! ledger and every viewer share it behind an `Arc`. Attachment bytes are not
//! part of the record; they live in the blob store and are referenced by
//! [`FileMeta::download_url`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::constants::DOWNLOAD_PREFIX;
use crate::ids::RecordId;
use crate::multimap::MultiMap;

/// Body of a captured call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordBody {
    /// Body parsed as JSON, or a multipart form rendered as an object.
    Json(Value),
    /// Non-empty body that was not valid JSON, decoded lossily as UTF-8.
    Text(String),
    /// No body bytes.
    #[default]
    Absent,
}

impl RecordBody {
    /// Classify raw body bytes: empty is `Absent`, valid JSON is `Json`,
    /// anything else is `Text`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::Absent;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Whether the call carried no body.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Metadata for an accepted attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    /// Client-supplied filename; also the blob store key.
    pub filename: String,
    /// Declared content type of the part.
    #[serde(rename = "content_type")]
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Server-relative URL the bytes can be fetched from.
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}

impl FileMeta {
    /// Build metadata for a stored file, deriving its download URL.
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        let filename = filename.into();
        let download_url = format!("{DOWNLOAD_PREFIX}{filename}");
        Self {
            filename,
            content_type: content_type.into(),
            size,
            download_url,
        }
    }
}

/// One captured inbound call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// Process-unique identifier.
    pub id: RecordId,
    /// Capture time (UTC).
    pub timestamp: DateTime<Utc>,
    /// HTTP method as received.
    pub method: String,
    /// Request headers, keys in canonical MIME case.
    pub headers: MultiMap,
    /// Parsed body.
    #[serde(skip_serializing_if = "RecordBody::is_absent")]
    pub body: RecordBody,
    /// Path and query as received.
    pub url: String,
    /// Parsed query string.
    pub query: MultiMap,
    /// Accepted attachments; all share one content type.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileMeta>,
    /// Peer address of the caller.
    pub remote_addr: String,
    /// Value of the `Content-Type` header, empty when missing.
    pub content_type: String,
}

impl CanonicalRecord {
    /// Start a record with a fresh id and the current time.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            timestamp: Utc::now(),
            method: method.into(),
            headers: MultiMap::new(),
            body: RecordBody::Absent,
            url: url.into(),
            query: MultiMap::new(),
            files: Vec::new(),
            remote_addr: String::new(),
            content_type: String::new(),
        }
    }
}
