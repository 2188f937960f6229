//! Ingest normalizer: turns a raw inbound call into a [`CanonicalRecord`].
//!
//! Multipart form bodies are parsed field by field; accepted attachments are
//! written to the blob store as they are read. Any other body is read whole,
//! up to the configured limit, and classified as JSON, text, or absent.

pub mod form;

use std::net::SocketAddr;

use axum::extract::multipart::MultipartError;
use axum::extract::{ConnectInfo, FromRequest, Multipart, Query, Request};
use axum::http::{StatusCode, Uri};
use axum::http::header::CONTENT_TYPE;
use hooktap_core::content_type::{OCTET_STREAM, is_multipart_form};
use hooktap_core::multimap::canonical_header_key;
use hooktap_core::{CanonicalRecord, FileMeta, MultiMap, RecordBody};
use hooktap_store::BlobStore;
use tracing::{debug, warn};

pub use form::{FormAccumulator, FormOutcome, SkipReason, SkippedFile};

use crate::errors::IngestError;

/// A normalized call and the attachments that were turned away.
#[derive(Debug)]
pub struct Ingested {
    /// The canonical record, ready to append.
    pub record: CanonicalRecord,
    /// Attachments excluded from the record.
    pub skipped: Vec<SkippedFile>,
}

/// Normalize `req`, storing accepted attachments in `blobs`.
pub async fn normalize(
    req: Request,
    blobs: &BlobStore,
    max_body_bytes: usize,
) -> Result<Ingested, IngestError> {
    let multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_multipart_form);
    if !multipart {
        let record = normalize_raw(req, max_body_bytes).await?;
        return Ok(Ingested {
            record,
            skipped: Vec::new(),
        });
    }

    let mut record = capture_envelope(&req);
    let multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| multipart_failure(e.status(), e.body_text()))?;
    let outcome = read_form(multipart, blobs).await?;
    record.body = RecordBody::Json(outcome.body);
    record.files = outcome.files;
    Ok(Ingested {
        record,
        skipped: outcome.skipped,
    })
}

/// Normalize `req` reading the body as opaque bytes, whatever its type.
pub async fn normalize_raw(req: Request, max_body_bytes: usize) -> Result<CanonicalRecord, IngestError> {
    let mut record = capture_envelope(&req);
    let bytes = axum::body::to_bytes(req.into_body(), max_body_bytes)
        .await
        .map_err(|e| IngestError::BodyUnreadable(e.to_string()))?;
    record.body = RecordBody::from_bytes(&bytes);
    Ok(record)
}

/// Build a record from everything but the body.
pub fn capture_envelope(req: &Request) -> CanonicalRecord {
    let uri = req.uri();
    let url = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());
    let mut record = CanonicalRecord::new(req.method().as_str(), url);

    for (name, value) in req.headers() {
        record.headers.append(
            canonical_header_key(name.as_str()),
            String::from_utf8_lossy(value.as_bytes()),
        );
    }
    record.query = parse_query(uri);
    record.remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    record.content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    record
}

fn parse_query(uri: &Uri) -> MultiMap {
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs.into_iter().collect(),
        Err(e) => {
            debug!(error = %e, "unparseable query string, recording none");
            MultiMap::new()
        }
    }
}

async fn read_form(mut multipart: Multipart, blobs: &BlobStore) -> Result<FormOutcome, IngestError> {
    let mut form = FormAccumulator::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if form.is_damaged() => {
                warn!(error = %e, "multipart stream lost after failed file, keeping parsed parts");
                break;
            }
            Err(e) => return Err(field_failure(&e)),
        };

        let name = field.name().unwrap_or_default().to_owned();
        let filename = field
            .file_name()
            .filter(|f| !f.is_empty())
            .map(str::to_owned);

        let Some(filename) = filename else {
            let text = field
                .text()
                .await
                .map_err(|e| field_failure(&e))?;
            form.push_value(&name, text);
            continue;
        };

        let content_type = field.content_type().unwrap_or(OCTET_STREAM).to_owned();
        if !form.admit(&name, &content_type) {
            warn!(
                %filename,
                %content_type,
                expected = form.locked_type().unwrap_or_default(),
                "skipping file with different content type"
            );
            form.skip(&filename, &content_type, SkipReason::ContentTypeMismatch);
            continue;
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => return Err(field_failure(&e)),
            Err(e) => {
                warn!(%filename, error = %e, "failed to read file part");
                form.skip(&filename, &content_type, SkipReason::ReadFailed);
                form.mark_damaged();
                continue;
            }
        };

        let size = bytes.len() as u64;
        match blobs.put(&filename, bytes) {
            Ok(replaced) => {
                debug!(%filename, size, replaced = replaced.is_some(), "file stored");
                form.accept(FileMeta::new(filename, content_type, size));
            }
            Err(e) => {
                warn!(%filename, error = %e, "file not stored");
                form.skip(&filename, &content_type, SkipReason::InvalidFilename);
            }
        }
    }

    Ok(form.finish())
}

fn field_failure(err: &MultipartError) -> IngestError {
    multipart_failure(err.status(), err.body_text())
}

/// Over-limit bodies are unreadable, not malformed.
fn multipart_failure(status: StatusCode, text: String) -> IngestError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        IngestError::BodyUnreadable(text)
    } else {
        IngestError::Malformed(text)
    }
}
