//! `ANY /webhook`: capture one inbound call.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use hooktap_core::{CanonicalRecord, RecordId};
use hooktap_store::StoredRecord;
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ApiError;
use crate::ingest::{self, Ingested, SkippedFile};
use crate::metrics::{
    LEDGER_RECORDS, WEBHOOK_FILES_SKIPPED_TOTAL, WEBHOOK_FILES_STORED_TOTAL,
    WEBHOOK_REQUESTS_TOTAL,
};
use crate::server::AppState;

/// Acknowledgment returned to the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// Always `"success"`.
    pub status: &'static str,
    /// Human-readable summary.
    pub message: &'static str,
    /// Capture time, RFC 3339.
    pub time: String,
    /// Id of the new record.
    pub id: RecordId,
    /// Attachments stored.
    pub files_accepted: usize,
    /// Attachments left out, with reasons.
    pub skipped_files: Vec<SkippedFile>,
}

/// Handler for every method on `/webhook`.
pub async fn ingest(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let Ingested { record, skipped } =
        ingest::normalize(req, &state.blobs, state.config.max_body_bytes).await?;
    for file in &skipped {
        warn!(
            filename = %file.filename,
            content_type = %file.content_type,
            reason = file.reason.as_str(),
            "attachment skipped"
        );
        counter!(WEBHOOK_FILES_SKIPPED_TOTAL, "reason" => file.reason.as_str()).increment(1);
    }

    let stored = commit(&state, record, "webhook");
    let ack = WebhookAck {
        status: "success",
        message: "Webhook received successfully",
        time: stored
            .record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        id: stored.record.id.clone(),
        files_accepted: stored.record.files.len(),
        skipped_files: skipped,
    };
    Ok(Json(ack).into_response())
}

/// Append `record` to the ledger and account for it.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn commit(state: &AppState, record: CanonicalRecord, route: &'static str) -> StoredRecord {
    counter!(WEBHOOK_REQUESTS_TOTAL, "route" => route).increment(1);
    counter!(WEBHOOK_FILES_STORED_TOTAL).increment(record.files.len() as u64);

    let stored = state.ledger.append(record);
    gauge!(LEDGER_RECORDS).set(state.ledger.len() as f64);
    info!(
        record_id = %stored.record.id,
        seq = stored.seq,
        method = %stored.record.method,
        url = %stored.record.url,
        files = stored.record.files.len(),
        route,
        "webhook captured"
    );
    stored
}
