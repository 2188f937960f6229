//! `GET /api/requests`: the ledger as JSON, newest first.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use hooktap_core::CanonicalRecord;
use serde::Serialize;

use crate::server::AppState;

#[derive(Serialize)]
struct RequestList<'a> {
    requests: Vec<&'a CanonicalRecord>,
    count: usize,
}

/// List every retained record.
pub async fn list(State(state): State<AppState>) -> Response {
    let snapshot = state.ledger.snapshot();
    let body = RequestList {
        requests: snapshot.iter().map(|s| &*s.record).collect(),
        count: snapshot.len(),
    };
    Json(body).into_response()
}
