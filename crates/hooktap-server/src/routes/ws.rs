//! `GET /ws`: upgrade to a viewer session.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hooktap_core::ViewerId;
use tracing::debug;

use crate::server::AppState;
use crate::websocket::run_viewer_session;

/// Upgrade and hand the socket to a new viewer session.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if state.shutdown.is_shutting_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let viewer_id = ViewerId::new();
    debug!(%viewer_id, "upgrading viewer connection");
    let deps = state.session_deps();
    ws.on_upgrade(move |socket| run_viewer_session(socket, viewer_id, deps))
}
