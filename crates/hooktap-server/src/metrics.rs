//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup, before anything records a metric. Fails if another
/// recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// A handle backed by a recorder that is not installed globally.
///
/// Renders an empty exposition; used when the global recorder is owned by
/// someone else (tests, embedding).
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

/// Webhook calls ingested (counter, label: route).
pub const WEBHOOK_REQUESTS_TOTAL: &str = "webhook_requests_total";
/// Attachments stored (counter).
pub const WEBHOOK_FILES_STORED_TOTAL: &str = "webhook_files_stored_total";
/// Attachments skipped (counter, label: reason).
pub const WEBHOOK_FILES_SKIPPED_TOTAL: &str = "webhook_files_skipped_total";
/// Viewer connections opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Viewer connections closed (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active viewer connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Fan-out deliveries that failed (counter, label: reason).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Viewer connection lifetime (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Records currently held by the ledger (gauge).
pub const LEDGER_RECORDS: &str = "ledger_records";
