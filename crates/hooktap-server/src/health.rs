//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` while the server is running.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Connected viewers.
    pub viewers: usize,
    /// Records in the ledger.
    pub records: usize,
    /// Stored attachments.
    pub blobs: usize,
    /// Sum of stored attachment sizes.
    pub blob_bytes: usize,
}

/// Live counters sampled for a health response.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCounters {
    /// Connected viewers.
    pub viewers: usize,
    /// Records in the ledger.
    pub records: usize,
    /// Stored attachments.
    pub blobs: usize,
    /// Sum of stored attachment sizes.
    pub blob_bytes: usize,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, counters: HealthCounters) -> HealthResponse {
    HealthResponse {
        status: "ok",
        service: hooktap_core::constants::NAME,
        version: hooktap_core::constants::VERSION,
        uptime_secs: start_time.elapsed().as_secs(),
        viewers: counters.viewers,
        records: counters.records,
        blobs: counters.blobs,
        blob_bytes: counters.blob_bytes,
    }
}
