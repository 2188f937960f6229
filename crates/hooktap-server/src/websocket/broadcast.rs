//! Fan-out of newly captured records to connected viewers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hooktap_core::ViewerId;
use hooktap_store::StoredRecord;
use metrics::counter;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::connection::{Frame, ViewerConnection};
use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

/// Outcome of one fan-out pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Viewers the frame was enqueued for.
    pub delivered: usize,
    /// Viewers removed because delivery failed.
    pub evicted: Vec<ViewerId>,
}

/// Registry of live viewers.
pub struct BroadcastHub {
    viewers: RwLock<HashMap<ViewerId, Arc<ViewerConnection>>>,
    active_count: AtomicUsize,
}

impl BroadcastHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            viewers: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Register a viewer.
    pub async fn register(&self, viewer: Arc<ViewerConnection>) {
        let mut viewers = self.viewers.write().await;
        if viewers.insert(viewer.id.clone(), viewer).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a viewer. Returns whether it was registered.
    pub async fn unregister(&self, viewer_id: &ViewerId) -> bool {
        let mut viewers = self.viewers.write().await;
        let removed = viewers.remove(viewer_id).is_some();
        if removed {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Number of registered viewers.
    pub fn viewer_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Enqueue `frame` for every registered viewer.
    ///
    /// The registry lock is released before any delivery is attempted.
    /// Viewers that cannot accept the frame are removed afterwards and told
    /// to close; they are never retried.
    pub async fn fan_out(&self, frame: &Frame) -> FanOutReport {
        let recipients: Vec<Arc<ViewerConnection>> =
            self.viewers.read().await.values().cloned().collect();

        let mut report = FanOutReport::default();
        let mut failed = Vec::new();
        for viewer in recipients {
            match viewer.deliver(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    counter!(WS_BROADCAST_DROPS_TOTAL, "reason" => err.label()).increment(1);
                    warn!(viewer_id = %viewer.id, seq = frame.seq, error = %err, "evicting viewer");
                    failed.push(viewer);
                }
            }
        }

        if !failed.is_empty() {
            {
                let mut viewers = self.viewers.write().await;
                for viewer in &failed {
                    if viewers.remove(&viewer.id).is_some() {
                        let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                    }
                }
            }
            for viewer in failed {
                viewer.close();
                report.evicted.push(viewer.id.clone());
            }
        }

        debug!(
            seq = frame.seq,
            delivered = report.delivered,
            evicted = report.evicted.len(),
            "fan-out complete"
        );
        report
    }

    /// Drain the ledger feed, fanning out each record in append order.
    ///
    /// Returns when the feed closes or `shutdown` fires.
    #[instrument(skip_all, name = "fan_out_dispatcher")]
    pub async fn run(
        self: Arc<Self>,
        mut feed: mpsc::UnboundedReceiver<StoredRecord>,
        shutdown: CancellationToken,
    ) {
        info!("fan-out dispatcher started");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                item = feed.recv() => {
                    let Some(stored) = item else { break };
                    match Frame::encode(&stored) {
                        Ok(frame) => {
                            let _ = self.fan_out(&frame).await;
                        }
                        Err(e) => {
                            warn!(record_id = %stored.record.id, error = %e, "failed to serialize record");
                        }
                    }
                }
            }
        }
        info!("fan-out dispatcher stopped");
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
