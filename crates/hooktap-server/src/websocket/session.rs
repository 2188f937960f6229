//! Viewer session lifecycle: one connected observer from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use hooktap_core::ViewerId;
use hooktap_store::Ledger;
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::broadcast::BroadcastHub;
use super::connection::{Frame, ViewerConnection, ViewerState};
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL,
};

/// Everything a session needs from the server.
#[derive(Clone)]
pub struct SessionDeps {
    /// Viewer registry.
    pub hub: Arc<BroadcastHub>,
    /// History source for replay.
    pub ledger: Arc<Ledger>,
    /// Mailbox size per viewer.
    pub mailbox_capacity: usize,
    /// Ping interval.
    pub heartbeat_interval: Duration,
    /// Server-wide shutdown signal.
    pub shutdown: CancellationToken,
}

/// Run a viewer session on an upgraded socket.
///
/// 1. Registers with the hub so no live record can be missed
/// 2. Replays the ledger oldest to newest straight onto the socket
/// 3. Goes live: drains the mailbox, skipping anything already replayed,
///    and pings at the heartbeat interval
/// 4. Unregisters on disconnect, eviction, or shutdown
#[instrument(skip_all, fields(viewer_id = %viewer_id))]
pub async fn run_viewer_session(ws: WebSocket, viewer_id: ViewerId, deps: SessionDeps) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (mailbox_tx, mailbox_rx) = mpsc::channel::<Frame>(deps.mailbox_capacity.max(1));
    let viewer = Arc::new(ViewerConnection::new(viewer_id.clone(), mailbox_tx));

    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    deps.hub.register(Arc::clone(&viewer)).await;
    let _ = viewer.advance(ViewerState::Replaying);

    let snapshot = deps.ledger.snapshot();
    let watermark = snapshot.high_water();
    let mut replayed = 0usize;
    let mut replay_ok = true;
    for stored in snapshot.chronological() {
        let json = match serde_json::to_string(&*stored.record) {
            Ok(json) => json,
            Err(e) => {
                warn!(record_id = %stored.record.id, error = %e, "failed to serialize record for replay");
                continue;
            }
        };
        if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
            debug!(error = %e, replayed, "replay write failed");
            replay_ok = false;
            break;
        }
        replayed += 1;
    }
    drop(snapshot);

    if replay_ok && viewer.advance(ViewerState::Live) {
        info!(replayed, watermark, "viewer connected");

        let mut writer = tokio::spawn(write_loop(
            ws_tx,
            mailbox_rx,
            watermark,
            viewer.close_signal(),
            deps.shutdown.clone(),
            deps.heartbeat_interval,
        ));

        tokio::select! {
            _ = &mut writer => {}
            () = read_loop(&mut ws_rx) => {}
        }
        writer.abort();
    }

    let _ = viewer.advance(ViewerState::Closed);
    let _ = deps.hub.unregister(&viewer_id).await;

    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(viewer.age().as_secs_f64());
    info!(
        evicted = viewer.is_close_requested(),
        dropped = viewer.drop_count(),
        "viewer disconnected"
    );
}

/// Sole writer on the socket once the session is live.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut mailbox: mpsc::Receiver<Frame>,
    watermark: u64,
    evicted: CancellationToken,
    shutdown: CancellationToken,
    heartbeat: Duration,
) {
    let mut ping = tokio::time::interval(heartbeat);
    // First tick completes immediately.
    let _ = ping.tick().await;

    loop {
        tokio::select! {
            () = evicted.cancelled() => {
                send_close(&mut ws_tx, close_code::POLICY, "viewer fell behind").await;
                break;
            }
            () = shutdown.cancelled() => {
                send_close(&mut ws_tx, close_code::AWAY, "server shutting down").await;
                break;
            }
            frame = mailbox.recv() => {
                let Some(frame) = frame else { break };
                if frame.seq <= watermark {
                    continue;
                }
                if ws_tx.send(Message::Text(frame.text)).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn read_loop(ws_rx: &mut futures::stream::SplitStream<WebSocket>) {
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                debug!("viewer sent close frame");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "viewer read failed");
                break;
            }
        }
    }
}

async fn send_close(ws_tx: &mut SplitSink<WebSocket, Message>, code: u16, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from_static(reason),
    };
    let _ = ws_tx.send(Message::Close(Some(frame))).await;
}
