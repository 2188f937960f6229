//! Per-viewer connection state held by the broadcast hub.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ws::Utf8Bytes;
use hooktap_core::ViewerId;
use hooktap_store::StoredRecord;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// A serialized record ready to be written to viewers.
///
/// The text is reference-counted, so one encoding is shared by every
/// mailbox it is delivered to.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Ledger sequence number of the record.
    pub seq: u64,
    /// JSON text of the record.
    pub text: Utf8Bytes,
}

impl Frame {
    /// Serialize a stored record.
    pub fn encode(stored: &StoredRecord) -> serde_json::Result<Self> {
        let json = serde_json::to_string(&*stored.record)?;
        Ok(Self {
            seq: stored.seq,
            text: Utf8Bytes::from(json),
        })
    }
}

/// Why a frame could not be delivered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The viewer's mailbox is at capacity.
    #[error("viewer mailbox full")]
    MailboxFull,
    /// The viewer's writer has gone away.
    #[error("viewer disconnected")]
    Disconnected,
}

impl DeliveryError {
    /// Short label for metrics.
    pub fn label(self) -> &'static str {
        match self {
            Self::MailboxFull => "mailbox_full",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Lifecycle of a viewer session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerState {
    /// Upgrade accepted, not yet replaying.
    Connecting,
    /// Writing ledger history.
    Replaying,
    /// Receiving live fan-out.
    Live,
    /// Terminal.
    Closed,
}

impl ViewerState {
    fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Replaying)
                | (Self::Replaying, Self::Live)
                | (Self::Connecting | Self::Replaying | Self::Live, Self::Closed)
        )
    }
}

/// Hub-side handle to a connected viewer.
///
/// The viewer's writer task owns the socket; the hub only enqueues frames
/// into the bounded mailbox and, on eviction, signals the writer to close.
pub struct ViewerConnection {
    /// Unique viewer ID.
    pub id: ViewerId,
    tx: mpsc::Sender<Frame>,
    state: Mutex<ViewerState>,
    closer: CancellationToken,
    /// When the viewer connected.
    pub connected_at: Instant,
    dropped_frames: AtomicU64,
}

impl ViewerConnection {
    /// Create a connection feeding `tx`.
    pub fn new(id: ViewerId, tx: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            tx,
            state: Mutex::new(ViewerState::Connecting),
            closer: CancellationToken::new(),
            connected_at: Instant::now(),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Enqueue a frame without waiting.
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                Err(DeliveryError::MailboxFull)
            }
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Disconnected),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ViewerState {
        *self.state.lock()
    }

    /// Move to `next` if the transition is allowed. Returns whether it moved.
    pub fn advance(&self, next: ViewerState) -> bool {
        let mut state = self.state.lock();
        if state.can_advance_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }

    /// Ask the viewer's writer to close the socket.
    pub fn close(&self) {
        self.closer.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_close_requested(&self) -> bool {
        self.closer.is_cancelled()
    }

    /// Token cancelled by [`close`](Self::close).
    pub fn close_signal(&self) -> CancellationToken {
        self.closer.clone()
    }

    /// Frames refused because the mailbox was full.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooktap_core::CanonicalRecord;
    use std::sync::Arc;

    fn frame(seq: u64) -> Frame {
        Frame {
            seq,
            text: Utf8Bytes::from(format!("{{\"seq\":{seq}}}")),
        }
    }

    fn make_connection(capacity: usize) -> (ViewerConnection, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ViewerConnection::new(ViewerId::from("viewer_1"), tx), rx)
    }

    #[tokio::test]
    async fn deliver_enqueues_in_order() {
        let (conn, mut rx) = make_connection(8);
        for seq in 1..=3 {
            conn.deliver(frame(seq)).unwrap();
        }
        for seq in 1..=3 {
            assert_eq!(rx.recv().await.unwrap().seq, seq);
        }
    }

    #[test]
    fn full_mailbox_is_reported() {
        let (conn, _rx) = make_connection(1);
        conn.deliver(frame(1)).unwrap();
        assert_eq!(conn.deliver(frame(2)), Err(DeliveryError::MailboxFull));
        assert_eq!(conn.drop_count(), 1);
    }

    #[test]
    fn closed_mailbox_is_reported() {
        let (conn, rx) = make_connection(4);
        drop(rx);
        assert_eq!(conn.deliver(frame(1)), Err(DeliveryError::Disconnected));
        assert_eq!(conn.drop_count(), 0);
    }

    #[test]
    fn state_machine_forward_only() {
        let (conn, _rx) = make_connection(1);
        assert_eq!(conn.state(), ViewerState::Connecting);
        assert!(!conn.advance(ViewerState::Live));
        assert!(conn.advance(ViewerState::Replaying));
        assert!(conn.advance(ViewerState::Live));
        assert!(!conn.advance(ViewerState::Replaying));
        assert!(conn.advance(ViewerState::Closed));
        assert!(!conn.advance(ViewerState::Live));
        assert!(!conn.advance(ViewerState::Closed));
        assert_eq!(conn.state(), ViewerState::Closed);
    }

    #[test]
    fn any_live_state_can_close() {
        for path in [
            &[][..],
            &[ViewerState::Replaying][..],
            &[ViewerState::Replaying, ViewerState::Live][..],
        ] {
            let (conn, _rx) = make_connection(1);
            for s in path {
                assert!(conn.advance(*s));
            }
            assert!(conn.advance(ViewerState::Closed));
        }
    }

    #[tokio::test]
    async fn close_signals_token() {
        let (conn, _rx) = make_connection(1);
        let signal = conn.close_signal();
        assert!(!conn.is_close_requested());
        conn.close();
        signal.cancelled().await;
        assert!(conn.is_close_requested());
    }

    #[test]
    fn frame_encodes_record() {
        let stored = StoredRecord {
            seq: 9,
            record: Arc::new(CanonicalRecord::new("POST", "/webhook")),
        };
        let f = Frame::encode(&stored).unwrap();
        assert_eq!(f.seq, 9);
        let v: serde_json::Value = serde_json::from_str(f.text.as_str()).unwrap();
        assert_eq!(v["url"], "/webhook");
        assert_eq!(v["id"], stored.record.id.as_str());
    }

    #[test]
    fn delivery_error_labels() {
        assert_eq!(DeliveryError::MailboxFull.label(), "mailbox_full");
        assert_eq!(DeliveryError::Disconnected.label(), "disconnected");
    }
}
