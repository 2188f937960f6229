//! Bounded, newest-first history of captured calls.
//!
//! Every append assigns a strictly increasing sequence number and, while the
//! write lock is still held, publishes the stored record on the fan-out feed.
//! The feed therefore carries records in exactly the order they were
//! appended, and a snapshot's high-water mark tells a late subscriber which
//! feed items it has already seen.

use std::collections::VecDeque;
use std::sync::Arc;

use hooktap_core::CanonicalRecord;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Maximum number of records the ledger retains.
pub const LEDGER_CAPACITY: usize = 100;

/// A ledger slot: the shared record plus its append sequence number.
#[derive(Clone, Debug)]
pub struct StoredRecord {
    /// Sequence number, starting at 1.
    pub seq: u64,
    /// The immutable record.
    pub record: Arc<CanonicalRecord>,
}

struct LedgerInner {
    records: VecDeque<StoredRecord>,
    next_seq: u64,
    feed: Option<mpsc::UnboundedSender<StoredRecord>>,
}

/// Concurrent request ledger.
///
/// One writer at a time, any number of concurrent readers.
pub struct Ledger {
    inner: RwLock<LedgerInner>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create an empty ledger with no fan-out feed.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                records: VecDeque::with_capacity(LEDGER_CAPACITY),
                next_seq: 1,
                feed: None,
            }),
        }
    }

    /// Open the fan-out feed.
    ///
    /// There is a single feed; calling this again replaces the previous
    /// sender, and the old receiver sees its channel close.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoredRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().feed = Some(tx);
        rx
    }

    /// Insert `record` at the head, evicting the oldest beyond capacity.
    ///
    /// Returns without waiting for any consumer of the feed.
    pub fn append(&self, record: CanonicalRecord) -> StoredRecord {
        let mut inner = self.inner.write();

        let stored = StoredRecord {
            seq: inner.next_seq,
            record: Arc::new(record),
        };
        inner.next_seq += 1;

        inner.records.push_front(stored.clone());
        if inner.records.len() > LEDGER_CAPACITY {
            if let Some(evicted) = inner.records.pop_back() {
                debug!(record_id = %evicted.record.id, seq = evicted.seq, "ledger evicted oldest record");
            }
        }

        let feed_closed = inner
            .feed
            .as_ref()
            .is_some_and(|feed| feed.send(stored.clone()).is_err());
        if feed_closed {
            warn!("ledger feed receiver dropped, fan-out disabled");
            inner.feed = None;
        }

        stored
    }

    /// Point-in-time copy of the history, newest first.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.read();
        LedgerSnapshot {
            records: inner.records.iter().cloned().collect(),
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Fixed retention limit.
    pub fn capacity(&self) -> usize {
        LEDGER_CAPACITY
    }
}

/// Immutable copy of the ledger taken by [`Ledger::snapshot`].
#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    records: Vec<StoredRecord>,
}

impl LedgerSnapshot {
    /// Records newest first.
    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter()
    }

    /// Records oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter().rev()
    }

    /// Shared records newest first.
    pub fn records(&self) -> Vec<Arc<CanonicalRecord>> {
        self.records.iter().map(|s| Arc::clone(&s.record)).collect()
    }

    /// Highest sequence number in the snapshot, or 0 when empty.
    pub fn high_water(&self) -> u64 {
        self.records.first().map_or(0, |s| s.seq)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
