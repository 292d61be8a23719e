//! Store statistics.
//!
//! Counters are updated after the store lock is released and are never
//! rolled back, so a failed batch still shows up in `transactions_rolled_back`.
//!
//! ```rust,ignore
//! let stats = store.stats().snapshot();
//! println!("committed: {}", stats.transactions_committed);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics and counters.
///
/// All counters are atomic and can be read while operations are in progress.
#[derive(Debug, Default)]
pub struct StoreStats {
    // Transaction counters
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,

    // Row counters
    rows_inserted: AtomicU64,
    rows_updated: AtomicU64,
    rows_deleted: AtomicU64,

    // Store-level counters
    snapshots: AtomicU64,
    tables_created: AtomicU64,
    values_generated: AtomicU64,
    clears: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed batch and its row counts.
    pub(crate) fn record_commit(&self, inserted: u64, updated: u64, deleted: u64) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
        self.rows_inserted.fetch_add(inserted, Ordering::Relaxed);
        self.rows_updated.fetch_add(updated, Ordering::Relaxed);
        self.rows_deleted.fetch_add(deleted, Ordering::Relaxed);
    }

    /// Records a batch that was rolled back.
    pub(crate) fn record_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a snapshot request.
    pub(crate) fn record_snapshot(&self) {
        self.snapshots.fetch_add(1, Ordering::Relaxed);
    }

    /// Records lazily created tables.
    pub(crate) fn record_tables_created(&self, count: u64) {
        self.tables_created.fetch_add(count, Ordering::Relaxed);
    }

    /// Records a generated key value.
    pub(crate) fn record_value_generated(&self) {
        self.values_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a clear that dropped at least one table.
    pub(crate) fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of committed batches.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of rolled back batches.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns the number of rows inserted by committed batches.
    pub fn rows_inserted(&self) -> u64 {
        self.rows_inserted.load(Ordering::Relaxed)
    }

    /// Returns the number of rows updated by committed batches.
    pub fn rows_updated(&self) -> u64 {
        self.rows_updated.load(Ordering::Relaxed)
    }

    /// Returns the number of rows deleted by committed batches.
    pub fn rows_deleted(&self) -> u64 {
        self.rows_deleted.load(Ordering::Relaxed)
    }

    /// Returns the number of snapshot requests.
    pub fn snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::Relaxed)
    }

    /// Returns the number of tables created.
    pub fn tables_created(&self) -> u64 {
        self.tables_created.load(Ordering::Relaxed)
    }

    /// Returns the number of generated key values.
    pub fn values_generated(&self) -> u64 {
        self.values_generated.load(Ordering::Relaxed)
    }

    /// Returns the number of effective clears.
    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions_committed: self.transactions_committed(),
            transactions_rolled_back: self.transactions_rolled_back(),
            rows_inserted: self.rows_inserted(),
            rows_updated: self.rows_updated(),
            rows_deleted: self.rows_deleted(),
            snapshots: self.snapshots(),
            tables_created: self.tables_created(),
            values_generated: self.values_generated(),
            clears: self.clears(),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Committed batches.
    pub transactions_committed: u64,
    /// Rolled back batches.
    pub transactions_rolled_back: u64,
    /// Rows inserted.
    pub rows_inserted: u64,
    /// Rows updated.
    pub rows_updated: u64,
    /// Rows deleted.
    pub rows_deleted: u64,
    /// Snapshot requests.
    pub snapshots: u64,
    /// Tables created.
    pub tables_created: u64,
    /// Generated key values.
    pub values_generated: u64,
    /// Effective clears.
    pub clears: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = StoreStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_commit_adds_row_counts() {
        let stats = StoreStats::new();
        stats.record_commit(2, 1, 0);
        stats.record_commit(0, 0, 3);
        stats.record_rollback();

        let snap = stats.snapshot();
        assert_eq!(snap.transactions_committed, 2);
        assert_eq!(snap.transactions_rolled_back, 1);
        assert_eq!(snap.rows_inserted, 2);
        assert_eq!(snap.rows_updated, 1);
        assert_eq!(snap.rows_deleted, 3);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(StoreStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_value_generated();
                    s.record_snapshot();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.values_generated(), 1000);
        assert_eq!(stats.snapshots(), 1000);
    }
}
