//! Store statistics.
//!
//! Counters for the benchmark driver to report alongside throughput.
//!
//! # Usage
//!
//! ```rust
//! use nosqlbench_core::{Database, MemoryDatabase, StoreConfig};
//!
//! let db = MemoryDatabase::new();
//! db.init(&StoreConfig::default()).unwrap();
//!
//! let stats = db.stats().snapshot();
//! assert_eq!(stats.conflicts, 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values are monotonically increasing except the `entity_count` gauge.
#[derive(Debug, Default)]
pub struct StoreStats {
    // Operation counters
    /// Successful reads of a committed entity.
    reads: AtomicU64,
    /// Applied upserts.
    writes: AtomicU64,
    /// Applied deletes.
    deletes: AtomicU64,
    /// Query scans.
    scans: AtomicU64,

    // Transaction counters
    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,
    /// Commits rejected by the version check.
    conflicts: AtomicU64,

    /// Resident entities after the last mutation.
    entity_count: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    // === Increment methods (internal use) ===

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_writes(&self, count: u64) {
        self.writes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_entity_count(&self, count: u64) {
        self.entity_count.store(count, Ordering::Relaxed);
    }

    // === Getter methods (public API) ===

    /// Returns the number of committed-entity reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of applied upserts.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of applied deletes.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of query scans.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions started.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions committed.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions rolled back.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns the number of commits rejected by a version conflict.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Returns the resident entity count.
    pub fn entity_count(&self) -> u64 {
        self.entity_count.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            writes: self.writes(),
            deletes: self.deletes(),
            scans: self.scans(),
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_rolled_back: self.transactions_rolled_back(),
            conflicts: self.conflicts(),
            entity_count: self.entity_count(),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Committed-entity reads.
    pub reads: u64,
    /// Applied upserts.
    pub writes: u64,
    /// Applied deletes.
    pub deletes: u64,
    /// Query scans.
    pub scans: u64,
    /// Transactions started.
    pub transactions_started: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back.
    pub transactions_rolled_back: u64,
    /// Commits rejected by a version conflict.
    pub conflicts: u64,
    /// Resident entities.
    pub entity_count: u64,
}
