//! Counters describing how the buffer pool has been used.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the buffer pool manager.
///
/// The counters live outside the pool's mutex, so reading them never contends with page
/// operations.
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    /// Fetches answered from memory.
    hits: AtomicU64,
    /// Fetches that had to go to disk.
    misses: AtomicU64,
    /// Frames reclaimed from the replacer.
    evictions: AtomicU64,
    /// Pages read from disk.
    disk_reads: AtomicU64,
    /// Pages written to disk.
    disk_writes: AtomicU64,
    /// Pages created through `new_page`.
    allocations: AtomicU64,
    /// Pages removed through `delete_page`.
    deletions: AtomicU64,
}

/// A point-in-time copy of [`BufferPoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Fetches answered from memory.
    pub hits: u64,
    /// Fetches that had to go to disk.
    pub misses: u64,
    /// Frames reclaimed from the replacer.
    pub evictions: u64,
    /// Pages read from disk.
    pub disk_reads: u64,
    /// Pages written to disk.
    pub disk_writes: u64,
    /// Pages created through `new_page`.
    pub allocations: u64,
    /// Pages removed through `delete_page`.
    pub deletions: u64,
}

impl StatsSnapshot {
    /// The fraction of fetches that were hits, or `0.0` if nothing has been fetched.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl BufferPoolStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_read(&self) {
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_write(&self) {
        self.disk_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deletion(&self) {
        self.deletions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            disk_reads: self.disk_reads.load(Ordering::Relaxed),
            disk_writes: self.disk_writes.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
        }
    }
}
