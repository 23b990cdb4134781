//! Metrics registry for rawstore
//!
//! - Counters only
//! - Monotonic increase, reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by every request handler
///
/// All counters use Relaxed ordering; they are reporting values, not
/// synchronization points.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    writes: AtomicU64,
    write_conflicts: AtomicU64,
    reads: AtomicU64,
    reads_not_found: AtomicU64,
    corrupted_reads: AtomicU64,
    deletes: AtomicU64,
    backups: AtomicU64,
    namespaces_created: AtomicU64,
    events_published: AtomicU64,
    events_failed: AtomicU64,
    rate_limited: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Data path

    /// Increment committed writes
    pub fn increment_writes(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment insert-only writes rejected because the key existed
    pub fn increment_write_conflicts(&self) {
        self.write_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment successful reads
    pub fn increment_reads(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment reads of absent keys
    pub fn increment_reads_not_found(&self) {
        self.reads_not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment reads whose stored payload failed to decompress
    pub fn increment_corrupted_reads(&self) {
        self.corrupted_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment deletes
    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    // Namespace lifecycle

    /// Increment backups created
    pub fn increment_backups(&self) {
        self.backups.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment namespaces created through the API
    pub fn increment_namespaces_created(&self) {
        self.namespaces_created.fetch_add(1, Ordering::Relaxed);
    }

    // Change stream

    /// Increment change events appended to the stream
    pub fn increment_events_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment change events dropped after a failed publish
    pub fn increment_events_failed(&self) {
        self.events_failed.fetch_add(1, Ordering::Relaxed);
    }

    // HTTP

    /// Increment requests rejected by the rate limiter
    pub fn increment_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            write_conflicts: self.write_conflicts.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            reads_not_found: self.reads_not_found.load(Ordering::Relaxed),
            corrupted_reads: self.corrupted_reads.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            backups: self.backups.load(Ordering::Relaxed),
            namespaces_created: self.namespaces_created.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub writes: u64,
    pub write_conflicts: u64,
    pub reads: u64,
    pub reads_not_found: u64,
    pub corrupted_reads: u64,
    pub deletes: u64,
    pub backups: u64,
    pub namespaces_created: u64,
    pub events_published: u64,
    pub events_failed: u64,
    pub rate_limited: u64,
}
