//! Lightweight global metrics for the cache.
//!
//! Thread-safe atomic counters:
//! - writes (accepted / rejected)
//! - snapshots (taken, failed, bytes, records)
//! - restore (records applied, incomplete restores)
//! - transport frames

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Writes -----
static WRITES_TOTAL: AtomicU64 = AtomicU64::new(0);
static WRITES_REJECTED: AtomicU64 = AtomicU64::new(0);

// ----- Snapshots -----
static SNAPSHOTS_TAKEN: AtomicU64 = AtomicU64::new(0);
static SNAPSHOTS_FAILED: AtomicU64 = AtomicU64::new(0);
static SNAPSHOT_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static SNAPSHOT_RECORDS_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Restore -----
static RESTORE_RECORDS_APPLIED: AtomicU64 = AtomicU64::new(0);
static RESTORES_INCOMPLETE: AtomicU64 = AtomicU64::new(0);

// ----- Transport -----
static FRAMES_RECEIVED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub writes_total: u64,
    pub writes_rejected: u64,

    pub snapshots_taken: u64,
    pub snapshots_failed: u64,
    pub snapshot_bytes_written: u64,
    pub snapshot_records_written: u64,

    pub restore_records_applied: u64,
    pub restores_incomplete: u64,

    pub frames_received: u64,
}

impl MetricsSnapshot {
    pub fn avg_snapshot_bytes(&self) -> f64 {
        if self.snapshots_taken == 0 {
            0.0
        } else {
            self.snapshot_bytes_written as f64 / self.snapshots_taken as f64
        }
    }
}

// ----- Recorders -----
pub fn record_write() {
    WRITES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn record_write_rejected() {
    WRITES_REJECTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_snapshot(bytes: u64, records: u64) {
    SNAPSHOTS_TAKEN.fetch_add(1, Ordering::Relaxed);
    SNAPSHOT_BYTES_WRITTEN.fetch_add(bytes, Ordering::Relaxed);
    SNAPSHOT_RECORDS_WRITTEN.fetch_add(records, Ordering::Relaxed);
}

pub fn record_snapshot_failure() {
    SNAPSHOTS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_restore(records: u64, complete: bool) {
    RESTORE_RECORDS_APPLIED.fetch_add(records, Ordering::Relaxed);
    if !complete {
        RESTORES_INCOMPLETE.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_frame() {
    FRAMES_RECEIVED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        writes_total: WRITES_TOTAL.load(Ordering::Relaxed),
        writes_rejected: WRITES_REJECTED.load(Ordering::Relaxed),
        snapshots_taken: SNAPSHOTS_TAKEN.load(Ordering::Relaxed),
        snapshots_failed: SNAPSHOTS_FAILED.load(Ordering::Relaxed),
        snapshot_bytes_written: SNAPSHOT_BYTES_WRITTEN.load(Ordering::Relaxed),
        snapshot_records_written: SNAPSHOT_RECORDS_WRITTEN.load(Ordering::Relaxed),
        restore_records_applied: RESTORE_RECORDS_APPLIED.load(Ordering::Relaxed),
        restores_incomplete: RESTORES_INCOMPLETE.load(Ordering::Relaxed),
        frames_received: FRAMES_RECEIVED.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_snapshot_bytes_handles_zero() {
        let m = MetricsSnapshot::default();
        assert_eq!(m.avg_snapshot_bytes(), 0.0);
        let m = MetricsSnapshot {
            snapshots_taken: 2,
            snapshot_bytes_written: 10,
            ..Default::default()
        };
        assert_eq!(m.avg_snapshot_bytes(), 5.0);
    }
}
