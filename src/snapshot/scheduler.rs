//! snapshot/scheduler: decides when to snapshot and runs the snapshot task.
//!
//! States: `Idle` -> `Snapshotting` -> `Idle`.
//!
//! - `after_write` consults the injected `SnapshotPolicy` with the new
//!   operation count and snapshots when it fires.
//! - `snapshot_now` runs encode + durable write on a separate scoped thread
//!   and blocks the caller until that thread finishes.
//! - One snapshot in flight at a time: a second caller waits on `in_flight`.
//! - The encode holds the store's read lock, so the snapshot is a consistent
//!   point-in-time view; file I/O happens after the lock is released.

use log::info;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::codec::encode_maps;
use crate::error::{CacheError, Result};
use crate::metrics::{record_snapshot, record_snapshot_failure};
use crate::policy::SnapshotPolicy;
use crate::store::TypedStore;

use super::file::write_snapshot_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Snapshotting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStats {
    pub bytes: u64,
    pub records: u64,
    pub elapsed: Duration,
}

pub struct Scheduler {
    path: PathBuf,
    policy: Arc<dyn SnapshotPolicy>,
    fsync: bool,
    state: Mutex<SchedulerState>,
    in_flight: Mutex<()>,
}

impl Scheduler {
    pub fn new(path: &Path, policy: Arc<dyn SnapshotPolicy>, fsync: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            policy,
            fsync,
            state: Mutex::new(SchedulerState::Idle),
            in_flight: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &dyn SnapshotPolicy {
        self.policy.as_ref()
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Called after each counted write; snapshots if the policy fires.
    pub fn after_write(
        &self,
        store: &TypedStore,
        operation_count: u64,
    ) -> Result<Option<SnapshotStats>> {
        if !self.policy.should_snapshot(operation_count) {
            return Ok(None);
        }
        info!(
            "snapshot: triggered at operation {} ({})",
            operation_count,
            self.policy.describe()
        );
        self.snapshot_now(store).map(Some)
    }

    /// Encode the whole store and replace the snapshot file. Blocks until done.
    pub fn snapshot_now(&self, store: &TypedStore) -> Result<SnapshotStats> {
        let _in_flight = self.in_flight.lock();
        *self.state.lock() = SchedulerState::Snapshotting;
        let started = Instant::now();

        let res = std::thread::scope(|s| -> Result<(u64, u64)> {
            let task = std::thread::Builder::new()
                .name("cc-snapshot".to_string())
                .spawn_scoped(s, || self.encode_and_write(store))
                .map_err(|e| CacheError::io("spawn snapshot task", e))?;
            task.join().unwrap_or_else(|_| {
                Err(CacheError::io(
                    "snapshot task",
                    std::io::Error::new(std::io::ErrorKind::Other, "panicked"),
                ))
            })
        });

        *self.state.lock() = SchedulerState::Idle;

        match res {
            Ok((bytes, records)) => {
                let stats = SnapshotStats {
                    bytes,
                    records,
                    elapsed: started.elapsed(),
                };
                record_snapshot(bytes, records);
                info!(
                    "snapshot: {} record(s), {} B -> {} in {:?}",
                    records,
                    bytes,
                    self.path.display(),
                    stats.elapsed
                );
                Ok(stats)
            }
            Err(e) => {
                record_snapshot_failure();
                Err(e)
            }
        }
    }

    fn encode_and_write(&self, store: &TypedStore) -> Result<(u64, u64)> {
        let (buf, records) = store.with_maps(|maps| -> Result<(Vec<u8>, u64)> {
            Ok((encode_maps(maps)?, maps.len() as u64))
        })?;
        write_snapshot_file(&self.path, &buf, self.fsync)?;
        Ok((buf.len() as u64, records))
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("path", &self.path)
            .field("policy", &self.policy.describe())
            .field("fsync", &self.fsync)
            .field("state", &self.state())
            .finish()
    }
}
