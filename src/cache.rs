//! cache: the engine: typed store + snapshot scheduler + single-writer lock.
//!
//! Lifecycle:
//! - `open`: take `<snapshot>.lock`, restore the snapshot file if present.
//!   A missing, unreadable or corrupt snapshot never fails startup: the cache
//!   starts empty (or with the decodable prefix) and logs a warning.
//! - `set` (and the typed wrappers): apply the write, count it, let the
//!   scheduler decide whether to snapshot.
//! - `close` / `Drop`: final snapshot when `snapshot_on_close` is set.
//!   `close` reports the error, `Drop` only logs it.

use log::{error, info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{CacheBuilder, CacheConfig};
use crate::error::Result;
use crate::lock::{try_acquire_exclusive_lock, LockGuard};
use crate::metrics::{record_restore, record_write, record_write_rejected};
use crate::policy::SnapshotPolicy;
use crate::snapshot::{restore_from_file, Scheduler, SnapshotStats};
use crate::store::TypedStore;
use crate::util::display_key;
use crate::value::{Value, ValueKind};

/// What `open` found at the snapshot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreSource {
    /// No snapshot file yet.
    Missing,
    /// Snapshot decoded; `complete == false` means only a prefix was usable.
    Loaded { version: i64, complete: bool },
    /// Snapshot unusable (bad header, unsupported version, I/O error).
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub source: RestoreSource,
    pub records: u64,
}

pub struct Cache {
    store: TypedStore,
    scheduler: Scheduler,
    config: CacheConfig,
    restore: RestoreReport,
    closed: AtomicBool,
    _lock: LockGuard,
}

impl Cache {
    pub fn builder() -> CacheBuilder {
        CacheBuilder::new()
    }

    pub fn open(config: CacheConfig) -> Result<Self> {
        let policy = config.default_policy();
        Self::open_with_policy(config, policy)
    }

    pub fn open_with_policy(config: CacheConfig, policy: Arc<dyn SnapshotPolicy>) -> Result<Self> {
        let lock = try_acquire_exclusive_lock(&config.snapshot_path)?;

        let store = TypedStore::with_namespace(config.key_namespace());
        let restore = restore_startup(&config.snapshot_path, &store);
        let scheduler = Scheduler::new(&config.snapshot_path, policy, config.fsync);

        info!(
            "cache open: {} key(s) from {}, snapshot {}, lock {}",
            store.len(),
            config.snapshot_path.display(),
            scheduler.policy().describe(),
            lock.path().display()
        );

        Ok(Self {
            store,
            scheduler,
            config,
            restore,
            closed: AtomicBool::new(false),
            _lock: lock,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn restore_report(&self) -> &RestoreReport {
        &self.restore
    }

    pub fn store(&self) -> &TypedStore {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn operation_count(&self) -> u64 {
        self.store.operation_count()
    }

    /// Write dispatcher: apply, count, maybe snapshot.
    ///
    /// A rejected write (key namespace conflict) leaves the store and the
    /// operation counter unchanged. A failed snapshot does not undo the write;
    /// it is logged and counted in metrics.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        let kind = value.kind();
        if let Err(e) = self.store.apply(key.as_str(), value) {
            record_write_rejected();
            warn!("set {} {}: rejected: {}", kind, display_key(&key), e);
            return Err(e);
        }
        record_write();
        let count = self.store.record_operation();
        if let Err(e) = self.scheduler.after_write(&self.store, count) {
            error!("snapshot after operation {} failed: {}", count, e);
        }
        Ok(())
    }

    pub fn set_integer(&self, key: impl Into<String>, value: i64) -> Result<()> {
        self.set(key, Value::Integer(value))
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.set(key, Value::String(value.into()))
    }

    pub fn set_float(&self, key: impl Into<String>, value: f64) -> Result<()> {
        self.set(key, Value::Float(value))
    }

    pub fn set_integer_array(&self, key: impl Into<String>, value: Vec<i64>) -> Result<()> {
        self.set(key, Value::IntegerArray(value))
    }

    pub fn set_string_array(&self, key: impl Into<String>, value: Vec<String>) -> Result<()> {
        self.set(key, Value::StringArray(value))
    }

    pub fn set_float_array(&self, key: impl Into<String>, value: Vec<f64>) -> Result<()> {
        self.set(key, Value::FloatArray(value))
    }

    /// Precedence lookup (see `ValueKind::PRECEDENCE`).
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.lookup(key)
    }

    pub fn get_kind(&self, kind: ValueKind, key: &str) -> Option<Value> {
        self.store.get(kind, key)
    }

    pub fn snapshot_now(&self) -> Result<SnapshotStats> {
        self.scheduler.snapshot_now(&self.store)
    }

    /// Final snapshot (if configured) and release the lock.
    pub fn close(self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if self.config.snapshot_on_close {
            self.snapshot_now()?;
        }
        Ok(())
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("cache close: shutdown snapshot failed: {}", e);
        }
    }
}

fn restore_startup(path: &Path, store: &TypedStore) -> RestoreReport {
    match restore_from_file(path, store) {
        Ok(None) => {
            info!("no snapshot at {}, starting empty", path.display());
            RestoreReport {
                source: RestoreSource::Missing,
                records: 0,
            }
        }
        Ok(Some(outcome)) => {
            let complete = outcome.is_complete();
            record_restore(outcome.records, complete);
            if let Some(e) = &outcome.stopped {
                warn!(
                    "snapshot {} partially restored ({} record(s)): {}",
                    path.display(),
                    outcome.records,
                    e
                );
            } else {
                info!(
                    "snapshot {} restored: version {}, {} record(s)",
                    path.display(),
                    outcome.version,
                    outcome.records
                );
            }
            RestoreReport {
                source: RestoreSource::Loaded {
                    version: outcome.version,
                    complete,
                },
                records: outcome.records,
            }
        }
        Err(e) => {
            record_restore(0, false);
            if e.is_format() {
                warn!("ignoring corrupt snapshot {}: {}", path.display(), e);
            } else {
                warn!("snapshot {} unreadable, starting empty: {}", path.display(), e);
            }
            RestoreReport {
                source: RestoreSource::Rejected(e.to_string()),
                records: 0,
            }
        }
    }
}
