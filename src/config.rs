//! Centralized configuration and builder for the cache.
//!
//! - `CacheConfig::from_env()` reads the `CC_*` variables; unset or unparsable
//!   values keep their defaults.
//! - Fluent `with_*` setters override individual fields.
//! - `CacheBuilder` starts from env (or clean defaults), optionally takes an
//!   explicit `SnapshotPolicy`, and opens a `Cache`.
//!
//! Defaults:
//! - snapshot_path = ./snapshot
//! - snapshot_every = 10 (0 disables count-triggered snapshots)
//! - snapshot_on_close = true
//! - fsync = true
//! - strict_keys = false (same key may live in several typed maps)

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::Cache;
use crate::consts::{
    DEFAULT_LISTEN_ADDR, DEFAULT_MAX_FRAME_BYTES, DEFAULT_SNAPSHOT_INTERVAL, SNAPSHOT_FILE_NAME,
};
use crate::error::Result;
use crate::policy::{EveryNWrites, SnapshotPolicy};
use crate::store::KeyNamespace;

#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Snapshot file location.
    /// Env: CC_SNAPSHOT_PATH (default "./snapshot")
    pub snapshot_path: PathBuf,

    /// Snapshot after every N counted writes (0 = never by count).
    /// Env: CC_SNAPSHOT_EVERY (default 10)
    pub snapshot_every: u64,

    /// Take a final snapshot on close/drop.
    /// Env: CC_SNAPSHOT_ON_CLOSE (default true)
    pub snapshot_on_close: bool,

    /// fsync the temp file and parent directory on every snapshot.
    /// Env: CC_FSYNC (default true)
    pub fsync: bool,

    /// A key may live in at most one typed map.
    /// Env: CC_STRICT_KEYS (default false)
    pub strict_keys: bool,

    /// Address for the frame listener.
    /// Env: CC_LISTEN_ADDR (default "127.0.0.1:4444")
    pub listen_addr: String,

    /// Largest accepted frame content.
    /// Env: CC_MAX_FRAME_BYTES (default 16 MiB)
    pub max_frame_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(SNAPSHOT_FILE_NAME),
            snapshot_every: DEFAULT_SNAPSHOT_INTERVAL,
            snapshot_on_close: true,
            fsync: true,
            strict_keys: false,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

fn parse_bool(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("CC_SNAPSHOT_PATH") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.snapshot_path = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("CC_SNAPSHOT_EVERY") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.snapshot_every = n;
            }
        }

        if let Ok(v) = std::env::var("CC_SNAPSHOT_ON_CLOSE") {
            cfg.snapshot_on_close = parse_bool(&v);
        }

        if let Ok(v) = std::env::var("CC_FSYNC") {
            cfg.fsync = parse_bool(&v);
        }

        if let Ok(v) = std::env::var("CC_STRICT_KEYS") {
            cfg.strict_keys = parse_bool(&v);
        }

        if let Ok(v) = std::env::var("CC_LISTEN_ADDR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.listen_addr = s.to_string();
            }
        }

        if let Ok(v) = std::env::var("CC_MAX_FRAME_BYTES") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_frame_bytes = n;
            }
        }

        cfg
    }

    pub fn with_snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = path.into();
        self
    }

    pub fn with_snapshot_every(mut self, n: u64) -> Self {
        self.snapshot_every = n;
        self
    }

    pub fn with_snapshot_on_close(mut self, on: bool) -> Self {
        self.snapshot_on_close = on;
        self
    }

    pub fn with_fsync(mut self, on: bool) -> Self {
        self.fsync = on;
        self
    }

    pub fn with_strict_keys(mut self, on: bool) -> Self {
        self.strict_keys = on;
        self
    }

    pub fn with_listen_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_max_frame_bytes(mut self, n: usize) -> Self {
        self.max_frame_bytes = n;
        self
    }

    pub fn key_namespace(&self) -> KeyNamespace {
        if self.strict_keys {
            KeyNamespace::Exclusive
        } else {
            KeyNamespace::Shared
        }
    }

    /// Policy implied by `snapshot_every`.
    pub fn default_policy(&self) -> Arc<dyn SnapshotPolicy> {
        Arc::new(EveryNWrites(self.snapshot_every))
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheConfig {{ \
             snapshot_path: {}, \
             snapshot_every: {}, \
             snapshot_on_close: {}, \
             fsync: {}, \
             strict_keys: {}, \
             listen_addr: {}, \
             max_frame_bytes: {} \
             }}",
            self.snapshot_path.display(),
            self.snapshot_every,
            self.snapshot_on_close,
            self.fsync,
            self.strict_keys,
            self.listen_addr,
            self.max_frame_bytes,
        )
    }
}

#[derive(Clone, Debug)]
pub struct CacheBuilder {
    cfg: CacheConfig,
    policy: Option<Arc<dyn SnapshotPolicy>>,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self {
            cfg: CacheConfig::from_env(),
            policy: None,
        }
    }
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: CacheConfig::default(),
            policy: None,
        }
    }

    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cfg.snapshot_path = path.into();
        self
    }

    pub fn snapshot_every(mut self, n: u64) -> Self {
        self.cfg.snapshot_every = n;
        self
    }

    pub fn snapshot_on_close(mut self, on: bool) -> Self {
        self.cfg.snapshot_on_close = on;
        self
    }

    pub fn fsync(mut self, on: bool) -> Self {
        self.cfg.fsync = on;
        self
    }

    pub fn strict_keys(mut self, on: bool) -> Self {
        self.cfg.strict_keys = on;
        self
    }

    /// Override the count-based policy derived from `snapshot_every`.
    pub fn policy(mut self, policy: Arc<dyn SnapshotPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> CacheConfig {
        self.cfg
    }

    pub fn open(self) -> Result<Cache> {
        let policy = self
            .policy
            .unwrap_or_else(|| self.cfg.default_policy());
        Cache::open_with_policy(self.cfg, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CacheConfig::default();
        assert_eq!(c.snapshot_path, PathBuf::from("snapshot"));
        assert_eq!(c.snapshot_every, 10);
        assert!(c.snapshot_on_close);
        assert!(c.fsync);
        assert_eq!(c.key_namespace(), KeyNamespace::Shared);
    }

    #[test]
    fn fluent_setters() {
        let c = CacheConfig::default()
            .with_snapshot_every(3)
            .with_strict_keys(true)
            .with_fsync(false)
            .with_snapshot_path("/tmp/x");
        assert_eq!(c.snapshot_every, 3);
        assert_eq!(c.key_namespace(), KeyNamespace::Exclusive);
        assert!(!c.fsync);
        assert!(c.to_string().contains("snapshot_every: 3"));
        assert!(c.default_policy().should_snapshot(6));
        assert!(!c.default_policy().should_snapshot(5));
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for s in ["1", "true", "YES", " on "] {
            assert!(parse_bool(s), "{s}");
        }
        for s in ["0", "false", "off", ""] {
            assert!(!parse_bool(s), "{s}");
        }
    }
}
