//! Snapshot trigger policies.
//!
//! The cache asks its policy after every successful write; the argument is the
//! operation counter after the write was counted.

use std::fmt;

pub trait SnapshotPolicy: Send + Sync {
    fn should_snapshot(&self, operation_count: u64) -> bool;

    fn describe(&self) -> String;
}

/// Snapshot when `operation_count % n == 0`. `n == 0` never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EveryNWrites(pub u64);

impl SnapshotPolicy for EveryNWrites {
    fn should_snapshot(&self, operation_count: u64) -> bool {
        self.0 != 0 && operation_count != 0 && operation_count % self.0 == 0
    }

    fn describe(&self) -> String {
        if self.0 == 0 {
            "never (interval 0)".to_string()
        } else {
            format!("every {} write(s)", self.0)
        }
    }
}

/// Only explicit and shutdown snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl SnapshotPolicy for Never {
    fn should_snapshot(&self, _operation_count: u64) -> bool {
        false
    }

    fn describe(&self) -> String {
        "never".to_string()
    }
}

impl fmt::Debug for dyn SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotPolicy({})", self.describe())
    }
}
