//! Snapshot persistence: durable file I/O and the write-count scheduler.

pub mod file;
pub mod scheduler;

pub use file::{read_snapshot_file, restore_from_file, write_snapshot_file};
pub use scheduler::{Scheduler, SchedulerState, SnapshotStats};
