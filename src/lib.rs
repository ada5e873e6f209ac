#![allow(non_snake_case)]

// Format and values
pub mod consts;
pub mod error;
pub mod value;

// Store and snapshot codec
pub mod store;
pub mod codec;   // src/codec/{mod,encode,decode}.rs

// Snapshots: policy, file write/read, scheduler
pub mod policy;
pub mod snapshot; // src/snapshot/{mod,file,scheduler}.rs

// Engine and surroundings
pub mod cache;
pub mod config;
pub mod lock;
pub mod metrics;
pub mod util;

// Upstream transport framing
pub mod protocol; // src/protocol/{mod,server}.rs

// Convenience re-exports
pub use cache::{Cache, RestoreReport, RestoreSource};
pub use config::{CacheBuilder, CacheConfig};
pub use error::{CacheError, Result};
pub use policy::{EveryNWrites, Never, SnapshotPolicy};
pub use store::{KeyNamespace, TypedStore};
pub use value::{Value, ValueKind};
