//! Typed store: six independent `key -> value` maps plus the operation counter.
//!
//! All six maps live in one `Maps` value behind a single `RwLock`. Writers take
//! the write lock for one insert; the snapshot encoder holds the read lock for
//! the whole encode, so every snapshot is a point-in-time view of all maps.
//!
//! Setters are last-write-wins within their own map. Whether the same key may
//! also live in another map is decided by `KeyNamespace`:
//! - `Shared` (default): allowed; `lookup` resolves collisions by
//!   `ValueKind::PRECEDENCE` (string, string-array, integer, integer-array,
//!   float, float-array).
//! - `Exclusive`: a key lives in at most one map; a write of another kind is
//!   rejected with `CacheError::KeyConflict`. Restoring a snapshot written in
//!   shared mode keeps only the highest-precedence kind per key
//!   (`restore_record`), so `lookup` agrees across both modes.
//!
//! The operation counter is not touched by the setters. The dispatcher
//! (`Cache::set`) bumps it after a successful write; snapshot restore goes
//! through the same setters and therefore does not count.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use parking_lot::RwLock;

use crate::error::{CacheError, Result};
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyNamespace {
    #[default]
    Shared,
    Exclusive,
}

#[derive(Debug, Default, Clone)]
pub struct Maps {
    pub integers: HashMap<String, i64>,
    pub integer_arrays: HashMap<String, Vec<i64>>,
    pub strings: HashMap<String, String>,
    pub string_arrays: HashMap<String, Vec<String>>,
    pub floats: HashMap<String, f64>,
    pub float_arrays: HashMap<String, Vec<f64>>,
}

impl Maps {
    pub fn contains(&self, kind: ValueKind, key: &str) -> bool {
        match kind {
            ValueKind::String => self.strings.contains_key(key),
            ValueKind::StringArray => self.string_arrays.contains_key(key),
            ValueKind::Integer => self.integers.contains_key(key),
            ValueKind::IntegerArray => self.integer_arrays.contains_key(key),
            ValueKind::Float => self.floats.contains_key(key),
            ValueKind::FloatArray => self.float_arrays.contains_key(key),
        }
    }

    pub fn get(&self, kind: ValueKind, key: &str) -> Option<Value> {
        match kind {
            ValueKind::String => self.strings.get(key).cloned().map(Value::String),
            ValueKind::StringArray => self.string_arrays.get(key).cloned().map(Value::StringArray),
            ValueKind::Integer => self.integers.get(key).copied().map(Value::Integer),
            ValueKind::IntegerArray => self
                .integer_arrays
                .get(key)
                .cloned()
                .map(Value::IntegerArray),
            ValueKind::Float => self.floats.get(key).copied().map(Value::Float),
            ValueKind::FloatArray => self.float_arrays.get(key).cloned().map(Value::FloatArray),
        }
    }

    /// First hit in precedence order.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        ValueKind::PRECEDENCE
            .iter()
            .find_map(|kind| self.get(*kind, key))
    }

    /// All maps holding `key`, in precedence order.
    pub fn kinds_of(&self, key: &str) -> Vec<ValueKind> {
        ValueKind::PRECEDENCE
            .iter()
            .copied()
            .filter(|kind| self.contains(*kind, key))
            .collect()
    }

    pub fn count(&self, kind: ValueKind) -> usize {
        match kind {
            ValueKind::String => self.strings.len(),
            ValueKind::StringArray => self.string_arrays.len(),
            ValueKind::Integer => self.integers.len(),
            ValueKind::IntegerArray => self.integer_arrays.len(),
            ValueKind::Float => self.floats.len(),
            ValueKind::FloatArray => self.float_arrays.len(),
        }
    }

    /// Total number of entries across all maps (one per snapshot record).
    pub fn len(&self) -> usize {
        ValueKind::PRECEDENCE.iter().map(|k| self.count(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&mut self, kind: ValueKind, key: &str) -> bool {
        match kind {
            ValueKind::String => self.strings.remove(key).is_some(),
            ValueKind::StringArray => self.string_arrays.remove(key).is_some(),
            ValueKind::Integer => self.integers.remove(key).is_some(),
            ValueKind::IntegerArray => self.integer_arrays.remove(key).is_some(),
            ValueKind::Float => self.floats.remove(key).is_some(),
            ValueKind::FloatArray => self.float_arrays.remove(key).is_some(),
        }
    }

    fn insert(&mut self, key: String, value: Value) {
        match value {
            Value::String(v) => {
                self.strings.insert(key, v);
            }
            Value::StringArray(v) => {
                self.string_arrays.insert(key, v);
            }
            Value::Integer(v) => {
                self.integers.insert(key, v);
            }
            Value::IntegerArray(v) => {
                self.integer_arrays.insert(key, v);
            }
            Value::Float(v) => {
                self.floats.insert(key, v);
            }
            Value::FloatArray(v) => {
                self.float_arrays.insert(key, v);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct TypedStore {
    maps: RwLock<Maps>,
    ops: AtomicU64,
    namespace: KeyNamespace,
}

impl TypedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(namespace: KeyNamespace) -> Self {
        Self {
            namespace,
            ..Self::default()
        }
    }

    pub fn namespace(&self) -> KeyNamespace {
        self.namespace
    }

    // ----- typed setters -----

    pub fn set_integer(&self, key: impl Into<String>, value: i64) -> Result<()> {
        self.put(key.into(), Value::Integer(value))
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.put(key.into(), Value::String(value.into()))
    }

    pub fn set_float(&self, key: impl Into<String>, value: f64) -> Result<()> {
        self.put(key.into(), Value::Float(value))
    }

    pub fn set_integer_array(&self, key: impl Into<String>, value: Vec<i64>) -> Result<()> {
        self.put(key.into(), Value::IntegerArray(value))
    }

    pub fn set_string_array(&self, key: impl Into<String>, value: Vec<String>) -> Result<()> {
        self.put(key.into(), Value::StringArray(value))
    }

    pub fn set_float_array(&self, key: impl Into<String>, value: Vec<f64>) -> Result<()> {
        self.put(key.into(), Value::FloatArray(value))
    }

    /// Route a tagged value to its typed setter.
    pub fn apply(&self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        match value {
            Value::Integer(v) => self.set_integer(key, v),
            Value::String(v) => self.set_string(key, v),
            Value::Float(v) => self.set_float(key, v),
            Value::IntegerArray(v) => self.set_integer_array(key, v),
            Value::StringArray(v) => self.set_string_array(key, v),
            Value::FloatArray(v) => self.set_float_array(key, v),
        }
    }

    fn put(&self, key: String, value: Value) -> Result<()> {
        let kind = value.kind();
        let mut maps = self.maps.write();
        if self.namespace == KeyNamespace::Exclusive {
            if let Some(existing) = maps
                .kinds_of(&key)
                .into_iter()
                .find(|k| *k != kind)
            {
                return Err(CacheError::KeyConflict {
                    key,
                    existing,
                    attempted: kind,
                });
            }
        }
        debug!("set {} '{}'", kind, key);
        maps.insert(key, value);
        Ok(())
    }

    /// Restore path for one snapshot record.
    ///
    /// `Shared` behaves like `apply`. In `Exclusive` mode a cross-kind
    /// duplicate is settled by `ValueKind::PRECEDENCE` instead of file order,
    /// so strict and shared mode resolve `lookup(key)` to the same value.
    /// Returns how many earlier entries were displaced; a record that loses
    /// is refused with `KeyConflict`.
    pub fn restore_record(&self, key: impl Into<String>, value: Value) -> Result<usize> {
        let key = key.into();
        if self.namespace == KeyNamespace::Shared {
            self.apply(key, value)?;
            return Ok(0);
        }
        let kind = value.kind();
        let mut maps = self.maps.write();
        let others: Vec<ValueKind> = maps
            .kinds_of(&key)
            .into_iter()
            .filter(|k| *k != kind)
            .collect();
        if let Some(winner) = others
            .iter()
            .copied()
            .find(|k| k.precedence_rank() < kind.precedence_rank())
        {
            return Err(CacheError::KeyConflict {
                key,
                existing: winner,
                attempted: kind,
            });
        }
        let mut displaced = 0;
        for k in others {
            if maps.remove(k, &key) {
                debug!("restore: '{}' {} displaced by {}", key, k, kind);
                displaced += 1;
            }
        }
        maps.insert(key, value);
        Ok(displaced)
    }

    // ----- typed getters -----

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.maps.read().integers.get(key).copied()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.maps.read().strings.get(key).cloned()
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.maps.read().floats.get(key).copied()
    }

    pub fn get_integer_array(&self, key: &str) -> Option<Vec<i64>> {
        self.maps.read().integer_arrays.get(key).cloned()
    }

    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.maps.read().string_arrays.get(key).cloned()
    }

    pub fn get_float_array(&self, key: &str) -> Option<Vec<f64>> {
        self.maps.read().float_arrays.get(key).cloned()
    }

    pub fn get(&self, kind: ValueKind, key: &str) -> Option<Value> {
        self.maps.read().get(kind, key)
    }

    /// Generic lookup; collisions resolve by `ValueKind::PRECEDENCE`.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        self.maps.read().lookup(key)
    }

    pub fn kinds_of(&self, key: &str) -> Vec<ValueKind> {
        self.maps.read().kinds_of(key)
    }

    pub fn len(&self) -> usize {
        self.maps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` with shared access to all maps; writers wait until it returns.
    pub fn with_maps<R>(&self, f: impl FnOnce(&Maps) -> R) -> R {
        let maps = self.maps.read();
        f(&maps)
    }

    /// Owned point-in-time copy of all maps.
    pub fn clone_maps(&self) -> Maps {
        self.maps.read().clone()
    }

    // ----- operation counter -----

    pub fn operation_count(&self) -> u64 {
        self.ops.load(Ordering::Acquire)
    }

    /// Count one successful write; returns the new total.
    pub fn record_operation(&self) -> u64 {
        self.ops.fetch_add(1, Ordering::AcqRel) + 1
    }
}
