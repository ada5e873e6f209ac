use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde_json::json;

use CerebralCache::codec::{decode_into, encode_store};
use CerebralCache::{CacheBuilder, CacheError, KeyNamespace, TypedStore, Value, ValueKind};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("cctest-ns-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn shared_lookup_follows_precedence() -> Result<()> {
    let s = TypedStore::new();
    s.set_float_array("k", vec![1.0])?;
    assert_eq!(s.lookup("k"), Some(Value::FloatArray(vec![1.0])));
    s.set_float("k", 2.0)?;
    assert_eq!(s.lookup("k"), Some(Value::Float(2.0)));
    s.set_integer_array("k", vec![3])?;
    assert_eq!(s.lookup("k"), Some(Value::IntegerArray(vec![3])));
    s.set_integer("k", 4)?;
    assert_eq!(s.lookup("k"), Some(Value::Integer(4)));
    s.set_string_array("k", vec!["five".into()])?;
    assert_eq!(s.lookup("k"), Some(Value::from(vec!["five"])));
    s.set_string("k", "six")?;
    assert_eq!(s.lookup("k"), Some(Value::from("six")));

    assert_eq!(s.kinds_of("k"), ValueKind::PRECEDENCE.to_vec());
    // typed getters still see every map
    assert_eq!(s.get_integer("k"), Some(4));
    assert_eq!(s.get_float("k"), Some(2.0));
    assert_eq!(s.lookup("missing"), None);
    Ok(())
}

#[test]
fn exclusive_rejects_cross_kind_keys_and_keeps_counter() -> Result<()> {
    let root = unique_root("strict");
    let cache = CacheBuilder::from_default()
        .snapshot_path(root.join("snapshot"))
        .strict_keys(true)
        .snapshot_on_close(false)
        .open()?;
    assert_eq!(cache.store().namespace(), KeyNamespace::Exclusive);

    cache.set_integer("k", 1)?;
    cache.set_integer("k", 2)?; // same kind overwrites
    assert_eq!(cache.operation_count(), 2);

    let rejected_before = CerebralCache::metrics::snapshot().writes_rejected;
    match cache.set_string("k", "nope") {
        Err(CacheError::KeyConflict { key, existing, attempted }) => {
            assert_eq!(key, "k");
            assert_eq!(existing, ValueKind::Integer);
            assert_eq!(attempted, ValueKind::String);
        }
        other => panic!("expected KeyConflict, got {other:?}"),
    }
    assert_eq!(cache.operation_count(), 2);
    assert_eq!(cache.get("k"), Some(Value::Integer(2)));
    assert_eq!(cache.get_kind(ValueKind::String, "k"), None);
    assert!(CerebralCache::metrics::snapshot().writes_rejected > rejected_before);
    Ok(())
}

#[test]
fn exclusive_restore_of_shared_snapshot_follows_precedence() -> Result<()> {
    let shared = TypedStore::new();
    shared.set_integer("k", 7)?;
    shared.set_string("k", "seven")?;
    shared.set_float("k", 7.0)?;
    shared.set_integer("only_int", 1)?;
    let bytes = encode_store(&shared)?;

    let strict = TypedStore::with_namespace(KeyNamespace::Exclusive);
    let outcome = decode_into(&bytes[..], &strict)?;
    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.skipped, 2);
    assert!(outcome.is_complete());
    assert_eq!(strict.kinds_of("k"), vec![ValueKind::String]);
    assert_eq!(strict.lookup("k"), shared.lookup("k"));
    assert_eq!(strict.lookup("only_int"), Some(Value::Integer(1)));
    Ok(())
}

#[test]
fn untyped_values_outside_the_six_kinds_are_rejected() {
    for bad in [
        json!(null),
        json!(true),
        json!({"a": 1}),
        json!([]),
        json!([1, "two"]),
        json!([1.5, "x"]),
        json!([[1]]),
        json!(u64::MAX),
        json!(i64::MAX as u64 + 1),
        json!([1, u64::MAX]),
        json!([0.5, u64::MAX]),
    ] {
        match Value::try_from(&bad) {
            Err(CacheError::UnsupportedValue(_)) => {}
            other => panic!("{bad}: expected UnsupportedValue, got {other:?}"),
        }
    }

    assert_eq!(Value::try_from(&json!(7)).ok(), Some(Value::Integer(7)));
    assert_eq!(
        Value::try_from(&json!(i64::MAX as u64)).ok(),
        Some(Value::Integer(i64::MAX))
    );
    assert_eq!(
        Value::try_from(&json!([i64::MIN, i64::MAX])).ok(),
        Some(Value::IntegerArray(vec![i64::MIN, i64::MAX]))
    );
    assert_eq!(Value::try_from(&json!(0.25)).ok(), Some(Value::Float(0.25)));
    assert_eq!(Value::try_from(&json!([1, 2])).ok(), Some(Value::IntegerArray(vec![1, 2])));
    assert_eq!(
        Value::try_from(&json!([1, 2.5])).ok(),
        Some(Value::FloatArray(vec![1.0, 2.5]))
    );
    assert_eq!(
        Value::try_from(&json!(["a", ""])).ok(),
        Some(Value::from(vec!["a", ""]))
    );
}
