use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use CerebralCache::codec::encode_store;
use CerebralCache::{CacheBuilder, RestoreSource, TypedStore, Value};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("cctest-startup-{prefix}-{pid}-{t}-{id}"))
}

fn prepared(prefix: &str, bytes: &[u8]) -> Result<PathBuf> {
    let root = unique_root(prefix);
    fs::create_dir_all(&root)?;
    let path = root.join("snapshot");
    fs::write(&path, bytes)?;
    Ok(path)
}

#[test]
fn wrong_header_starts_empty() -> Result<()> {
    let path = prepared("header", b"NotTheCacheHdr\x01\0\0\0\0\0\0\0")?;
    let cache = CacheBuilder::from_default()
        .snapshot_path(&path)
        .snapshot_on_close(false)
        .open()?;
    assert!(cache.store().is_empty());
    assert!(matches!(cache.restore_report().source, RestoreSource::Rejected(_)));
    Ok(())
}

#[test]
fn future_version_starts_empty() -> Result<()> {
    let mut bytes = b"CerebralCache".to_vec();
    bytes.extend_from_slice(&2i64.to_le_bytes());
    let path = prepared("version", &bytes)?;
    let cache = CacheBuilder::from_default()
        .snapshot_path(&path)
        .snapshot_on_close(false)
        .open()?;
    assert!(cache.store().is_empty());
    match &cache.restore_report().source {
        RestoreSource::Rejected(msg) => assert!(msg.contains('2'), "{msg}"),
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn truncated_snapshot_keeps_prefix() -> Result<()> {
    let src = TypedStore::new();
    src.set_integer("one", 1)?;
    src.set_integer("two", 2)?;
    src.set_string("three", "3")?;
    let bytes = encode_store(&src)?;
    // drop the separator of the last record
    let path = prepared("prefix", &bytes[..bytes.len() - 1])?;

    let cache = CacheBuilder::from_default()
        .snapshot_path(&path)
        .snapshot_on_close(false)
        .open()?;
    assert_eq!(
        cache.restore_report().source,
        RestoreSource::Loaded { version: 1, complete: false }
    );
    // integers are encoded before strings, so both survive
    assert_eq!(cache.restore_report().records, 2);
    assert_eq!(cache.get("one"), Some(Value::Integer(1)));
    assert_eq!(cache.get("two"), Some(Value::Integer(2)));
    assert_eq!(cache.get("three"), None);
    Ok(())
}

#[test]
fn corrupt_snapshot_is_replaced_on_next_snapshot() -> Result<()> {
    let path = prepared("replace", b"garbage")?;
    {
        let cache = CacheBuilder::from_default().snapshot_path(&path).open()?;
        cache.set("fresh", Value::Float(0.5))?;
    }
    let cache = CacheBuilder::from_default().snapshot_path(&path).open()?;
    assert_eq!(
        cache.restore_report().source,
        RestoreSource::Loaded { version: 1, complete: true }
    );
    assert_eq!(cache.get("fresh"), Some(Value::Float(0.5)));
    Ok(())
}
