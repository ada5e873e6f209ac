use anyhow::{Context, Result};
use std::path::PathBuf;

use CerebralCache::codec::decode_store;
use CerebralCache::snapshot::read_snapshot_file;

use super::util::{config_for, format_value};

/// Reads the snapshot file without taking the writer lock.
pub fn exec(path: Option<PathBuf>, key: String, json: bool) -> Result<()> {
    let cfg = config_for(path);
    let bytes = match read_snapshot_file(&cfg.snapshot_path)? {
        Some(b) => b,
        None => {
            println!("NOT FOUND '{}' (no snapshot at {})", key, cfg.snapshot_path.display());
            return Ok(());
        }
    };
    let (store, outcome) = decode_store(&bytes)
        .with_context(|| format!("decode {}", cfg.snapshot_path.display()))?;
    if let Some(e) = &outcome.stopped {
        eprintln!("warning: snapshot only partially readable: {}", e);
    }

    let kinds = store.kinds_of(&key);
    match store.lookup(&key) {
        Some(v) if json => {
            println!("{}", serde_json::to_string(&v)?);
        }
        Some(v) => {
            println!("FOUND '{}' ({}): {}", key, v.kind(), format_value(&v));
            if kinds.len() > 1 {
                let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
                println!("note: key also present as {}", names.join(", "));
            }
        }
        None if json => println!("null"),
        None => println!("NOT FOUND '{}'", key),
    }
    Ok(())
}
