use anyhow::{Context, Result};
use std::path::PathBuf;

use CerebralCache::{Cache, Value};

use super::util::{config_for, format_value};

pub fn exec(path: Option<PathBuf>, key: String, value: Value) -> Result<()> {
    let cfg = config_for(path);
    let cache = Cache::open(cfg).context("open cache")?;
    let shown = format_value(&value);
    let kind = value.kind();
    cache
        .set(key.as_str(), value)
        .with_context(|| format!("set '{}'", key))?;
    cache.close().context("shutdown snapshot")?;
    println!("OK '{}' = {} ({})", key, shown, kind);
    Ok(())
}
