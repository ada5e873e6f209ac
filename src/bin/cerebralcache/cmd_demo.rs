use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use CerebralCache::{Cache, Value};

use super::util::config_for;

fn demo_sequence() -> Vec<(&'static str, Value)> {
    vec![
        ("a-rather-long-integer-key-name", Value::Integer(458_234_092_380_598_235)),
        ("minus-one", Value::Integer(-1)),
        ("two", Value::Integer(2)),
        ("three", Value::Integer(3)),
        ("ten", Value::Integer(10)),
        ("hundred", Value::Integer(100)),
        ("nice", Value::Integer(69)),
        ("greeting", Value::from("hello from the cache")),
        ("empty-string", Value::from("")),
        ("tens", Value::from(vec![10i64, 20, 30, 40, 50])),
        ("mixed-ints", Value::from(vec![80i64, 90, 500, 200, 80_808_080])),
        ("ratios", Value::from(vec![69.69f64, 20.22, 33.33])),
        ("pi-ish", Value::Float(3.14159)),
        ("phrases", Value::from(vec!["hello", "how are you", ""])),
        ("pair", Value::from(vec!["left", "right"])),
    ]
}

pub fn exec(path: Option<PathBuf>) -> Result<()> {
    let cfg = config_for(path);
    let cache = Cache::open(cfg).context("open cache")?;
    info!("demo: {} key(s) restored", cache.store().len());

    for (key, value) in demo_sequence() {
        cache
            .set(key, value)
            .with_context(|| format!("demo set '{}'", key))?;
    }

    let ops = cache.operation_count();
    let keys = cache.store().len();
    cache.close().context("shutdown snapshot")?;
    println!("demo: {} operation(s), {} key(s) stored", ops, keys);
    Ok(())
}
