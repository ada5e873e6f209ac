use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use CerebralCache::{CacheConfig, Value};

/// Env config with an optional `--path` override.
pub fn config_for(path: Option<PathBuf>) -> CacheConfig {
    let cfg = CacheConfig::from_env();
    match path {
        Some(p) => cfg.with_snapshot_path(p),
        None => cfg,
    }
}

pub struct ValueArgs {
    pub int: Option<i64>,
    pub float: Option<f64>,
    pub str: Option<String>,
    pub ints: Option<String>,
    pub floats: Option<String>,
    pub strs: Option<String>,
    pub json: Option<String>,
}

pub fn value_from_args(a: ValueArgs) -> Result<Value> {
    let mut found: Vec<Value> = Vec::new();
    if let Some(v) = a.int {
        found.push(Value::Integer(v));
    }
    if let Some(v) = a.float {
        found.push(Value::Float(v));
    }
    if let Some(v) = a.str {
        found.push(Value::String(v));
    }
    if let Some(s) = a.ints {
        found.push(Value::IntegerArray(parse_list(&s).context("--ints")?));
    }
    if let Some(s) = a.floats {
        found.push(Value::FloatArray(parse_list(&s).context("--floats")?));
    }
    if let Some(s) = a.strs {
        let items = if s.is_empty() {
            Vec::new()
        } else {
            s.split(',').map(str::to_string).collect()
        };
        found.push(Value::StringArray(items));
    }
    if let Some(s) = a.json {
        let j: serde_json::Value = serde_json::from_str(&s).context("parse --json")?;
        found.push(Value::try_from(&j)?);
    }
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(anyhow!(
            "no value given: use one of --int --float --str --ints --floats --strs --json"
        )),
        n => Err(anyhow!("{} value flags given, expected exactly one", n)),
    }
}

pub fn parse_list<T>(s: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|x| {
            x.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("invalid element '{}': {}", x.trim(), e))
        })
        .collect()
}

pub fn format_value(v: &Value) -> String {
    match v {
        Value::Integer(x) => x.to_string(),
        Value::Float(x) => x.to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::IntegerArray(xs) => format!("{:?}", xs),
        Value::FloatArray(xs) => format!("{:?}", xs),
        Value::StringArray(xs) => format!("{:?}", xs),
    }
}
