//! codec/encode: full-store serialization.
//!
//! The encoder never sees a partially updated store: `encode_store` runs
//! under the store's read lock (`TypedStore::with_maps`), so concurrent
//! writers wait until the buffer is complete.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::consts::{BLOCK_SEPARATOR, CURRENT_VERSION, FILE_HEADER, STRING_TERMINATOR};
use crate::error::{CacheError, Result};
use crate::store::{Maps, TypedStore};
use crate::value::{Value, ValueKind};

/// [FILE_HEADER][CURRENT_VERSION i64]
pub fn write_header<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(FILE_HEADER)?;
    w.write_i64::<LittleEndian>(CURRENT_VERSION)
}

/// [len i64][bytes][0x00]
fn write_str<W: Write>(w: &mut W, s: &str) -> std::io::Result<()> {
    w.write_i64::<LittleEndian>(s.len() as i64)?;
    w.write_all(s.as_bytes())?;
    w.write_u8(STRING_TERMINATOR)
}

fn write_prefix<W: Write>(w: &mut W, kind: ValueKind, key: &str) -> std::io::Result<()> {
    w.write_i64::<LittleEndian>(kind.tag())?;
    write_str(w, key)
}

fn write_integer<W: Write>(w: &mut W, key: &str, v: i64) -> std::io::Result<()> {
    write_prefix(w, ValueKind::Integer, key)?;
    w.write_i64::<LittleEndian>(v)?;
    w.write_all(BLOCK_SEPARATOR)
}

fn write_float<W: Write>(w: &mut W, key: &str, v: f64) -> std::io::Result<()> {
    write_prefix(w, ValueKind::Float, key)?;
    w.write_u64::<LittleEndian>(v.to_bits())?;
    w.write_all(BLOCK_SEPARATOR)
}

fn write_string<W: Write>(w: &mut W, key: &str, v: &str) -> std::io::Result<()> {
    write_prefix(w, ValueKind::String, key)?;
    write_str(w, v)?;
    w.write_all(BLOCK_SEPARATOR)
}

fn write_integer_array<W: Write>(w: &mut W, key: &str, v: &[i64]) -> std::io::Result<()> {
    write_prefix(w, ValueKind::IntegerArray, key)?;
    w.write_i64::<LittleEndian>(v.len() as i64)?;
    for x in v {
        w.write_i64::<LittleEndian>(*x)?;
    }
    w.write_all(BLOCK_SEPARATOR)
}

fn write_float_array<W: Write>(w: &mut W, key: &str, v: &[f64]) -> std::io::Result<()> {
    write_prefix(w, ValueKind::FloatArray, key)?;
    w.write_i64::<LittleEndian>(v.len() as i64)?;
    for x in v {
        w.write_u64::<LittleEndian>(x.to_bits())?;
    }
    w.write_all(BLOCK_SEPARATOR)
}

fn write_string_array<W: Write>(w: &mut W, key: &str, v: &[String]) -> std::io::Result<()> {
    write_prefix(w, ValueKind::StringArray, key)?;
    w.write_i64::<LittleEndian>(v.len() as i64)?;
    for s in v {
        write_str(w, s)?;
    }
    w.write_all(BLOCK_SEPARATOR)
}

/// Write one complete record (prefix, payload, separator).
pub fn write_record<W: Write>(w: &mut W, key: &str, value: &Value) -> std::io::Result<()> {
    match value {
        Value::Integer(v) => write_integer(w, key, *v),
        Value::Float(v) => write_float(w, key, *v),
        Value::String(v) => write_string(w, key, v),
        Value::IntegerArray(v) => write_integer_array(w, key, v),
        Value::FloatArray(v) => write_float_array(w, key, v),
        Value::StringArray(v) => write_string_array(w, key, v),
    }
}

/// Exact encoded size of one record.
pub fn record_len(key: &str, value: &Value) -> usize {
    let payload = match value {
        Value::Integer(_) | Value::Float(_) => 8,
        Value::String(s) => 8 + s.len() + 1,
        Value::IntegerArray(v) => 8 + v.len() * 8,
        Value::FloatArray(v) => 8 + v.len() * 8,
        Value::StringArray(v) => 8 + v.iter().map(|s| 8 + s.len() + 1).sum::<usize>(),
    };
    8 + 8 + key.len() + 1 + payload + BLOCK_SEPARATOR.len()
}

fn str_len(s: &str) -> usize {
    8 + s.len() + 1
}

/// Exact size of the snapshot `encode_maps` would produce.
pub fn encoded_len(maps: &Maps) -> usize {
    const FIXED: usize = 8 + 2; // tag + separator
    let mut n = FILE_HEADER.len() + 8;
    n += maps.integers.keys().map(|k| FIXED + str_len(k) + 8).sum::<usize>();
    n += maps
        .integer_arrays
        .iter()
        .map(|(k, v)| FIXED + str_len(k) + 8 + v.len() * 8)
        .sum::<usize>();
    n += maps
        .strings
        .iter()
        .map(|(k, v)| FIXED + str_len(k) + str_len(v))
        .sum::<usize>();
    n += maps
        .string_arrays
        .iter()
        .map(|(k, v)| FIXED + str_len(k) + 8 + v.iter().map(|s| str_len(s)).sum::<usize>())
        .sum::<usize>();
    n += maps.floats.keys().map(|k| FIXED + str_len(k) + 8).sum::<usize>();
    n += maps
        .float_arrays
        .iter()
        .map(|(k, v)| FIXED + str_len(k) + 8 + v.len() * 8)
        .sum::<usize>();
    n
}

/// Header plus every record, maps in `ValueKind::ENCODE_ORDER`.
/// Returns the number of records written.
pub fn encode_maps_to<W: Write>(w: &mut W, maps: &Maps) -> std::io::Result<u64> {
    write_header(w)?;
    let mut records = 0u64;
    for kind in ValueKind::ENCODE_ORDER {
        match kind {
            ValueKind::Integer => {
                for (k, v) in &maps.integers {
                    write_integer(w, k, *v)?;
                }
            }
            ValueKind::IntegerArray => {
                for (k, v) in &maps.integer_arrays {
                    write_integer_array(w, k, v)?;
                }
            }
            ValueKind::String => {
                for (k, v) in &maps.strings {
                    write_string(w, k, v)?;
                }
            }
            ValueKind::StringArray => {
                for (k, v) in &maps.string_arrays {
                    write_string_array(w, k, v)?;
                }
            }
            ValueKind::Float => {
                for (k, v) in &maps.floats {
                    write_float(w, k, *v)?;
                }
            }
            ValueKind::FloatArray => {
                for (k, v) in &maps.float_arrays {
                    write_float_array(w, k, v)?;
                }
            }
        }
        records += maps.count(kind) as u64;
    }
    Ok(records)
}

pub fn encode_maps(maps: &Maps) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(encoded_len(maps));
    encode_maps_to(&mut buf, maps).map_err(|e| CacheError::io("encode snapshot", e))?;
    Ok(buf)
}

/// Point-in-time snapshot of the whole store.
pub fn encode_store(store: &TypedStore) -> Result<Vec<u8>> {
    store.with_maps(encode_maps)
}
