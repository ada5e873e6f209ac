//! Value kinds stored by the cache.
//!
//! `Value` is a closed set: one variant per typed map. Anything that arrives
//! untyped (JSON from the CLI, network payloads) goes through `TryFrom`
//! and is rejected with `CacheError::UnsupportedValue` when it does not fit.

use std::fmt;

use serde::Serialize;

use crate::consts::{
    FLOAT_ARRAY_TYPE, FLOAT_TYPE, INTEGER_ARRAY_TYPE, INTEGER_TYPE, STRING_ARRAY_TYPE, STRING_TYPE,
};
use crate::error::{CacheError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    String,
    StringArray,
    Integer,
    IntegerArray,
    Float,
    FloatArray,
}

impl ValueKind {
    /// Lookup precedence when the same key lives in several maps.
    pub const PRECEDENCE: [ValueKind; 6] = [
        ValueKind::String,
        ValueKind::StringArray,
        ValueKind::Integer,
        ValueKind::IntegerArray,
        ValueKind::Float,
        ValueKind::FloatArray,
    ];

    /// Order in which the encoder emits maps.
    pub const ENCODE_ORDER: [ValueKind; 6] = [
        ValueKind::Integer,
        ValueKind::IntegerArray,
        ValueKind::String,
        ValueKind::StringArray,
        ValueKind::Float,
        ValueKind::FloatArray,
    ];

    /// Position in `PRECEDENCE` (0 wins).
    pub fn precedence_rank(self) -> usize {
        match self {
            ValueKind::String => 0,
            ValueKind::StringArray => 1,
            ValueKind::Integer => 2,
            ValueKind::IntegerArray => 3,
            ValueKind::Float => 4,
            ValueKind::FloatArray => 5,
        }
    }

    pub fn tag(self) -> i64 {
        match self {
            ValueKind::String => STRING_TYPE,
            ValueKind::StringArray => STRING_ARRAY_TYPE,
            ValueKind::Integer => INTEGER_TYPE,
            ValueKind::IntegerArray => INTEGER_ARRAY_TYPE,
            ValueKind::Float => FLOAT_TYPE,
            ValueKind::FloatArray => FLOAT_ARRAY_TYPE,
        }
    }

    pub fn from_tag(tag: i64) -> Result<Self> {
        match tag {
            STRING_TYPE => Ok(ValueKind::String),
            STRING_ARRAY_TYPE => Ok(ValueKind::StringArray),
            INTEGER_TYPE => Ok(ValueKind::Integer),
            INTEGER_ARRAY_TYPE => Ok(ValueKind::IntegerArray),
            FLOAT_TYPE => Ok(ValueKind::Float),
            FLOAT_ARRAY_TYPE => Ok(ValueKind::FloatArray),
            other => Err(CacheError::UnknownTag(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::StringArray => "string-array",
            ValueKind::Integer => "integer",
            ValueKind::IntegerArray => "integer-array",
            ValueKind::Float => "float",
            ValueKind::FloatArray => "float-array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Value {
    String(String),
    StringArray(Vec<String>),
    Integer(i64),
    IntegerArray(Vec<i64>),
    Float(f64),
    FloatArray(Vec<f64>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::StringArray(_) => ValueKind::StringArray,
            Value::Integer(_) => ValueKind::Integer,
            Value::IntegerArray(_) => ValueKind::IntegerArray,
            Value::Float(_) => ValueKind::Float,
            Value::FloatArray(_) => ValueKind::FloatArray,
        }
    }

    /// Equality on the stored bit patterns (NaN == NaN, 0.0 != -0.0).
    pub fn bit_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::FloatArray(a), Value::FloatArray(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            _ => self == other,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntegerArray(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatArray(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringArray(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StringArray(v.into_iter().map(str::to_string).collect())
    }
}

/// Untyped input: numbers, strings and homogeneous arrays of them.
/// Empty arrays carry no element type and are rejected.
impl TryFrom<&serde_json::Value> for Value {
    type Error = CacheError;

    fn try_from(v: &serde_json::Value) -> Result<Self> {
        use serde_json::Value as J;
        match v {
            J::String(s) => Ok(Value::String(s.clone())),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if n.is_u64() {
                    Err(CacheError::UnsupportedValue(format!("integer {n} out of i64 range")))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(CacheError::UnsupportedValue(format!("number {n} out of range")))
                }
            }
            J::Array(items) => {
                if items.is_empty() {
                    return Err(CacheError::UnsupportedValue(
                        "empty array has no element type".into(),
                    ));
                }
                if items.iter().all(J::is_string) {
                    return Ok(Value::StringArray(
                        items
                            .iter()
                            .filter_map(|x| x.as_str().map(str::to_string))
                            .collect(),
                    ));
                }
                if items.iter().all(J::is_i64) {
                    return Ok(Value::IntegerArray(
                        items.iter().filter_map(J::as_i64).collect(),
                    ));
                }
                if items.iter().any(|x| x.is_u64() && !x.is_i64()) {
                    return Err(CacheError::UnsupportedValue(
                        "array element out of i64 range".into(),
                    ));
                }
                if items.iter().all(J::is_number) {
                    return Ok(Value::FloatArray(
                        items.iter().filter_map(J::as_f64).collect(),
                    ));
                }
                Err(CacheError::UnsupportedValue("mixed-type array".into()))
            }
            J::Null => Err(CacheError::UnsupportedValue("null".into())),
            J::Bool(_) => Err(CacheError::UnsupportedValue("boolean".into())),
            J::Object(_) => Err(CacheError::UnsupportedValue("object".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_match_format() {
        for kind in ValueKind::PRECEDENCE {
            assert_eq!(ValueKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert_eq!(ValueKind::Integer.tag(), 0x03);
        assert_eq!(ValueKind::FloatArray.tag(), 0x06);
        assert!(matches!(ValueKind::from_tag(0), Err(CacheError::UnknownTag(0))));
        assert!(matches!(ValueKind::from_tag(7), Err(CacheError::UnknownTag(7))));
    }

    #[test]
    fn precedence_rank_matches_order() {
        for (i, kind) in ValueKind::PRECEDENCE.iter().enumerate() {
            assert_eq!(kind.precedence_rank(), i);
        }
    }

    #[test]
    fn untyped_json_maps_to_kinds() {
        assert_eq!(Value::try_from(&json!(5)).unwrap(), Value::Integer(5));
        assert_eq!(Value::try_from(&json!(-1.5)).unwrap(), Value::Float(-1.5));
        assert_eq!(Value::try_from(&json!("x")).unwrap(), Value::from("x"));
        assert_eq!(
            Value::try_from(&json!([1, 2])).unwrap(),
            Value::IntegerArray(vec![1, 2])
        );
        assert_eq!(
            Value::try_from(&json!([1, 2.5])).unwrap(),
            Value::FloatArray(vec![1.0, 2.5])
        );
        assert_eq!(
            Value::try_from(&json!(["a", "b"])).unwrap(),
            Value::from(vec!["a", "b"])
        );
    }

    #[test]
    fn untyped_json_rejects_unsupported() {
        for bad in [json!(null), json!(true), json!({"a": 1}), json!([]), json!([1, "a"])] {
            assert!(matches!(
                Value::try_from(&bad),
                Err(CacheError::UnsupportedValue(_))
            ));
        }
    }

    #[test]
    fn bit_eq_distinguishes_float_patterns() {
        assert!(Value::Float(f64::NAN).bit_eq(&Value::Float(f64::NAN)));
        assert!(!Value::Float(0.0).bit_eq(&Value::Float(-0.0)));
        assert!(Value::FloatArray(vec![-0.0]).bit_eq(&Value::FloatArray(vec![-0.0])));
        assert!(!Value::Integer(1).bit_eq(&Value::Float(1.0)));
    }
}
