//! Snapshot codec: full-store encoder and streaming decoder.
//!
//! Layout (LE):
//!   [FILE_HEADER 13B]["version" i64]
//!   record* = [tag i64][key_len i64][key][0x00][payload]["\r\n"]
//!
//! Payload per tag:
//!   INTEGER        [i64]
//!   FLOAT          [f64 bits]
//!   STRING         [len i64][bytes][0x00]
//!   INTEGER_ARRAY  [n i64][n x i64]
//!   FLOAT_ARRAY    [n i64][n x f64 bits]
//!   STRING_ARRAY   [n i64] n x ([len i64][bytes][0x00])
//!
//! There is no end marker: a clean EOF at a record boundary ends the stream.

pub mod decode;
pub mod encode;

pub use decode::{decode_into, decode_store, DecodeOutcome, Record, SnapshotReader};
pub use encode::{encode_maps, encode_maps_to, encode_store, encoded_len, record_len, write_header, write_record};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{CURRENT_VERSION, FILE_HEADER};
    use crate::error::CacheError;
    use crate::store::TypedStore;
    use crate::value::{Value, ValueKind};

    fn populated() -> TypedStore {
        let s = TypedStore::new();
        s.set_integer("int", -42).unwrap();
        s.set_integer("zero", 0).unwrap();
        s.set_integer("max", i64::MAX).unwrap();
        s.set_integer_array("ints", vec![1, -2, i64::MIN]).unwrap();
        s.set_integer_array("no ints", vec![]).unwrap();
        s.set_string("str", "hello world").unwrap();
        s.set_string("", "empty key").unwrap();
        s.set_string("empty", "").unwrap();
        s.set_string_array("strs", vec!["a".into(), "".into(), "ünï".into()]).unwrap();
        s.set_string_array("no strs", vec![]).unwrap();
        s.set_float("pi", 3.25).unwrap();
        s.set_float("neg zero", -0.0).unwrap();
        s.set_float("nan", f64::from_bits(0x7ff8_0000_dead_beef)).unwrap();
        s.set_float_array("floats", vec![0.0, -0.0, f64::INFINITY, f64::NAN]).unwrap();
        s
    }

    fn assert_same(a: &TypedStore, b: &TypedStore) {
        assert_eq!(a.len(), b.len());
        a.with_maps(|maps| {
            for kind in ValueKind::PRECEDENCE {
                let keys: Vec<String> = match kind {
                    ValueKind::String => maps.strings.keys().cloned().collect(),
                    ValueKind::StringArray => maps.string_arrays.keys().cloned().collect(),
                    ValueKind::Integer => maps.integers.keys().cloned().collect(),
                    ValueKind::IntegerArray => maps.integer_arrays.keys().cloned().collect(),
                    ValueKind::Float => maps.floats.keys().cloned().collect(),
                    ValueKind::FloatArray => maps.float_arrays.keys().cloned().collect(),
                };
                for key in keys {
                    let want = maps.get(kind, &key).unwrap();
                    let got = b.get(kind, &key).unwrap_or_else(|| panic!("missing {kind} '{key}'"));
                    assert!(want.bit_eq(&got), "{kind} '{key}': {want:?} != {got:?}");
                }
            }
        });
    }

    #[test]
    fn roundtrip_preserves_every_kind_bit_exact() {
        let src = populated();
        let bytes = encode_store(&src).unwrap();
        assert_eq!(bytes.len(), src.with_maps(encoded_len));

        let (dst, outcome) = decode_store(&bytes).unwrap();
        assert_eq!(outcome.version, CURRENT_VERSION);
        assert_eq!(outcome.records, src.len() as u64);
        assert!(outcome.stopped.is_none());
        assert_same(&src, &dst);
        assert_eq!(dst.operation_count(), 0);
    }

    #[test]
    fn empty_store_is_header_only() {
        let bytes = encode_store(&TypedStore::new()).unwrap();
        assert_eq!(bytes.len(), FILE_HEADER.len() + 8);
        assert_eq!(&bytes[..13], FILE_HEADER);
        let (dst, outcome) = decode_store(&bytes).unwrap();
        assert!(dst.is_empty());
        assert_eq!(outcome.records, 0);
    }

    #[test]
    fn integer_record_layout() {
        let mut buf = Vec::new();
        write_record(&mut buf, "ab", &Value::Integer(-1)).unwrap();
        let mut want = Vec::new();
        want.extend_from_slice(&3i64.to_le_bytes());
        want.extend_from_slice(&2i64.to_le_bytes());
        want.extend_from_slice(b"ab\0");
        want.extend_from_slice(&(-1i64).to_le_bytes());
        want.extend_from_slice(b"\r\n");
        assert_eq!(buf, want);
        assert_eq!(buf.len(), record_len("ab", &Value::Integer(-1)));
    }

    #[test]
    fn string_array_record_layout() {
        let mut buf = Vec::new();
        write_record(&mut buf, "k", &Value::from(vec!["x", ""])).unwrap();
        let mut want = Vec::new();
        want.extend_from_slice(&2i64.to_le_bytes());
        want.extend_from_slice(&1i64.to_le_bytes());
        want.extend_from_slice(b"k\0");
        want.extend_from_slice(&2i64.to_le_bytes());
        want.extend_from_slice(&1i64.to_le_bytes());
        want.extend_from_slice(b"x\0");
        want.extend_from_slice(&0i64.to_le_bytes());
        want.extend_from_slice(b"\0");
        want.extend_from_slice(b"\r\n");
        assert_eq!(buf, want);
    }

    #[test]
    fn empty_and_singleton_integer_arrays() {
        for (arr, n) in [(vec![], 0usize), (vec![7i64], 1)] {
            let s = TypedStore::new();
            s.set_integer_array("a", arr.clone()).unwrap();
            let bytes = encode_store(&s).unwrap();
            // header + version + tag + key_len + "a\0" + count + n*8 + "\r\n"
            assert_eq!(bytes.len(), 13 + 8 + 8 + 8 + 2 + 8 + n * 8 + 2);
            let count_at = 13 + 8 + 8 + 8 + 2;
            assert_eq!(&bytes[count_at..count_at + 8], &(n as i64).to_le_bytes());
            let (dst, _) = decode_store(&bytes).unwrap();
            assert_eq!(dst.get_integer_array("a"), Some(arr));
        }
    }

    #[test]
    fn integers_are_written_before_strings() {
        let s = TypedStore::new();
        s.set_string("s", "v").unwrap();
        s.set_integer("i", 1).unwrap();
        let bytes = encode_store(&s).unwrap();
        let first_tag = i64::from_le_bytes(bytes[21..29].try_into().unwrap());
        assert_eq!(first_tag, ValueKind::Integer.tag());
    }

    #[test]
    fn header_mismatch_leaves_store_untouched() {
        let mut bytes = encode_store(&populated()).unwrap();
        bytes[0] = b'X';
        let target = TypedStore::new();
        target.set_integer("keep", 1).unwrap();
        let err = decode_into(&bytes[..], &target).unwrap_err();
        assert!(matches!(err, CacheError::InvalidHeader { .. }));
        assert!(err.is_format());
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = encode_store(&populated()).unwrap();
        bytes[13..21].copy_from_slice(&(CURRENT_VERSION + 1).to_le_bytes());
        let target = TypedStore::new();
        let err = decode_into(&bytes[..], &target).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedVersion { found: 2, .. }));
        assert!(target.is_empty());
    }

    #[test]
    fn bad_separator_stops_after_previous_record() {
        let s = TypedStore::new();
        s.set_integer("a", 1).unwrap();
        let mut bytes = encode_store(&s).unwrap();
        let mut second = Vec::new();
        write_record(&mut second, "b", &Value::Integer(2)).unwrap();
        let n = second.len();
        second[n - 1] = b'X';
        bytes.extend_from_slice(&second);

        let (dst, outcome) = decode_store(&bytes).unwrap();
        assert_eq!(outcome.records, 1);
        assert!(matches!(outcome.stopped, Some(CacheError::BadSeparator { .. })));
        assert_eq!(dst.get_integer("a"), Some(1));
        assert_eq!(dst.get_integer("b"), None);
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let mut bytes = encode_store(&TypedStore::new()).unwrap();
        bytes.extend_from_slice(&9i64.to_le_bytes());
        let (dst, outcome) = decode_store(&bytes).unwrap();
        assert!(dst.is_empty());
        assert!(matches!(outcome.stopped, Some(CacheError::UnknownTag(9))));
    }

    #[test]
    fn negative_length_is_a_format_error() {
        let mut bytes = encode_store(&TypedStore::new()).unwrap();
        bytes.extend_from_slice(&ValueKind::String.tag().to_le_bytes());
        bytes.extend_from_slice(&(-5i64).to_le_bytes());
        let (_, outcome) = decode_store(&bytes).unwrap();
        assert!(matches!(
            outcome.stopped,
            Some(CacheError::NegativeLength { len: -5, .. })
        ));
    }

    #[test]
    fn huge_length_does_not_allocate_past_stream() {
        let mut bytes = encode_store(&TypedStore::new()).unwrap();
        bytes.extend_from_slice(&ValueKind::IntegerArray.tag().to_le_bytes());
        bytes.extend_from_slice(&1i64.to_le_bytes());
        bytes.extend_from_slice(b"k\0");
        bytes.extend_from_slice(&(i64::MAX / 16).to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        let (dst, outcome) = decode_store(&bytes).unwrap();
        assert!(dst.is_empty());
        assert!(matches!(outcome.stopped, Some(CacheError::Truncated { .. })));
    }

    #[test]
    fn missing_key_terminator_is_detected() {
        let s = TypedStore::new();
        s.set_integer("k", 1).unwrap();
        let mut bytes = encode_store(&s).unwrap();
        // header(13) + version(8) + tag(8) + key_len(8) + "k" -> terminator
        bytes[13 + 8 + 8 + 8 + 1] = b'!';
        let (_, outcome) = decode_store(&bytes).unwrap();
        assert!(matches!(
            outcome.stopped,
            Some(CacheError::MissingTerminator { what: "key" })
        ));
    }

    #[test]
    fn reader_walks_records_in_order() {
        let s = TypedStore::new();
        s.set_integer("i", 1).unwrap();
        s.set_float("f", 2.0).unwrap();
        let bytes = encode_store(&s).unwrap();

        let mut r = SnapshotReader::new(&bytes[..]);
        assert_eq!(r.read_header().unwrap(), CURRENT_VERSION);
        let a = r.next_record().unwrap().unwrap();
        let b = r.next_record().unwrap().unwrap();
        assert!(r.next_record().unwrap().is_none());
        assert_eq!(a, Record { key: "i".into(), value: Value::Integer(1) });
        assert_eq!(b, Record { key: "f".into(), value: Value::Float(2.0) });
        assert_eq!(r.records_read(), 2);
    }
}
