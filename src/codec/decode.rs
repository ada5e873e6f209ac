//! codec/decode: streaming snapshot reader.
//!
//! - `read_header` validates the literal and gates on the version.
//! - `next_record` returns `Ok(None)` only on a clean EOF at a record boundary;
//!   EOF anywhere else is `Truncated`.
//! - Payload bytes are read in bounded chunks, so a corrupt length cannot
//!   allocate more than the stream actually holds.
//! - `decode_into` applies records through the typed setters as they arrive.
//!   A record-level failure stops the loop and keeps the applied prefix.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use std::io::{ErrorKind, Read};

use crate::consts::{
    BLOCK_SEPARATOR, CURRENT_VERSION, FILE_HEADER, FLOAT_TYPE_LENGTH, INT_TYPE_LENGTH,
    STRING_TERMINATOR,
};
use crate::error::{CacheError, Result};
use crate::store::TypedStore;
use crate::value::{Value, ValueKind};

const CHUNK: usize = 64 * 1024;

/// One decoded `key -> value` record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub value: Value,
}

/// Summary of a restore.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    pub version: i64,
    /// Records applied to the target store.
    pub records: u64,
    /// Records refused or displaced by the store (key namespace conflicts).
    pub skipped: u64,
    /// Why decoding stopped before a clean EOF, if it did.
    pub stopped: Option<CacheError>,
}

impl DecodeOutcome {
    pub fn is_complete(&self) -> bool {
        self.stopped.is_none()
    }
}

pub struct SnapshotReader<R: Read> {
    inner: R,
    records: u64,
}

impl<R: Read> SnapshotReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, records: 0 }
    }

    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// Read until `buf` is full or EOF; returns the number of bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut off = 0usize;
        while off < buf.len() {
            match self.inner.read(&mut buf[off..]) {
                Ok(0) => break,
                Ok(n) => off += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CacheError::io("read snapshot", e)),
            }
        }
        Ok(off)
    }

    fn read_exact_field(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        if self.fill(buf)? < buf.len() {
            return Err(CacheError::Truncated { what });
        }
        Ok(())
    }

    fn read_i64(&mut self, what: &'static str) -> Result<i64> {
        let mut b = [0u8; INT_TYPE_LENGTH];
        self.read_exact_field(&mut b, what)?;
        Ok(LittleEndian::read_i64(&b))
    }

    fn read_len(&mut self, what: &'static str) -> Result<usize> {
        let len = self.read_i64(what)?;
        if len < 0 {
            return Err(CacheError::NegativeLength { what, len });
        }
        usize::try_from(len).map_err(|_| CacheError::Truncated { what })
    }

    fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(CHUNK));
        let mut chunk = vec![0u8; len.min(CHUNK)];
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(chunk.len());
            let n = self.fill(&mut chunk[..want])?;
            out.extend_from_slice(&chunk[..n]);
            if n < want {
                return Err(CacheError::Truncated { what });
            }
            remaining -= n;
        }
        Ok(out)
    }

    /// [len i64][bytes][0x00] as UTF-8.
    fn read_string(&mut self, what: &'static str) -> Result<String> {
        let len = self.read_len(what)?;
        let bytes = self.read_bytes(len, what)?;
        let mut term = [0u8; 1];
        self.read_exact_field(&mut term, what)?;
        if term[0] != STRING_TERMINATOR {
            return Err(CacheError::MissingTerminator { what });
        }
        String::from_utf8(bytes).map_err(|_| CacheError::InvalidUtf8 { what })
    }

    fn read_word_array(&mut self, width: usize, what: &'static str) -> Result<(usize, Vec<u8>)> {
        let n = self.read_len(what)?;
        let total = n
            .checked_mul(width)
            .ok_or(CacheError::Truncated { what })?;
        Ok((n, self.read_bytes(total, what)?))
    }

    /// Validate the header literal and return the (supported) version.
    pub fn read_header(&mut self) -> Result<i64> {
        let mut hdr = [0u8; FILE_HEADER.len()];
        let n = self.fill(&mut hdr)?;
        if n < hdr.len() || &hdr != FILE_HEADER {
            return Err(CacheError::InvalidHeader {
                found: hdr[..n].to_vec(),
            });
        }
        let version = self.read_i64("version")?;
        if !(1..=CURRENT_VERSION).contains(&version) {
            return Err(CacheError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        Ok(version)
    }

    /// Next record, or `None` on a clean EOF at a record boundary.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut tag = [0u8; INT_TYPE_LENGTH];
        match self.fill(&mut tag)? {
            0 => return Ok(None),
            n if n < tag.len() => return Err(CacheError::Truncated { what: "type tag" }),
            _ => {}
        }
        let kind = ValueKind::from_tag(LittleEndian::read_i64(&tag))?;
        let key = self.read_string("key")?;

        let value = match kind {
            ValueKind::Integer => Value::Integer(self.read_i64("integer value")?),
            ValueKind::Float => {
                let mut b = [0u8; FLOAT_TYPE_LENGTH];
                self.read_exact_field(&mut b, "float value")?;
                Value::Float(f64::from_bits(LittleEndian::read_u64(&b)))
            }
            ValueKind::String => Value::String(self.read_string("string value")?),
            ValueKind::IntegerArray => {
                let (n, bytes) = self.read_word_array(INT_TYPE_LENGTH, "integer array")?;
                let mut v = vec![0i64; n];
                LittleEndian::read_i64_into(&bytes, &mut v);
                Value::IntegerArray(v)
            }
            ValueKind::FloatArray => {
                let (n, bytes) = self.read_word_array(FLOAT_TYPE_LENGTH, "float array")?;
                let v = bytes
                    .chunks_exact(FLOAT_TYPE_LENGTH)
                    .map(|c| f64::from_bits(LittleEndian::read_u64(c)))
                    .collect::<Vec<_>>();
                debug_assert_eq!(v.len(), n);
                Value::FloatArray(v)
            }
            ValueKind::StringArray => {
                let n = self.read_len("string array")?;
                let mut v = Vec::with_capacity(n.min(1024));
                for _ in 0..n {
                    v.push(self.read_string("string array element")?);
                }
                Value::StringArray(v)
            }
        };

        let mut sep = [0u8; 2];
        self.read_exact_field(&mut sep, "block separator")?;
        if &sep != BLOCK_SEPARATOR {
            return Err(CacheError::BadSeparator { found: sep });
        }

        self.records += 1;
        Ok(Some(Record { key, value }))
    }
}

/// Restore a snapshot stream into `store`.
///
/// Errors:
/// - `Err(..)` only for header/version problems (store untouched) and for
///   I/O failure before the first record.
/// - Anything after the header stops the loop; the applied prefix stays in
///   `store` and the cause is returned in `DecodeOutcome::stopped`.
pub fn decode_into<R: Read>(reader: R, store: &TypedStore) -> Result<DecodeOutcome> {
    let mut r = SnapshotReader::new(reader);
    let version = r.read_header()?;
    debug!("decode: snapshot version {}", version);

    let mut outcome = DecodeOutcome {
        version,
        ..DecodeOutcome::default()
    };
    loop {
        match r.next_record() {
            Ok(Some(rec)) => match store.restore_record(rec.key, rec.value) {
                Ok(displaced) => {
                    outcome.records += 1;
                    outcome.records -= displaced as u64;
                    outcome.skipped += displaced as u64;
                }
                Err(e) => {
                    warn!("decode: skip record: {}", e);
                    outcome.skipped += 1;
                }
            },
            Ok(None) => break,
            Err(e) => {
                warn!(
                    "decode: stopped after {} record(s): {}",
                    r.records_read(),
                    e
                );
                outcome.stopped = Some(e);
                break;
            }
        }
    }
    Ok(outcome)
}

/// Decode a complete in-memory snapshot into a fresh store.
pub fn decode_store(bytes: &[u8]) -> Result<(TypedStore, DecodeOutcome)> {
    let store = TypedStore::new();
    let outcome = decode_into(bytes, &store)?;
    Ok((store, outcome))
}
