//! Error taxonomy for the cache, the snapshot codec and the transport.
//!
//! Format errors (bad header, bad separator, short read, ...) abort a decode;
//! I/O errors abandon one snapshot write or read; rejected writes leave the
//! store and the operation counter untouched.

use std::path::PathBuf;

use thiserror::Error;

use crate::value::ValueKind;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid header: expected \"CerebralCache\", found {found:?}")]
    InvalidHeader { found: Vec<u8> },

    #[error("unsupported snapshot version {found} (supported 1..={supported})")]
    UnsupportedVersion { found: i64, supported: i64 },

    #[error("bad block separator: expected \\r\\n, found {found:02x?}")]
    BadSeparator { found: [u8; 2] },

    #[error("unexpected end of stream while reading {what}")]
    Truncated { what: &'static str },

    #[error("unknown type tag {0:#x}")]
    UnknownTag(i64),

    #[error("negative length {len} for {what}")]
    NegativeLength { what: &'static str, len: i64 },

    #[error("missing NUL terminator after {what}")]
    MissingTerminator { what: &'static str },

    #[error("{what} is not valid UTF-8")]
    InvalidUtf8 { what: &'static str },

    #[error("key '{key}' already holds a {existing} value, refusing to store {attempted}")]
    KeyConflict {
        key: String,
        existing: ValueKind,
        attempted: ValueKind,
    },

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("snapshot lock {} is held by another owner", .path.display())]
    LockHeld { path: PathBuf },

    #[error("protocol: {0}")]
    Protocol(String),
}

impl CacheError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CacheError::Io {
            context: context.into(),
            source,
        }
    }

    /// Structural problems in a snapshot stream (as opposed to I/O failures).
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidHeader { .. }
                | CacheError::UnsupportedVersion { .. }
                | CacheError::BadSeparator { .. }
                | CacheError::Truncated { .. }
                | CacheError::UnknownTag(_)
                | CacheError::NegativeLength { .. }
                | CacheError::MissingTerminator { .. }
                | CacheError::InvalidUtf8 { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
