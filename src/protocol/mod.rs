//! protocol: frame codec for the upstream transport.
//!
//! Frame layout (big-endian):
//!   [version u8;3][content_len u64][content][action u64]
//!
//! The codec does not interpret `content`; applying frames to a store is the
//! caller's business (the listener in `server` only hands them over).

pub mod server;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{ErrorKind, Read, Write};

use crate::consts::PROTOCOL_VERSION;
use crate::error::{CacheError, Result};

pub use server::{serve, serve_connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
    Unknown(u64),
}

impl Action {
    pub fn code(self) -> u64 {
        match self {
            Action::Create => 0,
            Action::Delete => 1,
            Action::Unknown(n) => n,
        }
    }

    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Action::Create,
            1 => Action::Delete,
            n => Action::Unknown(n),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Delete => f.write_str("delete"),
            Action::Unknown(n) => write!(f, "unknown({})", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: [u8; 3],
    pub content: Vec<u8>,
    pub action: Action,
}

impl Frame {
    pub fn new(action: Action, content: impl Into<Vec<u8>>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            content: content.into(),
            action,
        }
    }

    pub fn encoded_len(&self) -> usize {
        3 + 8 + self.content.len() + 8
    }
}

pub fn version_string(v: [u8; 3]) -> String {
    format!("{}.{}.{}", v[0], v[1], v[2])
}

/// Read one frame. `Ok(None)` on a clean EOF before the first byte of a frame;
/// EOF inside a frame is `Truncated`.
pub fn read_frame<R: Read>(r: &mut R, max_len: usize) -> Result<Option<Frame>> {
    let mut version = [0u8; 3];
    if !read_exact_or_eof(r, &mut version)? {
        return Ok(None);
    }
    if version != PROTOCOL_VERSION {
        return Err(CacheError::Protocol(format!(
            "version mismatch: client {}, server {}",
            version_string(version),
            version_string(PROTOCOL_VERSION)
        )));
    }

    let len = r
        .read_u64::<BigEndian>()
        .map_err(|e| eof_as_truncated(e, "frame content length"))?;
    if len > max_len as u64 {
        return Err(CacheError::Protocol(format!(
            "frame content too large: {} (max {})",
            len, max_len
        )));
    }

    let mut content = vec![0u8; len as usize];
    r.read_exact(&mut content)
        .map_err(|e| eof_as_truncated(e, "frame content"))?;

    let action = r
        .read_u64::<BigEndian>()
        .map_err(|e| eof_as_truncated(e, "frame action"))?;

    Ok(Some(Frame {
        version,
        content,
        action: Action::from_code(action),
    }))
}

pub fn write_frame<W: Write>(w: &mut W, frame: &Frame) -> Result<()> {
    let io = |e| CacheError::io("write frame", e);
    w.write_all(&frame.version).map_err(io)?;
    w.write_u64::<BigEndian>(frame.content.len() as u64)
        .map_err(io)?;
    w.write_all(&frame.content).map_err(io)?;
    w.write_u64::<BigEndian>(frame.action.code()).map_err(io)?;
    Ok(())
}

/// `Ok(false)` only if EOF hits before any byte was read.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut off = 0usize;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) if off == 0 => return Ok(false),
            Ok(0) => return Err(CacheError::Truncated { what: "frame version" }),
            Ok(n) => off += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CacheError::io("read frame", e)),
        }
    }
    Ok(true)
}

fn eof_as_truncated(e: std::io::Error, what: &'static str) -> CacheError {
    if e.kind() == ErrorKind::UnexpectedEof {
        CacheError::Truncated { what }
    } else {
        CacheError::io(what, e)
    }
}
