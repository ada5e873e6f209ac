//! Snapshot format constants (header, version, type tags, separators).
//!
//! File layout (all integers little-endian):
//! [header "CerebralCache" 13B][version i64]
//! then records: [tag i64][key_len i64][key][0x00][payload][\r\n]

// -------- File --------
pub const FILE_HEADER: &[u8; 13] = b"CerebralCache";
pub const CURRENT_VERSION: i64 = 1;
pub const SNAPSHOT_FILE_NAME: &str = "snapshot";

// -------- Records --------
pub const STRING_TYPE: i64 = 0x01;
pub const STRING_ARRAY_TYPE: i64 = 0x02;
pub const INTEGER_TYPE: i64 = 0x03;
pub const INTEGER_ARRAY_TYPE: i64 = 0x04;
pub const FLOAT_TYPE: i64 = 0x05;
pub const FLOAT_ARRAY_TYPE: i64 = 0x06;

pub const INT_TYPE_LENGTH: usize = 8;
pub const FLOAT_TYPE_LENGTH: usize = 8;

pub const BLOCK_SEPARATOR: &[u8; 2] = b"\r\n";
pub const STRING_TERMINATOR: u8 = 0x00;

// -------- Scheduler --------
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 10;

// -------- Network transport --------
pub const PROTOCOL_VERSION: [u8; 3] = [0, 0, 0];
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4444";
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;
