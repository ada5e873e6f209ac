//! snapshot/file: whole-file snapshot write/read.
//!
//! Policy:
//! - Atomic replace: write `<path>.tmp-<pid>-<n>`, fsync, rename over `path`,
//!   then fsync the parent directory (best-effort on non-unix).
//! - A crash mid-write leaves at most a stray temp file; `path` is always either
//!   the previous snapshot or the new one.
//! - Reads stream through a `BufReader` straight into the decoder.

use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;

use crate::codec::{decode_into, DecodeOutcome};
use crate::error::{CacheError, Result};
use crate::store::TypedStore;
use crate::util::{fsync_dir, tmp_path_for};

/// Replace `path` with `bytes` via tmp+rename.
pub fn write_snapshot_file(path: &Path, bytes: &[u8], fsync: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io(format!("create dir {}", parent.display()), e))?;
        }
    }

    let tmp = tmp_path_for(path);
    let res = (|| -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| CacheError::io(format!("open snapshot tmp {}", tmp.display()), e))?;
        f.write_all(bytes)
            .map_err(|e| CacheError::io(format!("write snapshot tmp {}", tmp.display()), e))?;
        if fsync {
            f.sync_all()
                .map_err(|e| CacheError::io(format!("fsync {}", tmp.display()), e))?;
        }
        drop(f);
        fs::rename(&tmp, path).map_err(|e| {
            CacheError::io(
                format!("rename {} -> {}", tmp.display(), path.display()),
                e,
            )
        })
    })();

    if res.is_err() {
        let _ = fs::remove_file(&tmp); // best-effort
        return res;
    }
    if fsync {
        let _ = fsync_dir(path);
    }
    debug!("snapshot file: {} B -> {}", bytes.len(), path.display());
    Ok(())
}

/// Whole snapshot file, or `None` when it does not exist.
pub fn read_snapshot_file(path: &Path) -> Result<Option<Vec<u8>>> {
    let mut f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(format!("open {}", path.display()), e)),
    };
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)
        .map_err(|e| CacheError::io(format!("read {}", path.display()), e))?;
    Ok(Some(buf))
}

/// Decode the snapshot at `path` into `store`.
/// `Ok(None)` when there is no snapshot yet.
pub fn restore_from_file(path: &Path, store: &TypedStore) -> Result<Option<DecodeOutcome>> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(format!("open {}", path.display()), e)),
    };
    decode_into(BufReader::new(f), store).map(Some)
}
