use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use CerebralCache::codec::SnapshotReader;
use CerebralCache::util::display_key;

use super::util::{config_for, format_value};

pub fn exec(path: Option<PathBuf>, json: bool) -> Result<()> {
    let cfg = config_for(path);
    let f = File::open(&cfg.snapshot_path)
        .with_context(|| format!("open {}", cfg.snapshot_path.display()))?;
    let mut reader = SnapshotReader::new(BufReader::new(f));
    let version = reader.read_header()?;
    if !json {
        println!("snapshot {} (version {})", cfg.snapshot_path.display(), version);
    }

    loop {
        match reader.next_record() {
            Ok(Some(rec)) => {
                if json {
                    let line = serde_json::json!({ "key": rec.key, "value": rec.value });
                    println!("{}", line);
                } else {
                    println!(
                        "{:<14} {} = {}",
                        rec.value.kind().name(),
                        display_key(&rec.key),
                        format_value(&rec.value)
                    );
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!(
                    "dump stopped after {} record(s): {}",
                    reader.records_read(),
                    e
                );
                break;
            }
        }
    }
    if !json {
        println!("{} record(s)", reader.records_read());
    }
    Ok(())
}
