use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use CerebralCache::codec::decode_store;
use CerebralCache::consts::FILE_HEADER;
use CerebralCache::metrics::{self, MetricsSnapshot};
use CerebralCache::snapshot::read_snapshot_file;
use CerebralCache::util::hex_dump;
use CerebralCache::ValueKind;

#[derive(Serialize)]
struct KindCount {
    kind: ValueKind,
    records: usize,
}

#[derive(Serialize)]
struct Status {
    path: String,
    present: bool,
    file_bytes: u64,
    version: Option<i64>,
    records: u64,
    complete: bool,
    error: Option<String>,
    kinds: Vec<KindCount>,
    metrics: MetricsSnapshot,
}

pub fn exec(path: Option<PathBuf>, json: bool) -> Result<()> {
    let cfg = super::util::config_for(path);
    let mut st = Status {
        path: cfg.snapshot_path.display().to_string(),
        present: false,
        file_bytes: 0,
        version: None,
        records: 0,
        complete: true,
        error: None,
        kinds: Vec::new(),
        metrics: MetricsSnapshot::default(),
    };

    if let Some(bytes) = read_snapshot_file(&cfg.snapshot_path)
        .with_context(|| format!("read {}", cfg.snapshot_path.display()))?
    {
        st.present = true;
        st.file_bytes = bytes.len() as u64;
        match decode_store(&bytes) {
            Ok((store, outcome)) => {
                st.version = Some(outcome.version);
                st.records = outcome.records;
                st.complete = outcome.is_complete();
                st.error = outcome.stopped.as_ref().map(|e| e.to_string());
                metrics::record_restore(outcome.records, st.complete);
                store.with_maps(|m| {
                    for kind in ValueKind::ENCODE_ORDER {
                        st.kinds.push(KindCount {
                            kind,
                            records: m.count(kind),
                        });
                    }
                });
            }
            Err(e) => {
                metrics::record_restore(0, false);
                st.complete = false;
                st.error = Some(e.to_string());
            }
        }
    }
    st.metrics = metrics::snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&st)?);
        return Ok(());
    }

    println!("status for {}", st.path);
    println!("  header:   {}", hex_dump(FILE_HEADER));
    if !st.present {
        println!("  snapshot: missing");
        return Ok(());
    }
    println!("  size:     {} B", st.file_bytes);
    match st.version {
        Some(v) => println!("  version:  {}", v),
        None => println!("  version:  -"),
    }
    println!("  records:  {}{}", st.records, if st.complete { "" } else { " (incomplete)" });
    for k in &st.kinds {
        println!("    {:<14} {}", k.kind.name(), k.records);
    }
    if let Some(e) = &st.error {
        println!("  error:    {}", e);
    }
    println!(
        "  decoded:  {} record(s), {} incomplete restore(s)",
        st.metrics.restore_records_applied, st.metrics.restores_incomplete
    );
    if st.metrics.snapshots_taken > 0 {
        println!("  avg snapshot: {:.1} B", st.metrics.avg_snapshot_bytes());
    }
    Ok(())
}
