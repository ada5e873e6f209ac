use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CerebralCache: typed in-memory KV store with binary snapshots.
///
/// `--path` defaults to CC_SNAPSHOT_PATH, then `./snapshot`.
#[derive(Parser, Debug)]
#[command(name = "cerebralcache", version, about = "CerebralCache CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Apply the demonstration insert sequence, snapshot on exit
    Demo {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Set one key (exactly one value flag)
    Set {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        key: String,
        #[arg(long, allow_negative_numbers = true)]
        int: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        float: Option<f64>,
        #[arg(long)]
        str: Option<String>,
        /// Comma-separated integers, e.g. 1,2,-3
        #[arg(long, allow_hyphen_values = true)]
        ints: Option<String>,
        /// Comma-separated floats
        #[arg(long, allow_hyphen_values = true)]
        floats: Option<String>,
        /// Comma-separated strings; an empty value stores an empty array
        #[arg(long)]
        strs: Option<String>,
        /// Untyped JSON value: number, string or homogeneous array
        #[arg(long)]
        json: Option<String>,
    },
    /// Resolve a key (string, string-array, integer, integer-array, float, float-array)
    Get {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        key: String,
        #[arg(long)]
        json: bool,
    },
    /// Stream every record of a snapshot file
    Dump {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Snapshot header, per-kind counts, file size, metrics
    Status {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Frame listener (logs received frames)
    Serve {
        /// Defaults to CC_LISTEN_ADDR, then 127.0.0.1:4444
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        max_frame_bytes: Option<usize>,
    },
}
