use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_demo;
mod cmd_set;
mod cmd_get;
mod cmd_dump;
mod cmd_status;
mod cmd_serve;

fn init_logger() {
    // RUST_LOG overrides, default is info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Demo { path } => cmd_demo::exec(path),

        cli::Cmd::Set {
            path,
            key,
            int,
            float,
            str,
            ints,
            floats,
            strs,
            json,
        } => {
            let value = util::value_from_args(util::ValueArgs {
                int,
                float,
                str,
                ints,
                floats,
                strs,
                json,
            })?;
            cmd_set::exec(path, key, value)
        }

        cli::Cmd::Get { path, key, json } => cmd_get::exec(path, key, json),

        cli::Cmd::Dump { path, json } => cmd_dump::exec(path, json),

        cli::Cmd::Status { path, json } => cmd_status::exec(path, json),

        cli::Cmd::Serve { addr, max_frame_bytes } => cmd_serve::exec(addr, max_frame_bytes),
    }
}
