//! PCTD command-line tool
//!
//! Decodes VCD simulation traces into per-signal activity, and ranks
//! rarely toggling register-like signals as hardware trojan candidates.

#[global_allocator]
/// Global allocator using jemalloc.
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod args;
mod commands;

use clap::Parser;
use tracing::info;

use args::{Args, Command};

/// Executes the PCTD pipeline.
///
/// This function:
/// 1. Initializes logging from `RUST_LOG`
/// 2. Parses command-line arguments
/// 3. Runs the requested stage and writes its artifacts and reports
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match &args.command {
        Command::Extract(extract) => {
            let extracted = commands::extract(extract)?;
            info!("Artifacts written next to {}", extracted.all_signals.display());
        }
        Command::Detect(detect) => commands::detect(detect)?,
        Command::Run(run) => commands::run(run)?,
    }

    Ok(())
}
