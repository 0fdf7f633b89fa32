//! Sine benchmark
//!
//! Times `sin(x)` over a counting sequence with every configured strategy.
//! Pass a TOML configuration path as the first argument or via
//! `SPEEDUP_CONFIG` to override the defaults.

use anyhow::Context;
use speedup::{run_benchmark, BenchConfig, Workload};

fn run() -> anyhow::Result<()> {
    let config = BenchConfig::from_args(Workload::Sine, std::env::args())
        .context("failed to load sine benchmark configuration")?;
    run_benchmark(&config).context("sine benchmark aborted")?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run() {
        log::error!("Sine benchmark failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
