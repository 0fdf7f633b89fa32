//! Discriminant benchmark
//!
//! Times `sqrt(b^2 - 4ac)` over three random arrays with every configured
//! strategy.

use anyhow::Context;
use speedup::{run_benchmark, BenchConfig, Workload};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let result = BenchConfig::from_args(Workload::Discriminant, std::env::args())
        .context("failed to load discriminant benchmark configuration")
        .and_then(|config| run_benchmark(&config).context("discriminant benchmark aborted"));

    match result {
        Ok(outcome) => {
            log::info!("Measured {} phase(s)", outcome.measurements.len());
        }
        Err(e) => {
            log::error!("Discriminant benchmark failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
