//! Elementwise speedup benchmarks
//!
//! Measures the same elementwise formula computed by several execution
//! strategies (an indexed loop, whole-array operations, a fused iterator, a
//! thread pool and a GPU compute shader) and reports the average wall-clock
//! time per call for each.

pub mod benchmarks;
pub mod config;
pub mod element;
pub mod error;
pub mod gpu;
pub mod harness;
pub mod kernels;
pub mod report;
pub mod strategy;
pub mod validation;
pub mod workload;

pub use benchmarks::{run_benchmark, run_with_reporter, BenchmarkOutcome};
pub use config::{BenchConfig, ConfigFile, GpuConfig, ParallelConfig, ReportConfig};
pub use element::{DType, Element};
pub use error::{BenchError, BenchResult};
pub use harness::{Harness, Measurement, Phase};
pub use report::Reporter;
pub use strategy::{Candidate, StrategyRegistry, Warmup, ALL_STRATEGIES};
pub use workload::{BenchInput, Workload};
