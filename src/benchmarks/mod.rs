//! End-to-end benchmark runs
//!
//! Builds the input once, constructs every configured strategy, then measures
//! and reports them in order. Each result line is written as soon as it is
//! measured, so a later failure leaves earlier lines on the output.

use std::io::Write;

use crate::config::BenchConfig;
use crate::element::{DType, Element};
use crate::error::BenchResult;
use crate::harness::{Harness, Measurement};
use crate::report::Reporter;
use crate::strategy::StrategyRegistry;
use crate::validation::{self, OutputCheck};
use crate::workload::Workload;

/// Everything a run measured
#[derive(Debug, Clone, Default)]
pub struct BenchmarkOutcome {
    pub measurements: Vec<Measurement>,
    /// Empty unless `report.verify` is set
    pub checks: Vec<OutputCheck>,
}

/// First line of a report
pub fn header(workload: Workload, size: usize) -> String {
    match workload {
        Workload::Sine => format!("Array with {} elems", size),
        Workload::Discriminant => format!("Total size: {}", size),
    }
}

/// Run the configured benchmark, reporting to stdout
pub fn run_benchmark(config: &BenchConfig) -> BenchResult<BenchmarkOutcome> {
    let mut reporter = Reporter::stdout(&config.report);
    run_with_reporter(config, &mut reporter)
}

pub fn run_with_reporter<W: Write>(
    config: &BenchConfig,
    reporter: &mut Reporter<W>,
) -> BenchResult<BenchmarkOutcome> {
    config.validate()?;
    match config.dtype {
        DType::F32 => run_typed::<f32, W>(config, reporter),
        DType::F64 => run_typed::<f64, W>(config, reporter),
    }
}

fn run_typed<T: Element, W: Write>(
    config: &BenchConfig,
    reporter: &mut Reporter<W>,
) -> BenchResult<BenchmarkOutcome> {
    log::info!(
        "[Benchmark] {} workload, {} x {}, {} repetition(s)",
        config.workload,
        config.size,
        T::DTYPE,
        config.repetitions
    );

    let input = config.workload.generate::<T>(config.size, config.seed)?;
    log::info!(
        "[Benchmark] Input ready: {:.2} MB",
        input.size_bytes() as f64 / (1024.0 * 1024.0)
    );

    let mut registry = StrategyRegistry::<T>::from_config(config)?;
    let harness = Harness::from_config(config);

    reporter.header(&header(config.workload, config.size))?;
    let measurements = harness.run(&mut registry, &input, reporter)?;
    reporter.summary(&measurements)?;

    let checks = if config.report.verify {
        let checks = validation::verify_registry(&mut registry, &input)?;
        reporter.checks(&checks)?;
        checks
    } else {
        Vec::new()
    };

    Ok(BenchmarkOutcome {
        measurements,
        checks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::harness::Phase;

    fn cpu_config(workload: Workload, size: usize) -> BenchConfig {
        let mut config = BenchConfig::defaults(workload);
        config.size = size;
        config.repetitions = 2;
        config.seed = Some(1);
        config.strategies = vec![
            "loop".to_string(),
            "array".to_string(),
            "fused".to_string(),
            "parallel".to_string(),
        ];
        config.parallel.threads = 2;
        config
    }

    #[test]
    fn test_headers() {
        assert_eq!(header(Workload::Sine, 100), "Array with 100 elems");
        assert_eq!(header(Workload::Discriminant, 5), "Total size: 5");
    }

    #[test]
    fn test_run_reports_every_phase_in_order() {
        let config = cpu_config(Workload::Discriminant, 256);
        let mut reporter = Reporter::new(Vec::new(), &ReportConfig::default());
        let outcome = run_with_reporter(&config, &mut reporter).unwrap();

        let phases: Vec<(String, Phase)> = outcome
            .measurements
            .iter()
            .map(|m| (m.strategy.clone(), m.phase))
            .collect();
        assert_eq!(
            phases,
            vec![
                ("loop".to_string(), Phase::Steady),
                ("array".to_string(), Phase::Steady),
                ("fused".to_string(), Phase::Steady),
                ("parallel".to_string(), Phase::Cold),
                ("parallel".to_string(), Phase::Warm),
            ]
        );

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Total size: 256");
        assert!(lines[1].starts_with("Time with for loop: "));
        assert!(lines[4].starts_with("Time with parallel vectorization (first call): "));
        assert!(lines[5].starts_with("Time with parallel vectorization (pre-compiled): "));
    }

    #[test]
    fn test_verify_checks_every_candidate() {
        let mut config = cpu_config(Workload::Sine, 64);
        config.dtype = DType::F64;
        config.report.verify = true;
        let mut reporter = Reporter::new(Vec::new(), &config.report);
        let outcome = run_with_reporter(&config, &mut reporter).unwrap();

        assert_eq!(outcome.checks.len(), 4);
        assert!(outcome.checks.iter().all(|c| c.passed));
    }

    #[test]
    fn test_invalid_config_fails_before_output() {
        let mut config = cpu_config(Workload::Sine, 64);
        config.repetitions = 0;
        let mut reporter = Reporter::new(Vec::new(), &ReportConfig::default());
        assert!(run_with_reporter(&config, &mut reporter).is_err());
        assert!(reporter.into_inner().is_empty());
    }
}
