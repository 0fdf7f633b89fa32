/// Harness and strategy behaviour tests
///
/// Covers output agreement between the host strategies, the cold/warm
/// measurement protocol, repetition scaling and GPU absence handling.

use std::thread;
use std::time::Duration;

use speedup::{
    run_with_reporter, BenchConfig, BenchError, BenchInput, BenchResult, Candidate, DType,
    Element, Harness, Phase, ReportConfig, Reporter, StrategyRegistry, Warmup, Workload,
};

const CPU_STRATEGIES: [&str; 4] = ["loop", "array", "fused", "parallel"];

fn cpu_config(workload: Workload) -> BenchConfig {
    let mut config = BenchConfig::defaults(workload);
    config.strategies = CPU_STRATEGIES.iter().map(|s| s.to_string()).collect();
    config.parallel.threads = 2;
    config
}

/// Call every registered candidate once and collect its output
fn outputs<T: Element>(config: &BenchConfig, input: &BenchInput<T>) -> Vec<(String, Vec<T>)> {
    let mut registry = StrategyRegistry::<T>::from_config(config).unwrap();
    let results = registry
        .candidates_mut()
        .map(|candidate| {
            candidate.prepare(input).unwrap();
            candidate.call(input).unwrap();
            (candidate.name().to_string(), candidate.output().unwrap())
        })
        .collect();
    results
}

/// Sleeps for a fixed time per call; the first call optionally sleeps longer
struct Sleeper {
    first_call: Duration,
    per_call: Duration,
    warmup: Warmup,
    calls: u32,
}

impl Sleeper {
    fn steady(per_call: Duration) -> Self {
        Self {
            first_call: per_call,
            per_call,
            warmup: Warmup::None,
            calls: 0,
        }
    }

    fn compiling(first_call: Duration, per_call: Duration) -> Self {
        Self {
            first_call,
            per_call,
            warmup: Warmup::Compiles,
            calls: 0,
        }
    }
}

impl Candidate<f64> for Sleeper {
    fn name(&self) -> &str {
        "sleeper"
    }

    fn label(&self) -> &str {
        "Time with sleeper"
    }

    fn warmup(&self) -> Warmup {
        self.warmup
    }

    fn call(&mut self, _input: &BenchInput<f64>) -> BenchResult<()> {
        let delay = if self.calls == 0 { self.first_call } else { self.per_call };
        self.calls += 1;
        thread::sleep(delay);
        Ok(())
    }

    fn output(&mut self) -> BenchResult<Vec<f64>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_cpu_strategies_agree_within_tolerance() {
    let config = cpu_config(Workload::Discriminant);
    let input = Workload::Discriminant.generate::<f64>(10_000, Some(11)).unwrap();
    let expected = Workload::Discriminant.reference(&input);
    let tolerance = DType::F64.tolerance();

    for (name, actual) in outputs(&config, &input) {
        assert_eq!(actual.len(), expected.len(), "{} output length", name);
        for (i, (a, e)) in actual.iter().zip(&expected).enumerate() {
            assert!(
                (a - e).abs() <= tolerance * e.abs().max(1.0),
                "{} index {}: {} vs {}",
                name,
                i,
                a,
                e
            );
        }
    }
}

#[test]
fn test_f32_strategies_agree_within_tolerance() {
    let config = cpu_config(Workload::Sine);
    let input = Workload::Sine.generate::<f32>(4096, None).unwrap();
    let expected = Workload::Sine.reference(&input);
    let tolerance = DType::F32.tolerance();

    for (name, actual) in outputs(&config, &input) {
        for (i, (&a, e)) in actual.iter().zip(&expected).enumerate() {
            assert!(
                (f64::from(a) - e).abs() <= tolerance * e.abs().max(1.0),
                "{} index {}: {} vs {}",
                name,
                i,
                a,
                e
            );
        }
    }
}

#[test]
fn test_eight_element_closed_form() {
    // a = 0 reduces the discriminant root to |b|
    let b: Vec<f64> = (0..8).map(|i| i as f64 * 1.5).collect();
    let input = BenchInput::new(
        Workload::Discriminant,
        vec![vec![0.0; 8], b.clone(), vec![3.0; 8]],
    )
    .unwrap();

    let results = outputs(&cpu_config(Workload::Discriminant), &input);
    assert_eq!(results.len(), CPU_STRATEGIES.len());
    for (name, actual) in results {
        assert_eq!(actual.len(), 8, "{} output length", name);
        assert_eq!(actual, b, "{} output", name);
    }

    let sine = Workload::Sine.generate::<f64>(8, None).unwrap();
    for (name, actual) in outputs(&cpu_config(Workload::Sine), &sine) {
        assert_eq!(actual.len(), 8, "{} output length", name);
        for (i, a) in actual.iter().enumerate() {
            assert!((a - (i as f64).sin()).abs() < 1e-12, "{} index {}", name, i);
        }
    }
}

#[test]
fn test_discriminant_of_single_element() {
    let expected = 21.0f64.sqrt();

    let input = BenchInput::new(
        Workload::Discriminant,
        vec![vec![1.0f64], vec![5.0], vec![1.0]],
    )
    .unwrap();
    for (name, actual) in outputs(&cpu_config(Workload::Discriminant), &input) {
        assert!((actual[0] - expected).abs() < 1e-12, "{}: {}", name, actual[0]);
    }

    let input = BenchInput::new(
        Workload::Discriminant,
        vec![vec![1.0f32], vec![5.0], vec![1.0]],
    )
    .unwrap();
    for (name, actual) in outputs(&cpu_config(Workload::Discriminant), &input) {
        assert!((f64::from(actual[0]) - expected).abs() < 1e-5, "{}: {}", name, actual[0]);
    }
}

#[test]
fn test_total_time_scales_with_repetitions() {
    let input = Workload::Sine.generate::<f64>(1, None).unwrap();
    let mut candidate = Sleeper::steady(Duration::from_millis(5));

    let short = Harness::measure::<f64>(&mut candidate, &input, 2, Phase::Steady).unwrap();
    let long = Harness::measure::<f64>(&mut candidate, &input, 8, Phase::Steady).unwrap();

    assert!(long.total > short.total);
    assert!(short.average() >= Duration::from_millis(5));
    assert!(long.average() >= Duration::from_millis(5));
    let ratio = long.average_secs() / short.average_secs();
    assert!((0.5..2.0).contains(&ratio), "average drifted by {}x", ratio);
}

#[test]
fn test_cold_call_slower_than_warm_average() {
    let input = Workload::Sine.generate::<f64>(1, None).unwrap();
    let mut candidate = Sleeper::compiling(Duration::from_millis(60), Duration::from_millis(2));

    let measurements = Harness::new(4)
        .measure_candidate::<f64>(&mut candidate, &input)
        .unwrap();

    assert_eq!(measurements.len(), 2);
    let (cold, warm) = (&measurements[0], &measurements[1]);
    assert_eq!(cold.phase, Phase::Cold);
    assert_eq!(cold.repetitions, 1);
    assert_eq!(warm.phase, Phase::Warm);
    assert_eq!(warm.repetitions, 4);
    assert!(cold.average() > warm.average());
}

#[test]
fn test_parallel_strategy_reports_cold_and_warm() {
    let mut config = cpu_config(Workload::Sine);
    config.strategies = vec!["parallel".to_string()];
    config.size = 1024;
    config.repetitions = 3;

    let mut reporter = Reporter::new(Vec::new(), &ReportConfig::default());
    let outcome = run_with_reporter(&config, &mut reporter).unwrap();

    let phases: Vec<Phase> = outcome.measurements.iter().map(|m| m.phase).collect();
    assert_eq!(phases, vec![Phase::Cold, Phase::Warm]);
    assert_eq!(outcome.measurements[1].repetitions, 3);
}

#[test]
fn test_missing_gpu_backend_is_fatal() {
    let mut config = cpu_config(Workload::Discriminant);
    config.strategies = vec!["loop".to_string(), "gpu-resident".to_string()];
    config.size = 16;
    config.gpu.backends.clear();

    let mut reporter = Reporter::new(Vec::new(), &ReportConfig::default());
    match run_with_reporter(&config, &mut reporter) {
        Err(BenchError::BackendUnavailable { strategy, .. }) => assert_eq!(strategy, "gpu-resident"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(outcome) => panic!("ran without a GPU: {:?}", outcome.measurements),
    }
    // Strategies are built before the first measurement, so nothing ran on a fallback
    let text = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(!text.contains("Time with"));
}

#[test]
fn test_end_to_end_output_format() {
    let mut config = cpu_config(Workload::Discriminant);
    config.size = 500;
    config.repetitions = 2;
    config.seed = Some(5);
    let report = ReportConfig {
        precision: 4,
        summary: true,
        verify: true,
    };
    config.report = report.clone();

    let mut reporter = Reporter::new(Vec::new(), &report);
    let outcome = run_with_reporter(&config, &mut reporter).unwrap();
    assert!(outcome.checks.iter().all(|c| c.passed));

    let text = String::from_utf8(reporter.into_inner()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Total size: 500"));
    let timing = lines.next().unwrap();
    let (label, seconds) = timing.rsplit_once(": ").unwrap();
    assert_eq!(label, "Time with for loop");
    assert_eq!(seconds.split('.').nth(1).map(str::len), Some(4));
    assert!(text.contains("Speedup over loop:"));
    assert!(text.contains("Output check parallel: ok"));
}
