//! Repetition harness
//!
//! Times blocking candidate calls over a shared input and reports the
//! average per call. Candidates whose first call pays a one-time cost are
//! measured twice: once with a single cold call, then with the configured
//! repetition count once that cost has been paid.

use std::collections::HashMap;
use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::BenchConfig;
use crate::element::Element;
use crate::error::{BenchError, BenchResult};
use crate::report::Reporter;
use crate::strategy::{Candidate, StrategyRegistry, Warmup};
use crate::workload::BenchInput;

/// Which part of the two-phase protocol a measurement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First call of a compiling candidate, always one repetition
    Cold,
    /// Compiling candidate after its first call
    Warm,
    /// Candidate without a one-time cost
    Steady,
}

/// Timing of `repetitions` consecutive calls of one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub strategy: String,
    pub label: String,
    pub phase: Phase,
    pub repetitions: u32,
    pub total: Duration,
}

impl Measurement {
    pub fn average(&self) -> Duration {
        self.total / self.repetitions
    }

    pub fn average_secs(&self) -> f64 {
        self.total.as_secs_f64() / f64::from(self.repetitions)
    }

    /// Label including the phase, e.g. `Time with gpu + memory (first call)`
    pub fn display_label(&self) -> String {
        match self.phase {
            Phase::Cold => format!("{} (first call)", self.label),
            Phase::Warm => format!("{} (pre-compiled)", self.label),
            Phase::Steady => self.label.clone(),
        }
    }
}

pub struct Harness {
    repetitions: u32,
    overrides: HashMap<String, u32>,
}

impl Harness {
    pub fn new(repetitions: u32) -> Self {
        Self {
            repetitions,
            overrides: HashMap::new(),
        }
    }

    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            repetitions: config.repetitions,
            overrides: config.repetition_overrides.clone(),
        }
    }

    /// Use a different repetition count for one strategy
    pub fn with_override(mut self, strategy: &str, repetitions: u32) -> Self {
        self.overrides.insert(strategy.to_string(), repetitions);
        self
    }

    pub fn repetitions_for(&self, strategy: &str) -> u32 {
        self.overrides.get(strategy).copied().unwrap_or(self.repetitions)
    }

    /// Total wall-clock time of `n` consecutive calls
    pub fn time<T: Element>(
        candidate: &mut dyn Candidate<T>,
        input: &BenchInput<T>,
        n: u32,
    ) -> BenchResult<Duration> {
        if n == 0 {
            return Err(BenchError::Config(format!(
                "repetitions for '{}' must be positive",
                candidate.name()
            )));
        }

        let start = Instant::now();
        for _ in 0..n {
            candidate.call(input)?;
        }
        Ok(start.elapsed())
    }

    pub fn measure<T: Element>(
        candidate: &mut dyn Candidate<T>,
        input: &BenchInput<T>,
        n: u32,
        phase: Phase,
    ) -> BenchResult<Measurement> {
        let total = Self::time(candidate, input, n)?;
        log::debug!(
            "[Harness] {} {:?}: {} call(s) in {:?}",
            candidate.name(),
            phase,
            n,
            total
        );
        Ok(Measurement {
            strategy: candidate.name().to_string(),
            label: candidate.label().to_string(),
            phase,
            repetitions: n,
            total,
        })
    }

    /// Measure one prepared candidate following the cold/warm protocol.
    ///
    /// Compiling candidates yield a `Cold` measurement of exactly one call
    /// followed by a `Warm` one; others yield a single `Steady` measurement.
    pub fn measure_candidate<T: Element>(
        &self,
        candidate: &mut dyn Candidate<T>,
        input: &BenchInput<T>,
    ) -> BenchResult<Vec<Measurement>> {
        let n = self.repetitions_for(candidate.name());
        match candidate.warmup() {
            Warmup::Compiles => {
                let cold = Self::measure(candidate, input, 1, Phase::Cold)?;
                let warm = Self::measure(candidate, input, n, Phase::Warm)?;
                Ok(vec![cold, warm])
            }
            Warmup::None => Ok(vec![Self::measure(candidate, input, n, Phase::Steady)?]),
        }
    }

    /// Prepare, measure and report every candidate in registry order.
    ///
    /// The first failure aborts the run; lines already reported stay written.
    pub fn run<T: Element, W: Write>(
        &self,
        registry: &mut StrategyRegistry<T>,
        input: &BenchInput<T>,
        reporter: &mut Reporter<W>,
    ) -> BenchResult<Vec<Measurement>> {
        let mut measurements = Vec::new();

        for candidate in registry.candidates_mut() {
            let candidate = candidate.as_mut();
            log::info!("[Harness] Measuring '{}'", candidate.name());
            candidate.prepare(input)?;
            for measurement in self.measure_candidate(candidate, input)? {
                reporter.measurement(&measurement)?;
                measurements.push(measurement);
            }
        }

        Ok(measurements)
    }
}
