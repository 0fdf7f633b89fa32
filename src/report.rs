//! Human-readable timing output

use std::io::{self, Write};

use crate::config::ReportConfig;
use crate::error::BenchResult;
use crate::harness::{Measurement, Phase};
use crate::validation::OutputCheck;

/// Writes one `<label>: <seconds>` line per measurement
pub struct Reporter<W: Write> {
    out: W,
    precision: usize,
    summary: bool,
}

impl Reporter<io::Stdout> {
    pub fn stdout(config: &ReportConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, config: &ReportConfig) -> Self {
        Self {
            out,
            precision: config.precision,
            summary: config.summary,
        }
    }

    pub fn header(&mut self, text: &str) -> BenchResult<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// Emit a measurement immediately so it survives a later failure
    pub fn measurement(&mut self, measurement: &Measurement) -> BenchResult<()> {
        writeln!(
            self.out,
            "{}: {:.*}",
            measurement.display_label(),
            self.precision,
            measurement.average_secs()
        )?;
        self.out.flush()?;
        Ok(())
    }

    /// Speedup of each steady-state measurement over the first one
    pub fn summary(&mut self, measurements: &[Measurement]) -> BenchResult<()> {
        if !self.summary {
            return Ok(());
        }
        let steady: Vec<&Measurement> = measurements
            .iter()
            .filter(|m| m.phase != Phase::Cold)
            .collect();
        let Some(baseline) = steady.first() else {
            return Ok(());
        };

        writeln!(self.out, "\nSpeedup over {}:", baseline.strategy)?;
        for m in &steady {
            match speedup(baseline.average_secs(), m.average_secs()) {
                Some(ratio) => writeln!(self.out, "  {}: {:.2}x", m.strategy, ratio)?,
                None => writeln!(self.out, "  {}: n/a", m.strategy)?,
            }
        }
        if let Some(fastest) = steady
            .iter()
            .min_by(|a, b| a.average_secs().total_cmp(&b.average_secs()))
        {
            writeln!(self.out, "Fastest: {}", fastest.strategy)?;
        }
        Ok(())
    }

    pub fn checks(&mut self, checks: &[OutputCheck]) -> BenchResult<()> {
        for check in checks {
            writeln!(
                self.out,
                "Output check {}: {} (max relative error {:.3e})",
                check.strategy,
                if check.passed { "ok" } else { "MISMATCH" },
                check.max_relative_error
            )?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Ratio of two averages, undefined when either is below timer resolution
fn speedup(baseline: f64, average: f64) -> Option<f64> {
    (baseline > 0.0 && average > 0.0).then(|| baseline / average)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn measurement(strategy: &str, phase: Phase, millis: u64, repetitions: u32) -> Measurement {
        Measurement {
            strategy: strategy.to_string(),
            label: format!("Time with {}", strategy),
            phase,
            repetitions,
            total: Duration::from_millis(millis),
        }
    }

    fn render(config: &ReportConfig, f: impl FnOnce(&mut Reporter<Vec<u8>>)) -> String {
        let mut reporter = Reporter::new(Vec::new(), config);
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_line_format_uses_fixed_decimals() {
        let config = ReportConfig {
            precision: 4,
            ..Default::default()
        };
        let text = render(&config, |r| {
            r.measurement(&measurement("loop", Phase::Steady, 500, 5)).unwrap();
        });
        assert_eq!(text, "Time with loop: 0.1000\n");
    }

    #[test]
    fn test_phase_suffixes() {
        let text = render(&ReportConfig::default(), |r| {
            r.measurement(&measurement("gpu", Phase::Cold, 30, 1)).unwrap();
            r.measurement(&measurement("gpu", Phase::Warm, 10, 5)).unwrap();
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Time with gpu (first call): 0.030000");
        assert_eq!(lines[1], "Time with gpu (pre-compiled): 0.002000");
    }

    #[test]
    fn test_summary_disabled_by_default() {
        let text = render(&ReportConfig::default(), |r| {
            r.summary(&[measurement("loop", Phase::Steady, 10, 1)]).unwrap();
        });
        assert!(text.is_empty());
    }

    #[test]
    fn test_summary_skips_cold_measurements() {
        let config = ReportConfig {
            summary: true,
            ..Default::default()
        };
        let text = render(&config, |r| {
            r.summary(&[
                measurement("loop", Phase::Steady, 40, 1),
                measurement("parallel", Phase::Cold, 100, 1),
                measurement("parallel", Phase::Warm, 10, 1),
            ])
            .unwrap();
        });
        assert!(text.contains("Speedup over loop:"));
        assert!(text.contains("  parallel: 4.00x"));
        assert!(text.contains("Fastest: parallel"));
        assert_eq!(text.matches("parallel:").count(), 1);
    }

    #[test]
    fn test_summary_zero_average_is_not_a_ratio() {
        let config = ReportConfig {
            summary: true,
            ..Default::default()
        };
        let text = render(&config, |r| {
            r.summary(&[
                measurement("loop", Phase::Steady, 40, 1),
                measurement("fused", Phase::Steady, 0, 1),
            ])
            .unwrap();
        });
        assert!(text.contains("  loop: 1.00x"));
        assert!(text.contains("  fused: n/a"));
        assert!(!text.contains("inf"));
    }
}
