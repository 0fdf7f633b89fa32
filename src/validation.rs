//! Output agreement checks against the double precision reference

use crate::element::Element;
use crate::error::{length_mismatch, BenchResult};
use crate::strategy::StrategyRegistry;
use crate::workload::BenchInput;

/// Result of comparing one candidate's output with the reference
#[derive(Debug, Clone, PartialEq)]
pub struct OutputCheck {
    pub strategy: String,
    /// Largest `|actual - expected| / max(|expected|, 1)` over all elements
    pub max_relative_error: f64,
    pub passed: bool,
}

/// Largest scaled deviation between `actual` and `expected`
pub fn max_relative_error<T: Element>(
    strategy: &str,
    actual: &[T],
    expected: &[f64],
) -> BenchResult<f64> {
    if actual.len() != expected.len() {
        return Err(length_mismatch(strategy, expected.len(), actual.len()));
    }
    Ok(actual
        .iter()
        .zip(expected)
        .map(|(&a, &e)| (a.to_f64() - e).abs() / e.abs().max(1.0))
        .fold(0.0, f64::max))
}

pub fn check_output<T: Element>(
    strategy: &str,
    actual: &[T],
    expected: &[f64],
    tolerance: f64,
) -> BenchResult<OutputCheck> {
    let max_relative_error = max_relative_error(strategy, actual, expected)?;
    Ok(OutputCheck {
        strategy: strategy.to_string(),
        max_relative_error,
        passed: max_relative_error <= tolerance,
    })
}

/// Check the last output of every registered candidate.
///
/// Candidates must have been called at least once.
pub fn verify_registry<T: Element>(
    registry: &mut StrategyRegistry<T>,
    input: &BenchInput<T>,
) -> BenchResult<Vec<OutputCheck>> {
    let expected = input.workload().reference(input);
    let tolerance = T::DTYPE.tolerance();

    let mut checks = Vec::with_capacity(registry.len());
    for candidate in registry.candidates_mut() {
        let actual = candidate.output()?;
        let check = check_output(candidate.name(), &actual, &expected, tolerance)?;
        if !check.passed {
            log::warn!(
                "[Validation] '{}' deviates from the reference by {:.3e} (tolerance {:.1e})",
                check.strategy,
                check.max_relative_error,
                tolerance
            );
        }
        checks.push(check);
    }
    Ok(checks)
}
