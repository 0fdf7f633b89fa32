//! Host strategies

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{Candidate, Warmup};
use crate::config::BenchConfig;
use crate::element::Element;
use crate::error::{length_mismatch, BenchError, BenchResult};
use crate::kernels;
use crate::workload::BenchInput;

/// How a host candidate evaluates the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStyle {
    /// Explicit indexed loop
    Loop,
    /// One whole-array primitive per operator
    Array,
    /// Single pass, specialised for the element type at build time
    Fused,
    /// Single pass over a thread pool that is built on the first call
    Parallel,
}

impl CpuStyle {
    pub fn name(self) -> &'static str {
        match self {
            CpuStyle::Loop => "loop",
            CpuStyle::Array => "array",
            CpuStyle::Fused => "fused",
            CpuStyle::Parallel => "parallel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuStyle::Loop => "Time with for loop",
            CpuStyle::Array => "Time with array ops",
            CpuStyle::Fused => "Time with fused vectorization",
            CpuStyle::Parallel => "Time with parallel vectorization",
        }
    }
}

pub struct CpuCandidate<T: Element> {
    style: CpuStyle,
    threads: usize,
    pool: Option<ThreadPool>,
    last: Option<Vec<T>>,
}

impl<T: Element> CpuCandidate<T> {
    pub fn new(config: &BenchConfig, style: CpuStyle) -> Self {
        Self {
            style,
            threads: config.parallel.thread_count(),
            pool: None,
            last: None,
        }
    }

    fn pool(&mut self) -> BenchResult<&ThreadPool> {
        if self.pool.is_none() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .thread_name(|i| format!("speedup-worker-{}", i))
                .build()
                .map_err(|e| BenchError::BackendUnavailable {
                    strategy: self.style.name().to_string(),
                    reason: format!("failed to build thread pool: {}", e),
                })?;
            log::debug!("[CpuCandidate] Built pool with {} threads", self.threads);
            self.pool = Some(pool);
        }
        self.pool
            .as_ref()
            .ok_or_else(|| BenchError::NotRun(self.style.name().to_string()))
    }
}

impl<T: Element> Candidate<T> for CpuCandidate<T> {
    fn name(&self) -> &str {
        self.style.name()
    }

    fn label(&self) -> &str {
        self.style.label()
    }

    fn warmup(&self) -> Warmup {
        match self.style {
            CpuStyle::Parallel => Warmup::Compiles,
            _ => Warmup::None,
        }
    }

    fn call(&mut self, input: &BenchInput<T>) -> BenchResult<()> {
        let results = match self.style {
            CpuStyle::Loop => kernels::looped(input),
            CpuStyle::Array => kernels::array_ops(input),
            CpuStyle::Fused => kernels::fused(input),
            CpuStyle::Parallel => {
                let pool = self.pool()?;
                kernels::parallel(pool, input)
            }
        };
        if results.len() != input.len() {
            return Err(length_mismatch(self.style.name(), input.len(), results.len()));
        }
        self.last = Some(results);
        Ok(())
    }

    fn output(&mut self) -> BenchResult<Vec<T>> {
        self.last
            .clone()
            .ok_or_else(|| BenchError::NotRun(self.style.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::Workload;

    #[test]
    fn test_output_before_call_is_error() {
        let config = BenchConfig::defaults(Workload::Sine);
        let mut candidate = CpuCandidate::<f32>::new(&config, CpuStyle::Loop);
        assert!(matches!(candidate.output(), Err(BenchError::NotRun(_))));
    }

    #[test]
    fn test_only_parallel_needs_warmup() {
        let config = BenchConfig::defaults(Workload::Sine);
        for style in [CpuStyle::Loop, CpuStyle::Array, CpuStyle::Fused] {
            assert_eq!(CpuCandidate::<f32>::new(&config, style).warmup(), Warmup::None);
        }
        assert_eq!(
            CpuCandidate::<f32>::new(&config, CpuStyle::Parallel).warmup(),
            Warmup::Compiles
        );
    }

    #[test]
    fn test_parallel_builds_pool_once() {
        let mut config = BenchConfig::defaults(Workload::Sine);
        config.parallel.threads = 2;
        let input = Workload::Sine.generate::<f64>(32, None).unwrap();
        let mut candidate = CpuCandidate::<f64>::new(&config, CpuStyle::Parallel);

        assert!(candidate.pool.is_none());
        candidate.call(&input).unwrap();
        assert_eq!(candidate.pool.as_ref().map(|p| p.current_num_threads()), Some(2));
        candidate.call(&input).unwrap();
        assert_eq!(candidate.output().unwrap().len(), 32);
    }
}
