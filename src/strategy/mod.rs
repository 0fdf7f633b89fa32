//! Candidate strategies and the registry that builds them
//!
//! A candidate is one way of computing a workload. The harness only sees the
//! [`Candidate`] trait, so adding a strategy means adding a factory to
//! [`builtin_factory`] and nothing in the measurement loop.

pub mod cpu;
pub mod gpu;

use std::sync::Arc;

use crate::config::BenchConfig;
use crate::element::Element;
use crate::error::{BenchError, BenchResult};
use crate::gpu::GpuContext;
use crate::workload::BenchInput;

pub use cpu::{CpuCandidate, CpuStyle};
pub use gpu::{GpuResidentCandidate, GpuTransferCandidate};

/// Every built-in strategy name, in default reporting order
pub const ALL_STRATEGIES: &[&str] = &["loop", "array", "fused", "parallel", "gpu", "gpu-resident"];

/// Whether the first call of a candidate pays a one-time setup cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warmup {
    /// Every call costs the same
    None,
    /// The first call compiles or builds something that later calls reuse
    Compiles,
}

/// One implementation strategy for a workload
pub trait Candidate<T: Element> {
    /// Registry key
    fn name(&self) -> &str;

    /// Human readable label used in reports
    fn label(&self) -> &str;

    fn warmup(&self) -> Warmup {
        Warmup::None
    }

    /// Untimed setup against the run's input
    fn prepare(&mut self, _input: &BenchInput<T>) -> BenchResult<()> {
        Ok(())
    }

    /// One timed, blocking evaluation of the workload
    fn call(&mut self, input: &BenchInput<T>) -> BenchResult<()>;

    /// Result of the last call, retrieved to the host outside of timing
    fn output(&mut self) -> BenchResult<Vec<T>>;
}

/// Shared resources handed to strategy factories
pub struct BuildContext<'a> {
    config: &'a BenchConfig,
    gpu: Option<Arc<GpuContext>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a BenchConfig) -> Self {
        Self { config, gpu: None }
    }

    pub fn config(&self) -> &BenchConfig {
        self.config
    }

    /// GPU context, acquired on first request and shared afterwards
    pub fn gpu(&mut self, strategy: &str) -> BenchResult<Arc<GpuContext>> {
        if let Some(context) = &self.gpu {
            return Ok(context.clone());
        }
        let context = Arc::new(GpuContext::new(&self.config.gpu, strategy)?);
        self.gpu = Some(context.clone());
        Ok(context)
    }
}

/// Builds a boxed candidate for a run
pub type StrategyFactory<T> = fn(&mut BuildContext<'_>) -> BenchResult<Box<dyn Candidate<T>>>;

/// Factory for a built-in strategy name
pub fn builtin_factory<T: Element>(name: &str) -> Option<StrategyFactory<T>> {
    let factory: StrategyFactory<T> = match name {
        "loop" => |ctx| Ok(Box::new(CpuCandidate::<T>::new(ctx.config(), CpuStyle::Loop))),
        "array" => |ctx| Ok(Box::new(CpuCandidate::<T>::new(ctx.config(), CpuStyle::Array))),
        "fused" => |ctx| Ok(Box::new(CpuCandidate::<T>::new(ctx.config(), CpuStyle::Fused))),
        "parallel" => |ctx| Ok(Box::new(CpuCandidate::<T>::new(ctx.config(), CpuStyle::Parallel))),
        "gpu" => |ctx| Ok(Box::new(GpuTransferCandidate::<T>::new(ctx)?)),
        "gpu-resident" => |ctx| Ok(Box::new(GpuResidentCandidate::<T>::new(ctx)?)),
        _ => return None,
    };
    Some(factory)
}

/// Ordered set of candidates for one run
pub struct StrategyRegistry<T: Element> {
    candidates: Vec<Box<dyn Candidate<T>>>,
}

impl<T: Element> StrategyRegistry<T> {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Build every strategy named in the configuration, in order.
    ///
    /// Any factory failure, such as a missing GPU, aborts construction.
    pub fn from_config(config: &BenchConfig) -> BenchResult<Self> {
        let mut ctx = BuildContext::new(config);
        let mut registry = Self::new();

        for name in &config.strategies {
            let factory =
                builtin_factory::<T>(name).ok_or_else(|| BenchError::UnknownStrategy(name.clone()))?;
            let candidate = factory(&mut ctx)?;
            log::debug!("[Registry] Built strategy '{}'", candidate.name());
            registry.register(candidate)?;
        }

        Ok(registry)
    }

    /// Append a candidate; names must be unique
    pub fn register(&mut self, candidate: Box<dyn Candidate<T>>) -> BenchResult<()> {
        if self.get(candidate.name()).is_some() {
            return Err(BenchError::Config(format!(
                "strategy '{}' registered twice",
                candidate.name()
            )));
        }
        self.candidates.push(candidate);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Candidate<T>> {
        self.candidates
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    pub fn candidates_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Candidate<T>>> {
        self.candidates.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<T: Element> Default for StrategyRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
