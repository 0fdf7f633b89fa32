//! Run configuration
//!
//! Every workload has built-in defaults for size, precision and repetition
//! count. An optional TOML file overrides them per workload:
//!
//! ```toml
//! [discriminant]
//! size = 2_000_000
//! dtype = "f32"
//! seed = 42
//! repetitions = 10
//! strategies = ["loop", "fused", "gpu"]
//!
//! [discriminant.repetition_overrides]
//! loop = 2
//!
//! [gpu]
//! backends = ["vulkan"]
//!
//! [report]
//! precision = 4
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::element::DType;
use crate::error::{BenchError, BenchResult};
use crate::strategy::ALL_STRATEGIES;
use crate::workload::Workload;

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "SPEEDUP_CONFIG";

/// Largest workgroup guaranteed by the default wgpu limits
const MAX_WORKGROUP_SIZE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    LowPower,
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(value: PowerPreference) -> Self {
        match value {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// GPU adapter selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpuConfig {
    /// Backend names: `vulkan`, `metal`, `dx12`, `gl`, `browser-webgpu`,
    /// `primary`, `secondary` or `all`. An empty list selects no backend.
    pub backends: Vec<String>,
    pub power_preference: PowerPreference,
    pub force_fallback_adapter: bool,
    pub workgroup_size: u32,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            backends: vec!["primary".to_string()],
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            workgroup_size: 256,
        }
    }
}

impl GpuConfig {
    /// Resolve backend names into a wgpu backend set
    pub fn backends(&self) -> BenchResult<wgpu::Backends> {
        let mut backends = wgpu::Backends::empty();
        for name in &self.backends {
            backends |= match name.to_ascii_lowercase().as_str() {
                "vulkan" => wgpu::Backends::VULKAN,
                "metal" => wgpu::Backends::METAL,
                "dx12" => wgpu::Backends::DX12,
                "gl" => wgpu::Backends::GL,
                "browser-webgpu" => wgpu::Backends::BROWSER_WEBGPU,
                "primary" => wgpu::Backends::PRIMARY,
                "secondary" => wgpu::Backends::SECONDARY,
                "all" => wgpu::Backends::all(),
                other => {
                    return Err(BenchError::Config(format!("unknown GPU backend '{}'", other)))
                }
            };
        }
        Ok(backends)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelConfig {
    /// Worker threads for the parallel strategy, 0 means one per CPU
    pub threads: usize,
}

impl ParallelConfig {
    pub fn thread_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Decimal places for seconds per call
    pub precision: usize,
    /// Print speedups relative to the first strategy after the timings
    pub summary: bool,
    /// Compare every strategy's output against the reference after timing
    pub verify: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: 6,
            summary: false,
            verify: false,
        }
    }
}

/// Per-workload overrides read from the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadOverrides {
    pub size: Option<usize>,
    pub dtype: Option<DType>,
    pub seed: Option<u64>,
    pub repetitions: Option<u32>,
    pub repetition_overrides: HashMap<String, u32>,
    pub strategies: Option<Vec<String>>,
}

/// On-disk configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub sine: WorkloadOverrides,
    pub discriminant: WorkloadOverrides,
    pub gpu: GpuConfig,
    pub parallel: ParallelConfig,
    pub report: ReportConfig,
}

impl ConfigFile {
    pub fn parse(raw: &str) -> BenchResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> BenchResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    fn overrides(&self, workload: Workload) -> &WorkloadOverrides {
        match workload {
            Workload::Sine => &self.sine,
            Workload::Discriminant => &self.discriminant,
        }
    }
}

/// Fully resolved parameters of one benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub workload: Workload,
    pub size: usize,
    pub dtype: DType,
    pub seed: Option<u64>,
    pub repetitions: u32,
    pub repetition_overrides: HashMap<String, u32>,
    pub strategies: Vec<String>,
    pub gpu: GpuConfig,
    pub parallel: ParallelConfig,
    pub report: ReportConfig,
}

impl BenchConfig {
    /// Defaults for a workload
    pub fn defaults(workload: Workload) -> Self {
        let (size, dtype, repetitions) = match workload {
            // f32 keeps the counting sequence exact and the GPU path usable
            Workload::Sine => (10_000_000, DType::F32, 3),
            Workload::Discriminant => (1_000_000, DType::F64, 5),
        };
        Self {
            workload,
            size,
            dtype,
            seed: None,
            repetitions,
            repetition_overrides: HashMap::new(),
            strategies: ALL_STRATEGIES.iter().map(|s| s.to_string()).collect(),
            gpu: GpuConfig::default(),
            parallel: ParallelConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Apply a configuration file on top of the workload defaults
    pub fn resolve(workload: Workload, file: &ConfigFile) -> BenchResult<Self> {
        let mut config = Self::defaults(workload);
        let overrides = file.overrides(workload);

        if let Some(size) = overrides.size {
            config.size = size;
        }
        if let Some(dtype) = overrides.dtype {
            config.dtype = dtype;
        }
        if overrides.seed.is_some() {
            config.seed = overrides.seed;
        }
        if let Some(repetitions) = overrides.repetitions {
            config.repetitions = repetitions;
        }
        if let Some(strategies) = &overrides.strategies {
            config.strategies = strategies.clone();
        }
        config.repetition_overrides = overrides.repetition_overrides.clone();
        config.gpu = file.gpu.clone();
        config.parallel = file.parallel.clone();
        config.report = file.report.clone();

        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file path, falling back to defaults
    pub fn load(workload: Workload, path: Option<&Path>) -> BenchResult<Self> {
        match path {
            Some(path) => {
                log::info!("[Config] Loading {}", path.display());
                Self::resolve(workload, &ConfigFile::from_path(path)?)
            }
            None => {
                let config = Self::defaults(workload);
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load using the first command line argument or `SPEEDUP_CONFIG`
    pub fn from_args(workload: Workload, mut args: impl Iterator<Item = String>) -> BenchResult<Self> {
        let path = args
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
            .map(PathBuf::from);
        Self::load(workload, path.as_deref())
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.size == 0 {
            return Err(BenchError::Config("size must be positive".to_string()));
        }
        if self.repetitions == 0 {
            return Err(BenchError::Config("repetitions must be positive".to_string()));
        }
        if self.strategies.is_empty() {
            return Err(BenchError::Config("at least one strategy is required".to_string()));
        }

        let mut seen = HashSet::new();
        for name in &self.strategies {
            if !ALL_STRATEGIES.contains(&name.as_str()) {
                return Err(BenchError::UnknownStrategy(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(BenchError::Config(format!("strategy '{}' listed twice", name)));
            }
        }
        for (name, &count) in &self.repetition_overrides {
            if !ALL_STRATEGIES.contains(&name.as_str()) {
                return Err(BenchError::UnknownStrategy(name.clone()));
            }
            if count == 0 {
                return Err(BenchError::Config(format!(
                    "repetitions for '{}' must be positive",
                    name
                )));
            }
        }

        if self.gpu.workgroup_size == 0 || self.gpu.workgroup_size > MAX_WORKGROUP_SIZE {
            return Err(BenchError::Config(format!(
                "gpu.workgroup_size must be in 1..={}",
                MAX_WORKGROUP_SIZE
            )));
        }
        self.gpu.backends()?;

        if self.report.precision > 12 {
            return Err(BenchError::Config("report.precision must be at most 12".to_string()));
        }
        Ok(())
    }
}
