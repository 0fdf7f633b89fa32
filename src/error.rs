//! Benchmark error handling
//!
//! Every failure aborts the run. Nothing here is retried or recovered
//! locally; the variants only exist so the failing backend or candidate is
//! named in the diagnostic.

use crate::element::DType;

/// Result type used throughout the crate
pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Backend unavailable for strategy '{strategy}': {reason}")]
    BackendUnavailable { strategy: String, reason: String },

    #[error("Strategy '{strategy}' does not support {dtype} input")]
    UnsupportedPrecision { strategy: String, dtype: DType },

    #[error("Shape mismatch in '{strategy}': expected {expected}, got {actual}")]
    ShapeMismatch {
        strategy: String,
        expected: String,
        actual: String,
    },

    #[error("Shader compilation failed for {shader}: {message}")]
    ShaderCompilation { shader: String, message: String },

    #[error("GPU operation '{operation}' failed: {error}")]
    GpuOperation { operation: String, error: String },

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Strategy '{0}' has not produced any output yet")]
    NotRun(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Attach a GPU operation name to foreign errors
pub trait GpuErrorContext<T> {
    fn gpu_context(self, operation: &str) -> BenchResult<T>;
}

impl<T, E> GpuErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn gpu_context(self, operation: &str) -> BenchResult<T> {
        self.map_err(|e| gpu_operation_error(operation, e))
    }
}

/// Create a GPU operation error
pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> BenchError {
    BenchError::GpuOperation {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

/// Create a length mismatch error for a candidate
pub fn length_mismatch(strategy: &str, expected: usize, actual: usize) -> BenchError {
    BenchError::ShapeMismatch {
        strategy: strategy.to_string(),
        expected: format!("{} elements", expected),
        actual: format!("{} elements", actual),
    }
}
