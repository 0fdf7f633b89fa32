//! GPU backend for the device strategies
//!
//! Provides device acquisition, WGSL templating, lazily compiled elementwise
//! pipelines and host/device transfers. Every call blocks until the device
//! is idle again.

pub mod buffer_manager;
pub mod context;
pub mod kernel;
pub mod preprocessor;

pub use context::{workgroup_grid, GpuContext};
pub use kernel::GpuKernel;
pub use preprocessor::WgslPreprocessor;
