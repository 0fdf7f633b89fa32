//! GPU device acquisition

use crate::config::GpuConfig;
use crate::element::DType;
use crate::error::{gpu_operation_error, BenchError, BenchResult};
use crate::workload::Workload;

/// Grid dimension limit guaranteed by the default wgpu limits
const DEFAULT_MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// An initialised device and queue shared by every GPU strategy of a run
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    supports_f64: bool,
    max_binding_size: u64,
    max_workgroups_per_dimension: u32,
    workgroup_size: u32,
}

impl GpuContext {
    /// Acquire an adapter and device.
    ///
    /// Fails with `BackendUnavailable` naming `strategy` when no adapter
    /// matches the configured backends. There is no CPU fallback.
    pub fn new(config: &GpuConfig, strategy: &str) -> BenchResult<Self> {
        let unavailable = |reason: String| BenchError::BackendUnavailable {
            strategy: strategy.to_string(),
            reason,
        };

        let backends = config.backends()?;
        if backends.is_empty() {
            return Err(unavailable("no GPU backends are enabled".to_string()));
        }

        log::info!("[GPU] Requesting adapter for backends {:?}", backends);
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference.into(),
            compatible_surface: None,
            force_fallback_adapter: config.force_fallback_adapter,
        }))
        .ok_or_else(|| unavailable(format!("no GPU adapter found for backends {:?}", backends)))?;

        let info = adapter.get_info();
        let supports_f64 = adapter.features().contains(wgpu::Features::SHADER_F64);
        let required_features = if supports_f64 {
            wgpu::Features::SHADER_F64
        } else {
            wgpu::Features::empty()
        };
        let limits = adapter.limits();

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Speedup Benchmark Device"),
                required_features,
                required_limits: limits.clone(),
            },
            None,
        ))
        .map_err(|e| unavailable(format!("device request failed: {}", e)))?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            log::error!("[GPU] Uncaptured device error: {}", error);
        }));

        log::info!(
            "[GPU] Using {} ({:?}, {:?}), f64 shaders: {}",
            info.name,
            info.backend,
            info.device_type,
            supports_f64
        );

        Ok(Self {
            device,
            queue,
            supports_f64,
            max_binding_size: u64::from(limits.max_storage_buffer_binding_size),
            max_workgroups_per_dimension: limits
                .max_compute_workgroups_per_dimension
                .min(DEFAULT_MAX_WORKGROUPS_PER_DIMENSION)
                .max(1),
            workgroup_size: config.workgroup_size,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn workgroup_size(&self) -> u32 {
        self.workgroup_size
    }

    pub fn max_workgroups_per_dimension(&self) -> u32 {
        self.max_workgroups_per_dimension
    }

    /// Run `f` with out-of-memory and validation errors captured.
    ///
    /// Any error raised by the device while `f` runs fails `operation`
    /// instead of reaching the uncaptured error handler.
    pub fn scoped<R>(&self, operation: &str, f: impl FnOnce() -> R) -> BenchResult<R> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(error) => Err(gpu_operation_error(operation, error)),
            None => Ok(result),
        }
    }

    /// Reject element types the device cannot compute in
    pub fn check_precision(&self, strategy: &str, workload: Workload, dtype: DType) -> BenchResult<()> {
        // f64 transcendentals are not available in shaders even with SHADER_F64
        let supported = match dtype {
            DType::F32 => true,
            DType::F64 => self.supports_f64 && workload != Workload::Sine,
        };
        if supported {
            Ok(())
        } else {
            Err(BenchError::UnsupportedPrecision {
                strategy: strategy.to_string(),
                dtype,
            })
        }
    }

    /// Reject arrays that do not fit in a single storage binding
    pub fn check_len(&self, strategy: &str, len: usize, dtype: DType) -> BenchResult<()> {
        let bytes = (len as u64).saturating_mul(dtype.size_of() as u64);
        if bytes > self.max_binding_size {
            return Err(BenchError::ShapeMismatch {
                strategy: strategy.to_string(),
                expected: format!("at most {} bytes per array", self.max_binding_size),
                actual: format!("{} bytes ({} elements)", bytes, len),
            });
        }
        Ok(())
    }
}

/// Workgroup grid covering `len` elements.
///
/// Groups beyond the per-dimension limit spill into `y`; the shader
/// flattens the grid back into a linear index and bounds-checks it.
pub fn workgroup_grid(len: usize, workgroup_size: u32, max_per_dimension: u32) -> (u32, u32) {
    let groups = (len as u64).div_ceil(u64::from(workgroup_size)).max(1);
    let x = groups.min(u64::from(max_per_dimension));
    let y = groups.div_ceil(x);
    (x as u32, y as u32)
}
