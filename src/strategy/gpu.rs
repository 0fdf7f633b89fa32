//! Device strategies
//!
//! `gpu` moves the input to the device, computes and retrieves the result on
//! every call. `gpu-resident` uploads once during `prepare` and leaves the
//! result on the device, so its timings exclude both transfers.

use super::{BuildContext, Candidate, Warmup};
use crate::element::Element;
use crate::error::{length_mismatch, BenchError, BenchResult};
use crate::gpu::GpuKernel;
use crate::workload::{BenchInput, Workload};

const GPU_TRANSFER: &str = "gpu";
const GPU_RESIDENT: &str = "gpu-resident";

fn build_kernel<T: Element>(ctx: &mut BuildContext<'_>, strategy: &str) -> BenchResult<GpuKernel<T>> {
    let workload = ctx.config().workload;
    let context = ctx.gpu(strategy)?;
    context.check_precision(strategy, workload, T::DTYPE)?;
    Ok(GpuKernel::new(context, workload, &kernel_label(strategy, workload)))
}

fn kernel_label(strategy: &str, workload: Workload) -> String {
    format!("{} {} kernel", strategy, workload)
}

fn upload_columns<T: Element>(
    kernel: &GpuKernel<T>,
    input: &BenchInput<T>,
) -> BenchResult<Vec<wgpu::Buffer>> {
    let names = input.workload().column_names();
    input
        .columns()
        .iter()
        .zip(names)
        .map(|(column, name)| kernel.context().upload(name, column))
        .collect()
}

/// Upload, compute and download on every call
pub struct GpuTransferCandidate<T: Element> {
    kernel: GpuKernel<T>,
    last: Option<Vec<T>>,
}

impl<T: Element> GpuTransferCandidate<T> {
    pub fn new(ctx: &mut BuildContext<'_>) -> BenchResult<Self> {
        Ok(Self {
            kernel: build_kernel(ctx, GPU_TRANSFER)?,
            last: None,
        })
    }
}

impl<T: Element> Candidate<T> for GpuTransferCandidate<T> {
    fn name(&self) -> &str {
        GPU_TRANSFER
    }

    fn label(&self) -> &str {
        "Time with gpu + memory"
    }

    fn warmup(&self) -> Warmup {
        Warmup::Compiles
    }

    fn prepare(&mut self, input: &BenchInput<T>) -> BenchResult<()> {
        self.kernel.context().check_len(GPU_TRANSFER, input.len(), T::DTYPE)
    }

    fn call(&mut self, input: &BenchInput<T>) -> BenchResult<()> {
        let len = input.len();
        let inputs = upload_columns(&self.kernel, input)?;
        let output = self.kernel.context().create_output::<T>("results", len)?;
        self.kernel.dispatch(&inputs, &output, len)?;
        self.last = Some(self.kernel.context().read_back(&output, len)?);
        Ok(())
    }

    fn output(&mut self) -> BenchResult<Vec<T>> {
        self.last
            .clone()
            .ok_or_else(|| BenchError::NotRun(GPU_TRANSFER.to_string()))
    }
}

struct DeviceArrays {
    inputs: Vec<wgpu::Buffer>,
    output: wgpu::Buffer,
    len: usize,
}

/// Compute on arrays that already live on the device
pub struct GpuResidentCandidate<T: Element> {
    kernel: GpuKernel<T>,
    arrays: Option<DeviceArrays>,
    dispatched: bool,
}

impl<T: Element> GpuResidentCandidate<T> {
    pub fn new(ctx: &mut BuildContext<'_>) -> BenchResult<Self> {
        Ok(Self {
            kernel: build_kernel(ctx, GPU_RESIDENT)?,
            arrays: None,
            dispatched: false,
        })
    }
}

impl<T: Element> Candidate<T> for GpuResidentCandidate<T> {
    fn name(&self) -> &str {
        GPU_RESIDENT
    }

    fn label(&self) -> &str {
        "Time with gpu (device resident)"
    }

    fn warmup(&self) -> Warmup {
        Warmup::Compiles
    }

    fn prepare(&mut self, input: &BenchInput<T>) -> BenchResult<()> {
        let len = input.len();
        self.kernel.context().check_len(GPU_RESIDENT, len, T::DTYPE)?;
        let inputs = upload_columns(&self.kernel, input)?;
        let output = self.kernel.context().create_output::<T>("results", len)?;
        self.arrays = Some(DeviceArrays { inputs, output, len });
        self.dispatched = false;
        log::debug!("[GpuResident] Uploaded {} bytes", input.size_bytes());
        Ok(())
    }

    fn call(&mut self, input: &BenchInput<T>) -> BenchResult<()> {
        let arrays = self.arrays.as_ref().ok_or_else(|| BenchError::GpuOperation {
            operation: "dispatch".to_string(),
            error: format!("{} input was not uploaded before the first call", GPU_RESIDENT),
        })?;
        if arrays.len != input.len() {
            return Err(length_mismatch(GPU_RESIDENT, arrays.len, input.len()));
        }
        self.kernel.dispatch(&arrays.inputs, &arrays.output, arrays.len)?;
        self.dispatched = true;
        Ok(())
    }

    fn output(&mut self) -> BenchResult<Vec<T>> {
        match &self.arrays {
            Some(arrays) if self.dispatched => self.kernel.context().read_back(&arrays.output, arrays.len),
            _ => Err(BenchError::NotRun(GPU_RESIDENT.to_string())),
        }
    }
}
