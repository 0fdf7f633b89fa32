//! Elementwise compute kernels compiled on first dispatch

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use super::context::{workgroup_grid, GpuContext};
use super::preprocessor::WgslPreprocessor;
use crate::element::Element;
use crate::error::{BenchError, BenchResult};
use crate::workload::Workload;

/// A workload's WGSL kernel specialised for `T`.
///
/// The shader module and pipeline are built by the first `dispatch` and
/// cached, so the first call carries the compilation cost.
pub struct GpuKernel<T: Element> {
    context: Arc<GpuContext>,
    workload: Workload,
    label: String,
    pipeline: Option<wgpu::ComputePipeline>,
    _element: PhantomData<T>,
}

impl<T: Element> GpuKernel<T> {
    pub fn new(context: Arc<GpuContext>, workload: Workload, label: &str) -> Self {
        Self {
            context,
            workload,
            label: label.to_string(),
            pipeline: None,
            _element: PhantomData,
        }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    pub fn is_compiled(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Preprocessed WGSL source for this kernel
    pub fn source(&self) -> BenchResult<String> {
        let template = match self.workload.arity() {
            1 => "unary.wgsl",
            _ => "ternary.wgsl",
        };
        let mut preprocessor = WgslPreprocessor::new();
        preprocessor
            .define("T", T::wgsl_type())
            .define("EXPR", self.workload.wgsl_expression::<T>())
            .define("WORKGROUP_SIZE", self.context.workgroup_size().to_string());
        preprocessor.process(template)
    }

    fn compile(&self) -> BenchResult<wgpu::ComputePipeline> {
        let start = Instant::now();
        let source = self.source()?;
        let device = self.context.device();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&self.label),
            layout: None,
            module: &module,
            entry_point: "main",
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(BenchError::ShaderCompilation {
                shader: self.label.clone(),
                message: error.to_string(),
            });
        }

        log::debug!("[GpuKernel] Compiled {} in {:?}", self.label, start.elapsed());
        Ok(pipeline)
    }

    /// Run the kernel over `len` elements and wait for completion
    pub fn dispatch(&mut self, inputs: &[wgpu::Buffer], output: &wgpu::Buffer, len: usize) -> BenchResult<()> {
        if inputs.len() != self.workload.arity() {
            return Err(BenchError::ShapeMismatch {
                strategy: self.label.clone(),
                expected: format!("{} input buffers", self.workload.arity()),
                actual: format!("{} input buffers", inputs.len()),
            });
        }

        if self.pipeline.is_none() {
            self.pipeline = Some(self.compile()?);
        }
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| BenchError::NotRun(self.label.clone()))?;

        let context = &self.context;
        let device = context.device();
        let label = self.label.as_str();
        context.scoped("dispatch", || {
            let layout = pipeline.get_bind_group_layout(0);
            let entries: Vec<wgpu::BindGroupEntry> = inputs
                .iter()
                .chain(std::iter::once(output))
                .enumerate()
                .map(|(binding, buffer)| wgpu::BindGroupEntry {
                    binding: binding as u32,
                    resource: buffer.as_entire_binding(),
                })
                .collect();
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &entries,
            });

            let (groups_x, groups_y) = workgroup_grid(
                len,
                context.workgroup_size(),
                context.max_workgroups_per_dimension(),
            );

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(label),
            });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(label),
                    timestamp_writes: None,
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }

            context.queue().submit(std::iter::once(encoder.finish()));
            device.poll(wgpu::Maintain::Wait);
        })?;
        Ok(())
    }
}
