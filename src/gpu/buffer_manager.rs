//! Host/device transfers for elementwise kernels

use wgpu::util::DeviceExt;

use super::context::GpuContext;
use crate::element::Element;
use crate::error::{gpu_operation_error, BenchResult, GpuErrorContext};

impl GpuContext {
    /// Upload a host array into a read-only storage buffer
    pub fn upload<T: Element>(&self, label: &str, data: &[T]) -> BenchResult<wgpu::Buffer> {
        log::trace!("[GpuBuffers] Uploading {} ({} bytes)", label, std::mem::size_of_val(data));
        self.scoped("upload", || {
            self.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE,
            })
        })
    }

    /// Allocate a writable storage buffer for `len` elements
    pub fn create_output<T: Element>(&self, label: &str, len: usize) -> BenchResult<wgpu::Buffer> {
        self.scoped("create_output", || {
            self.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (len * std::mem::size_of::<T>()) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        })
    }

    /// Copy `len` elements of a storage buffer back to the host.
    ///
    /// Blocks until the copy has completed and the staging buffer is mapped.
    pub fn read_back<T: Element>(&self, source: &wgpu::Buffer, len: usize) -> BenchResult<Vec<T>> {
        let size = (len * std::mem::size_of::<T>()) as u64;
        let staging = self.scoped("readback", || {
            let staging = self.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("Readback Staging"),
                size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let mut encoder = self
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Readback"),
                });
            encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
            self.queue().submit(std::iter::once(encoder.finish()));
            staging
        })?;

        let slice = staging.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // Receiver only disappears if the caller already bailed out
            let _ = tx.send(result);
        });
        self.device().poll(wgpu::Maintain::Wait);

        pollster::block_on(rx)
            .map_err(|_| gpu_operation_error("readback", "map callback was dropped"))?
            .gpu_context("readback")?;

        let values = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, T>(&data).to_vec()
        };
        staging.unmap();

        Ok(values)
    }
}
