use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::error::{Result, WaterError};
use crate::simulation::FieldCell;

/// Manages ping-pong storage buffers for the field
pub struct FieldBuffers {
    /// Buffer A - ping
    pub buffer_a: Buffer,
    /// Buffer B - pong
    pub buffer_b: Buffer,
    /// Uniform buffer for simulation parameters
    pub params_buffer: Buffer,
    /// Which buffer is current (true = A is current, false = B is current)
    read_from_a: bool,
    /// Cells along each side
    pub grid_size: u32,
}

/// Simulation parameters passed to the compute kernels (64 bytes, aligned to 16).
/// Each kernel reads only the fields it needs.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimParams {
    // Grid info (16 bytes)
    pub grid_size: u32,
    pub boundary: u32,
    pub damping: f32,
    pub radius: f32,

    // Drop (16 bytes)
    pub strength: f32,
    pub _padding: f32,
    pub drop_center: [f32; 2],

    // Volume move (32 bytes) - vec3 + pad each
    pub old_center: [f32; 4],
    pub new_center: [f32; 4],
}

/// Surface shading uniforms (144 bytes, aligned to 16)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SurfaceUniforms {
    pub view_proj: [[f32; 4]; 4],

    pub eye: [f32; 3],
    pub displacement_clamp: f32,

    pub light_dir: [f32; 3],
    pub displacement_scale: f32,

    pub base_color: [f32; 3],
    pub discard_threshold: f32,

    pub reflection_tint: [f32; 3],
    pub grid_size: u32,

    pub mesh_extent: [f32; 2],
    pub edge_fade_inner: f32,
    pub edge_fade_outer: f32,
}

impl FieldBuffers {
    /// Create new field buffers and upload the initial cells to both
    pub fn new(device: &Device, queue: &Queue, grid_size: u32, initial_data: &[FieldCell]) -> Result<Self> {
        let cell_count = (grid_size * grid_size) as usize;
        if initial_data.len() != cell_count {
            return Err(WaterError::InvalidConfig(format!(
                "initial data has {} cells, grid needs {}",
                initial_data.len(),
                cell_count
            )));
        }

        let buffer_size = Self::byte_size(grid_size);
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        if buffer_size > limit {
            return Err(WaterError::Resource(format!(
                "field of {}x{} needs {} bytes per buffer, device allows {}",
                grid_size, grid_size, buffer_size, limit
            )));
        }

        let usage = BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC;
        let buffer_a = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field-buffer-a"),
            size: buffer_size,
            usage,
            mapped_at_creation: false,
        });

        let buffer_b = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field-buffer-b"),
            size: buffer_size,
            usage,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sim-params-buffer"),
            size: std::mem::size_of::<SimParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&buffer_a, 0, bytemuck::cast_slice(initial_data));
        queue.write_buffer(&buffer_b, 0, bytemuck::cast_slice(initial_data));

        Ok(Self {
            buffer_a,
            buffer_b,
            params_buffer,
            read_from_a: true,
            grid_size,
        })
    }

    fn byte_size(grid_size: u32) -> u64 {
        grid_size as u64 * grid_size as u64 * std::mem::size_of::<FieldCell>() as u64
    }

    /// Get (input_buffer, output_buffer) for the next pass
    pub fn get_io_buffers(&self) -> (&Buffer, &Buffer) {
        if self.read_from_a {
            (&self.buffer_a, &self.buffer_b)
        } else {
            (&self.buffer_b, &self.buffer_a)
        }
    }

    /// Buffer holding the latest completed pass
    pub fn current(&self) -> &Buffer {
        self.get_io_buffers().0
    }

    /// Whether A is current; selects the matching cached bind group
    pub fn reads_from_a(&self) -> bool {
        self.read_from_a
    }

    /// Swap buffers after a pass
    pub fn swap(&mut self) {
        self.read_from_a = !self.read_from_a;
    }

    pub fn write_params(&self, queue: &Queue, params: &SimParams) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Copy the current buffer back to the host. Blocks until the GPU is done.
    pub fn read_current(&self, device: &Device, queue: &Queue) -> Result<Vec<FieldCell>> {
        let size = Self::byte_size(self.grid_size);
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field-staging-buffer"),
            size,
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("field-readback-encoder"),
        });
        encoder.copy_buffer_to_buffer(self.current(), 0, &staging_buffer, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(result) => result?,
            Err(_) => return Err(WaterError::ReadbackDisconnected),
        }

        let cells = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, FieldCell>(&data).to_vec()
        };
        staging_buffer.unmap();
        Ok(cells)
    }

    /// Release both field buffers and the params buffer
    pub fn destroy(&self) {
        self.buffer_a.destroy();
        self.buffer_b.destroy();
        self.params_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_params_size() {
        assert_eq!(std::mem::size_of::<SimParams>(), 64);
    }

    #[test]
    fn test_surface_uniforms_size() {
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 144);
        assert_eq!(std::mem::size_of::<SurfaceUniforms>() % 16, 0);
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(FieldBuffers::byte_size(256), 256 * 256 * 16);
    }
}
