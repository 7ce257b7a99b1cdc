use std::sync::Arc;
use glam::{Vec2, Vec3};
use wgpu::{BindGroup, Buffer, BufferUsages, Device, Queue, TextureFormat, TextureView};

use crate::camera::Camera;
use crate::config::{CameraMode, SurfaceConfig};
use crate::error::{Result, WaterError};
use crate::gpu::buffers::SurfaceUniforms;
use crate::gpu::render::{SurfaceMesh, SurfacePipeline};
use crate::gpu::simulator::WaterSimulator;
use crate::gpu::GpuContext;
use crate::shading;
use crate::simulation::FieldSimulator;

/// Draws the water mesh displaced and shaded by a simulator's current field
pub struct SurfaceRenderer {
    resources: Option<RendererResources>,
    config: SurfaceConfig,
    camera: Camera,
    light_direction: Vec3,
    grid_size: u32,
}

struct RendererResources {
    device: Arc<Device>,
    queue: Arc<Queue>,
    pipeline: SurfacePipeline,
    mesh: SurfaceMesh,
    uniform_buffer: Buffer,
    /// Bind groups for the last simulator seen, one per field buffer
    field_bindings: Option<FieldBindings>,
    /// Index into `field_bindings` of the current buffer
    current: usize,
}

struct FieldBindings {
    simulator_id: u64,
    /// [A, B]
    bind_groups: [BindGroup; 2],
}

impl SurfaceRenderer {
    /// Build the mesh and pipeline for drawing into targets of `format`
    pub fn new(
        ctx: &GpuContext,
        config: &SurfaceConfig,
        camera: Camera,
        format: TextureFormat,
    ) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Creating {}x{} surface mesh over {}x{} units",
            config.mesh_segments,
            config.mesh_segments,
            config.mesh_extent[0],
            config.mesh_extent[1]
        );

        let (pipeline, mesh, uniform_buffer) = ctx.capture_errors("surface renderer", || {
            let pipeline = SurfacePipeline::new(&ctx.device, format);
            let mesh = SurfaceMesh::new(&ctx.device, config.mesh_segments);
            let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("surface-uniform-buffer"),
                size: std::mem::size_of::<SurfaceUniforms>() as u64,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            (pipeline, mesh, uniform_buffer)
        })?;

        Ok(Self {
            resources: Some(RendererResources {
                device: ctx.device.clone(),
                queue: ctx.queue.clone(),
                pipeline,
                mesh,
                uniform_buffer,
                field_bindings: None,
                current: 0,
            }),
            light_direction: config.light_direction,
            config: config.clone(),
            camera,
            grid_size: 0,
        })
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light_direction(&self) -> Vec3 {
        self.light_direction
    }

    /// Normalize and store; used from the next render on
    pub fn set_light_direction(&mut self, direction: Vec3) {
        match direction.try_normalize() {
            Some(direction) => self.light_direction = direction,
            None => log::warn!("Ignoring degenerate light direction {:?}", direction),
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.aspect = aspect;
    }

    /// Eye position used for shading
    pub fn eye(&self) -> Vec3 {
        match self.config.camera_mode {
            CameraMode::Fixed(eye) => eye,
            CameraMode::Dynamic => self.camera.eye,
        }
    }

    /// Field coordinate in [-1, 1]² under a world-space point on the mesh,
    /// or `None` if the point is off the mesh
    pub fn field_point(&self, world: Vec3) -> Option<Vec2> {
        shading::field_point(world, self.config.mesh_extent)
    }

    /// Bind the simulator's current field without drawing
    pub fn update_texture(&mut self, simulator: &WaterSimulator) -> Result<()> {
        let [buffer_a, buffer_b] = simulator.field_buffers()?;
        let reads_from_a = simulator.reads_from_a()?;
        let res = self.resources.as_mut().ok_or(WaterError::Disposed)?;

        let stale = res
            .field_bindings
            .as_ref()
            .map_or(true, |bindings| bindings.simulator_id != simulator.id());
        if stale {
            log::debug!("Binding field of simulator {}", simulator.id());
            res.field_bindings = Some(FieldBindings {
                simulator_id: simulator.id(),
                bind_groups: [
                    res.pipeline
                        .create_bind_group(&res.device, buffer_a, &res.uniform_buffer),
                    res.pipeline
                        .create_bind_group(&res.device, buffer_b, &res.uniform_buffer),
                ],
            });
        }
        res.current = if reads_from_a { 0 } else { 1 };
        self.grid_size = simulator.grid_size();
        Ok(())
    }

    /// Simulator whose buffers are currently bound, if any
    pub fn bound_simulator(&self) -> Option<u64> {
        self.resources
            .as_ref()?
            .field_bindings
            .as_ref()
            .map(|bindings| bindings.simulator_id)
    }

    fn uniforms(&self) -> SurfaceUniforms {
        let c = &self.config;
        SurfaceUniforms {
            view_proj: self.camera.view_proj_matrix().to_cols_array_2d(),
            eye: self.eye().to_array(),
            displacement_clamp: c.displacement_clamp,
            light_dir: self.light_direction.to_array(),
            displacement_scale: c.displacement_scale,
            base_color: c.base_color.to_array(),
            discard_threshold: c.discard_threshold,
            reflection_tint: c.reflection_tint.to_array(),
            grid_size: self.grid_size,
            mesh_extent: c.mesh_extent,
            edge_fade_inner: c.edge_fade_inner,
            edge_fade_outer: c.edge_fade_outer,
        }
    }

    /// Bind the simulator's current field and draw the surface into `target`
    pub fn render(&mut self, simulator: &WaterSimulator, target: &TextureView) -> Result<()> {
        self.update_texture(simulator)?;
        self.draw(target)
    }

    /// Draw with whatever field was last bound by `update_texture`
    pub fn draw(&self, target: &TextureView) -> Result<()> {
        let uniforms = self.uniforms();
        let res = self.resources.as_ref().ok_or(WaterError::Disposed)?;
        let bindings = res.field_bindings.as_ref().ok_or_else(|| {
            WaterError::Resource("no field bound; call update_texture first".into())
        })?;
        let bind_group = &bindings.bind_groups[res.current];

        res.queue
            .write_buffer(&res.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = res
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("surface-encoder"),
            });
        res.pipeline
            .draw(&mut encoder, target, bind_group, &res.mesh, self.config.clear_color);
        res.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    /// Release mesh, uniforms and bindings. Safe to call more than once.
    pub fn dispose(&mut self) {
        match self.resources.take() {
            Some(res) => {
                res.mesh.destroy();
                res.uniform_buffer.destroy();
                log::debug!("Surface renderer disposed");
            }
            None => log::debug!("Surface renderer already disposed"),
        }
    }
}
