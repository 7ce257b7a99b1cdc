use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use wgpu::{BindGroup, Buffer, Device, Queue};

use crate::config::SimulationConfig;
use crate::error::{Result, WaterError};
use crate::gpu::buffers::{FieldBuffers, SimParams};
use crate::gpu::compute::{Kernel, SimulationPipelines};
use crate::gpu::GpuContext;
use crate::simulation::{Disturbance, Field, FieldCell, FieldSimulator};

/// GPU-resident water field.
///
/// Each operation is a single compute pass submitted on its own: params are
/// written, the pass reads the current buffer and writes the other one, then
/// the buffers swap.
pub struct WaterSimulator {
    id: u64,
    resources: Option<SimulatorResources>,
    params: SimParams,
}

static NEXT_SIMULATOR_ID: AtomicU64 = AtomicU64::new(0);

struct SimulatorResources {
    device: Arc<Device>,
    queue: Arc<Queue>,
    buffers: FieldBuffers,
    pipelines: SimulationPipelines,
    /// [A -> B, B -> A]
    bind_groups: [BindGroup; 2],
}

impl WaterSimulator {
    /// Allocate the field on the GPU, flat and at rest
    pub fn new(ctx: &GpuContext, config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let initial = Field::new(config)?;
        Self::with_cells(ctx, config, initial.current())
    }

    /// Allocate the field on the GPU starting from the given cells
    pub fn with_cells(ctx: &GpuContext, config: &SimulationConfig, cells: &[FieldCell]) -> Result<Self> {
        config.validate()?;
        let grid_size = config.grid_size;
        log::info!("Creating {}x{} water field", grid_size, grid_size);

        let buffers = ctx.capture_errors("field buffers", || {
            FieldBuffers::new(&ctx.device, &ctx.queue, grid_size, cells)
        })??;
        let (pipelines, bind_groups) = ctx.capture_errors("simulation pipelines", || {
            let pipelines = SimulationPipelines::new(&ctx.device);
            let bind_groups = [
                pipelines.create_bind_group(
                    &ctx.device,
                    &buffers.buffer_a,
                    &buffers.buffer_b,
                    &buffers.params_buffer,
                ),
                pipelines.create_bind_group(
                    &ctx.device,
                    &buffers.buffer_b,
                    &buffers.buffer_a,
                    &buffers.params_buffer,
                ),
            ];
            (pipelines, bind_groups)
        })?;

        let params = SimParams {
            grid_size,
            boundary: config.boundary.shader_value(),
            damping: config.damping,
            radius: 0.0,
            strength: 0.0,
            _padding: 0.0,
            drop_center: [0.0, 0.0],
            old_center: [0.0; 4],
            new_center: [0.0; 4],
        };

        Ok(Self {
            id: NEXT_SIMULATOR_ID.fetch_add(1, Ordering::Relaxed),
            resources: Some(SimulatorResources {
                device: ctx.device.clone(),
                queue: ctx.queue.clone(),
                buffers,
                pipelines,
                bind_groups,
            }),
            params,
        })
    }

    fn resources(&self) -> Result<&SimulatorResources> {
        self.resources.as_ref().ok_or(WaterError::Disposed)
    }

    /// Buffer holding the latest completed pass, one `FieldCell` per cell
    pub fn current_field(&self) -> Result<&Buffer> {
        Ok(self.resources()?.buffers.current())
    }

    /// Distinct per simulator; lets a renderer tell whose buffers it bound
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Both field buffers, A then B. Neither changes for the simulator's lifetime.
    pub fn field_buffers(&self) -> Result<[&Buffer; 2]> {
        let buffers = &self.resources()?.buffers;
        Ok([&buffers.buffer_a, &buffers.buffer_b])
    }

    /// Whether buffer A holds the latest completed pass
    pub fn reads_from_a(&self) -> Result<bool> {
        Ok(self.resources()?.buffers.reads_from_a())
    }

    /// Copy the current field back to the host
    pub fn read_field(&self) -> Result<Vec<FieldCell>> {
        let res = self.resources()?;
        res.buffers.read_current(&res.device, &res.queue)
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    /// Release the field buffers. Safe to call more than once.
    pub fn dispose(&mut self) {
        match self.resources.take() {
            Some(res) => {
                res.buffers.destroy();
                log::debug!("Water field disposed");
            }
            None => log::debug!("Water field already disposed"),
        }
    }

    fn run(&mut self, kernel: Kernel) -> Result<()> {
        let params = self.params;
        let res = self.resources.as_mut().ok_or(WaterError::Disposed)?;
        res.buffers.write_params(&res.queue, &params);

        let mut encoder = res
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("field-encoder"),
            });
        let bind_group = if res.buffers.reads_from_a() {
            &res.bind_groups[0]
        } else {
            &res.bind_groups[1]
        };
        res.pipelines
            .dispatch(&mut encoder, kernel, bind_group, res.buffers.grid_size);
        res.queue.submit(std::iter::once(encoder.finish()));

        res.buffers.swap();
        Ok(())
    }
}

impl FieldSimulator for WaterSimulator {
    fn grid_size(&self) -> u32 {
        self.params.grid_size
    }

    fn apply(&mut self, disturbance: Disturbance) -> Result<()> {
        self.resources()?;
        if disturbance.is_degenerate() {
            log::trace!("Skipping degenerate disturbance {:?}", disturbance);
            return Ok(());
        }
        match disturbance {
            Disturbance::Drop {
                center,
                radius,
                strength,
            } => {
                self.params.drop_center = center.to_array();
                self.params.radius = radius;
                self.params.strength = strength;
                self.run(Kernel::Drop)
            }
            Disturbance::Volume {
                old_center,
                new_center,
                radius,
            } => {
                self.params.old_center = old_center.extend(0.0).to_array();
                self.params.new_center = new_center.extend(0.0).to_array();
                self.params.radius = radius;
                self.run(Kernel::Volume)
            }
        }
    }

    fn advance(&mut self) -> Result<()> {
        self.run(Kernel::Step)
    }

    fn recompute_normals(&mut self) -> Result<()> {
        self.run(Kernel::Normals)
    }
}
