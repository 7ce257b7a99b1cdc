use wgpu::{BindGroup, BindGroupLayout, Buffer, ComputePipeline, Device};
use crate::config::WORKGROUP_SIZE;

/// One write pass over the field; discriminant indexes the pipeline array
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    Drop,
    Volume,
    Step,
    Normals,
}

impl Kernel {
    const ALL: [Kernel; 4] = [Kernel::Drop, Kernel::Volume, Kernel::Step, Kernel::Normals];

    fn entry_point(self) -> &'static str {
        match self {
            Kernel::Drop => "apply_drop",
            Kernel::Volume => "apply_volume",
            Kernel::Step => "relax_step",
            Kernel::Normals => "update_normals",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kernel::Drop => "drop-pass",
            Kernel::Volume => "volume-pass",
            Kernel::Step => "step-pass",
            Kernel::Normals => "normals-pass",
        }
    }
}

/// Compute pipelines for the four field kernels, sharing one layout
pub struct SimulationPipelines {
    pipelines: [ComputePipeline; 4],
    bind_group_layout: BindGroupLayout,
}

impl SimulationPipelines {
    /// Create the simulation program and its pipelines
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("simulation-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/simulation.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simulation-bind-group-layout"),
            entries: &[
                // Current field (read-only storage)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Next field (read-write storage)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Simulation parameters (uniform)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("simulation-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Kernel::ALL.map(|kernel| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.label()),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(kernel.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        });

        Self {
            pipelines,
            bind_group_layout,
        }
    }

    /// Create a bind group reading `input` and writing `output`
    pub fn create_bind_group(
        &self,
        device: &Device,
        input_buffer: &Buffer,
        output_buffer: &Buffer,
        params_buffer: &Buffer,
    ) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("simulation-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Dispatch one kernel over the whole grid
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kernel: Kernel,
        bind_group: &BindGroup,
        grid_size: u32,
    ) {
        let workgroups = grid_size.div_ceil(WORKGROUP_SIZE);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(kernel.label()),
            timestamp_writes: None,
        });

        pass.set_pipeline(&self.pipelines[kernel as usize]);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups, workgroups, 1);
    }
}
