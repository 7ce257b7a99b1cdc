mod context;
mod buffers;
mod compute;
mod render;
mod simulator;
mod renderer;

pub use context::{GpuContext, WindowSurface};
pub use buffers::{FieldBuffers, SimParams, SurfaceUniforms};
pub use compute::{Kernel, SimulationPipelines};
pub use render::{grid_geometry, MeshVertex, SurfaceMesh, SurfacePipeline};
pub use simulator::WaterSimulator;
pub use renderer::SurfaceRenderer;
