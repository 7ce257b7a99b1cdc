//! Real-time water surface on the GPU.
//!
//! A double-buffered height field ([`WaterSimulator`]) is disturbed by drops
//! and moving volumes, relaxed one step per frame, and handed to a
//! [`SurfaceRenderer`] that displaces and shades a mesh from it.
//! [`simulation::Field`] runs the same passes on the host.

pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod shading;
pub mod simulation;

pub use camera::Camera;
pub use config::{BoundaryMode, CameraMode, SimulationConfig, SurfaceConfig, WaterConfig};
pub use error::{Result, WaterError};
pub use gpu::{GpuContext, SurfaceRenderer, WaterSimulator};
pub use simulation::{Disturbance, Field, FieldCell, FieldSimulator};
