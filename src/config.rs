use glam::Vec3;

use crate::error::{Result, WaterError};

/// Field resolution (256x256 = 65K cells)
pub const GRID_SIZE: u32 = 256;

/// Largest accepted field resolution
pub const MAX_GRID_SIZE: u32 = 4096;

/// Compute shader workgroup size
pub const WORKGROUP_SIZE: u32 = 16;

// ============================================
// Simulation
// ============================================

/// Velocity damping applied once per step.
///
/// The relaxation is explicit and only empirically stable: every Fourier mode
/// of the averaging operator decays for damping < 1, but the checkerboard mode
/// sits right at the edge. Re-derive the bound before touching this or
/// `RELAXATION_RATE`.
pub const DAMPING: f32 = 0.998;

/// Pull of velocity toward the neighbour average
pub const RELAXATION_RATE: f32 = 2.0;

/// Scale of the displaced-volume kernel used by `move_volume`
pub const VOLUME_SCALE: f32 = 0.1;

// ============================================
// Surface mesh
// ============================================

/// Quads along each side of the surface mesh
pub const MESH_SEGMENTS: u32 = 200;

/// World-space size of the surface (x, z)
pub const MESH_EXTENT: [f32; 2] = [100.0, 50.0];

/// Heights beyond this are clamped before displacing vertices
pub const DISPLACEMENT_CLAMP: f32 = 1.0;

pub const DISPLACEMENT_SCALE: f32 = 1.0;

/// Radial edge fade, in units of half the mesh (UV centre = 0, UV edge = 1)
pub const EDGE_FADE_INNER: f32 = 0.5;
pub const EDGE_FADE_OUTER: f32 = 1.0;

/// Fragments fainter than this are discarded
pub const DISCARD_THRESHOLD: f32 = 0.01;

// ============================================
// Shading
// ============================================

pub const WATER_COLOR: [f32; 3] = [0.8, 0.9, 1.0];
pub const REFLECTION_TINT: [f32; 3] = [0.9, 0.95, 1.0];
pub const LIGHT_DIRECTION: [f32; 3] = [2.0, 2.0, -1.0];

/// Eye used for shading when the camera mode is fixed
pub const FIXED_EYE_POSITION: [f32; 3] = [0.0, 15.0, 30.0];

pub const CAMERA_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 500.0;

/// Neighbour lookup at the grid border
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Out-of-range neighbours read the edge cell (reflective wall)
    #[default]
    Clamp,
    /// Periodic grid
    Wrap,
}

impl BoundaryMode {
    /// Value of the `boundary` field in the simulation uniform block
    pub fn shader_value(self) -> u32 {
        match self {
            BoundaryMode::Clamp => 0,
            BoundaryMode::Wrap => 1,
        }
    }

    /// Resolve a possibly out-of-range coordinate on an axis of length `n`
    pub fn resolve(self, i: i32, n: u32) -> usize {
        let n = n as i32;
        match self {
            BoundaryMode::Clamp => i.clamp(0, n - 1) as usize,
            BoundaryMode::Wrap => i.rem_euclid(n) as usize,
        }
    }
}

/// Where the shading eye comes from
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraMode {
    /// Shade as seen from a fixed point, whatever the projection camera does
    Fixed(Vec3),
    /// Shade from the current camera position
    Dynamic,
}

impl Default for CameraMode {
    fn default() -> Self {
        CameraMode::Fixed(Vec3::from(FIXED_EYE_POSITION))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub grid_size: u32,
    pub damping: f32,
    pub boundary: BoundaryMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            damping: DAMPING,
            boundary: BoundaryMode::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 2 || self.grid_size > MAX_GRID_SIZE {
            return Err(WaterError::InvalidConfig(format!(
                "grid size must be in 2..={}, got {}",
                MAX_GRID_SIZE, self.grid_size
            )));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(WaterError::InvalidConfig(format!(
                "damping must be in (0, 1], got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceConfig {
    pub mesh_segments: u32,
    pub mesh_extent: [f32; 2],
    pub displacement_clamp: f32,
    pub displacement_scale: f32,
    pub edge_fade_inner: f32,
    pub edge_fade_outer: f32,
    pub discard_threshold: f32,
    pub camera_mode: CameraMode,
    pub light_direction: Vec3,
    pub base_color: Vec3,
    pub reflection_tint: Vec3,
    /// `None` draws over whatever the target already holds
    pub clear_color: Option<[f64; 4]>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            mesh_segments: MESH_SEGMENTS,
            mesh_extent: MESH_EXTENT,
            displacement_clamp: DISPLACEMENT_CLAMP,
            displacement_scale: DISPLACEMENT_SCALE,
            edge_fade_inner: EDGE_FADE_INNER,
            edge_fade_outer: EDGE_FADE_OUTER,
            discard_threshold: DISCARD_THRESHOLD,
            camera_mode: CameraMode::default(),
            light_direction: Vec3::from(LIGHT_DIRECTION).normalize(),
            base_color: Vec3::from(WATER_COLOR),
            reflection_tint: Vec3::from(REFLECTION_TINT),
            clear_color: None,
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.mesh_segments == 0 {
            return Err(WaterError::InvalidConfig(
                "mesh needs at least one segment".into(),
            ));
        }
        let [w, d] = self.mesh_extent;
        if !(w.is_finite() && d.is_finite() && w > 0.0 && d > 0.0) {
            return Err(WaterError::InvalidConfig(format!(
                "mesh extent must be positive, got {}x{}",
                w, d
            )));
        }
        if !(self.displacement_clamp >= 0.0 && self.displacement_clamp.is_finite()) {
            return Err(WaterError::InvalidConfig(format!(
                "displacement clamp must be non-negative, got {}",
                self.displacement_clamp
            )));
        }
        if !self.displacement_scale.is_finite() {
            return Err(WaterError::InvalidConfig(
                "displacement scale must be finite".into(),
            ));
        }
        if !(self.edge_fade_inner >= 0.0 && self.edge_fade_inner < self.edge_fade_outer) {
            return Err(WaterError::InvalidConfig(format!(
                "edge fade needs 0 <= inner < outer, got {}..{}",
                self.edge_fade_inner, self.edge_fade_outer
            )));
        }
        if !(0.0..1.0).contains(&self.discard_threshold) {
            return Err(WaterError::InvalidConfig(format!(
                "discard threshold must be in [0, 1), got {}",
                self.discard_threshold
            )));
        }
        if !self.light_direction.is_normalized() {
            return Err(WaterError::InvalidConfig(
                "light direction must be a unit vector".into(),
            ));
        }
        Ok(())
    }
}

/// Full configuration for a simulator/renderer pair
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaterConfig {
    pub simulation: SimulationConfig,
    pub surface: SurfaceConfig,
}

impl WaterConfig {
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.surface.validate()
    }
}
