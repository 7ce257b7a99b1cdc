//! Host mirror of the surface shader's per-vertex and per-fragment math.
//!
//! `src/shaders/surface.wgsl` is the program that actually runs; these
//! functions follow it line for line so the shading rules can be checked
//! without a device.

use glam::{Vec2, Vec3};

use crate::config::SurfaceConfig;
use crate::simulation::{reconstruct_normal, FieldCell};

/// Floor of the fragment alpha before the edge fade
pub const MIN_ALPHA: f32 = 0.4;

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Weight of the reflection as the view grazes the surface
pub fn fresnel(view_dir: Vec3, normal: Vec3) -> f32 {
    let f = 1.0 - (-view_dir).dot(normal).clamp(0.0, 1.0);
    f * f * f
}

/// 1 inside the inner radius, 0 past the outer one; `uv` in [0, 1]²
pub fn edge_fade(uv: Vec2, inner: f32, outer: f32) -> f32 {
    let distance = ((uv - 0.5) * 2.0).length();
    1.0 - smoothstep(inner, outer, distance)
}

/// Flat mesh position for a vertex UV
pub fn mesh_position(uv: Vec2, extent: [f32; 2]) -> Vec3 {
    Vec3::new((uv.x - 0.5) * extent[0], 0.0, (0.5 - uv.y) * extent[1])
}

/// Inverse of [`mesh_position`] onto field coordinates in [-1, 1]²; `None`
/// off the mesh
pub fn field_point(world: Vec3, extent: [f32; 2]) -> Option<Vec2> {
    let uv = Vec2::new(world.x / extent[0] + 0.5, 0.5 - world.z / extent[1]);
    let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
    inside.then(|| uv * 2.0 - 1.0)
}

/// Mesh position after displacement by the sampled height
pub fn displaced_position(uv: Vec2, height: f32, config: &SurfaceConfig) -> Vec3 {
    let mut position = mesh_position(uv, config.mesh_extent);
    position.y += height.clamp(-config.displacement_clamp, config.displacement_clamp)
        * config.displacement_scale;
    position
}

/// Shade one fragment. `None` means the fragment is discarded.
pub fn shade(
    sample: FieldCell,
    world_position: Vec3,
    uv: Vec2,
    eye: Vec3,
    light_dir: Vec3,
    config: &SurfaceConfig,
) -> Option<[f32; 4]> {
    let normal = Vec3::from(reconstruct_normal(sample.normal_x, sample.normal_z));
    let view_dir = (world_position - eye).normalize();

    let fresnel = fresnel(view_dir, normal);
    let diffuse = normal.dot(light_dir).max(0.0);

    let reflection = config.reflection_tint * fresnel * 0.2;
    let mut color = config.base_color.lerp(reflection, fresnel * 0.5);
    color += Vec3::splat((diffuse * 0.8 + 0.2) * 0.3);

    let alpha = (diffuse * 0.4 + fresnel * 0.5).max(MIN_ALPHA)
        * edge_fade(uv, config.edge_fade_inner, config.edge_fade_outer);
    if alpha < config.discard_threshold {
        return None;
    }
    Some([color.x, color.y, color.z, alpha])
}
