//! Per-cell update rules shared by the CPU field.
//!
//! `src/shaders/simulation.wgsl` implements the same formulas; keep the two
//! in step.

use glam::{Vec2, Vec3};

use crate::config::{RELAXATION_RATE, VOLUME_SCALE};

/// Normalized coordinate of the centre of cell `(x, y)` on an `n`-wide grid
pub fn cell_coord(x: usize, y: usize, n: u32) -> Vec2 {
    (Vec2::new(x as f32, y as f32) + 0.5) / n as f32
}

/// Field-space centre for a cell, the inverse of the drop mapping
pub fn cell_center(x: usize, y: usize, n: u32) -> Vec2 {
    cell_coord(x, y, n) * 2.0 - 1.0
}

/// Smoothed bump of a drop at `coord`; 1 at the centre, 0 at `radius` and beyond
pub fn drop_profile(coord: Vec2, center: Vec2, radius: f32) -> f32 {
    let drop = (1.0 - (center * 0.5 + 0.5 - coord).length() / radius).max(0.0);
    0.5 - (drop * std::f32::consts::PI).cos() * 0.5
}

/// Water column displaced at `coord` by a sphere at `center`
pub fn volume_in_sphere(coord: Vec2, center: Vec3, radius: f32) -> f32 {
    let to_center = Vec3::new(coord.x * 2.0 - 1.0, 0.0, coord.y * 2.0 - 1.0) - center;
    let t = to_center.length() / radius * 1.5;
    let t2 = t * t;
    let dy = (-(t2 * t2 * t2)).exp();
    let ymin = (center.y - dy).min(0.0);
    let ymax = (center.y + dy).max(0.0).min(ymin + 2.0 * dy);
    (ymax - ymin) * VOLUME_SCALE
}

/// One relaxation step; returns the new `(height, velocity)`
pub fn relax(height: f32, velocity: f32, average: f32, damping: f32) -> (f32, f32) {
    let velocity = (velocity + (average - height) * RELAXATION_RATE) * damping;
    (height + velocity, velocity)
}

/// Normal of the surface from forward differences; returns the stored (x, z)
pub fn surface_normal(height: f32, height_x: f32, height_y: f32, delta: f32) -> (f32, f32) {
    let dx = Vec3::new(delta, height_x - height, 0.0);
    let dy = Vec3::new(0.0, height_y - height, delta);
    let n = dy.cross(dx).normalize();
    (n.x, n.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_profile_peaks_at_center() {
        let c = Vec2::new(0.2, -0.4);
        let coord = c * 0.5 + 0.5;
        assert!((drop_profile(coord, c, 0.1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_drop_profile_vanishes_at_radius() {
        let coord = Vec2::new(0.5, 0.5);
        // 0.2 away in field space is 0.1 in coordinate space
        assert_eq!(drop_profile(coord + Vec2::new(0.1, 0.0), Vec2::ZERO, 0.1), 0.0);
        assert_eq!(drop_profile(coord + Vec2::new(0.3, 0.2), Vec2::ZERO, 0.1), 0.0);
    }

    #[test]
    fn test_drop_profile_is_monotonic() {
        let mut last = f32::MAX;
        for i in 0..20 {
            let coord = Vec2::new(0.5 + i as f32 * 0.005, 0.5);
            let p = drop_profile(coord, Vec2::ZERO, 0.1);
            assert!(p <= last);
            last = p;
        }
    }

    #[test]
    fn test_volume_decays_away_from_sphere() {
        let center = Vec3::new(0.0, 0.0, 0.0);
        let near = volume_in_sphere(Vec2::new(0.5, 0.5), center, 0.25);
        let far = volume_in_sphere(Vec2::new(0.9, 0.9), center, 0.25);
        assert!(near > 0.0);
        assert!(far < 1e-6);
    }

    #[test]
    fn test_volume_of_sphere_above_water_is_zero() {
        // Sphere floating well above the surface displaces nothing
        let center = Vec3::new(0.0, 3.0, 0.0);
        assert!(volume_in_sphere(Vec2::new(0.5, 0.5), center, 0.25) < 1e-6);
    }

    #[test]
    fn test_relax_flat_is_fixed_point() {
        assert_eq!(relax(0.25, 0.0, 0.25, 0.998), (0.25, 0.0));
    }

    #[test]
    fn test_flat_normal_points_up() {
        let (x, z) = surface_normal(0.5, 0.5, 0.5, 1.0 / 256.0);
        assert_eq!((x, z), (0.0, 0.0));
    }

    #[test]
    fn test_slope_tilts_normal_downhill() {
        // Height rising toward +x tilts the normal toward -x
        let (x, z) = surface_normal(0.0, 0.01, 0.0, 1.0 / 256.0);
        assert!(x < 0.0);
        assert_eq!(z, 0.0);
    }
}
