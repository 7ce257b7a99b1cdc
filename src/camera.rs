use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::config::{CAMERA_FAR, CAMERA_FOV_Y, CAMERA_NEAR, FIXED_EYE_POSITION};

/// Perspective camera looking at a target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::from(FIXED_EYE_POSITION),
            target: Vec3::ZERO,
            fov_y: CAMERA_FOV_Y,
            aspect: 16.0 / 9.0,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn proj_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect.max(1e-3), self.near, self.far)
    }

    pub fn view_proj_matrix(&self) -> Mat4 {
        self.proj_matrix() * self.view_matrix()
    }

    /// Point where the ray through `ndc` (x, y in [-1, 1], y up) meets the
    /// plane y = 0, if it does in front of the camera
    pub fn pick_water_plane(&self, ndc: Vec2) -> Option<Vec3> {
        let inverse = self.view_proj_matrix().inverse();
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;

        let dir = far - near;
        if dir.y.abs() < f32::EPSILON {
            return None;
        }
        let t = -near.y / dir.y;
        (t >= 0.0).then(|| near + dir * t)
    }

    /// Circle the target at the current height and distance
    pub fn orbit(&mut self, angle: f32) {
        let offset = self.eye - self.target;
        let radius = Vec2::new(offset.x, offset.z).length();
        self.eye = self.target + Vec3::new(radius * angle.sin(), offset.y, radius * angle.cos());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_hits_target() {
        let camera = Camera::default();
        let hit = camera.pick_water_plane(Vec2::ZERO).unwrap();
        assert!(hit.length() < 1e-2, "hit {:?}", hit);
    }

    #[test]
    fn test_ray_above_horizon_misses() {
        let camera = Camera {
            eye: Vec3::new(0.0, 5.0, 0.0),
            target: Vec3::new(0.0, 5.0, -10.0),
            ..Default::default()
        };
        assert!(camera.pick_water_plane(Vec2::new(0.0, 0.5)).is_none());
        assert!(camera.pick_water_plane(Vec2::new(0.0, -0.5)).is_some());
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        let before = camera.eye.distance(camera.target);
        camera.orbit(1.3);
        assert!((camera.eye.distance(camera.target) - before).abs() < 1e-4);
        assert_eq!(camera.eye.y, FIXED_EYE_POSITION[1]);
    }
}
