/// GPU-compatible field cell.
///
/// Layout: 16 bytes, one `vec4<f32>` in WGSL.
/// - height: f32 (r) - surface displacement
/// - velocity: f32 (g) - vertical velocity
/// - normal_x: f32 (b) - x component of the surface normal
/// - normal_z: f32 (a) - z component of the surface normal
///
/// The vertical normal component is not stored; readers rebuild it with
/// [`reconstruct_normal`]. The all-zero rest cell therefore has a flat,
/// upward normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FieldCell {
    pub height: f32,
    pub velocity: f32,
    pub normal_x: f32,
    pub normal_z: f32,
}

impl FieldCell {
    /// Flat water at rest
    pub const REST: FieldCell = FieldCell {
        height: 0.0,
        velocity: 0.0,
        normal_x: 0.0,
        normal_z: 0.0,
    };

    /// Cell with the given height, at rest
    pub fn with_height(height: f32) -> Self {
        Self {
            height,
            ..Self::REST
        }
    }

    /// Full unit normal (x, y up, z)
    pub fn normal(&self) -> [f32; 3] {
        reconstruct_normal(self.normal_x, self.normal_z)
    }
}

/// Rebuild a normal from its two stored components.
///
/// The implied vertical component is `sqrt(1 - x² - z²)`; the radicand is
/// clamped to [0, 1] so encodings with `x² + z² > 1` (interpolation, float
/// drift) yield a horizontal normal instead of NaN.
pub fn reconstruct_normal(x: f32, z: f32) -> [f32; 3] {
    let y = (1.0 - x * x - z * z).clamp(0.0, 1.0).sqrt();
    [x, y, z]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_cell_size() {
        assert_eq!(std::mem::size_of::<FieldCell>(), 16);
    }

    #[test]
    fn test_rest_normal_points_up() {
        assert_eq!(FieldCell::REST.normal(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_reconstructed_normal_is_unit() {
        let samples = [(0.0, 0.0), (0.3, -0.4), (-0.6, 0.8), (0.1, 0.05), (0.7, 0.0)];
        for (x, z) in samples {
            let n = reconstruct_normal(x, z);
            assert!(
                (length(n) - 1.0).abs() < 1e-5,
                "normal from ({}, {}) has length {}",
                x,
                z,
                length(n)
            );
            assert!(n[1] >= 0.0);
        }
    }

    #[test]
    fn test_overlong_encoding_is_clamped() {
        let n = reconstruct_normal(0.9, 0.9);
        assert!(n.iter().all(|c| c.is_finite()));
        assert_eq!(n[1], 0.0);
        assert_eq!(n[0], 0.9);
        assert_eq!(n[2], 0.9);
    }
}
