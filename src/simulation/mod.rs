mod cell;
mod field;
pub mod kernels;

pub use cell::{reconstruct_normal, FieldCell};
pub use field::Field;

use glam::{Vec2, Vec3};

use crate::error::Result;

/// A one-shot perturbation of the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Disturbance {
    /// Bell-shaped bump centred at `center` in [-1, 1]²; negative strength depresses
    Drop {
        center: Vec2,
        radius: f32,
        strength: f32,
    },
    /// Object of `radius` moving from `old_center` to `new_center` (x, z on the
    /// plane, y vertical); leaves a source behind and a sink ahead
    Volume {
        old_center: Vec3,
        new_center: Vec3,
        radius: f32,
    },
}

impl Disturbance {
    /// Whether applying this would change nothing or poison the field with
    /// non-finite values. Such disturbances are skipped, not reported.
    pub fn is_degenerate(&self) -> bool {
        match *self {
            Disturbance::Drop {
                center,
                radius,
                strength,
            } => {
                !(radius > 0.0)
                    || !radius.is_finite()
                    || strength == 0.0
                    || !strength.is_finite()
                    || !center.is_finite()
            }
            Disturbance::Volume {
                old_center,
                new_center,
                radius,
            } => {
                !(radius > 0.0)
                    || !radius.is_finite()
                    || !old_center.is_finite()
                    || !new_center.is_finite()
                    || old_center == new_center
            }
        }
    }
}

/// Double-buffered height field advanced one write pass at a time.
///
/// Every operation reads the current buffer, writes the other one and swaps,
/// so the current buffer always holds the latest completed pass.
pub trait FieldSimulator {
    /// Cells along each side
    fn grid_size(&self) -> u32;

    /// Apply one disturbance; degenerate ones are a no-op
    fn apply(&mut self, disturbance: Disturbance) -> Result<()>;

    /// Relax heights toward the neighbour average
    fn advance(&mut self) -> Result<()>;

    /// Rebuild the stored normals from the current heights
    fn recompute_normals(&mut self) -> Result<()>;

    fn add_drop(&mut self, center: Vec2, radius: f32, strength: f32) -> Result<()> {
        self.apply(Disturbance::Drop {
            center,
            radius,
            strength,
        })
    }

    fn move_volume(&mut self, old_center: Vec3, new_center: Vec3, radius: f32) -> Result<()> {
        self.apply(Disturbance::Volume {
            old_center,
            new_center,
            radius,
        })
    }

    /// One full simulation tick
    fn update(&mut self) -> Result<()> {
        self.advance()?;
        self.recompute_normals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_drops() {
        let drop = |radius, strength| Disturbance::Drop {
            center: Vec2::ZERO,
            radius,
            strength,
        };
        assert!(drop(0.0, 1.0).is_degenerate());
        assert!(drop(-0.1, 1.0).is_degenerate());
        assert!(drop(f32::NAN, 1.0).is_degenerate());
        assert!(drop(0.1, 0.0).is_degenerate());
        assert!(drop(0.1, f32::INFINITY).is_degenerate());
        assert!(!drop(0.1, -0.5).is_degenerate());
    }

    #[test]
    fn test_degenerate_volumes() {
        let volume = |center: Vec3, radius| Disturbance::Volume {
            old_center: Vec3::ZERO,
            new_center: center,
            radius,
        };
        assert!(volume(Vec3::ZERO, 0.0).is_degenerate());
        // Not moving displaces nothing
        assert!(volume(Vec3::ZERO, 0.2).is_degenerate());
        assert!(volume(Vec3::new(f32::NAN, 0.0, 0.0), 0.2).is_degenerate());
        assert!(!volume(Vec3::new(0.1, -0.1, 0.0), 0.2).is_degenerate());
    }
}
