use glam::Vec2;

use crate::config::{BoundaryMode, SimulationConfig};
use crate::error::{Result, WaterError};
use crate::simulation::cell::FieldCell;
use crate::simulation::kernels;
use crate::simulation::{Disturbance, FieldSimulator};

/// Host-side field running the same passes as the GPU simulator.
///
/// Provides the initial upload for the GPU buffers and a reference to check
/// the GPU kernels against.
pub struct Field {
    size: u32,
    damping: f32,
    boundary: BoundaryMode,
    buffers: [Vec<FieldCell>; 2],
    current: usize,
}

impl Field {
    /// Flat field at rest
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let cell_count = (config.grid_size * config.grid_size) as usize;
        Ok(Self {
            size: config.grid_size,
            damping: config.damping,
            boundary: config.boundary,
            buffers: [
                vec![FieldCell::REST; cell_count],
                vec![FieldCell::REST; cell_count],
            ],
            current: 0,
        })
    }

    /// Field starting from the given cells (row-major, `grid_size²` of them)
    pub fn from_cells(config: &SimulationConfig, cells: Vec<FieldCell>) -> Result<Self> {
        let mut field = Self::new(config)?;
        if cells.len() != field.buffers[0].len() {
            return Err(WaterError::InvalidConfig(format!(
                "expected {} cells, got {}",
                field.buffers[0].len(),
                cells.len()
            )));
        }
        field.buffers[field.current] = cells;
        Ok(field)
    }

    /// Latest completed state
    pub fn current(&self) -> &[FieldCell] {
        &self.buffers[self.current]
    }

    pub fn cell(&self, x: usize, y: usize) -> FieldCell {
        self.current()[y * self.size as usize + x]
    }

    /// Bilinear sample at a normalized coordinate, clamped to the edge cells.
    /// Matches how the surface shader reads the field.
    pub fn sample(&self, coord: Vec2) -> FieldCell {
        let n = self.size;
        let p = coord * n as f32 - 0.5;
        let base = p.floor();
        let f = p - base;
        let (x0, y0) = (base.x as i32, base.y as i32);
        let at = |x: i32, y: i32| {
            let x = BoundaryMode::Clamp.resolve(x, n);
            let y = BoundaryMode::Clamp.resolve(y, n);
            self.current()[y * n as usize + x]
        };
        let lerp = |a: FieldCell, b: FieldCell, t: f32| FieldCell {
            height: a.height + (b.height - a.height) * t,
            velocity: a.velocity + (b.velocity - a.velocity) * t,
            normal_x: a.normal_x + (b.normal_x - a.normal_x) * t,
            normal_z: a.normal_z + (b.normal_z - a.normal_z) * t,
        };
        let bottom = lerp(at(x0, y0), at(x0 + 1, y0), f.x);
        let top = lerp(at(x0, y0 + 1), at(x0 + 1, y0 + 1), f.x);
        lerp(bottom, top, f.y)
    }

    /// Variance of the height channel about its mean
    pub fn height_variance(&self) -> f64 {
        let cells = self.current();
        let count = cells.len() as f64;
        let mean = cells.iter().map(|c| c.height as f64).sum::<f64>() / count;
        cells
            .iter()
            .map(|c| {
                let d = c.height as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / count
    }

    /// Read current, write next, swap
    fn write_pass<F>(&mut self, kernel: F)
    where
        F: Fn(&[FieldCell], usize, usize) -> FieldCell,
    {
        let n = self.size as usize;
        let next_index = 1 - self.current;
        let mut next = std::mem::take(&mut self.buffers[next_index]);
        let src = &self.buffers[self.current];
        for y in 0..n {
            for x in 0..n {
                next[y * n + x] = kernel(src, x, y);
            }
        }
        self.buffers[next_index] = next;
        self.current = next_index;
    }
}

/// Neighbour of `(x, y)` offset by `(dx, dy)` under the boundary policy
fn neighbour(
    src: &[FieldCell],
    n: u32,
    boundary: BoundaryMode,
    x: usize,
    y: usize,
    dx: i32,
    dy: i32,
) -> FieldCell {
    let nx = boundary.resolve(x as i32 + dx, n);
    let ny = boundary.resolve(y as i32 + dy, n);
    src[ny * n as usize + nx]
}

impl FieldSimulator for Field {
    fn grid_size(&self) -> u32 {
        self.size
    }

    fn apply(&mut self, disturbance: Disturbance) -> Result<()> {
        if disturbance.is_degenerate() {
            log::trace!("Skipping degenerate disturbance {:?}", disturbance);
            return Ok(());
        }
        let n = self.size;
        match disturbance {
            Disturbance::Drop {
                center,
                radius,
                strength,
            } => self.write_pass(|src, x, y| {
                let mut cell = src[y * n as usize + x];
                let coord = kernels::cell_coord(x, y, n);
                cell.height += kernels::drop_profile(coord, center, radius) * strength;
                cell
            }),
            Disturbance::Volume {
                old_center,
                new_center,
                radius,
            } => self.write_pass(|src, x, y| {
                let mut cell = src[y * n as usize + x];
                let coord = kernels::cell_coord(x, y, n);
                cell.height += kernels::volume_in_sphere(coord, old_center, radius)
                    - kernels::volume_in_sphere(coord, new_center, radius);
                cell
            }),
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        let (n, boundary, damping) = (self.size, self.boundary, self.damping);
        self.write_pass(|src, x, y| {
            let mut cell = src[y * n as usize + x];
            let average = (neighbour(src, n, boundary, x, y, -1, 0).height
                + neighbour(src, n, boundary, x, y, 0, -1).height
                + neighbour(src, n, boundary, x, y, 1, 0).height
                + neighbour(src, n, boundary, x, y, 0, 1).height)
                * 0.25;
            let (height, velocity) = kernels::relax(cell.height, cell.velocity, average, damping);
            cell.height = height;
            cell.velocity = velocity;
            cell
        });
        Ok(())
    }

    fn recompute_normals(&mut self) -> Result<()> {
        let (n, boundary) = (self.size, self.boundary);
        let delta = 1.0 / n as f32;
        self.write_pass(|src, x, y| {
            let mut cell = src[y * n as usize + x];
            let (nx, nz) = kernels::surface_normal(
                cell.height,
                neighbour(src, n, boundary, x, y, 1, 0).height,
                neighbour(src, n, boundary, x, y, 0, 1).height,
                delta,
            );
            cell.normal_x = nx;
            cell.normal_z = nz;
            cell
        });
        Ok(())
    }
}
