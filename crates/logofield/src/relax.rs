//! Jacobi relaxation of the ink field.
//!
//! Solves a Poisson-style problem with a constant source term over the ink
//! region: boundary and non-ink cells are pinned to zero every sweep, every
//! other cell becomes the average of its four orthogonal neighbors plus the
//! source term. A fixed number of sweeps over a double buffer is enough for
//! the smooth dome shape the shader wants; convergence checks are not worth
//! their cost here.

use std::mem;

use crate::mask::MaskGrid;

/// Constant source term added to every relaxed cell.
pub const SOURCE_TERM: f32 = 0.01;

/// Jacobi sweeps per extraction.
pub const RELAX_ITERATIONS: usize = 300;

/// Non-negative scalar field over the working canvas, row-major.
#[derive(Debug, Clone)]
pub struct ScalarField {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl ScalarField {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

/// Runs the full relaxation over the masked canvas.
pub fn relax(shape: &MaskGrid, boundary: &MaskGrid) -> ScalarField {
    let width = shape.width();
    let height = shape.height();
    let len = width as usize * height as usize;
    let mut current = vec![0.0f32; len];
    let mut next = vec![0.0f32; len];

    for _ in 0..RELAX_ITERATIONS {
        for y in 0..height {
            for x in 0..width {
                let idx = y as usize * width as usize + x as usize;
                if boundary.get(i64::from(x), i64::from(y)) || !shape.get(i64::from(x), i64::from(y))
                {
                    next[idx] = 0.0;
                    continue;
                }
                let sum = sample(&current, shape, i64::from(x) + 1, i64::from(y))
                    + sample(&current, shape, i64::from(x) - 1, i64::from(y))
                    + sample(&current, shape, i64::from(x), i64::from(y) + 1)
                    + sample(&current, shape, i64::from(x), i64::from(y) - 1);
                next[idx] = (SOURCE_TERM + sum) / 4.0;
            }
        }
        mem::swap(&mut current, &mut next);
    }

    ScalarField {
        width,
        height,
        values: current,
    }
}

/// A neighbor contributes its current value only while in-canvas and ink.
fn sample(values: &[f32], shape: &MaskGrid, x: i64, y: i64) -> f32 {
    if shape.get(x, y) {
        values[y as usize * shape.width() as usize + x as usize]
    } else {
        0.0
    }
}
