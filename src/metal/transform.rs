use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::PixelArray;

/// Largest output extent, per axis, a transform may produce.
const MAX_EXTENT: usize = 1 << 16;

/// Sampling used when rotating a patch. Zoom is always nearest-neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Geometric transform of one metal patch: rotation first, then zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    pub zoom: f64,
    /// Degrees, counter-clockwise.
    pub angle: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            angle: 0.0,
        }
    }
}

impl TransformParams {
    pub fn new(zoom: f64, angle: f64) -> Self {
        Self { zoom, angle }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.angle.is_finite() {
            return Err(Error::BadTransformParameter {
                name: "angle",
                value: self.angle,
            });
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(Error::BadTransformParameter {
                name: "zoom",
                value: self.zoom,
            });
        }
        Ok(())
    }

    pub fn apply(&self, patch: &PixelArray, interpolation: Interpolation) -> Result<PixelArray> {
        self.validate()?;
        let rotated = rotate(patch, self.angle, interpolation)?;
        zoom(&rotated, self.zoom)
    }
}

/// Rotates `patch` by `angle` degrees about its center on an expanded
/// canvas that holds the whole rotated patch. Uncovered pixels are 0.
pub fn rotate(patch: &PixelArray, angle: f64, interpolation: Interpolation) -> Result<PixelArray> {
    if !angle.is_finite() {
        return Err(Error::BadTransformParameter {
            name: "angle",
            value: angle,
        });
    }
    if angle.rem_euclid(360.0) == 0.0 {
        return Ok(patch.clone());
    }

    let (rows, cols) = patch.dim();
    let (c, s) = cos_sin_degrees(angle);
    // (row, col) -> (c*row + s*col, -s*row + c*col)
    let map = |r: f64, q: f64| (c * r + s * q, -s * r + c * q);

    let corners = [
        map(0.0, 0.0),
        map(0.0, cols as f64),
        map(rows as f64, 0.0),
        map(rows as f64, cols as f64),
    ];
    let extent = |pick: fn(&(f64, f64)) -> f64| {
        let lo = corners.iter().map(pick).fold(f64::INFINITY, f64::min);
        let hi = corners.iter().map(pick).fold(f64::NEG_INFINITY, f64::max);
        (hi - lo + 0.5).floor() as usize
    };
    let out_rows = extent(|p| p.0);
    let out_cols = extent(|p| p.1);
    check_extent("angle", angle, out_rows, out_cols)?;

    let (out_cr, out_cc) = map(
        (out_rows as f64 - 1.0) / 2.0,
        (out_cols as f64 - 1.0) / 2.0,
    );
    let offset_r = (rows as f64 - 1.0) / 2.0 - out_cr;
    let offset_c = (cols as f64 - 1.0) / 2.0 - out_cc;

    Ok(Array2::from_shape_fn((out_rows, out_cols), |(i, j)| {
        let (r, q) = map(i as f64, j as f64);
        let (r, q) = (r + offset_r, q + offset_c);
        match interpolation {
            Interpolation::Nearest => sample_nearest(patch, r, q),
            Interpolation::Bilinear => sample_bilinear(patch, r, q),
        }
    }))
}

/// Rescales `patch` by `factor` with nearest-neighbour (order 0) sampling.
///
/// Output extent is `round(extent * factor)` per axis; the first and last
/// output pixels align with the first and last input pixels.
pub fn zoom(patch: &PixelArray, factor: f64) -> Result<PixelArray> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::BadTransformParameter {
            name: "zoom",
            value: factor,
        });
    }
    if factor == 1.0 {
        return Ok(patch.clone());
    }

    let (rows, cols) = patch.dim();
    let out_rows = (rows as f64 * factor).round_ties_even() as usize;
    let out_cols = (cols as f64 * factor).round_ties_even() as usize;
    check_extent("zoom", factor, out_rows, out_cols)?;

    let src_rows = nearest_indices(rows, out_rows);
    let src_cols = nearest_indices(cols, out_cols);
    Ok(Array2::from_shape_fn((out_rows, out_cols), |(i, j)| {
        patch[(src_rows[i], src_cols[j])]
    }))
}

fn check_extent(name: &'static str, value: f64, rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 || rows > MAX_EXTENT || cols > MAX_EXTENT {
        return Err(Error::BadTransformParameter { name, value });
    }
    Ok(())
}

fn nearest_indices(input: usize, output: usize) -> Vec<usize> {
    if output <= 1 || input <= 1 {
        return vec![0; output];
    }
    let step = (input - 1) as f64 / (output - 1) as f64;
    (0..output)
        .map(|i| ((i as f64 * step + 0.5).floor() as usize).min(input - 1))
        .collect()
}

// exact values at quarter turns keep 90 degree rotations lossless
fn cos_sin_degrees(angle: f64) -> (f64, f64) {
    let a = angle.rem_euclid(360.0);
    if a == 90.0 {
        (0.0, 1.0)
    } else if a == 180.0 {
        (-1.0, 0.0)
    } else if a == 270.0 {
        (0.0, -1.0)
    } else {
        let rad = a.to_radians();
        (rad.cos(), rad.sin())
    }
}

fn pixel(patch: &PixelArray, r: i64, q: i64) -> f64 {
    if r < 0 || q < 0 {
        return 0.0;
    }
    patch.get((r as usize, q as usize)).copied().unwrap_or(0.0)
}

fn sample_nearest(patch: &PixelArray, r: f64, q: f64) -> f64 {
    pixel(patch, (r + 0.5).floor() as i64, (q + 0.5).floor() as i64)
}

fn sample_bilinear(patch: &PixelArray, r: f64, q: f64) -> f64 {
    let r0 = r.floor();
    let q0 = q.floor();
    let fr = r - r0;
    let fq = q - q0;
    let (r0, q0) = (r0 as i64, q0 as i64);

    let mut acc = 0.0;
    for (dr, wr) in [(0, 1.0 - fr), (1, fr)] {
        for (dq, wq) in [(0, 1.0 - fq), (1, fq)] {
            let w = wr * wq;
            if w > 0.0 {
                acc += w * pixel(patch, r0 + dr, q0 + dq);
            }
        }
    }
    acc
}
