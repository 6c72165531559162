use log::debug;
use ndarray::{s, ArrayView2};

use crate::error::{Error, Result};
use crate::PixelArray;

/// Inclusive pixel bounds of a region, in source-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl BoundingBox {
    /// Smallest box holding every element for which `keep` is true.
    pub fn enclosing(view: ArrayView2<'_, f64>, keep: impl Fn(f64) -> bool) -> Option<Self> {
        view.indexed_iter()
            .filter(|(_, &v)| keep(v))
            .fold(None, |acc: Option<BoundingBox>, ((r, c), _)| {
                Some(match acc {
                    None => BoundingBox {
                        row_min: r,
                        row_max: r,
                        col_min: c,
                        col_max: c,
                    },
                    Some(b) => BoundingBox {
                        row_min: b.row_min.min(r),
                        row_max: b.row_max.max(r),
                        col_min: b.col_min.min(c),
                        col_max: b.col_max.max(c),
                    },
                })
            })
    }

    pub fn height(&self) -> usize {
        self.row_max - self.row_min + 1
    }

    pub fn width(&self) -> usize {
        self.col_max - self.col_min + 1
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    fn shift_cols(self, offset: usize) -> Self {
        BoundingBox {
            col_min: self.col_min + offset,
            col_max: self.col_max + offset,
            ..self
        }
    }
}

/// A cropped metal region: pixels below the threshold are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MetalRegion {
    pub bbox: BoundingBox,
    pub patch: PixelArray,
}

/// Metal found in one source image. `Two` when it splits into a left and a
/// right part.
#[derive(Debug, Clone, PartialEq)]
pub enum MetalRegions {
    One(MetalRegion),
    Two { left: MetalRegion, right: MetalRegion },
}

impl MetalRegions {
    pub fn count(&self) -> usize {
        match self {
            MetalRegions::One(_) => 1,
            MetalRegions::Two { .. } => 2,
        }
    }
}

/// Finds the metal in `image`: every pixel at or above `threshold`.
///
/// Metal on both sides of the column midpoint (`width / 2`) is split there
/// into a left and a right region, each cropped on its own. Anything else is
/// cropped as a single region.
pub fn derive_regions(image: &PixelArray, threshold: f64) -> Result<MetalRegions> {
    let is_metal = |v: f64| v >= threshold;
    let clipped = image.mapv(|v| if is_metal(v) { v } else { 0.0 });
    let mid = image.ncols() / 2;

    let left = BoundingBox::enclosing(clipped.slice(s![.., ..mid]), is_metal);
    let right = BoundingBox::enclosing(clipped.slice(s![.., mid..]), is_metal)
        .map(|b| b.shift_cols(mid));
    let regions = match (left, right) {
        (Some(left), Some(right)) => MetalRegions::Two {
            left: crop(&clipped, left),
            right: crop(&clipped, right),
        },
        _ => match BoundingBox::enclosing(clipped.view(), is_metal) {
            Some(bbox) => MetalRegions::One(crop(&clipped, bbox)),
            None => return Err(Error::NoMetalFound { threshold }),
        },
    };
    debug!("derived {} metal region(s): {:?}", regions.count(), bounds(&regions));
    Ok(regions)
}

fn crop(clipped: &PixelArray, bbox: BoundingBox) -> MetalRegion {
    let patch = clipped
        .slice(s![bbox.row_min..=bbox.row_max, bbox.col_min..=bbox.col_max])
        .to_owned();
    MetalRegion { bbox, patch }
}

fn bounds(regions: &MetalRegions) -> Vec<BoundingBox> {
    match regions {
        MetalRegions::One(region) => vec![region.bbox],
        MetalRegions::Two { left, right } => vec![left.bbox, right.bbox],
    }
}
