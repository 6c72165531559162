use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use log::debug;
use ndarray::s;

use crate::config::Config;
use crate::dicom::{DicomImageSource, ImageSource};
use crate::error::{Error, Result};
use crate::metal::MetalPatches;
use crate::PixelArray;

/// Top-left pixel at which a patch lands on the base image.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
}

impl Placement {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Parses `"Y X"` (whitespace or comma separated).
impl FromStr for Placement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 2 {
            bail!("expected \"ROW COL\", got {s:?}");
        }
        let parse = |p: &str| {
            p.parse::<usize>()
                .map_err(|err| anyhow!("invalid coordinate {p:?}: {err}"))
        };
        Ok(Placement::new(parse(parts[0])?, parse(parts[1])?))
    }
}

/// Adds `patch` (and optionally a second one) onto a copy of `base`, then
/// clips the result to `[min(result), ceiling]`.
///
/// Every placement is checked before anything is written.
pub fn insert(
    base: &PixelArray,
    patch: &PixelArray,
    at: Placement,
    second: Option<(&PixelArray, Placement)>,
    ceiling: f64,
) -> Result<PixelArray> {
    let placed: Vec<(&PixelArray, Placement)> = std::iter::once((patch, at)).chain(second).collect();
    for &(patch, at) in &placed {
        check_fits(base, patch, at)?;
    }

    let mut result = base.clone();
    for (patch, at) in placed {
        let (h, w) = patch.dim();
        let mut window = result.slice_mut(s![at.row..at.row + h, at.col..at.col + w]);
        window += patch;
    }

    let floor = result.fold(f64::INFINITY, |lo, &v| lo.min(v));
    result.mapv_inplace(|v| v.max(floor).min(ceiling));
    Ok(result)
}

fn check_fits(base: &PixelArray, patch: &PixelArray, at: Placement) -> Result<()> {
    let (base_h, base_w) = base.dim();
    let (h, w) = patch.dim();
    let fits = |start: usize, len: usize, limit: usize| start.checked_add(len).map_or(false, |end| end <= limit);
    if fits(at.row, h, base_h) && fits(at.col, w, base_w) {
        Ok(())
    } else {
        Err(Error::OutOfBounds {
            at,
            patch: (h, w),
            base: (base_h, base_w),
        })
    }
}

/// Composites metal onto a "non-metal" base image read from its own source.
pub struct Compositor<S = DicomImageSource> {
    source: S,
    ceiling: f64,
}

impl Compositor<DicomImageSource> {
    pub fn new(config: &Config) -> Self {
        Self::with_source(DicomImageSource::new(), config)
    }
}

impl<S: ImageSource> Compositor<S> {
    pub fn with_source(source: S, config: &Config) -> Self {
        Self {
            source,
            ceiling: config.intensity_ceiling,
        }
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&PixelArray> {
        let path = path.as_ref();
        self.source
            .load(path)
            .map_err(|err| Error::image_source(path, err))
    }

    pub fn base(&self) -> Option<&PixelArray> {
        self.source.current()
    }

    /// Places the only patch at `first`, or the left and right patches at
    /// `first` and `second`.
    pub fn insert(&self, patches: &MetalPatches, first: Placement, second: Placement) -> Result<PixelArray> {
        let base = self.base().ok_or(Error::StaleState("compositor"))?;
        match patches {
            MetalPatches::One(patch) => {
                debug!("inserting {:?} patch at {first}", patch.dim());
                insert(base, patch, first, None, self.ceiling)
            }
            MetalPatches::Two(left, right) => {
                debug!(
                    "inserting {:?} patch at {first} and {:?} patch at {second}",
                    left.dim(),
                    right.dim()
                );
                insert(base, left, first, Some((right, second)), self.ceiling)
            }
        }
    }
}
