use std::path::{Path, PathBuf};

use log::{debug, info};

use super::region::{derive_regions, MetalRegions};
use super::transform::{Interpolation, TransformParams};
use crate::config::Config;
use crate::dicom::{DicomImageSource, ImageSource};
use crate::error::{Error, Result};
use crate::PixelArray;

/// Transformed metal, ready to be composited. Mirrors [`MetalRegions`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetalPatches {
    One(PixelArray),
    Two(PixelArray, PixelArray),
}

impl MetalPatches {
    pub fn count(&self) -> usize {
        match self {
            MetalPatches::One(_) => 1,
            MetalPatches::Two(..) => 2,
        }
    }
}

/// Extracts metal from a "metal" source image.
///
/// Regions are memoized per path: loading the same path twice derives them
/// once.
pub struct MetalExtractor<S = DicomImageSource> {
    source: S,
    threshold: f64,
    interpolation: Interpolation,
    path: Option<PathBuf>,
    regions: Option<MetalRegions>,
}

impl MetalExtractor<DicomImageSource> {
    pub fn new(config: &Config) -> Self {
        Self::with_source(DicomImageSource::new(), config)
    }
}

impl<S: ImageSource> MetalExtractor<S> {
    pub fn with_source(source: S, config: &Config) -> Self {
        Self {
            source,
            threshold: config.metal_threshold,
            interpolation: config.rotation_interpolation,
            path: None,
            regions: None,
        }
    }

    /// Reads `path` and derives its metal regions, unless `path` is the one
    /// already loaded. On failure the previous regions are forgotten.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&MetalRegions> {
        let path = path.as_ref();
        let cached = self.regions.is_some() && self.path.as_deref() == Some(path);
        if cached {
            debug!("metal regions of {} already derived", path.display());
        } else {
            self.path = None;
            self.regions = None;
            let image = self
                .source
                .load(path)
                .map_err(|err| Error::image_source(path, err))?;
            let regions = derive_regions(image, self.threshold)?;
            info!("{}: {} metal region(s)", path.display(), regions.count());
            self.path = Some(path.to_path_buf());
            self.regions = Some(regions);
        }
        self.regions.as_ref().ok_or(Error::StaleState("metal extractor"))
    }

    pub fn regions(&self) -> Option<&MetalRegions> {
        self.regions.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rotates then zooms each region. `first` applies to the only region,
    /// or to the left one when there are two; `second` to the right one.
    pub fn patch(&self, first: TransformParams, second: TransformParams) -> Result<MetalPatches> {
        match self.regions.as_ref() {
            None => Err(Error::StaleState("metal extractor")),
            Some(MetalRegions::One(region)) => {
                if second != TransformParams::default() {
                    debug!("single metal region, ignoring {second:?}");
                }
                Ok(MetalPatches::One(first.apply(&region.patch, self.interpolation)?))
            }
            Some(MetalRegions::Two { left, right }) => Ok(MetalPatches::Two(
                first.apply(&left.patch, self.interpolation)?,
                second.apply(&right.patch, self.interpolation)?,
            )),
        }
    }
}
