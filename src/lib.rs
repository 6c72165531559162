use std::path::PathBuf;

use log::info;

pub mod compositor;
pub mod config;
pub mod dicom;
pub mod error;
pub mod metal;
pub mod output;

#[cfg(test)]
pub(crate) mod testing;

pub use compositor::{Compositor, Placement};
pub use config::Config;
pub use dicom::{CTImage, DicomImageSource, ImagePixel, ImageSource};
pub use error::{Error, Result};
pub use metal::{MetalExtractor, MetalPatches, MetalRegions, TransformParams};
pub use output::SavedComposite;

/// A 2-D grid of CT intensities, indexed `(row, col)`.
pub type PixelArray = ndarray::Array2<f64>;

/// Everything one insertion needs: which images, where, and how to
/// transform the metal. `second*` only matter when the metal image holds two
/// regions.
#[derive(Debug, Clone)]
pub struct InsertRequest {
    pub base: PathBuf,
    pub metal: PathBuf,
    pub first: Placement,
    pub first_transform: TransformParams,
    pub second: Placement,
    pub second_transform: TransformParams,
    pub save: bool,
}

impl InsertRequest {
    pub fn new(base: impl Into<PathBuf>, metal: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            metal: metal.into(),
            first: Placement::default(),
            first_transform: TransformParams::default(),
            second: Placement::default(),
            second_transform: TransformParams::default(),
            save: true,
        }
    }
}

#[derive(Debug)]
pub struct InsertOutcome {
    pub composite: PixelArray,
    pub regions: usize,
    pub saved: Option<SavedComposite>,
}

/// Loads both images, extracts and transforms the metal, and inserts it.
pub fn composite<S: ImageSource>(
    extractor: &mut MetalExtractor<S>,
    compositor: &mut Compositor<S>,
    request: &InsertRequest,
) -> Result<PixelArray> {
    compositor.load(&request.base)?;
    extractor.load(&request.metal)?;
    let patches = extractor.patch(request.first_transform, request.second_transform)?;
    compositor.insert(&patches, request.first, request.second)
}

/// One full cycle against DICOM files, saving into `config.output_dir`
/// when the request asks for it.
pub fn run(request: &InsertRequest, config: &Config) -> anyhow::Result<InsertOutcome> {
    info!("base image:  {}", request.base.display());
    info!("metal image: {}", request.metal.display());
    info!(
        "first: at {} zoom {} angle {}; second: at {} zoom {} angle {}",
        request.first,
        request.first_transform.zoom,
        request.first_transform.angle,
        request.second,
        request.second_transform.zoom,
        request.second_transform.angle
    );

    let mut extractor = MetalExtractor::new(config);
    let mut compositor = Compositor::new(config);
    let composite = composite(&mut extractor, &mut compositor, request)?;
    let regions = extractor.regions().map_or(0, MetalRegions::count);

    let saved = if request.save {
        Some(output::save_composite(
            &config.output_dir,
            &request.base,
            &request.metal,
            &composite,
        )?)
    } else {
        None
    };

    Ok(InsertOutcome {
        composite,
        regions,
        saved,
    })
}
