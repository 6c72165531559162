mod extractor;
mod region;
mod transform;

pub use extractor::{MetalExtractor, MetalPatches};
pub use region::{derive_regions, BoundingBox, MetalRegion, MetalRegions};
pub use transform::{rotate, zoom, Interpolation, TransformParams};
