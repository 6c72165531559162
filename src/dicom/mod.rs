mod ct_image;
mod dicom_helper;
mod image_source;

pub use ct_image::{CTImage, ImagePixel};
pub use dicom_helper::get_value;
pub use image_source::{DicomImageSource, ImageSource};
