use std::path::Path;

use anyhow::{bail, Context, Result};
use dicom_object::{open_file, InMemDicomObject};
use ndarray::Array2;

use crate::dicom_attributes;
use crate::PixelArray;

dicom_attributes!(ImagePixel {
    rows: u16 = "(0028,0010)" "Rows" required,
    columns: u16 = "(0028,0011)" "Columns" required,
    bits_allocated: u16 = "(0028,0100)" "BitsAllocated" optional,
    pixel_representation: u16 = "(0028,0103)" "PixelRepresentation" optional,
});

/// One CT slice: the attributes that describe its pixels plus the raw
/// PixelData bytes.
#[derive(Debug, Clone)]
pub struct CTImage {
    pub pixel: ImagePixel,
    pub pixel_data: Vec<u8>,
}

impl CTImage {
    pub fn from_file(path: &Path) -> Result<CTImage> {
        let obj = open_file(path)
            .with_context(|| format!("cannot open DICOM file {}", path.display()))?;
        Self::from_dicom_object(&obj)
    }

    pub fn from_dicom_object(obj: &InMemDicomObject) -> Result<CTImage> {
        Ok(CTImage {
            pixel: ImagePixel::from_dicom_object(obj)?,
            pixel_data: obj.element_by_name("PixelData")?.to_bytes()?.to_vec(),
        })
    }

    /// Stored pixel values as a `rows x columns` array.
    ///
    /// Only native little-endian pixel data is understood. No modality LUT is
    /// applied: the metal threshold is defined on stored values.
    pub fn to_pixel_array(&self) -> Result<PixelArray> {
        let rows = self.pixel.rows as usize;
        let columns = self.pixel.columns as usize;
        let count = rows * columns;
        let bits = self.pixel.bits_allocated.unwrap_or(16);
        let signed = self.pixel.pixel_representation.unwrap_or(0) == 1;

        let bytes_per_pixel = match bits {
            8 => 1,
            16 => 2,
            other => bail!("unsupported BitsAllocated {other}"),
        };
        let needed = count * bytes_per_pixel;
        if self.pixel_data.len() < needed {
            bail!(
                "PixelData holds {} bytes, {}x{} pixels at {} bits need {}",
                self.pixel_data.len(),
                rows,
                columns,
                bits,
                needed
            );
        }
        let raw = &self.pixel_data[..needed];

        let values: Vec<f64> = match (bytes_per_pixel, signed) {
            (1, false) => raw.iter().map(|&v| f64::from(v)).collect(),
            (1, true) => raw.iter().map(|&v| f64::from(v as i8)).collect(),
            (_, false) => bytemuck::pod_collect_to_vec::<u8, u16>(raw)
                .into_iter()
                .map(f64::from)
                .collect(),
            (_, true) => bytemuck::pod_collect_to_vec::<u8, i16>(raw)
                .into_iter()
                .map(f64::from)
                .collect(),
        };

        Ok(Array2::from_shape_vec((rows, columns), values)?)
    }
}
