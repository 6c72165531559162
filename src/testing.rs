//! Fixtures shared by the unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use ndarray::{s, Array2};

use crate::dicom::ImageSource;
use crate::PixelArray;

pub(crate) fn filled(rows: usize, cols: usize, value: f64) -> PixelArray {
    Array2::from_elem((rows, cols), value)
}

pub(crate) fn with_block(mut image: PixelArray, rows: Range<usize>, cols: Range<usize>, value: f64) -> PixelArray {
    image.slice_mut(s![rows, cols]).fill(value);
    image
}

const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

/// Writes `image` as a 16-bit unsigned single-frame CT file.
pub(crate) fn write_ct(path: &Path, image: &PixelArray) -> Result<()> {
    let (rows, columns) = image.dim();
    let pixels: Vec<u16> = image.iter().map(|&v| v as u16).collect();
    let bytes = bytemuck::cast_slice::<u16, u8>(&pixels).to_vec();
    let obj = InMemDicomObject::from_element_iter([
        DataElement::new(Tag(0x0008, 0x0016), VR::UI, PrimitiveValue::from(CT_IMAGE_STORAGE)),
        DataElement::new(Tag(0x0008, 0x0018), VR::UI, PrimitiveValue::from("1.2.3.4")),
        DataElement::new(Tag(0x0028, 0x0010), VR::US, PrimitiveValue::from(rows as u16)),
        DataElement::new(Tag(0x0028, 0x0011), VR::US, PrimitiveValue::from(columns as u16)),
        DataElement::new(Tag(0x0028, 0x0100), VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(Tag(0x0028, 0x0103), VR::US, PrimitiveValue::from(0_u16)),
        DataElement::new(Tag(0x7FE0, 0x0010), VR::OB, PrimitiveValue::from(bytes)),
    ]);
    let file = obj.with_meta(
        FileMetaTableBuilder::new()
            .transfer_syntax(EXPLICIT_VR_LE)
            .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
            .media_storage_sop_instance_uid("1.2.3.4"),
    )?;
    file.write_to_file(path)?;
    Ok(())
}

/// Serves arrays from a map and counts real (uncached) loads.
#[derive(Default)]
pub(crate) struct MemorySource {
    images: HashMap<PathBuf, PixelArray>,
    current: Option<PathBuf>,
    loads: Rc<Cell<usize>>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, path: &str, image: PixelArray) -> Self {
        self.images.insert(PathBuf::from(path), image);
        self
    }

    pub(crate) fn load_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.loads)
    }
}

impl ImageSource for MemorySource {
    fn load(&mut self, path: &Path) -> Result<&PixelArray> {
        if self.current.as_deref() != Some(path) {
            self.current = None;
            if !self.images.contains_key(path) {
                return Err(anyhow!("no such image {}", path.display()));
            }
            self.loads.set(self.loads.get() + 1);
            self.current = Some(path.to_path_buf());
        }
        self.current()
            .ok_or_else(|| anyhow!("no such image {}", path.display()))
    }

    fn current(&self) -> Option<&PixelArray> {
        self.current.as_ref().and_then(|path| self.images.get(path))
    }
}
