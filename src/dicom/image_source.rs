use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{debug, info};

use super::ct_image::CTImage;
use crate::PixelArray;

/// Something that turns a path into a pixel array.
///
/// Implementations remember the most recently loaded path and return the
/// same array for a repeated request instead of reading it again.
pub trait ImageSource {
    fn load(&mut self, path: &Path) -> Result<&PixelArray>;

    /// The array of the last successful `load`, if any.
    fn current(&self) -> Option<&PixelArray>;
}

/// Reads single-frame CT slices from DICOM files.
#[derive(Debug, Default)]
pub struct DicomImageSource {
    cached: Option<(PathBuf, PixelArray)>,
}

impl DicomImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.cached.as_ref().map(|(path, _)| path.as_path())
    }
}

impl ImageSource for DicomImageSource {
    fn load(&mut self, path: &Path) -> Result<&PixelArray> {
        if self.current_path() == Some(path) {
            debug!("reusing cached pixels of {}", path.display());
        } else {
            // a failed read must not leave the previous image looking current
            self.cached = None;
            let ct = CTImage::from_file(path)?;
            info!(
                "loaded {} ({}x{}, {} bits)",
                path.display(),
                ct.pixel.rows,
                ct.pixel.columns,
                ct.pixel.bits_allocated.unwrap_or(16)
            );
            debug!("{}", ct.pixel.format_tags().trim_end());
            let pixels = ct.to_pixel_array()?;
            self.cached = Some((path.to_path_buf(), pixels));
        }
        self.current()
            .ok_or_else(|| anyhow!("no image cached for {}", path.display()))
    }

    fn current(&self) -> Option<&PixelArray> {
        self.cached.as_ref().map(|(_, pixels)| pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_ct;
    use ndarray::arr2;

    #[test]
    fn test_load_dicom_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("slice_0001.dcm");
        write_ct(&path, &arr2(&[[0.0, 10.0, 20.0], [4090.0, 4095.0, 1000.0]]))?;

        let mut source = DicomImageSource::new();
        let arr = source.load(&path)?;
        assert_eq!(arr.dim(), (2, 3));
        assert_eq!(arr[(1, 0)], 4090.0);
        assert_eq!(arr[(1, 2)], 1000.0);
        assert_eq!(source.current_path(), Some(path.as_path()));
        Ok(())
    }

    #[test]
    fn test_same_path_is_not_read_again() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("slice.dcm");
        write_ct(&path, &arr2(&[[1.0, 2.0]]))?;

        let mut source = DicomImageSource::new();
        source.load(&path)?;
        // deleting the file proves the second call is served from the cache
        std::fs::remove_file(&path)?;
        let arr = source.load(&path)?;
        assert_eq!(arr.row(0).to_vec(), vec![1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_missing_file_clears_state() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("slice.dcm");
        write_ct(&path, &arr2(&[[7.0]]))?;

        let mut source = DicomImageSource::new();
        source.load(&path)?;
        assert!(source.load(&dir.path().join("missing.dcm")).is_err());
        assert!(source.current().is_none());
        Ok(())
    }
}
