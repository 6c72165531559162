use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use log::info;

use crate::PixelArray;

/// Files written for one composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedComposite {
    pub array: PathBuf,
    pub image: PathBuf,
}

/// `{base}_{metal}_{n}`, with `n` one past the highest counter already in
/// `dir` for this base/metal pair.
pub fn next_stem(dir: &Path, base: &Path, metal: &Path) -> Result<String> {
    let prefix = format!("{}_{}_", file_stem(base)?, file_stem(metal)?);
    let mut highest = 0_u32;
    if dir.is_dir() {
        for entry in fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))? {
            let path = entry?.path();
            let counter = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(prefix.as_str()))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(n) = counter {
                highest = highest.max(n);
            }
        }
    }
    Ok(format!("{prefix}{}", highest + 1))
}

/// Writes `composite` as `{stem}.npy` (raw f64 values) and `{stem}.png`
/// (8-bit grayscale, stretched from min to max) under `dir`.
pub fn save_composite(dir: &Path, base: &Path, metal: &Path, composite: &PixelArray) -> Result<SavedComposite> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let stem = next_stem(dir, base, metal)?;
    let array = dir.join(format!("{stem}.npy"));
    let image = dir.join(format!("{stem}.png"));

    ndarray_npy::write_npy(&array, composite)
        .with_context(|| format!("cannot write {}", array.display()))?;
    to_gray_image(composite)?
        .save(&image)
        .with_context(|| format!("cannot write {}", image.display()))?;

    info!("saved composite to {} and {}", array.display(), image.display());
    Ok(SavedComposite { array, image })
}

/// Linear stretch of `[min, max]` onto `[0, 255]`; a flat array maps to 0.
pub fn to_gray_image(pixels: &PixelArray) -> Result<GrayImage> {
    let (rows, cols) = pixels.dim();
    let lo = pixels.fold(f64::INFINITY, |m, &v| m.min(v));
    let hi = pixels.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let span = hi - lo;
    let bytes: Vec<u8> = pixels
        .iter()
        .map(|&v| {
            if span > 0.0 {
                ((v - lo) / span * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();
    GrayImage::from_raw(cols as u32, rows as u32, bytes)
        .ok_or_else(|| anyhow!("cannot build a {rows}x{cols} image"))
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::filled;

    #[test]
    fn test_stem_counts_up() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let base = Path::new("/data/15858650_0000.DCM");
        let metal = Path::new("/data/15369989_0070.DCM");
        assert_eq!(next_stem(dir.path(), base, metal)?, "15858650_0000_15369989_0070_1");

        fs::write(dir.path().join("15858650_0000_15369989_0070_1.npy"), b"")?;
        fs::write(dir.path().join("15858650_0000_15369989_0070_4.png"), b"")?;
        // other pairs do not count
        fs::write(dir.path().join("11111111_0000_15369989_0070_9.npy"), b"")?;
        assert_eq!(next_stem(dir.path(), base, metal)?, "15858650_0000_15369989_0070_5");
        Ok(())
    }

    #[test]
    fn test_stem_for_missing_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let stem = next_stem(&dir.path().join("inserted"), Path::new("a.dcm"), Path::new("b.dcm"))?;
        assert_eq!(stem, "a_b_1");
        Ok(())
    }

    #[test]
    fn test_save_writes_both_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("inserted");
        let mut composite = filled(4, 6, 1000.0);
        composite[(1, 2)] = 4095.0;

        let first = save_composite(&out, Path::new("base.dcm"), Path::new("metal.dcm"), &composite)?;
        assert_eq!(first.array, out.join("base_metal_1.npy"));
        assert!(first.array.is_file());
        assert!(first.image.is_file());

        let back: PixelArray = ndarray_npy::read_npy(&first.array)?;
        assert_eq!(back, composite);

        let png = image::open(&first.image)?.to_luma8();
        assert_eq!(png.dimensions(), (6, 4));
        assert_eq!(png.get_pixel(2, 1).0[0], 255);
        assert_eq!(png.get_pixel(0, 0).0[0], 0);

        let second = save_composite(&out, Path::new("base.dcm"), Path::new("metal.dcm"), &composite)?;
        assert_eq!(second.image, out.join("base_metal_2.png"));
        Ok(())
    }

    #[test]
    fn test_flat_image_is_black() -> Result<()> {
        let img = to_gray_image(&filled(3, 3, 42.0))?;
        assert!(img.pixels().all(|p| p.0[0] == 0));
        Ok(())
    }
}
