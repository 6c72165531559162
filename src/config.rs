use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::metal::Interpolation;

/// Lowest stored value treated as metal on the 12-bit CT scale.
pub const DEFAULT_METAL_THRESHOLD: f64 = 4090.0;
/// Highest valid intensity; composites are clipped to it.
pub const DEFAULT_INTENSITY_CEILING: f64 = 4095.0;

/// Tunables of one insertion run. Every field has a default, so an empty
/// TOML file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub metal_threshold: f64,
    pub intensity_ceiling: f64,
    pub rotation_interpolation: Interpolation,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metal_threshold: DEFAULT_METAL_THRESHOLD,
            intensity_ceiling: DEFAULT_INTENSITY_CEILING,
            rotation_interpolation: Interpolation::default(),
            output_dir: PathBuf::from("inserted"),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration file when one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!("reading configuration from {}", path.display());
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config {}", path.display()))?;
                Self::from_toml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        // a threshold at or below zero would count background as metal
        if !(self.metal_threshold.is_finite() && self.metal_threshold > 0.0) {
            bail!("metal_threshold must be finite and positive, got {}", self.metal_threshold);
        }
        if !self.intensity_ceiling.is_finite() {
            bail!("intensity_ceiling must be finite, got {}", self.intensity_ceiling);
        }
        Ok(())
    }
}
