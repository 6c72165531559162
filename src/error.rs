use std::path::PathBuf;

use thiserror::Error;

use crate::compositor::Placement;

/// Failures of the compositing core.
///
/// Every variant is deterministic and local: the caller recovers by choosing
/// different inputs, nothing here is worth retrying.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no metal found: no pixel reaches the threshold {threshold}")]
    NoMetalFound { threshold: f64 },

    #[error("bad transform parameter: {name} = {value}")]
    BadTransformParameter { name: &'static str, value: f64 },

    #[error("patch of shape {patch:?} placed at {at} exceeds base image of shape {base:?}")]
    OutOfBounds {
        at: Placement,
        patch: (usize, usize),
        base: (usize, usize),
    },

    #[error("{0} used before a successful load")]
    StaleState(&'static str),

    #[error("failed to load image {}", .path.display())]
    ImageSource {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn image_source(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        Error::ImageSource {
            path: path.into(),
            source: err.into(),
        }
    }
}
