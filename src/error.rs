// src/error.rs
use thiserror::Error;

use crate::io::Epoch;

/// Errors raised by the analysis core and its file adapters.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Two grids of one analysis run have different shapes.
    #[error("grid shape mismatch: {what} is {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Pixel buffer length does not match the declared shape.
    #[error("grid data length {actual} does not match shape {shape:?}")]
    DataLength { shape: (usize, usize), actual: usize },

    /// A validity flag other than 0 or 1.
    #[error("invalid mask flag {value} at pixel {index}, expected 0 or 1")]
    InvalidMaskFlag { index: usize, value: u8 },

    #[error("not enough input bands provided. Required: {required}, provided: {provided}")]
    MissingBands { required: usize, provided: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The scene source could not deliver one of the two dates.
    #[error("{year} data failed: {source}")]
    Fetch {
        epoch: Epoch,
        year: u16,
        #[source]
        source: FetchError,
    },

    #[error("unsupported input: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Rejected configuration values. Unknown values never fall back to a default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown classification context '{0}' (supported: urban)")]
    UnknownContext(String),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("invalid renderer configuration: {0}")]
    InvalidRenderer(String),
}

/// Failure reported by a scene source, carried through unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct FetchError {
    pub reason: String,
}

impl FetchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
