//! Error types for TerraFuse

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for TerraFuse operations.
///
/// Every error is fatal to the operation that raised it; nothing is retried
/// internally. Retry policy, if any, belongs to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("No tiles to mosaic: the selected resolution group is empty")]
    EmptyMosaicInput,

    #[error("Band count mismatch: tile '{tile}' has {got} band(s), expected {expected}")]
    BandCountMismatch {
        tile: String,
        expected: usize,
        got: usize,
    },

    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Raster I/O failed for '{path}': {message}")]
    RasterIoFailure { path: PathBuf, message: String },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Input rasters do not overlap")]
    NoOverlap,

    #[error("Field '{0}' not found in schema")]
    FieldNotFound(String),

    #[error("Operation '{0}' was cancelled")]
    Cancelled(&'static str),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for TerraFuse operations
pub type Result<T> = std::result::Result<T, Error>;
