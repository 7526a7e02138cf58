//! # TerraFuse Core
//!
//! Core types and I/O for the TerraFuse DEM fusion toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced grid type
//! - `RasterTile`: immutable multi-band tile handle used by the mosaic builder
//! - `GeoTransform` / `Bounds`: georeferencing and extent arithmetic
//! - `Crs`: coordinate reference system handling (EPSG codes and WKT)
//! - `CancelFlag`: cooperative cancellation for long-running passes
//! - GeoTIFF I/O (native by default, GDAL behind the `gdal` feature)

pub mod cancel;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use cancel::CancelFlag;
pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{Bounds, GeoTransform, Raster, RasterElement, RasterTile};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cancel::CancelFlag;
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Bounds, GeoTransform, Raster, RasterElement, RasterTile};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in TerraFuse.
///
/// Algorithms are pure functions that transform input data according to
/// parameters; all configuration travels in the `Params` struct so no
/// process-wide state persists between invocations.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
