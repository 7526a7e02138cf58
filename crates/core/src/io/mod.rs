//! I/O operations for reading and writing georeferenced rasters

#[cfg(feature = "gdal")]
mod gdal_io;
#[cfg(not(feature = "gdal"))]
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, update_band_windowed, write_geotiff, GeoTiffOptions};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, write_geotiff, GeoTiffOptions};

use crate::error::{Error, Result};
use crate::raster::{Raster, RasterTile};
use std::path::Path;

/// Read a raster file into a single-band `RasterTile`, recording its path.
///
/// Tile acquisition (download, discovery) is an external collaborator; this
/// only consumes local files it produced.
pub fn read_tile<P: AsRef<Path>>(path: P) -> Result<RasterTile> {
    let raster: Raster<f64> =
        read_geotiff(path.as_ref(), None).map_err(|e| Error::RasterIoFailure {
            path: path.as_ref().to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(RasterTile::from_band(raster).with_path(path))
}
