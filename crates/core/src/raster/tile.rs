//! Multi-band raster tile handle

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::raster::{Bounds, GeoTransform, Raster};
use std::path::{Path, PathBuf};

/// A handle to one source raster: one or more bands sharing a grid, plus the
/// path it was loaded from (when it came from a file).
///
/// Tiles are immutable input artifacts: the mosaic builder only reads them.
/// All bands of a tile share dimensions, transform and CRS; the constructor
/// enforces this.
#[derive(Debug, Clone)]
pub struct RasterTile {
    bands: Vec<Raster<f64>>,
    path: Option<PathBuf>,
}

impl RasterTile {
    /// Create a tile from a set of bands.
    ///
    /// Fails with `InvalidDimensions` if the band list is empty or the bands
    /// disagree on shape or transform.
    pub fn new(bands: Vec<Raster<f64>>) -> Result<Self> {
        let first = bands.first().ok_or(Error::InvalidDimensions {
            width: 0,
            height: 0,
        })?;
        let shape = first.shape();
        let transform = *first.transform();

        for band in &bands[1..] {
            if band.shape() != shape || *band.transform() != transform {
                return Err(Error::InvalidDimensions {
                    width: band.cols(),
                    height: band.rows(),
                });
            }
        }

        Ok(Self { bands, path: None })
    }

    /// Create a single-band tile
    pub fn from_band(band: Raster<f64>) -> Self {
        Self {
            bands: vec![band],
            path: None,
        }
    }

    /// Record the file path this tile was loaded from
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Get a band by zero-based index
    pub fn band(&self, index: usize) -> Option<&Raster<f64>> {
        self.bands.get(index)
    }

    /// All bands
    pub fn bands(&self) -> &[Raster<f64>] {
        &self.bands
    }

    /// Consume the tile, returning its bands
    pub fn into_bands(self) -> Vec<Raster<f64>> {
        self.bands
    }

    /// Source file path, if the tile came from a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A human-readable label for error messages
    pub fn label(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => "<in-memory tile>".to_string(),
        }
    }

    /// Native ground sample distance (resolution class) of the tile
    pub fn gsd(&self) -> f64 {
        self.bands[0].cell_size()
    }

    /// Geotransform shared by all bands
    pub fn transform(&self) -> &GeoTransform {
        self.bands[0].transform()
    }

    /// Geographic extent of the tile
    pub fn bounds(&self) -> Bounds {
        self.bands[0].bounds()
    }

    /// CRS shared by all bands
    pub fn crs(&self) -> Option<&Crs> {
        self.bands[0].crs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(rows: usize, cols: usize, gsd: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, 1.0);
        r.set_transform(GeoTransform::new(0.0, rows as f64 * gsd, gsd, -gsd));
        r
    }

    #[test]
    fn test_tile_metadata() {
        let tile = RasterTile::from_band(band(10, 20, 2.0)).with_path("tiles/a.tif");
        assert_eq!(tile.band_count(), 1);
        assert_eq!(tile.gsd(), 2.0);
        assert_eq!(tile.bounds(), Bounds::new(0.0, 0.0, 40.0, 20.0));
        assert_eq!(tile.label(), "tiles/a.tif");
    }

    #[test]
    fn test_mismatched_bands_rejected() {
        let result = RasterTile::new(vec![band(10, 10, 1.0), band(5, 5, 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_band_list_rejected() {
        assert!(RasterTile::new(Vec::new()).is_err());
    }
}
