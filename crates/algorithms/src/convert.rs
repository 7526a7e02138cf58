//! Windowed vertical unit conversion
//!
//! Scales elevation values by a constant factor, processed in square windows
//! so arbitrarily large rasters convert with bounded peak memory. Nodata
//! cells are left untouched: a nodata sentinel that gets multiplied stops
//! matching the declared sentinel and turns into a spurious elevation.

use crate::maybe_rayon::*;
use std::path::Path;
use terrafuse_core::cancel::CancelFlag;
use terrafuse_core::error::{Error, Result};
#[cfg(not(feature = "gdal"))]
use terrafuse_core::io::{read_geotiff, write_geotiff};
use terrafuse_core::raster::{Raster, RasterElement};
use terrafuse_core::Algorithm;

/// Metres to international feet
pub const METERS_TO_FEET: f64 = 3.28084;

/// Parameters for unit conversion
#[derive(Debug, Clone)]
pub struct ConvertParams {
    /// Side length of the square processing window, in pixels
    pub window_size: usize,
    /// Cooperative cancellation, checked between windows
    pub cancel: CancelFlag,
}

impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            window_size: 1024,
            cancel: CancelFlag::default(),
        }
    }
}

/// One square processing window, clamped at the raster edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
}

/// Iterate a raster's extent in row-major window order.
fn windows(rows: usize, cols: usize, size: usize) -> Vec<Window> {
    let mut out = Vec::new();
    let mut row = 0;
    while row < rows {
        let mut col = 0;
        let h = size.min(rows - row);
        while col < cols {
            let w = size.min(cols - col);
            out.push(Window {
                row,
                col,
                rows: h,
                cols: w,
            });
            col += size;
        }
        row += size;
    }
    out
}

fn check_params(factor: f64, window_size: usize) -> Result<()> {
    if window_size == 0 {
        return Err(Error::InvalidParameter {
            name: "window_size",
            value: "0".into(),
            reason: "window must span at least one pixel".into(),
        });
    }
    if !factor.is_finite() || factor == 0.0 {
        return Err(Error::InvalidParameter {
            name: "factor",
            value: factor.to_string(),
            reason: "must be finite and non-zero".into(),
        });
    }
    Ok(())
}

/// Scale every valid cell of a raster by `factor`, in place.
///
/// Nodata cells are skipped. Cancellation is observed between windows;
/// on cancellation some windows are already converted and the raster must
/// be discarded.
pub fn scale_units(raster: &mut Raster<f64>, factor: f64, params: &ConvertParams) -> Result<()> {
    check_params(factor, params.window_size)?;

    let nodata = raster.nodata();
    for window in windows(raster.rows(), raster.cols(), params.window_size) {
        if params.cancel.is_cancelled() {
            return Err(Error::Cancelled("unit conversion"));
        }

        let mut view = raster.data_mut().slice_mut(ndarray::s![
            window.row..window.row + window.rows,
            window.col..window.col + window.cols
        ]);
        view.iter_mut().for_each(|value| {
            if !value.is_nodata(nodata) {
                *value *= factor;
            }
        });
    }

    Ok(())
}

/// Convert a raster file on disk, one window at a time.
///
/// Each window is read from the band, scaled, and written back before the
/// next window is read, so peak memory stays bounded by the window size no
/// matter how large the file is. A window that fails to read or write
/// raises `RasterIoFailure`; windows already written stay written, nothing
/// is rolled back. Cancellation is observed between windows and likewise
/// leaves earlier windows converted.
#[cfg(feature = "gdal")]
pub fn scale_units_in_place(
    path: impl AsRef<Path>,
    factor: f64,
    params: &ConvertParams,
) -> Result<()> {
    check_params(factor, params.window_size)?;

    terrafuse_core::io::update_band_windowed::<f64, _, _>(
        path,
        None,
        params.window_size,
        |window, nodata| {
            if params.cancel.is_cancelled() {
                return Err(Error::Cancelled("unit conversion"));
            }
            for value in window.iter_mut() {
                if !value.is_nodata(nodata) {
                    *value *= factor;
                }
            }
            Ok(())
        },
    )
}

/// Convert a GeoTIFF on disk: read, scale, write back to the same path.
///
/// The native TIFF decoder has no windowed write, so this path materializes
/// the raster and rewrites the file only after the whole conversion
/// finished; a cancelled or failed run leaves the original file intact.
/// Enable the `gdal` feature for bounded-memory window-by-window updates.
#[cfg(not(feature = "gdal"))]
pub fn scale_units_in_place(
    path: impl AsRef<Path>,
    factor: f64,
    params: &ConvertParams,
) -> Result<()> {
    let path = path.as_ref();
    let mut raster: Raster<f64> = read_geotiff(path, None).map_err(|e| Error::RasterIoFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    scale_units(&mut raster, factor, params)?;
    write_geotiff(&raster, path, None).map_err(|e| Error::RasterIoFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Scale many rasters in one batch.
///
/// Every raster gets its own verdict: one failure does not stop the batch,
/// and the caller decides what to do with the failed subset.
pub fn scale_units_batch(
    rasters: &mut [Raster<f64>],
    factor: f64,
    params: &ConvertParams,
) -> Vec<Result<()>> {
    rasters
        .into_par_iter()
        .map(|raster| scale_units(raster, factor, params))
        .collect()
}

/// Unit conversion algorithm handle
#[derive(Debug, Clone, Default)]
pub struct UnitScale {
    /// Multiplicative factor applied to every valid cell
    pub factor: f64,
}

impl UnitScale {
    /// Metres to feet conversion
    pub fn to_feet() -> Self {
        Self {
            factor: METERS_TO_FEET,
        }
    }

    /// Feet to metres conversion
    pub fn to_meters() -> Self {
        Self {
            factor: 1.0 / METERS_TO_FEET,
        }
    }
}

impl Algorithm for UnitScale {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ConvertParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "UnitScale"
    }

    fn description(&self) -> &'static str {
        "Scale elevation values by a constant factor, skipping nodata"
    }

    fn execute(&self, mut input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        scale_units(&mut input, self.factor, &params)?;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use terrafuse_core::io::{read_geotiff, write_geotiff};

    #[test]
    fn test_valid_cells_scaled() {
        let mut r = Raster::filled(4, 4, 100.0);
        scale_units(&mut r, METERS_TO_FEET, &ConvertParams::default()).unwrap();
        assert_relative_eq!(r.get(2, 3).unwrap(), 328.084, epsilon = 1e-9);
    }

    #[test]
    fn test_nodata_untouched() {
        let mut r = Raster::filled(4, 4, 100.0);
        r.set_nodata(Some(-9999.0));
        r.set(1, 1, -9999.0).unwrap();

        scale_units(&mut r, METERS_TO_FEET, &ConvertParams::default()).unwrap();
        assert_relative_eq!(r.get(1, 1).unwrap(), -9999.0);
        assert_relative_eq!(r.get(0, 0).unwrap(), 328.084, epsilon = 1e-9);
    }

    #[test]
    fn test_nan_nodata_untouched() {
        let mut r = Raster::filled(2, 2, 10.0);
        r.set(0, 1, f64::NAN).unwrap();
        scale_units(&mut r, 2.0, &ConvertParams::default()).unwrap();
        assert!(r.get(0, 1).unwrap().is_nan());
        assert_relative_eq!(r.get(0, 0).unwrap(), 20.0);
    }

    #[test]
    fn test_roundtrip_recovers_values() {
        let mut r = Raster::filled(8, 8, 1523.7);
        scale_units(&mut r, METERS_TO_FEET, &ConvertParams::default()).unwrap();
        scale_units(&mut r, 1.0 / METERS_TO_FEET, &ConvertParams::default()).unwrap();
        assert_relative_eq!(r.get(4, 4).unwrap(), 1523.7, epsilon = 1e-9);
    }

    #[test]
    fn test_window_tiling_covers_everything() {
        // 5x7 raster with a 3-pixel window: ragged edge windows included
        let mut r = Raster::filled(5, 7, 1.0);
        let params = ConvertParams {
            window_size: 3,
            ..ConvertParams::default()
        };
        scale_units(&mut r, 10.0, &params).unwrap();
        for row in 0..5 {
            for col in 0..7 {
                assert_relative_eq!(r.get(row, col).unwrap(), 10.0);
            }
        }

        let tiled = windows(5, 7, 3);
        let covered: usize = tiled.iter().map(|w| w.rows * w.cols).sum();
        assert_eq!(covered, 35);
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut r = Raster::filled(2, 2, 1.0);
        let params = ConvertParams {
            window_size: 0,
            ..ConvertParams::default()
        };
        assert!(matches!(
            scale_units(&mut r, 2.0, &params),
            Err(Error::InvalidParameter { name: "window_size", .. })
        ));
    }

    #[test]
    fn test_cancellation_between_windows() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut r = Raster::filled(4, 4, 1.0);
        let params = ConvertParams {
            cancel,
            ..ConvertParams::default()
        };
        assert!(matches!(
            scale_units(&mut r, 2.0, &params),
            Err(Error::Cancelled(_))
        ));
        // Nothing converted before the first window
        assert_relative_eq!(r.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_batch_reports_per_raster() {
        let mut rasters = vec![Raster::filled(2, 2, 1.0), Raster::filled(2, 2, 2.0)];
        let verdicts = scale_units_batch(&mut rasters, 3.0, &ConvertParams::default());
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts.iter().all(Result::is_ok));
        assert_relative_eq!(rasters[1].get(0, 0).unwrap(), 6.0);
    }

    #[test]
    fn test_in_place_file_conversion() {
        use terrafuse_core::raster::GeoTransform;

        let mut r = Raster::filled(4, 4, 50.0);
        r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));

        let file = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&r, file.path(), None).unwrap();

        scale_units_in_place(file.path(), METERS_TO_FEET, &ConvertParams::default()).unwrap();

        let back: Raster<f64> = read_geotiff(file.path(), None).unwrap();
        assert_relative_eq!(back.get(0, 0).unwrap(), 164.042, epsilon = 1e-3);
    }

    #[test]
    fn test_in_place_failure_leaves_file_unconverted() {
        use terrafuse_core::raster::GeoTransform;

        let mut r = Raster::filled(4, 4, 50.0);
        r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));

        let file = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&r, file.path(), None).unwrap();

        // Invalid factor fails before any window is touched
        assert!(matches!(
            scale_units_in_place(file.path(), f64::NAN, &ConvertParams::default()),
            Err(Error::InvalidParameter { name: "factor", .. })
        ));

        // Cancellation fires before the first window is written back
        let cancel = CancelFlag::new();
        cancel.cancel();
        let params = ConvertParams {
            cancel,
            ..ConvertParams::default()
        };
        assert!(matches!(
            scale_units_in_place(file.path(), 2.0, &params),
            Err(Error::Cancelled(_))
        ));

        let back: Raster<f64> = read_geotiff(file.path(), None).unwrap();
        assert_relative_eq!(back.get(2, 2).unwrap(), 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unit_scale_algorithm() {
        let r = Raster::filled(2, 2, 10.0);
        let feet = UnitScale::to_feet().execute_default(r).unwrap();
        assert_relative_eq!(feet.get(0, 0).unwrap(), 32.8084, epsilon = 1e-9);

        let meters = UnitScale::to_meters().execute_default(feet).unwrap();
        assert_relative_eq!(meters.get(1, 1).unwrap(), 10.0, epsilon = 1e-9);
    }
}
