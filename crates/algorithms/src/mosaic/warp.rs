//! Spatial clip and reprojection engine
//!
//! Materializes a tile onto a new grid: optionally reprojected to a target
//! CRS, optionally clipped to a bounding box, optionally resampled to a new
//! pixel size. The output grid is computed first, then every output pixel
//! center is inverse-transformed into source coordinates and sampled there,
//! which avoids gaps and double-painting regardless of the distortion of the
//! projection.

use crate::mosaic::reproject::CoordTransform;
use crate::mosaic::resample::{sample, ResampleAlg};
use terrafuse_core::cancel::CancelFlag;
use terrafuse_core::crs::Crs;
use terrafuse_core::error::{Error, Result};
use terrafuse_core::raster::{Bounds, GeoTransform, Raster, RasterTile};

/// Parameters for a warp operation
#[derive(Debug, Clone, Default)]
pub struct WarpParams {
    /// Target CRS; `None` keeps the source CRS
    pub target_crs: Option<Crs>,
    /// Clip extent expressed in TARGET CRS coordinates; `None` keeps the
    /// full (reprojected) source extent
    pub bounds: Option<Bounds>,
    /// Output pixel size in target units; `None` derives it from the source
    pub pixel_size: Option<f64>,
    /// Resampling used to read source values
    pub resample: ResampleAlg,
    /// Cooperative cancellation, checked between bands
    pub cancel: CancelFlag,
}

/// Clip and/or reproject a tile onto a new grid.
///
/// Fails with `NoOverlap` when the clip extent does not intersect the source
/// extent, `Reprojection` when a CRS pair is unsupported, and `Resample` when
/// the requested output grid is degenerate.
pub fn warp(tile: &RasterTile, params: &WarpParams) -> Result<RasterTile> {
    let src_bounds = tile.bounds();

    let (transform_fwd, out_crs) = match &params.target_crs {
        Some(target) => {
            let src_crs = tile.crs().ok_or_else(|| {
                Error::Reprojection(format!(
                    "{} has no CRS, cannot reproject to {}",
                    tile.label(),
                    target.identifier()
                ))
            })?;
            (CoordTransform::new(src_crs, target)?, Some(target.clone()))
        }
        None => (CoordTransform::Identity, tile.crs().cloned()),
    };
    let transform_inv = transform_fwd.inverse();

    // Full source extent expressed in target coordinates
    let src_in_target = transform_fwd.transform_bounds(&src_bounds);

    let out_bounds = match params.bounds {
        Some(clip) => {
            // Reject a clip window that misses the data entirely
            src_in_target.intersection(&clip).ok_or(Error::NoOverlap)?;
            clip
        }
        None => src_in_target,
    };

    let pixel_size = match params.pixel_size {
        Some(ps) => ps,
        // Scale the source pixel size by the extent distortion of the
        // transform so the output has roughly the same pixel count.
        None => tile.gsd() * src_in_target.width() / src_bounds.width(),
    };
    if pixel_size <= 0.0 || !pixel_size.is_finite() {
        return Err(Error::InvalidParameter {
            name: "pixel_size",
            value: pixel_size.to_string(),
            reason: "must be positive and finite".into(),
        });
    }

    let cols = (out_bounds.width() / pixel_size).ceil() as usize;
    let rows = (out_bounds.height() / pixel_size).ceil() as usize;
    if cols == 0 || rows == 0 {
        return Err(Error::Resample(format!(
            "output grid {}x{} is degenerate for extent {:?} at pixel size {}",
            cols, rows, out_bounds, pixel_size
        )));
    }
    let grid = GeoTransform::north_up(&out_bounds, pixel_size);

    let mut out_bands = Vec::with_capacity(tile.band_count());
    for band in tile.bands() {
        if params.cancel.is_cancelled() {
            return Err(Error::Cancelled("warp"));
        }

        let mut out = Raster::fill_nodata(rows, cols, f64::NAN);
        out.set_transform(grid);
        out.set_crs(out_crs.clone());

        for row in 0..rows {
            for col in 0..cols {
                let (tx, ty) = grid.pixel_to_geo(col, row);
                let (sx, sy) = transform_inv.apply(tx, ty);
                if let Some(value) = sample(band, sx, sy, params.resample) {
                    unsafe { out.set_unchecked(row, col, value) };
                }
            }
        }

        out_bands.push(out);
    }

    RasterTile::new(out_bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 8x8 ramp (z = col) with 1 m pixels in EPSG:32613, origin (500000, 4400008)
    fn utm_ramp() -> RasterTile {
        let mut band = Raster::new(8, 8);
        band.set_transform(GeoTransform::new(500_000.0, 4_400_008.0, 1.0, -1.0));
        band.set_crs(Some(Crs::from_epsg(32613)));
        for row in 0..8 {
            for col in 0..8 {
                band.set(row, col, col as f64).unwrap();
            }
        }
        RasterTile::from_band(band)
    }

    #[test]
    fn test_full_extent_clip_matches_unclipped() {
        let tile = utm_ramp();
        let unclipped = warp(&tile, &WarpParams::default()).unwrap();
        let clipped = warp(
            &tile,
            &WarpParams {
                bounds: Some(tile.bounds()),
                ..WarpParams::default()
            },
        )
        .unwrap();

        let a = unclipped.band(0).unwrap();
        let b = clipped.band(0).unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.transform(), b.transform());
        for row in 0..a.rows() {
            for col in 0..a.cols() {
                let (va, vb) = (a.get(row, col).unwrap(), b.get(row, col).unwrap());
                assert!(va == vb || (va.is_nan() && vb.is_nan()));
            }
        }
    }

    #[test]
    fn test_clip_restricts_extent() {
        let tile = utm_ramp();
        let clip = Bounds::new(500_002.0, 4_400_002.0, 500_006.0, 4_400_006.0);
        let out = warp(
            &tile,
            &WarpParams {
                bounds: Some(clip),
                ..WarpParams::default()
            },
        )
        .unwrap();

        assert_eq!(out.band(0).unwrap().shape(), (4, 4));
        assert_eq!(out.bounds(), clip);
        // Cell at the clip's top-left center sits over source col 2
        assert_relative_eq!(out.band(0).unwrap().get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_disjoint_clip_is_no_overlap() {
        let tile = utm_ramp();
        let far_away = Bounds::new(600_000.0, 4_500_000.0, 600_100.0, 4_500_100.0);
        match warp(
            &tile,
            &WarpParams {
                bounds: Some(far_away),
                ..WarpParams::default()
            },
        ) {
            Err(Error::NoOverlap) => {}
            other => panic!("expected NoOverlap, got {:?}", other),
        }
    }

    #[test]
    fn test_resample_to_coarser_grid() {
        let tile = utm_ramp();
        let out = warp(
            &tile,
            &WarpParams {
                pixel_size: Some(2.0),
                ..WarpParams::default()
            },
        )
        .unwrap();
        assert_eq!(out.band(0).unwrap().shape(), (4, 4));
        assert_relative_eq!(out.gsd(), 2.0);
    }

    #[test]
    fn test_reproject_wgs84_to_utm() {
        // A constant-valued patch near Boulder, CO in WGS84
        let mut band = Raster::filled(10, 10, 42.0);
        band.set_transform(GeoTransform::new(-105.30, 40.05, 0.001, -0.001));
        band.set_crs(Some(Crs::wgs84()));
        let tile = RasterTile::from_band(band);

        let out = warp(
            &tile,
            &WarpParams {
                target_crs: Some(Crs::from_epsg(32613)),
                ..WarpParams::default()
            },
        )
        .unwrap();

        assert_eq!(out.crs().unwrap().epsg(), Some(32613));
        // Output extent is in metres now
        let b = out.bounds();
        assert!(b.min_x > 100_000.0 && b.min_x < 900_000.0);
        assert!(b.min_y > 4_000_000.0);
        // The middle of the output grid maps back inside the source patch
        let band = out.band(0).unwrap();
        let v = band.get(band.rows() / 2, band.cols() / 2).unwrap();
        assert_relative_eq!(v, 42.0);
    }

    #[test]
    fn test_reproject_without_source_crs_fails() {
        let band = Raster::filled(4, 4, 1.0);
        let tile = RasterTile::from_band(band);
        let result = warp(
            &tile,
            &WarpParams {
                target_crs: Some(Crs::from_epsg(32613)),
                ..WarpParams::default()
            },
        );
        assert!(matches!(result, Err(Error::Reprojection(_))));
    }

    #[test]
    fn test_cancellation() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = warp(
            &utm_ramp(),
            &WarpParams {
                cancel,
                ..WarpParams::default()
            },
        );
        assert!(matches!(result, Err(Error::Cancelled("warp"))));
    }
}
