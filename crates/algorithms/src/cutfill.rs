//! Raster difference and cut/fill volume integration
//!
//! Compares an existing-conditions DEM against a proposed-conditions DEM over
//! their shared extent and integrates the per-cell differences into cut and
//! fill volumes. The difference is `proposed - existing`: positive where
//! material must be added (fill), negative where it must be removed (cut).

use crate::mosaic::resample::{sample, ResampleAlg};
use terrafuse_core::error::{Error, Result};
use terrafuse_core::raster::{GeoTransform, Raster};
use terrafuse_core::Algorithm;

/// Parameters for cut/fill computation
#[derive(Debug, Clone)]
pub struct CutFillParams {
    /// Divisor converting (area unit squared x height unit) into the
    /// reporting volume unit. The default 27 converts cubic feet to cubic
    /// yards for inputs with foot coordinates and foot elevations.
    pub cubic_divisor: f64,
    /// Resampling used to read both DEMs on the common grid
    pub resample: ResampleAlg,
}

impl Default for CutFillParams {
    fn default() -> Self {
        Self {
            cubic_divisor: 27.0,
            resample: ResampleAlg::Bilinear,
        }
    }
}

/// Integrated earthwork volumes for one comparison.
///
/// `cut` is carried as a negative quantity (material below the existing
/// surface); use [`cut_magnitude`](Self::cut_magnitude) for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeReport {
    /// Cut volume, negative or zero
    pub cut: f64,
    /// Fill volume, positive or zero
    pub fill: f64,
    /// Net volume, `fill + cut`
    pub net: f64,
    /// Area of one cell of the comparison grid
    pub cell_area: f64,
    /// Number of cells where both inputs had valid data
    pub valid_cells: usize,
}

impl VolumeReport {
    /// Cut volume as a positive quantity
    pub fn cut_magnitude(&self) -> f64 {
        self.cut.abs()
    }
}

/// Compute the difference surface and volumes between two DEMs.
///
/// The comparison grid covers the intersection of the two extents at the
/// finer of the two cell sizes. Cells where either input is nodata carry
/// NaN in the difference surface and do not contribute to volumes.
///
/// Fails with `CrsMismatch` when the inputs disagree on CRS and `NoOverlap`
/// when their extents do not intersect.
pub fn dem_difference(
    existing: &Raster<f64>,
    proposed: &Raster<f64>,
    params: &CutFillParams,
) -> Result<(Raster<f64>, VolumeReport)> {
    if params.cubic_divisor <= 0.0 || !params.cubic_divisor.is_finite() {
        return Err(Error::InvalidParameter {
            name: "cubic_divisor",
            value: params.cubic_divisor.to_string(),
            reason: "must be positive and finite".into(),
        });
    }

    // Both inputs must live in the same CRS; comparing grids across CRS
    // silently produces garbage volumes, so it is an error. Two inputs with
    // no CRS at all are taken to share an implicit local system.
    match (existing.crs(), proposed.crs()) {
        (Some(a), Some(b)) if !a.is_equivalent(b) => {
            return Err(Error::CrsMismatch(a.identifier(), b.identifier()));
        }
        (Some(a), None) => {
            return Err(Error::CrsMismatch(a.identifier(), "Unknown".into()));
        }
        (None, Some(b)) => {
            return Err(Error::CrsMismatch("Unknown".into(), b.identifier()));
        }
        _ => {}
    }

    let pixel_size = existing.cell_size().min(proposed.cell_size());
    let extent = existing
        .bounds()
        .intersection(&proposed.bounds())
        .ok_or(Error::NoOverlap)?;

    let cols = ((extent.width() / pixel_size).round() as usize).max(1);
    let rows = ((extent.height() / pixel_size).round() as usize).max(1);
    let grid = GeoTransform::north_up(&extent, pixel_size);

    let mut diff = Raster::fill_nodata(rows, cols, f64::NAN);
    diff.set_transform(grid);
    diff.set_crs(existing.crs().cloned());

    let cell_area = pixel_size * pixel_size;
    let mut cut = 0.0;
    let mut fill = 0.0;
    let mut valid_cells = 0usize;

    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = grid.pixel_to_geo(col, row);
            let (Some(before), Some(after)) = (
                sample(existing, x, y, params.resample),
                sample(proposed, x, y, params.resample),
            ) else {
                continue;
            };

            let delta = after - before;
            unsafe { diff.set_unchecked(row, col, delta) };
            valid_cells += 1;

            let volume = delta * cell_area / params.cubic_divisor;
            if delta < 0.0 {
                cut += volume;
            } else {
                fill += volume;
            }
        }
    }

    let report = VolumeReport {
        cut,
        fill,
        net: fill + cut,
        cell_area,
        valid_cells,
    };
    Ok((diff, report))
}

/// Cut/fill algorithm handle
#[derive(Debug, Clone, Default)]
pub struct CutFill;

impl Algorithm for CutFill {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = (Raster<f64>, VolumeReport);
    type Params = CutFillParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CutFill"
    }

    fn description(&self) -> &'static str {
        "Difference two DEMs over their shared extent and integrate cut/fill volumes"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (existing, proposed) = input;
        dem_difference(&existing, &proposed, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use terrafuse_core::crs::Crs;

    fn dem(rows: usize, cols: usize, x0: f64, y_top: f64, ps: f64, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(x0, y_top, ps, -ps));
        r
    }

    #[test]
    fn test_identical_dems_zero_volumes() {
        let a = dem(6, 6, 0.0, 6.0, 1.0, 100.0);
        let (diff, report) = dem_difference(&a, &a.clone(), &CutFillParams::default()).unwrap();

        assert_relative_eq!(report.cut, 0.0);
        assert_relative_eq!(report.fill, 0.0);
        assert_relative_eq!(report.net, 0.0);
        assert_eq!(report.valid_cells, 36);
        for v in diff.data().iter() {
            assert_relative_eq!(*v, 0.0);
        }
    }

    #[test]
    fn test_uniform_fill_exact_volume() {
        // 2x2 grid of unit cells, proposed uniformly 1 higher:
        // 4 cells x 1 area x 1 height / 27 = 4/27 cubic units of fill.
        let existing = dem(2, 2, 0.0, 2.0, 1.0, 10.0);
        let proposed = dem(2, 2, 0.0, 2.0, 1.0, 11.0);

        let (_, report) =
            dem_difference(&existing, &proposed, &CutFillParams::default()).unwrap();

        assert_relative_eq!(report.fill, 4.0 / 27.0, epsilon = 1e-12);
        assert_relative_eq!(report.cut, 0.0);
        assert_relative_eq!(report.net, 4.0 / 27.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cut_reported_negative() {
        let existing = dem(2, 2, 0.0, 2.0, 1.0, 11.0);
        let proposed = dem(2, 2, 0.0, 2.0, 1.0, 10.0);

        let (_, report) =
            dem_difference(&existing, &proposed, &CutFillParams::default()).unwrap();

        assert!(report.cut < 0.0);
        assert_relative_eq!(report.cut, -4.0 / 27.0, epsilon = 1e-12);
        assert_relative_eq!(report.cut_magnitude(), 4.0 / 27.0, epsilon = 1e-12);
        assert_relative_eq!(report.fill, 0.0);
    }

    #[test]
    fn test_disjoint_extents_no_overlap() {
        let a = dem(2, 2, 0.0, 2.0, 1.0, 1.0);
        let b = dem(2, 2, 100.0, 102.0, 1.0, 1.0);
        match dem_difference(&a, &b, &CutFillParams::default()) {
            Err(Error::NoOverlap) => {}
            other => panic!("expected NoOverlap, got {:?}", other),
        }
    }

    #[test]
    fn test_crs_mismatch_rejected() {
        let mut a = dem(2, 2, 0.0, 2.0, 1.0, 1.0);
        let mut b = dem(2, 2, 0.0, 2.0, 1.0, 2.0);
        a.set_crs(Some(Crs::from_epsg(26913)));
        b.set_crs(Some(Crs::from_epsg(32613)));
        assert!(matches!(
            dem_difference(&a, &b, &CutFillParams::default()),
            Err(Error::CrsMismatch(_, _))
        ));

        // One-sided CRS is a mismatch too, not a silent assumption
        b.set_crs(None);
        assert!(matches!(
            dem_difference(&a, &b, &CutFillParams::default()),
            Err(Error::CrsMismatch(_, _))
        ));
    }

    #[test]
    fn test_comparison_grid_uses_finer_cell() {
        let coarse = dem(2, 2, 0.0, 4.0, 2.0, 5.0);
        let fine = dem(8, 8, 0.0, 4.0, 0.5, 6.0);
        let (diff, report) = dem_difference(&coarse, &fine, &CutFillParams::default()).unwrap();

        assert_relative_eq!(diff.cell_size(), 0.5);
        assert_eq!(report.valid_cells, 64);
        assert_relative_eq!(report.cell_area, 0.25);
        // 16 area units of uniform +1 difference
        assert_relative_eq!(report.fill, 16.0 / 27.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nodata_cells_excluded() {
        let existing = dem(2, 2, 0.0, 2.0, 1.0, 10.0);
        let mut proposed = dem(2, 2, 0.0, 2.0, 1.0, 11.0);
        proposed.set(0, 0, f64::NAN).unwrap();

        let (diff, report) =
            dem_difference(&existing, &proposed, &CutFillParams::default()).unwrap();

        assert_eq!(report.valid_cells, 3);
        assert!(diff.get(0, 0).unwrap().is_nan());
        assert_relative_eq!(report.fill, 3.0 / 27.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cutfill_through_algorithm_seam() {
        let existing = dem(2, 2, 0.0, 2.0, 1.0, 10.0);
        let proposed = dem(2, 2, 0.0, 2.0, 1.0, 11.0);
        let (_, report) = CutFill.execute_default((existing, proposed)).unwrap();
        assert_relative_eq!(report.fill, 4.0 / 27.0, epsilon = 1e-12);
        assert_relative_eq!(report.cut, 0.0);
    }

    #[test]
    fn test_partial_overlap_restricts_to_intersection() {
        // Two 4x4 unit-cell DEMs offset by 2: shared window is 2x2
        let existing = dem(4, 4, 0.0, 4.0, 1.0, 10.0);
        let proposed = dem(4, 4, 2.0, 6.0, 1.0, 13.0);

        let (diff, report) =
            dem_difference(&existing, &proposed, &CutFillParams::default()).unwrap();

        assert_eq!(diff.shape(), (2, 2));
        assert_eq!(report.valid_cells, 4);
        assert_relative_eq!(report.fill, 4.0 * 3.0 / 27.0, epsilon = 1e-12);
    }
}
