//! # TerraFuse Algorithms
//!
//! DEM fusion and earthwork analysis:
//!
//! - **mosaic**: resolution grouping, virtual mosaic compositing, spatial
//!   clip and reprojection
//! - **convert**: windowed in-place unit conversion
//! - **cutfill**: raster differencing and cut/fill volume integration

pub mod convert;
pub mod cutfill;
pub(crate) mod maybe_rayon;
pub mod mosaic;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::convert::{
        scale_units, scale_units_batch, scale_units_in_place, ConvertParams, UnitScale,
        METERS_TO_FEET,
    };
    pub use crate::cutfill::{dem_difference, CutFill, CutFillParams, VolumeReport};
    pub use crate::mosaic::{
        build_mosaic, group_by_resolution, mosaic_groups, sample, warp, CoordTransform, Mosaic,
        MosaicParams, ResampleAlg, ResolutionGroup, WarpParams,
    };
    pub use terrafuse_core::prelude::*;
}
