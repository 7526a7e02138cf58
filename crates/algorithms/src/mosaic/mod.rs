//! Resolution-priority mosaic construction
//!
//! Fuses many overlapping, variable-resolution elevation tiles into one
//! seamless surface: tiles are grouped by native ground sample distance,
//! composited with a deterministic last-tile-wins overlap policy, and
//! materialized through the clip/reprojection engine.

mod builder;
mod grouper;
mod reproject;
pub(crate) mod resample;
mod warp;

pub use builder::{build_mosaic, mosaic_groups, Mosaic, MosaicParams};
pub use grouper::{group_by_resolution, ResolutionGroup};
pub use reproject::CoordTransform;
pub use resample::{sample, ResampleAlg};
pub use warp::{warp, WarpParams};
