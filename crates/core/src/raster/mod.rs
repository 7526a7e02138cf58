//! Raster data structures and extent arithmetic

mod bounds;
mod element;
mod geotransform;
mod grid;
mod tile;

pub use bounds::Bounds;
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use tile::RasterTile;
