//! Tile resolution grouping
//!
//! Partitions a set of tiles into groups keyed by native ground sample
//! distance. Groups are ordered finest first (smallest GSD = highest
//! priority); within a group, tiles keep their insertion order, which is the
//! compositing order the mosaic builder relies on.

use terrafuse_core::raster::RasterTile;

/// Relative tolerance when comparing ground sample distances. Tiles from one
/// acquisition can differ in the last few bits after reprojection round trips.
const GSD_REL_TOLERANCE: f64 = 1e-6;

/// An ordered set of tiles sharing one native resolution
#[derive(Debug, Clone)]
pub struct ResolutionGroup {
    /// Ground sample distance shared by the member tiles
    pub gsd: f64,
    /// Member tiles in insertion order
    pub tiles: Vec<RasterTile>,
}

/// Partition tiles into resolution groups, finest first.
///
/// Every input tile lands in exactly one group; the union of all groups
/// equals the input set. Empty input yields an empty grouping — the mosaic
/// builder treats that as "no data to mosaic" and fails loudly.
pub fn group_by_resolution(tiles: Vec<RasterTile>) -> Vec<ResolutionGroup> {
    let mut groups: Vec<ResolutionGroup> = Vec::new();

    for tile in tiles {
        let gsd = tile.gsd();
        match groups
            .iter_mut()
            .find(|g| (g.gsd - gsd).abs() <= g.gsd * GSD_REL_TOLERANCE)
        {
            Some(group) => group.tiles.push(tile),
            None => groups.push(ResolutionGroup {
                gsd,
                tiles: vec![tile],
            }),
        }
    }

    groups.sort_by(|a, b| a.gsd.total_cmp(&b.gsd));
    groups
}
