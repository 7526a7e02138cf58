//! Axis-aligned geographic extents

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding rectangle in geographic or projected coordinates.
///
/// The mosaic builder takes the union of tile extents; the cut/fill
/// integrator takes the intersection of its two inputs. Both live here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create a new bounds rectangle
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether the rectangle has zero or negative area
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rectangle covering both `self` and `other`
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Overlap of `self` and `other`, or `None` if they do not intersect
    /// with positive area.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let candidate = Bounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if candidate.is_degenerate() {
            None
        } else {
            Some(candidate)
        }
    }

    /// Whether a point lies inside (or on the edge of) the rectangle
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
