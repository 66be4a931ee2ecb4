//! Axis-aligned bounds in scaled coordinates.
//!
//! Fillers use the bounds of a rotated region to lay out their line grid, and
//! the clipper helpers use them to reject far-apart segments early.

use super::Point;
use crate::{unscale, Coord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounds of a point set. An empty set has no bounds; `min` and `max` are
/// meaningless until [`BoundingBox::is_defined`] holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    defined: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    #[inline]
    pub fn new() -> Self {
        Self {
            min: Point::new(0, 0),
            max: Point::new(0, 0),
            defined: false,
        }
    }

    pub fn from_points(points: &[Point]) -> Self {
        points.iter().copied().collect()
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn merge_point(&mut self, p: Point) {
        if !self.defined {
            *self = Self {
                min: p,
                max: p,
                defined: true,
            };
            return;
        }
        self.min = Point::new(self.min.x.min(p.x), self.min.y.min(p.y));
        self.max = Point::new(self.max.x.max(p.x), self.max.y.max(p.y));
    }

    /// Grow to cover `other`. Undefined bounds add nothing.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + (self.max.x - self.min.x) / 2,
            self.min.y + (self.max.y - self.min.y) / 2,
        )
    }

    /// Whether two bounds share at least one point.
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.defined
            && other.defined
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    #[inline]
    pub fn contains_point(&self, p: &Point) -> bool {
        self.defined
            && (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
    }

    /// Bounds pushed out by `margin` on all four sides.
    pub fn expanded(&self, margin: Coord) -> Self {
        if !self.defined {
            return *self;
        }
        let delta = Point::new(margin, margin);
        Self {
            min: self.min - delta,
            max: self.max + delta,
            defined: true,
        }
    }
}

impl FromIterator<Point> for BoundingBox {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut bb = Self::new();
        for p in iter {
            bb.merge_point(p);
        }
        bb
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.defined {
            write!(f, "BoundingBox[{:?}, {:?}]", self.min, self.max)
        } else {
            f.write_str("BoundingBox[]")
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}] x [{:.3}, {:.3}]",
            unscale(self.min.x),
            unscale(self.max.x),
            unscale(self.min.y),
            unscale(self.max.y)
        )
    }
}
