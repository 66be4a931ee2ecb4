//! Line segment type.

use super::{Point, PointF};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line segment between two scaled points.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Length in scaled units.
    #[inline]
    pub fn length(&self) -> CoordF {
        self.a.distance(&self.b)
    }

    /// Unit direction vector from `a` to `b`.
    #[inline]
    pub fn direction(&self) -> PointF {
        PointF::from(self.b - self.a).normalize()
    }

    /// Distance from a point to this segment, in scaled units.
    pub fn distance_to(&self, p: &Point) -> CoordF {
        let ab = self.b - self.a;
        let len_sq = ab.dot(&ab);
        if len_sq == 0 {
            return self.a.distance(p);
        }
        let t = ((*p - self.a).dot(&ab) as CoordF / len_sq as CoordF).clamp(0.0, 1.0);
        self.a.lerp(&self.b, t).distance(p)
    }

    /// Parameter along `self` at which it crosses `other`, if the segments
    /// intersect. Parallel segments never report an intersection.
    pub fn intersection_param(&self, other: &Line) -> Option<CoordF> {
        let r = PointF::from(self.b - self.a);
        let s = PointF::from(other.b - other.a);
        let denom = r.x * s.y - r.y * s.x;
        if denom.abs() < 1e-9 {
            return None;
        }
        let qp = PointF::from(other.a - self.a);
        let t = (qp.x * s.y - qp.y * s.x) / denom;
        let u = (qp.x * r.y - qp.y * r.x) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?} -> {:?})", self.a, self.b)
    }
}
