//! Polyline type for open paths.

use super::{BoundingBox, Line, Point, PointF};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// An open path defined by a sequence of points.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    #[inline]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    #[inline]
    pub fn push(&mut self, p: Point) {
        self.points.push(p);
    }

    #[inline]
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    #[inline]
    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// A polyline needs at least two points to describe a path.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }

    /// Segments of this polyline, in order.
    pub fn lines(&self) -> Vec<Line> {
        self.points
            .windows(2)
            .map(|w| Line::new(w[0], w[1]))
            .collect()
    }

    /// Total length in scaled units.
    pub fn length(&self) -> CoordF {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// True if every segment runs parallel to the line from the first to the
    /// last point, within `EPSILON` radians. Comparing against the chord
    /// keeps the error from accumulating along the path.
    pub fn is_straight(&self) -> bool {
        let (Some(first), Some(last)) = (self.first_point(), self.last_point()) else {
            return false;
        };
        if first == last {
            return self.points.iter().all(|p| *p == first);
        }
        let chord = Line::new(first, last).direction();
        self.points
            .windows(2)
            .filter(|w| w[0] != w[1])
            .all(|w| {
                let dir = Line::new(w[0], w[1]).direction();
                let sin = chord.x * dir.y - chord.y * dir.x;
                let cos = chord.x * dir.x + chord.y * dir.y;
                // Opposite directions count as parallel.
                sin.atan2(cos.abs()).abs() <= crate::EPSILON
            })
    }

    /// Move the first point outwards along the first segment by `distance`.
    pub fn extend_start(&mut self, distance: Coord) {
        if self.points.len() < 2 {
            return;
        }
        let dir = PointF::from(self.points[0] - self.points[1]).normalize();
        let p = self.points[0];
        self.points[0] = Point::new(
            p.x + (dir.x * distance as CoordF).round() as Coord,
            p.y + (dir.y * distance as CoordF).round() as Coord,
        );
    }

    /// Move the last point outwards along the last segment by `distance`.
    pub fn extend_end(&mut self, distance: Coord) {
        let n = self.points.len();
        if n < 2 {
            return;
        }
        let dir = PointF::from(self.points[n - 1] - self.points[n - 2]).normalize();
        let p = self.points[n - 1];
        self.points[n - 1] = Point::new(
            p.x + (dir.x * distance as CoordF).round() as Coord,
            p.y + (dir.y * distance as CoordF).round() as Coord,
        );
    }

    /// Points spaced `distance` apart along the path, starting at the first point.
    pub fn equally_spaced_points(&self, distance: CoordF) -> Vec<Point> {
        let mut out = Vec::new();
        let Some(first) = self.first_point() else {
            return out;
        };
        out.push(first);
        if distance <= 0.0 {
            return out;
        }

        // Distance still to travel before the next sample.
        let mut remaining = distance;
        for w in self.points.windows(2) {
            let seg_len = w[0].distance(&w[1]);
            let mut along = 0.0;
            while seg_len - along >= remaining {
                along += remaining;
                out.push(w[0].lerp(&w[1], along / seg_len));
                remaining = distance;
            }
            remaining -= seg_len - along;
        }
        out
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline({} points)", self.points.len())
    }
}

impl Deref for Polyline {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

/// A collection of polylines.
pub type Polylines = Vec<Polyline>;

#[cfg(test)]
mod tests {
    use super::*;

    fn make_l_shape() -> Polyline {
        Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
        ])
    }

    #[test]
    fn test_polyline_length() {
        assert!((make_l_shape().length() - 200.0).abs() < 1e-9);
        assert_eq!(Polyline::new().length(), 0.0);
    }

    #[test]
    fn test_polyline_is_straight() {
        assert!(!make_l_shape().is_straight());
        let straight = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(50, 0),
            Point::new(100, 0),
        ]);
        assert!(straight.is_straight());

        // Short bends are bent however small the coordinates are.
        let tiny_bend = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(10, 1),
            Point::new(20, 0),
        ]);
        assert!(!tiny_bend.is_straight());

        // Long, nearly collinear runs stay straight.
        let long_run = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(5_000_000, 1),
            Point::new(10_000_000, 0),
        ]);
        assert!(long_run.is_straight());
    }

    #[test]
    fn test_polyline_extend() {
        let mut line = Polyline::from_points(vec![Point::new(0, 0), Point::new(100, 0)]);
        line.extend_start(10);
        line.extend_end(20);
        assert_eq!(line.first_point(), Some(Point::new(-10, 0)));
        assert_eq!(line.last_point(), Some(Point::new(120, 0)));
    }

    #[test]
    fn test_polyline_equally_spaced_points() {
        let pts = make_l_shape().equally_spaced_points(50.0);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], Point::new(0, 0));
        assert_eq!(pts[2], Point::new(100, 0));
        assert_eq!(pts[4], Point::new(100, 100));
    }
}
