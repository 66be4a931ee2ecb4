//! Closed contours.
//!
//! The last vertex connects back to the first. Outer contours wind
//! counter-clockwise, holes clockwise.

use super::{BoundingBox, Line, Point, Polyline};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
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
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    #[inline]
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Edges as lines, closing edge included.
    pub fn lines(&self) -> Vec<Line> {
        if self.points.len() < 2 {
            return Vec::new();
        }
        self.edges().map(|(a, b)| Line::new(a, b)).collect()
    }

    /// Shoelace area in scaled units squared, negative for a hole.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: i128 = self
            .edges()
            .map(|(a, b)| a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128)
            .sum();
        twice as CoordF / 2.0
    }

    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse if needed so that the polygon is counter-clockwise.
    /// Returns true if the orientation changed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if self.signed_area() < 0.0 {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    /// Reverse if needed so that the polygon is clockwise.
    pub fn make_clockwise(&mut self) -> bool {
        if self.signed_area() > 0.0 {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    /// Perimeter length in scaled units.
    pub fn length(&self) -> CoordF {
        self.lines().iter().map(Line::length).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Even-odd test: count the edges crossed by a ray towards +X.
    pub fn contains_point(&self, p: &Point) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let crossings = self
            .edges()
            .filter(|(a, b)| (a.y > p.y) != (b.y > p.y))
            .filter(|(a, b)| {
                let dy = (b.y - a.y) as i128;
                let x_at = a.x as i128 + (b.x - a.x) as i128 * (p.y - a.y) as i128 / dy;
                (p.x as i128) < x_at
            })
            .count();
        crossings % 2 == 1
    }

    /// Consecutive vertex pairs, closing edge last.
    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points
            .iter()
            .copied()
            .zip(self.points.iter().copied().cycle().skip(1))
    }

    /// Open the loop at its first point: the returned polyline starts and
    /// ends at the first vertex.
    pub fn split_at_first_point(&self) -> Polyline {
        let mut points = self.points.clone();
        if let Some(first) = self.first_point() {
            points.push(first);
        }
        Polyline::from_points(points)
    }

    /// Points spaced `distance` apart along the closed boundary.
    pub fn equally_spaced_points(&self, distance: CoordF) -> Vec<Point> {
        self.split_at_first_point().equally_spaced_points(distance)
    }

    pub fn translate(&mut self, v: Point) {
        for p in &mut self.points {
            *p += v;
        }
    }

    /// Axis-aligned rectangle, counter-clockwise.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
    }

    /// `n`-gon inscribed in a circle of `radius` around the origin, with a
    /// vertex on +X. Contact loops stamp these along their path.
    pub fn regular(n: usize, radius: Coord) -> Self {
        if n < 3 {
            return Self::new();
        }
        let step = std::f64::consts::TAU / n as CoordF;
        let r = radius as CoordF;
        (0..n)
            .map(|i| {
                let (sin, cos) = (i as CoordF * step).sin_cos();
                Point::new((r * cos).round() as Coord, (r * sin).round() as Coord)
            })
            .collect::<Vec<_>>()
            .into()
    }

    /// Circle approximation with `segments` vertices.
    pub fn circle(center: Point, radius: Coord, segments: usize) -> Self {
        let mut poly = Self::regular(segments, radius);
        poly.translate(center);
        poly
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon[{}]", self.points.len())
    }
}

impl Deref for Polygon {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl DerefMut for Polygon {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.points
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

pub type Polygons = Vec<Polygon>;
