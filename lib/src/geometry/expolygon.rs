//! Regions with holes.

use super::{BoundingBox, Point, Polygon, Polygons, Polyline};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One island: an outer contour and the holes cut into it.
///
/// The contour is the outer boundary (counter-clockwise for positive area).
/// The holes are interior boundaries (clockwise).
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    /// The outer contour of the polygon.
    pub contour: Polygon,
    /// Clockwise hole boundaries.
    pub holes: Vec<Polygon>,
}

impl ExPolygon {
    /// Solid island.
    #[inline]
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    /// Island with holes, orientation left as given.
    #[inline]
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.is_empty()
    }

    /// Contour area minus hole areas, in scaled units squared.
    pub fn area(&self) -> CoordF {
        let holes_area: CoordF = self.holes.iter().map(Polygon::area).sum();
        self.contour.area() - holes_area
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Inside the contour and outside every hole.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    /// Orient the contour counter-clockwise and every hole clockwise.
    pub fn make_canonical(&mut self) {
        self.contour.make_counter_clockwise();
        for hole in &mut self.holes {
            hole.make_clockwise();
        }
    }

    /// Contour and holes as a flat polygon list.
    pub fn to_polygons(&self) -> Polygons {
        std::iter::once(self.contour.clone())
            .chain(self.holes.iter().cloned())
            .collect()
    }

    /// Every boundary opened at its first point.
    pub fn to_polylines(&self) -> Vec<Polyline> {
        std::iter::once(&self.contour)
            .chain(self.holes.iter())
            .map(Polygon::split_at_first_point)
            .collect()
    }

    pub fn translate(&mut self, v: Point) {
        self.contour.translate(v);
        for hole in &mut self.holes {
            hole.translate(v);
        }
    }

    /// Axis-aligned rectangle.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::new(Polygon::rectangle(min, max))
    }

    /// Disk approximation with `segments` vertices.
    pub fn circle(center: Point, radius: Coord, segments: usize) -> Self {
        Self::new(Polygon::circle(center, radius, segments))
    }
}

impl fmt::Debug for ExPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExPolygon(contour: {} points, holes: {})",
            self.contour.len(),
            self.holes.len()
        )
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

/// A collection of ExPolygons.
pub type ExPolygons = Vec<ExPolygon>;

/// Flatten ExPolygons into contours and holes.
pub fn to_polygons(expolygons: &[ExPolygon]) -> Polygons {
    expolygons.iter().flat_map(ExPolygon::to_polygons).collect()
}

/// Bounding box of a set of ExPolygons.
pub fn get_extents(expolygons: &[ExPolygon]) -> BoundingBox {
    let mut bb = BoundingBox::new();
    for expoly in expolygons {
        bb.merge(&expoly.bounding_box());
    }
    bb
}
