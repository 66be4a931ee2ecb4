//! Geometry primitives for 2D support computation.
//!
//! This module provides the fundamental geometric types:
//! - `Point`, `PointF` - scaled integer and floating-point points
//! - `Line` - a line segment
//! - `Polyline` - an open path
//! - `Polygon` - a closed contour
//! - `ExPolygon` - a polygon with holes
//! - `BoundingBox` - axis-aligned bounds

mod bounding_box;
mod expolygon;
mod line;
mod point;
mod polygon;
mod polyline;

pub use bounding_box::BoundingBox;
pub use expolygon::{get_extents, to_polygons, ExPolygon, ExPolygons};
pub use line::Line;
pub use point::{Point, PointF, Points};
pub use polygon::{Polygon, Polygons};
pub use polyline::{Polyline, Polylines};
