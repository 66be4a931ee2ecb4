//! Boolean operations and offsets on scaled polygons.
//!
//! This module provides polygon boolean operations (union, intersection, difference)
//! and offset operations using the geo-clipper library, plus the open-path helpers
//! that support generation needs: offsetting polylines into areas and clipping
//! polylines against regions.
//!
//! All offset distances are in mm. Inputs and outputs use scaled coordinates.

use crate::geometry::{ExPolygon, ExPolygons, Line, Point, Polygon, Polyline, Polylines};
use crate::{scale, unscale, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Fixed-point factor passed to clipper (1 unit = 1 micron).
const CLIPPER_FACTOR: f64 = 1000.0;

/// Default arc tolerance for round joins (mm).
pub const DEFAULT_ARC_TOLERANCE: CoordF = 0.01;

/// Growth applied to the clip set by the `*_safety` operations (mm).
/// One clipper unit, enough to close hairline slivers along shared edges.
pub const CLIPPER_SAFETY_OFFSET: CoordF = 0.001;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners with the default arc tolerance
    #[default]
    Round,
    /// Round corners with an explicit arc tolerance (mm)
    RoundArc(CoordF),
    /// Mitered corners
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(DEFAULT_ARC_TOLERANCE),
            OffsetJoinType::RoundArc(tolerance) => JoinType::Round(tolerance),
            OffsetJoinType::Miter => JoinType::Miter(3.0),
        }
    }
}

fn ring_to_geo(poly: &Polygon, counter_clockwise: bool) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = poly
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();

    // Holes must wind opposite to contours for the non-zero fill rule.
    if (poly.signed_area() > 0.0) != counter_clockwise {
        ring.reverse();
    }

    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    LineString::new(ring)
}

fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&expoly.contour, true),
        expoly.holes.iter().map(|h| ring_to_geo(h, false)).collect(),
    )
}

fn geo_to_ring(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(scale(c.x), scale(c.y)))
        .collect();

    // Our Polygon doesn't store the closing point
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::from_points(points)
}

fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let mut expoly = ExPolygon::with_holes(
        geo_to_ring(geo_poly.exterior()),
        geo_poly.interiors().iter().map(geo_to_ring).collect(),
    );
    expoly.make_canonical();
    expoly
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|e| e.contour.len() >= 3)
        .collect()
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(
        expolys
            .iter()
            .filter(|e| e.contour.len() >= 3)
            .map(expolygon_to_geo)
            .collect(),
    )
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Area covered by either set.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return clip.to_vec();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);

    let result = subject_geo.union(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Merge overlapping islands of one set.
///
/// Halves are merged recursively, so each clipper call sees two
/// non-overlapping operands.
pub fn union_ex(polygons: &[ExPolygon]) -> ExPolygons {
    match polygons.len() {
        0 => vec![],
        1 => polygons.to_vec(),
        n => {
            let (left, right) = polygons.split_at(n / 2);
            union(&union_ex(left), &union_ex(right))
        }
    }
}

/// Area common to both sets.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }

    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);

    let result = subject_geo.intersection(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Area of `subject` outside `clip`.
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);

    let result = subject_geo.difference(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// `subject - clip` with the clip grown by [`CLIPPER_SAFETY_OFFSET`].
pub fn difference_safety(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return difference(subject, clip);
    }
    let grown = offset_expolygons(clip, CLIPPER_SAFETY_OFFSET, OffsetJoinType::Miter);
    difference(subject, &grown)
}

/// Union of a set of polygons, each grown by [`CLIPPER_SAFETY_OFFSET`] so that
/// touching edges merge.
pub fn union_safety(polygons: &[ExPolygon]) -> ExPolygons {
    offset_expolygons(polygons, CLIPPER_SAFETY_OFFSET, OffsetJoinType::Miter)
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset an ExPolygon by a given distance (mm).
///
/// A positive delta grows the islands, a negative one shrinks them.
pub fn offset_expolygon(
    expolygon: &ExPolygon,
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    offset_expolygons(std::slice::from_ref(expolygon), delta, join_type)
}

/// Offset multiple ExPolygons by a given distance (mm).
///
/// Overlapping results are merged.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }

    let geo_multi = expolygons_to_geo_multi(expolygons);
    let result = geo_multi.offset(delta, join_type.into(), EndType::ClosedPolygon, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Two successive offsets. With `delta1 < 0 < delta2` this is a morphological
/// opening that removes features thinner than `2 * |delta1|`.
pub fn offset2_ex(
    expolygons: &[ExPolygon],
    delta1: CoordF,
    delta2: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    let first = offset_expolygons(expolygons, delta1, join_type);
    offset_expolygons(&first, delta2, join_type)
}

/// Grow open polylines into areas of half-width `delta` with round caps.
pub fn offset_polylines(polylines: &[Polyline], delta: CoordF) -> ExPolygons {
    if delta <= 0.0 {
        return vec![];
    }
    let half = scale(delta);
    let mut pieces: ExPolygons = Vec::new();

    for polyline in polylines {
        for p in polyline.points() {
            pieces.push(ExPolygon::circle(*p, half, 16));
        }
        for line in polyline.lines() {
            if line.a == line.b {
                continue;
            }
            pieces.push(ExPolygon::new(segment_rectangle(&line, delta)));
        }
    }

    union_ex(&pieces)
}

/// Rectangle of half-width `delta` (mm) around a segment.
fn segment_rectangle(line: &Line, delta: CoordF) -> Polygon {
    let normal = line.direction().perp();
    let n = Point::new(scale(normal.x * delta), scale(normal.y * delta));
    let mut rect = Polygon::from_points(vec![line.a - n, line.b - n, line.b + n, line.a + n]);
    rect.make_counter_clockwise();
    rect
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Whether the two sets share any area.
pub fn polygons_overlap(a: &[ExPolygon], b: &[ExPolygon]) -> bool {
    !intersection(a, b).is_empty()
}

/// Compute the total area of a set of polygons (scaled units squared).
pub fn total_area(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|p| p.area()).sum()
}

/// Outer contours of the union of the input, holes dropped.
pub fn top_level_islands(expolygons: &[ExPolygon]) -> ExPolygons {
    union_ex(expolygons)
        .into_iter()
        .map(|e| ExPolygon::new(e.contour))
        .collect()
}

/// Pieces of `polylines` inside the islands.
///
/// Each input polyline may produce zero, one, or multiple output polylines
/// depending on how it crosses the clipping regions.
pub fn intersect_polylines_with_expolygons(
    polylines: &[Polyline],
    clip: &[ExPolygon],
) -> Polylines {
    if polylines.is_empty() || clip.is_empty() {
        return vec![];
    }
    polylines
        .iter()
        .flat_map(|pl| clip_polyline(pl, clip, true))
        .collect()
}

/// Parts of the polylines lying outside the ExPolygons.
pub fn diff_polylines_with_expolygons(polylines: &[Polyline], clip: &[ExPolygon]) -> Polylines {
    if clip.is_empty() {
        return polylines.iter().filter(|p| p.is_valid()).cloned().collect();
    }
    polylines
        .iter()
        .flat_map(|pl| clip_polyline(pl, clip, false))
        .collect()
}

/// Split every segment at its crossings with the clip boundaries and keep the
/// pieces whose midpoint is inside (or outside) the clip set.
fn clip_polyline(polyline: &Polyline, clip: &[ExPolygon], keep_inside: bool) -> Polylines {
    let mut result = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    let boundaries: Vec<Line> = clip
        .iter()
        .flat_map(|e| std::iter::once(&e.contour).chain(e.holes.iter()))
        .flat_map(|p| p.lines())
        .collect();

    for segment in polyline.lines() {
        let seg_bb = crate::geometry::BoundingBox::from_points(&[segment.a, segment.b]);

        let mut params = vec![0.0, 1.0];
        for edge in &boundaries {
            let edge_bb = crate::geometry::BoundingBox::from_points(&[edge.a, edge.b]);
            if !seg_bb.intersects(&edge_bb) {
                continue;
            }
            if let Some(t) = segment.intersection_param(edge) {
                params.push(t);
            }
        }
        params.sort_by(|a, b| a.total_cmp(b));
        params.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

        for w in params.windows(2) {
            let mid = segment.a.lerp(&segment.b, 0.5 * (w[0] + w[1]));
            let inside = clip.iter().any(|e| e.contains_point(&mid));
            let start = segment.a.lerp(&segment.b, w[0]);
            let end = segment.a.lerp(&segment.b, w[1]);

            if inside == keep_inside {
                if current.last() != Some(&start) {
                    flush(&mut current, &mut result);
                    current.push(start);
                }
                current.push(end);
            } else {
                flush(&mut current, &mut result);
            }
        }
    }
    flush(&mut current, &mut result);
    result
}

fn flush(current: &mut Vec<Point>, result: &mut Polylines) {
    let mut points = std::mem::take(current);
    points.dedup();
    if points.len() >= 2 {
        result.push(Polyline::from_points(points));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::{Coord, SCALING_FACTOR};

    fn make_square(x: Coord, y: Coord, size: Coord) -> ExPolygon {
        let poly = Polygon::rectangle(Point::new(x, y), Point::new(x + size, y + size));
        poly.into()
    }

    fn make_square_mm(x: f64, y: f64, size: f64) -> ExPolygon {
        make_square(scale(x), scale(y), scale(size))
    }

    fn area_mm2(expolys: &[ExPolygon]) -> f64 {
        total_area(expolys) / (SCALING_FACTOR * SCALING_FACTOR)
    }

    #[test]
    fn test_offset_grow_and_shrink() {
        let square = make_square_mm(10.0, 10.0, 10.0);

        let grown = offset_expolygon(&square, 1.0, OffsetJoinType::Miter);
        assert!((area_mm2(&grown) - 144.0).abs() < 0.01);

        // Square joins cut each corner at the offset distance:
        // 140 + 4 * (1 - (sqrt(2) - 1)^2) ~ 143.31.
        let chamfered = area_mm2(&offset_expolygon(&square, 1.0, OffsetJoinType::Square));
        assert!(chamfered > 143.0 && chamfered < 143.6, "area {}", chamfered);

        let shrunk = offset_expolygon(&square, -2.0, OffsetJoinType::Square);
        assert!((area_mm2(&shrunk) - 36.0).abs() < 0.5);
    }

    #[test]
    fn test_offset_shrink_to_nothing() {
        let square = make_square_mm(10.0, 10.0, 2.0);
        let shrunk = offset_expolygon(&square, -2.0, OffsetJoinType::Square);
        assert!(shrunk.is_empty());
    }

    #[test]
    fn test_offset2_removes_thin_sliver() {
        let body = make_square_mm(0.0, 0.0, 10.0);
        let sliver = ExPolygon::rectangle(
            Point::new_scale(10.0, 4.9),
            Point::new_scale(20.0, 5.1),
        );
        let both = union(&[body], &[sliver]);
        let opened = offset2_ex(&both, -0.2, 0.2, OffsetJoinType::Miter);
        let bb = crate::geometry::get_extents(&opened);
        assert!(unscale(bb.max.x) < 10.5);
        assert!((area_mm2(&opened) - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_union_ex_merges_overlaps() {
        let squares: Vec<ExPolygon> = (0..5)
            .map(|i| make_square_mm(i as f64 * 5.0, 0.0, 10.0))
            .collect();
        let merged = union_ex(&squares);
        assert_eq!(merged.len(), 1);
        assert!((area_mm2(&merged) - 300.0).abs() < 0.5);
    }

    #[test]
    fn test_intersection() {
        let square1 = make_square_mm(0.0, 0.0, 10.0);
        let square2 = make_square_mm(5.0, 0.0, 10.0);

        let result = intersection(&[square1], &[square2]);
        assert!((area_mm2(&result) - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_intersection_no_overlap() {
        let square1 = make_square_mm(0.0, 0.0, 10.0);
        let square2 = make_square_mm(20.0, 0.0, 10.0);
        assert!(intersection(&[square1], &[square2]).is_empty());
    }

    #[test]
    fn test_difference_keeps_hole() {
        let large = make_square_mm(0.0, 0.0, 20.0);
        let small = make_square_mm(5.0, 5.0, 10.0);

        let result = difference(&[large.clone()], &[small.clone()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);

        let expected_area = large.area() - small.area();
        assert!((total_area(&result) - expected_area).abs() / expected_area < 0.01);
    }

    #[test]
    fn test_difference_safety_removes_shared_edge_sliver() {
        let a = make_square_mm(0.0, 0.0, 10.0);
        let b = make_square_mm(0.0, 0.0, 10.0);
        assert!(difference_safety(&[a], &[b]).is_empty());
    }

    #[test]
    fn test_offset_polylines() {
        let line = Polyline::from_points(vec![Point::new_scale(0.0, 0.0), Point::new_scale(10.0, 0.0)]);
        let area = offset_polylines(&[line], 0.5);
        assert_eq!(area.len(), 1);
        // Rectangle 10 x 1 plus a disk of radius 0.5
        let expected = 10.0 + std::f64::consts::PI * 0.25;
        assert!((area_mm2(&area) - expected).abs() < 0.05);
    }

    #[test]
    fn test_top_level_islands_drops_holes() {
        let large = make_square_mm(0.0, 0.0, 20.0);
        let small = make_square_mm(5.0, 5.0, 10.0);
        let ring = difference(&[large], &[small]);
        let islands = top_level_islands(&ring);
        assert_eq!(islands.len(), 1);
        assert!(islands[0].holes.is_empty());
        assert!((area_mm2(&islands) - 400.0).abs() < 0.1);
    }

    #[test]
    fn test_intersect_polylines() {
        let clip = vec![make_square_mm(0.0, 0.0, 10.0)];
        let line = Polyline::from_points(vec![Point::new_scale(-5.0, 5.0), Point::new_scale(15.0, 5.0)]);

        let inside = intersect_polylines_with_expolygons(&[line.clone()], &clip);
        assert_eq!(inside.len(), 1);
        assert!((unscale(inside[0].length() as Coord) - 10.0).abs() < 1e-3);

        let outside = diff_polylines_with_expolygons(&[line], &clip);
        assert_eq!(outside.len(), 2);
        let total: f64 = outside.iter().map(|p| p.length()).sum();
        assert!((total / SCALING_FACTOR - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_intersect_polyline_through_hole() {
        let ring = difference(&[make_square_mm(0.0, 0.0, 20.0)], &[make_square_mm(5.0, 5.0, 10.0)]);
        let line = Polyline::from_points(vec![Point::new_scale(-1.0, 10.0), Point::new_scale(21.0, 10.0)]);
        let pieces = intersect_polylines_with_expolygons(&[line], &ring);
        assert_eq!(pieces.len(), 2);
        let total: f64 = pieces.iter().map(|p| p.length()).sum();
        assert!((total / SCALING_FACTOR - 10.0).abs() < 1e-2);
    }

    #[test]
    fn test_polygons_overlap() {
        let square1 = make_square_mm(0.0, 0.0, 10.0);
        let square2 = make_square_mm(5.0, 0.0, 10.0);
        let square3 = make_square_mm(20.0, 0.0, 10.0);

        assert!(polygons_overlap(&[square1.clone()], &[square2]));
        assert!(!polygons_overlap(&[square1], &[square3]));
    }
}
