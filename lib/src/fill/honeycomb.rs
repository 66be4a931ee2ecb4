//! Honeycomb fill.
//!
//! Columns of zigzags, mirrored in pairs, so neighbouring columns share their
//! vertical walls and close into hexagonal cells.

use super::{align_down, clip_and_unrotate, rotate_expolygon, scaled_line_spacing, Fill, FillParams};
use crate::geometry::{ExPolygon, Point, Polyline, Polylines};
use crate::{scale, Coord, CoordF};

const SQRT_3: CoordF = 1.732_050_807_568_877_2;

/// Hexagonal cells whose columns are `spacing / density` apart.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillHoneycomb;

/// Cell dimensions, scaled.
#[derive(Clone, Copy, Debug)]
struct CellMetrics {
    distance: CoordF,
    hex_side: CoordF,
    y_short: CoordF,
    x_offset: CoordF,
    y_offset: CoordF,
}

impl CellMetrics {
    fn new(distance: Coord, spacing: Coord) -> Self {
        let distance = distance as CoordF;
        let x_offset = (spacing as CoordF / 2.0).min(distance / 4.0);
        Self {
            distance,
            hex_side: distance / (SQRT_3 / 2.0),
            y_short: distance * SQRT_3 / 3.0,
            x_offset,
            y_offset: x_offset * SQRT_3 / 3.0,
        }
    }

    #[inline]
    fn hex_width(&self) -> CoordF {
        self.distance * 2.0
    }

    #[inline]
    fn pattern_height(&self) -> CoordF {
        2.0 * (self.y_short + self.hex_side)
    }
}

impl FillHoneycomb {
    pub fn new() -> Self {
        Self
    }

    fn zigzag(m: &CellMetrics, ax: [CoordF; 2], y_min: CoordF, y_max: CoordF) -> Polyline {
        let mut points = Vec::new();
        let p = |x: CoordF, y: CoordF| Point::new(x.round() as Coord, y.round() as Coord);
        let mut y = y_min;
        while y <= y_max {
            points.push(p(ax[1], y + m.y_offset));
            points.push(p(ax[0], y + m.y_short - m.y_offset));
            points.push(p(ax[0], y + m.y_short + m.hex_side + m.y_offset));
            points.push(p(ax[1], y + 2.0 * m.y_short + m.hex_side - m.y_offset));
            points.push(p(ax[1], y + 2.0 * m.y_short + 2.0 * m.hex_side + m.y_offset));
            y += m.pattern_height();
        }
        Polyline::from_points(points)
    }
}

impl Fill for FillHoneycomb {
    fn name(&self) -> &'static str {
        "honeycomb"
    }

    fn fill_surface(&self, expolygon: &ExPolygon, params: &FillParams) -> Polylines {
        let Some(distance) = scaled_line_spacing(params) else {
            return Vec::new();
        };
        if expolygon.is_empty() {
            return Vec::new();
        }

        let angle = params.angle.to_radians();
        let rotated = rotate_expolygon(expolygon, -angle);
        let bbox = rotated.bounding_box();
        if !bbox.is_defined() {
            return Vec::new();
        }

        let m = CellMetrics::new(distance, scale(params.spacing));
        let hex_width = m.hex_width().round() as Coord;
        let pattern_height = m.pattern_height().round() as Coord;
        if hex_width <= 0 || pattern_height <= 0 {
            return Vec::new();
        }
        let x_start = align_down(bbox.min.x, hex_width) as CoordF;
        let y_start = align_down(bbox.min.y, pattern_height) as CoordF;
        let y_end = bbox.max.y as CoordF;

        let mut zigzags = Vec::new();
        let mut x = x_start;
        while x <= bbox.max.x as CoordF {
            let mut ax = [x + m.x_offset, x + m.distance - m.x_offset];
            for i in 0..2 {
                let mut zigzag = Self::zigzag(&m, ax, y_start, y_end);
                if i == 1 {
                    zigzag.reverse();
                }
                zigzags.push(zigzag);
                ax = [ax[1] + m.distance, ax[0] + m.distance];
            }
            x += m.hex_width();
        }

        clip_and_unrotate(zigzags, &rotated, angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SCALING_FACTOR;

    fn square(size_mm: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(0.0, 0.0), Point::new_scale(size_mm, size_mm))
    }

    fn total_length_mm(polylines: &Polylines) -> f64 {
        polylines.iter().map(|p| p.length()).sum::<f64>() / SCALING_FACTOR
    }

    #[test]
    fn test_honeycomb_fills_region() {
        let region = square(20.0);
        let params = FillParams::new(0.2, 0.0, 0.4);
        let polylines = FillHoneycomb::new().fill_surface(&region, &params);
        assert!(!polylines.is_empty());
        let grown = region.bounding_box().expanded(crate::scale(0.01));
        for pl in &polylines {
            assert!(pl.is_valid());
            for p in pl.points() {
                assert!(grown.contains_point(p));
            }
        }
    }

    #[test]
    fn test_honeycomb_length_scales_with_density() {
        let region = square(30.0);
        let sparse = total_length_mm(
            &FillHoneycomb::new().fill_surface(&region, &FillParams::new(0.1, 0.0, 0.4)),
        );
        let dense = total_length_mm(
            &FillHoneycomb::new().fill_surface(&region, &FillParams::new(0.2, 0.0, 0.4)),
        );
        let ratio = dense / sparse;
        assert!(ratio > 1.7 && ratio < 2.3, "ratio {}", ratio);
    }

    #[test]
    fn test_honeycomb_empty_region() {
        let params = FillParams::new(0.5, 0.0, 0.4);
        assert!(FillHoneycomb::new()
            .fill_surface(&ExPolygon::default(), &params)
            .is_empty());
    }
}
