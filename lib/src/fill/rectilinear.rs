//! Rectilinear (parallel line) fill, with an optional crossed grid.

use super::{align_down, clip_and_unrotate, rotate_expolygon, scaled_line_spacing, Fill, FillParams};
use crate::geometry::{ExPolygon, Point, Polyline, Polylines};
use crate::CoordF;

/// Parallel lines at `params.angle`. The grid variant adds a second set at
/// `angle + 90°` and doubles the distance in each set, so the density law
/// still holds for the combined pattern.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillRectilinear {
    grid: bool,
}

impl FillRectilinear {
    pub fn new() -> Self {
        Self { grid: false }
    }

    pub fn grid() -> Self {
        Self { grid: true }
    }

    fn fill_direction(
        &self,
        expolygon: &ExPolygon,
        angle_deg: CoordF,
        distance: crate::Coord,
    ) -> Polylines {
        // Rotate the region so the lines become vertical.
        let angle = angle_deg.to_radians();
        let rotated = rotate_expolygon(expolygon, -angle);
        let bbox = rotated.bounding_box();
        if !bbox.is_defined() {
            return Vec::new();
        }

        let mut lines = Vec::new();
        let mut x = align_down(bbox.min.x, distance) + distance / 2;
        let mut flip = false;
        while x <= bbox.max.x {
            let (y0, y1) = if flip {
                (bbox.max.y + 1, bbox.min.y - 1)
            } else {
                (bbox.min.y - 1, bbox.max.y + 1)
            };
            lines.push(Polyline::from_points(vec![Point::new(x, y0), Point::new(x, y1)]));
            x += distance;
            flip = !flip;
        }

        clip_and_unrotate(lines, &rotated, angle)
    }
}

impl Fill for FillRectilinear {
    fn name(&self) -> &'static str {
        if self.grid {
            "grid"
        } else {
            "rectilinear"
        }
    }

    fn fill_surface(&self, expolygon: &ExPolygon, params: &FillParams) -> Polylines {
        let Some(distance) = scaled_line_spacing(params) else {
            return Vec::new();
        };
        if expolygon.is_empty() {
            return Vec::new();
        }

        if self.grid {
            let mut polylines = self.fill_direction(expolygon, params.angle, distance * 2);
            polylines.extend(self.fill_direction(expolygon, params.angle + 90.0, distance * 2));
            polylines
        } else {
            self.fill_direction(expolygon, params.angle, distance)
        }
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
    fn test_rectilinear_density_law() {
        let fill = FillRectilinear::new();
        let region = square(20.0);
        for density in [0.25, 0.5, 1.0] {
            let params = FillParams::new(density, 0.0, 0.4);
            let length = total_length_mm(&fill.fill_surface(&region, &params));
            let expected = 20.0 * 20.0 * density / 0.4;
            assert!(
                (length - expected).abs() / expected < 0.05,
                "density {}: {} vs {}",
                density,
                length,
                expected
            );
        }
    }

    #[test]
    fn test_rectilinear_rotated_stays_inside() {
        let fill = FillRectilinear::new();
        let region = square(10.0);
        let params = FillParams::new(0.3, 45.0, 0.4);
        let polylines = fill.fill_surface(&region, &params);
        assert!(!polylines.is_empty());
        let grown = region.bounding_box().expanded(crate::scale(0.01));
        for pl in &polylines {
            for p in pl.points() {
                assert!(grown.contains_point(p));
            }
        }
    }

    #[test]
    fn test_grid_matches_plain_coverage() {
        let region = square(20.0);
        let params = FillParams::new(0.5, 0.0, 0.4);
        let plain = total_length_mm(&FillRectilinear::new().fill_surface(&region, &params));
        let grid = total_length_mm(&FillRectilinear::grid().fill_surface(&region, &params));
        assert!((plain - grid).abs() / plain < 0.1);
    }

    #[test]
    fn test_zero_density_is_empty() {
        let fill = FillRectilinear::new();
        let params = FillParams::new(0.0, 0.0, 0.4);
        assert!(fill.fill_surface(&square(5.0), &params).is_empty());
    }
}
