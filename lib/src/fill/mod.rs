//! Infill pattern generation.
//!
//! Fillers turn a region into a finite set of open polylines. Patterns are
//! generated in a rotated frame, clipped against the region and rotated back,
//! so every filler shares the same alignment across layers.
//!
//! Density follows one law for every pattern: the distance between adjacent
//! lines is `spacing / density`. A density of 1 packs lines at the extrusion
//! spacing; 0 produces nothing.

mod honeycomb;
mod rectilinear;

pub use honeycomb::FillHoneycomb;
pub use rectilinear::FillRectilinear;

use crate::clipper;
use crate::config::SupportMaterialPattern;
use crate::geometry::{ExPolygon, Polygon, Polyline, Polylines};
use crate::{scale, Coord, CoordF};

/// Parameters for one fill call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillParams {
    /// Fraction of the region covered, 0.0 - 1.0.
    pub density: CoordF,
    /// Pattern rotation (degrees).
    pub angle: CoordF,
    /// Extrusion spacing (mm).
    pub spacing: CoordF,
}

impl FillParams {
    pub fn new(density: CoordF, angle: CoordF, spacing: CoordF) -> Self {
        Self {
            density,
            angle,
            spacing,
        }
    }

    /// Distance between adjacent lines (mm), or `None` when nothing is printed.
    pub fn line_spacing(&self) -> Option<CoordF> {
        if !(self.density > 0.0) || !(self.spacing > 0.0) {
            return None;
        }
        Some(self.spacing / self.density.min(1.0))
    }
}

impl Default for FillParams {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.4)
    }
}

/// A fill pattern generator.
pub trait Fill: Send + Sync {
    /// Pattern name.
    fn name(&self) -> &'static str;

    /// Cover `expolygon` with open polylines.
    fn fill_surface(&self, expolygon: &ExPolygon, params: &FillParams) -> Polylines;

    /// Fill every region in turn.
    fn fill_expolygons(&self, expolygons: &[ExPolygon], params: &FillParams) -> Polylines {
        expolygons
            .iter()
            .flat_map(|e| self.fill_surface(e, params))
            .collect()
    }
}

/// Filler used for the base support layers.
pub fn new_from_pattern(pattern: SupportMaterialPattern) -> Box<dyn Fill> {
    match pattern {
        SupportMaterialPattern::Rectilinear | SupportMaterialPattern::RectilinearGrid => {
            Box::new(FillRectilinear::new())
        }
        SupportMaterialPattern::Honeycomb | SupportMaterialPattern::Pillars => {
            Box::new(FillHoneycomb::new())
        }
    }
}

/// Rotate an ExPolygon around the origin.
pub(crate) fn rotate_expolygon(expolygon: &ExPolygon, angle: CoordF) -> ExPolygon {
    let (sin_a, cos_a) = angle.sin_cos();
    let rotate = |poly: &Polygon| {
        Polygon::from_points(
            poly.points()
                .iter()
                .map(|p| p.rotate_by_cos_sin(cos_a, sin_a))
                .collect(),
        )
    };
    ExPolygon::with_holes(
        rotate(&expolygon.contour),
        expolygon.holes.iter().map(rotate).collect(),
    )
}

/// Rotate polylines around the origin.
pub(crate) fn rotate_polylines(polylines: &mut Polylines, angle: CoordF) {
    let (sin_a, cos_a) = angle.sin_cos();
    for polyline in polylines.iter_mut() {
        for p in polyline.points_mut().iter_mut() {
            *p = p.rotate_by_cos_sin(cos_a, sin_a);
        }
    }
}

/// Clip polylines generated in the rotated frame and bring them back.
pub(crate) fn clip_and_unrotate(
    pattern: Vec<Polyline>,
    rotated: &ExPolygon,
    angle: CoordF,
) -> Polylines {
    let mut clipped = clipper::intersect_polylines_with_expolygons(
        &pattern,
        std::slice::from_ref(rotated),
    );
    clipped.retain(|p| p.is_valid());
    rotate_polylines(&mut clipped, angle);
    clipped
}

/// Round `v` down to a multiple of `step`, so patterns line up across layers.
#[inline]
pub(crate) fn align_down(v: Coord, step: Coord) -> Coord {
    if step <= 0 {
        return v;
    }
    v.div_euclid(step) * step
}

/// Scaled line distance for a fill call.
pub(crate) fn scaled_line_spacing(params: &FillParams) -> Option<Coord> {
    params
        .line_spacing()
        .map(scale)
        .filter(|&d| d > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spacing_density_law() {
        let params = FillParams::new(0.5, 0.0, 0.4);
        assert!((params.line_spacing().unwrap() - 0.8).abs() < 1e-12);
        assert!(FillParams::new(0.0, 0.0, 0.4).line_spacing().is_none());
        let solid = FillParams::new(1.5, 0.0, 0.4);
        assert!((solid.line_spacing().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_new_from_pattern() {
        assert_eq!(
            new_from_pattern(SupportMaterialPattern::Rectilinear).name(),
            "rectilinear"
        );
        assert_eq!(
            new_from_pattern(SupportMaterialPattern::Pillars).name(),
            "honeycomb"
        );
    }

    #[test]
    fn test_align_down_negative() {
        assert_eq!(align_down(-5, 4), -8);
        assert_eq!(align_down(9, 4), 8);
    }
}
