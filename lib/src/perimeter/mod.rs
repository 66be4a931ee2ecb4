//! Perimeter generation.
//!
//! Perimeters are generated from the slice contours by offsetting inward once
//! per loop. Every inset level yields contour and hole rings; the rings are
//! then nested into a tree of [`PerimeterGeneratorLoop`]s that mirrors how
//! they enclose one another, and the tree is traversed once to emit
//! [`ExtrusionLoop`]s in print order.
//!
//! # Ordering
//!
//! Traversal prints the children of a contour before the contour itself and
//! the children of a hole after the hole, so the default order goes from the
//! inside out. `external_perimeters_first` reverses the whole result.
//!
//! The support generator reads the emitted loops to find perimeters that
//! bridge over air (see `support::top_contacts`).

use crate::clipper::{offset2_ex, offset_expolygons, OffsetJoinType};
use crate::config::PrintRegionConfig;
use crate::extrusion::{
    ExtrusionEntityCollection, ExtrusionLoop, ExtrusionLoopRole, ExtrusionRole,
};
use crate::flow::{Flow, FlowResult, FlowRole};
use crate::geometry::{ExPolygon, ExPolygons, Polygon};
use crate::CoordF;
use log::trace;
use std::cmp::Ordering;

/// One perimeter ring and the rings it encloses.
#[derive(Debug, Clone)]
pub struct PerimeterGeneratorLoop {
    /// Ring centerline.
    pub polygon: Polygon,

    /// Inset level, 0 for the outermost ring.
    pub depth: usize,

    /// Whether this ring follows an outer boundary (false for holes).
    pub is_contour: bool,

    /// Rings nested inside this one.
    pub children: Vec<PerimeterGeneratorLoop>,
}

impl PerimeterGeneratorLoop {
    pub fn new(polygon: Polygon, depth: usize, is_contour: bool) -> Self {
        Self {
            polygon,
            depth,
            is_contour,
            children: Vec::new(),
        }
    }

    /// The outermost ring of an island or a hole.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.depth == 0
    }

    /// A contour that encloses no other contour.
    pub fn is_internal_contour(&self) -> bool {
        self.is_contour && !self.children.iter().any(|c| c.is_contour)
    }

    /// Number of rings in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.count()).sum::<usize>()
    }

    fn contains(&self, other: &PerimeterGeneratorLoop) -> bool {
        other
            .polygon
            .first_point()
            .map_or(false, |p| self.polygon.contains_point(&p))
    }
}

/// Result of perimeter generation for one region.
#[derive(Debug, Clone, Default)]
pub struct PerimeterResult {
    /// Perimeter loops in print order.
    pub perimeters: ExtrusionEntityCollection,

    /// Area left inside the innermost loops.
    pub fill_area: ExPolygons,
}

/// Perimeter generator for one region of one layer.
#[derive(Debug, Clone)]
pub struct PerimeterGenerator {
    loop_count: usize,
    external_perimeters_first: bool,
    layer_height: CoordF,
    ext_perimeter_flow: Flow,
    perimeter_flow: Flow,
}

impl PerimeterGenerator {
    /// Generator sized by the region's perimeter widths.
    pub fn new(
        config: &PrintRegionConfig,
        layer_height: CoordF,
        nozzle_diameter: CoordF,
    ) -> FlowResult<Self> {
        Ok(Self {
            loop_count: config.perimeters as usize,
            external_perimeters_first: config.external_perimeters_first,
            layer_height,
            ext_perimeter_flow: config.flow(FlowRole::ExternalPerimeter, layer_height, nozzle_diameter)?,
            perimeter_flow: config.flow(FlowRole::Perimeter, layer_height, nozzle_diameter)?,
        })
    }

    pub fn ext_perimeter_flow(&self) -> &Flow {
        &self.ext_perimeter_flow
    }

    pub fn perimeter_flow(&self) -> &Flow {
        &self.perimeter_flow
    }

    /// Generate perimeters for the given slices.
    pub fn process(&self, slices: &[ExPolygon]) -> FlowResult<PerimeterResult> {
        if slices.is_empty() || self.loop_count == 0 {
            return Ok(PerimeterResult {
                perimeters: ExtrusionEntityCollection::new(),
                fill_area: slices.to_vec(),
            });
        }

        let mut islands = slices.to_vec();
        sort_expolygons(&mut islands);

        let mut perimeters = ExtrusionEntityCollection::new();
        let mut fill_area = Vec::new();
        for island in &islands {
            let (loops, last) = self.build_loops(island);
            perimeters.extend(self.traverse_loops(&loops)?);
            let inset = if loops.is_empty() {
                self.ext_perimeter_flow.width()
            } else {
                0.5 * self.perimeter_flow.spacing()
            };
            let base = if loops.is_empty() {
                std::slice::from_ref(island)
            } else {
                last.as_slice()
            };
            fill_area.extend(offset_expolygons(base, -inset, OffsetJoinType::Miter));
        }

        if self.external_perimeters_first {
            perimeters.entities.reverse();
        }

        trace!(
            "Perimeters: {} islands, {} loops",
            islands.len(),
            perimeters.len()
        );
        Ok(PerimeterResult {
            perimeters,
            fill_area,
        })
    }

    /// Inset one island and nest the rings. Returns the root loops and the
    /// area enclosed by the innermost rings.
    pub fn build_loops(&self, island: &ExPolygon) -> (Vec<PerimeterGeneratorLoop>, ExPolygons) {
        let ext_width = self.ext_perimeter_flow.width();
        let ext_spacing = self.ext_perimeter_flow.spacing();
        let spacing = self.perimeter_flow.spacing();
        if self.loop_count == 0 {
            return (Vec::new(), vec![island.clone()]);
        }

        let mut contours: Vec<Vec<PerimeterGeneratorLoop>> = vec![Vec::new(); self.loop_count];
        let mut holes: Vec<Vec<PerimeterGeneratorLoop>> = vec![Vec::new(); self.loop_count];
        let mut last: ExPolygons = vec![island.clone()];

        for depth in 0..self.loop_count {
            let offsets = if depth == 0 {
                offset_expolygons(&last, -0.5 * ext_width, OffsetJoinType::Miter)
            } else {
                let distance = if depth == 1 {
                    0.5 * (ext_spacing + spacing)
                } else {
                    spacing
                };
                // Open by half a spacing so slivers thinner than one loop vanish.
                offset2_ex(
                    &last,
                    -(distance + 0.5 * spacing),
                    0.5 * spacing,
                    OffsetJoinType::Miter,
                )
            };
            if offsets.is_empty() {
                break;
            }

            for expolygon in &offsets {
                contours[depth].push(PerimeterGeneratorLoop::new(
                    expolygon.contour.clone(),
                    depth,
                    true,
                ));
                let mut sorted_holes = expolygon.holes.clone();
                sorted_holes.sort_by(compare_polygons);
                holes[depth].extend(
                    sorted_holes
                        .into_iter()
                        .map(|hole| PerimeterGeneratorLoop::new(hole, depth, false)),
                );
            }
            last = offsets;
        }

        let innermost = if contours.first().map_or(true, Vec::is_empty) {
            Vec::new()
        } else {
            last
        };
        (nest_loops(contours, holes), innermost)
    }

    /// Turn a loop tree into extrusion loops in print order.
    pub fn traverse_loops(
        &self,
        loops: &[PerimeterGeneratorLoop],
    ) -> FlowResult<ExtrusionEntityCollection> {
        let mut out = ExtrusionEntityCollection::new();
        for pg_loop in loops {
            let children = self.traverse_loops(&pg_loop.children)?;

            let (role, flow) = if pg_loop.is_external() {
                (ExtrusionRole::ExternalPerimeter, &self.ext_perimeter_flow)
            } else {
                (ExtrusionRole::Perimeter, &self.perimeter_flow)
            };
            let loop_role = if pg_loop.is_internal_contour() {
                ExtrusionLoopRole::ContourInternalPerimeter
            } else if pg_loop.is_contour {
                ExtrusionLoopRole::Default
            } else {
                ExtrusionLoopRole::Hole
            };

            let mut eloop = ExtrusionLoop::from_polygon(
                &pg_loop.polygon,
                role,
                loop_role,
                flow.mm3_per_mm()?,
                flow.width(),
                self.layer_height,
            );

            if pg_loop.is_contour {
                eloop.make_counter_clockwise();
                out.extend(children);
                out.push(eloop);
            } else {
                eloop.make_clockwise();
                out.push(eloop);
                out.extend(children);
            }
        }
        Ok(out)
    }
}

/// Where a ring gets nested.
enum Parent {
    Hole(usize, usize),
    Contour(usize, usize),
}

/// Nest holes under the hole or contour enclosing them, then contours under
/// the contour one level out. Everything ends up under the depth-0 contours.
fn nest_loops(
    mut contours: Vec<Vec<PerimeterGeneratorLoop>>,
    mut holes: Vec<Vec<PerimeterGeneratorLoop>>,
) -> Vec<PerimeterGeneratorLoop> {
    let levels = contours.len();

    for d in 0..levels {
        let pending = std::mem::take(&mut holes[d]);
        for hole in pending {
            match find_hole_parent(&holes, &contours, d, &hole) {
                Some(Parent::Hole(t, j)) => holes[t][j].children.push(hole),
                Some(Parent::Contour(t, j)) => contours[t][j].children.push(hole),
                None => holes[d].push(hole),
            }
        }
    }

    for d in (1..levels).rev() {
        let pending = std::mem::take(&mut contours[d]);
        for contour in pending {
            let parent = (0..d).rev().find_map(|t| {
                contours[t]
                    .iter()
                    .position(|c| c.contains(&contour))
                    .map(|j| (t, j))
            });
            match parent {
                Some((t, j)) => contours[t][j].children.push(contour),
                None => contours[d].push(contour),
            }
        }
    }

    // Rings left unnested (numerical corner cases) are kept as roots.
    let mut roots: Vec<PerimeterGeneratorLoop> = contours.into_iter().flatten().collect();
    roots.extend(holes.into_iter().flatten());
    roots
}

/// Enclosing hole from a deeper level, else the innermost enclosing contour.
fn find_hole_parent(
    holes: &[Vec<PerimeterGeneratorLoop>],
    contours: &[Vec<PerimeterGeneratorLoop>],
    depth: usize,
    hole: &PerimeterGeneratorLoop,
) -> Option<Parent> {
    let levels = holes.len();
    (depth + 1..levels)
        .find_map(|t| {
            holes[t]
                .iter()
                .position(|c| c.contains(hole))
                .map(|j| Parent::Hole(t, j))
        })
        .or_else(|| {
            (0..levels).rev().find_map(|t| {
                contours[t]
                    .iter()
                    .position(|c| c.contains(hole))
                    .map(|j| Parent::Contour(t, j))
            })
        })
}

/// Sort by bounding box min X, then min Y, then larger area first.
fn sort_expolygons(expolygons: &mut [ExPolygon]) {
    expolygons.sort_by(|a, b| {
        let (bb_a, bb_b) = (a.bounding_box(), b.bounding_box());
        bb_a.min
            .x
            .cmp(&bb_b.min.x)
            .then(bb_a.min.y.cmp(&bb_b.min.y))
            .then(b.area().partial_cmp(&a.area()).unwrap_or(Ordering::Equal))
    });
}

fn compare_polygons(a: &Polygon, b: &Polygon) -> Ordering {
    let (bb_a, bb_b) = (a.bounding_box(), b.bounding_box());
    bb_a.min
        .x
        .cmp(&bb_b.min.x)
        .then(bb_a.min.y.cmp(&bb_b.min.y))
        .then(b.area().partial_cmp(&a.area()).unwrap_or(Ordering::Equal))
}
