//! Extrusion paths for the finished support stack.
//!
//! Layers sharing a printed Z are grouped and turned into one [`SupportLayer`]
//! each. Groups are independent, so they are processed in parallel; every
//! group works on its own copies of the layers it merges or trims.

use super::layer::{Layer, LayerArena};
use super::output::SupportLayer;
use super::top_contacts::SUPPORT_SURFACES_JOIN;
use super::z_iter::{ActiveLayers, LayerTrack};
use super::{SupportMaterial, SupportResult, SupportStack, SUPPORT_MATERIAL_MARGIN};
use crate::clipper;
use crate::config::SupportMaterialPattern;
use crate::extrusion::{ExtrusionEntityCollection, ExtrusionLoop, ExtrusionLoopRole, ExtrusionRole};
use crate::fill::{self, Fill, FillParams, FillRectilinear};
use crate::flow::{Flow, FlowResult};
use crate::geometry::{to_polygons, ExPolygon, ExPolygons, Polygon, Polylines};
use crate::{scale, CoordF, EPSILON};
use log::{debug, trace};
use rayon::prelude::*;

/// Density of the first layer flange.
const FLANGE_DENSITY: CoordF = 0.5;

/// Contact loops around the parts of a top contact facing an overhang.
///
/// The outermost loop is perforated with hexagons so it breaks away from the
/// object more easily.
#[derive(Debug, Clone)]
pub struct LoopInterfaceProcessor {
    n_contact_loops: usize,
    circle_radius: CoordF,
    circle_distance: CoordF,
    /// Hexagon centered at the origin (scaled).
    circle: Polygon,
}

impl LoopInterfaceProcessor {
    /// `circle_radius` is the radius of the perforations (mm).
    pub fn new(n_contact_loops: usize, circle_radius: CoordF) -> Self {
        Self {
            n_contact_loops,
            circle_radius,
            circle_distance: 3.0 * circle_radius,
            circle: Polygon::regular(6, scale(circle_radius)),
        }
    }

    #[inline]
    pub fn n_contact_loops(&self) -> usize {
        self.n_contact_loops
    }

    #[inline]
    pub fn circle_radius(&self) -> CoordF {
        self.circle_radius
    }

    /// Loops for `contact`, extruded with `flow` at the contact's height.
    /// The area the loops cover is removed from `contact.polygons`.
    pub fn generate(
        &self,
        contact: &mut Layer,
        flow: &Flow,
    ) -> FlowResult<ExtrusionEntityCollection> {
        let mut out = ExtrusionEntityCollection::new();
        if self.n_contact_loops == 0 || contact.is_empty() {
            return Ok(out);
        }
        let flow = flow.with_height(contact.height)?;
        let (width, spacing) = (flow.width(), flow.spacing());

        // Centerline of the outermost loop; only contours facing the overhang.
        let centerline = to_polygons(&clipper::offset_expolygons(
            &contact.polygons,
            -0.5 * width,
            SUPPORT_SURFACES_JOIN,
        ));
        let overhang_with_margin =
            clipper::offset_expolygons(&contact.aux_polygons, 0.5 * width, SUPPORT_SURFACES_JOIN);

        let mut external_loops: ExPolygons = Vec::new();
        let mut circles: ExPolygons = Vec::new();
        for contour in &centerline {
            let line = contour.split_at_first_point();
            if clipper::intersect_polylines_with_expolygons(
                std::slice::from_ref(&line),
                &overhang_with_margin,
            )
            .is_empty()
            {
                continue;
            }
            for center in contour.equally_spaced_points(scale(self.circle_distance) as CoordF) {
                let mut circle = self.circle.clone();
                circle.translate(center);
                circles.push(ExPolygon::new(circle));
            }
            let mut contour = contour.clone();
            contour.make_counter_clockwise();
            external_loops.push(ExPolygon::new(contour));
        }
        if external_loops.is_empty() {
            return Ok(out);
        }
        let loops0 = clipper::difference(&external_loops, &circles);

        let mut loop_polygons = to_polygons(&loops0);
        for i in 1..self.n_contact_loops {
            let inset = clipper::offset2_ex(
                &loops0,
                -(i as CoordF * spacing + 0.5 * spacing),
                0.5 * spacing,
                SUPPORT_SURFACES_JOIN,
            );
            loop_polygons.extend(to_polygons(&inset));
        }

        // Only the side oriented towards the object.
        let loop_lines: Polylines = loop_polygons
            .iter()
            .map(Polygon::split_at_first_point)
            .collect();
        let reach = clipper::offset_expolygons(
            &contact.aux_polygons,
            SUPPORT_MATERIAL_MARGIN,
            SUPPORT_SURFACES_JOIN,
        );
        let loop_lines = clipper::intersect_polylines_with_expolygons(&loop_lines, &reach);
        if loop_lines.is_empty() {
            return Ok(out);
        }

        let covered = clipper::offset_polylines(&loop_lines, 1.1 * self.circle_radius);
        contact.polygons = clipper::difference(&contact.polygons, &covered);
        trace!(
            "Support generator - {} contact loop segments at z={:.3}",
            loop_lines.len(),
            contact.print_z
        );
        out.append_paths_with_flow(loop_lines, ExtrusionRole::SupportMaterialInterface, &flow)?;
        Ok(out)
    }
}

/// Settings shared by every layer of one toolpath run.
struct ToolpathParams {
    base_filler: Box<dyn Fill>,
    interface_filler: FillRectilinear,
    /// Base angles, cycled by layer id (degrees).
    angles: Vec<CoordF>,
    interface_angle: CoordF,
    support_density: CoordF,
    interface_density: CoordF,
    with_sheath: bool,
    /// No interface layers: contacts are printed like the base.
    interface_as_base: bool,
    loops: LoopInterfaceProcessor,
}

impl ToolpathParams {
    fn base_angle(&self, layer_id: usize) -> CoordF {
        self.angles[layer_id % self.angles.len()]
    }
}

/// Fill density leaving `gap` mm between lines of `flow_spacing`.
pub(crate) fn fill_density(flow_spacing: CoordF, gap: CoordF) -> CoordF {
    (flow_spacing / (gap + flow_spacing)).min(1.0)
}

impl SupportMaterial {
    /// One [`SupportLayer`] per printed Z level of the stack, bottom first.
    pub(crate) fn generate_toolpaths(
        &self,
        stack: &SupportStack,
    ) -> SupportResult<Vec<SupportLayer>> {
        let params = self.toolpath_params();
        let groups: Vec<(CoordF, ActiveLayers)> = stack.z_sorted().collect();
        debug!(
            "Support generator - toolpaths for {} layers, density {:.3} base, {:.3} interface",
            groups.len(),
            params.support_density,
            params.interface_density
        );

        groups
            .par_iter()
            .enumerate()
            .map(|(id, (print_z, active))| {
                self.layer_toolpaths(&params, &stack.arena, id, *print_z, active)
            })
            .collect()
    }

    fn toolpath_params(&self) -> ToolpathParams {
        let config = &self.object_config;
        let angle = config.support_material_angle;
        let mut angles = vec![angle];
        if config.support_material_pattern == SupportMaterialPattern::RectilinearGrid {
            angles.push(angle + 90.0);
        }

        let support_density =
            fill_density(self.support_flow.spacing(), config.support_material_spacing);
        let interface_as_base = config.support_material_interface_layers == 0;
        let interface_density = if interface_as_base {
            support_density
        } else {
            fill_density(
                self.interface_flow.spacing(),
                config.support_material_interface_spacing,
            )
        };
        let n_contact_loops = usize::from(self.has_contact_loops());

        ToolpathParams {
            base_filler: fill::new_from_pattern(config.support_material_pattern),
            interface_filler: FillRectilinear::new(),
            angles,
            interface_angle: angle + 90.0,
            support_density,
            interface_density,
            with_sheath: config.support_material_with_sheath,
            interface_as_base,
            loops: LoopInterfaceProcessor::new(n_contact_loops, 1.5 * self.interface_flow.width()),
        }
    }

    fn layer_toolpaths(
        &self,
        params: &ToolpathParams,
        arena: &LayerArena,
        id: usize,
        print_z: CoordF,
        active: &ActiveLayers,
    ) -> SupportResult<SupportLayer> {
        let mut out = SupportLayer::new(id, active.min_height(arena), print_z);
        let footprint: ExPolygons = active
            .iter()
            .flat_map(|(_, idx)| arena[idx].polygons.iter().cloned())
            .collect();
        out.support_islands = clipper::union_ex(&footprint);

        let local = |track| {
            active
                .get(track)
                .map(|idx| arena[idx].clone())
                .filter(|layer: &Layer| !layer.is_empty())
        };

        if let Some(raft) = local(LayerTrack::Raft) {
            self.raft_toolpaths(params, &raft, &mut out)?;
        }

        let mut top = local(LayerTrack::TopContact);
        let mut bottom = local(LayerTrack::BottomContact);
        let mut interface = local(LayerTrack::Interface);
        let mut base = local(LayerTrack::Intermediate);

        if params.interface_as_base {
            merge_or_swap(&mut base, &mut top);
            merge_or_swap(&mut base, &mut bottom);
        } else {
            if let Some(contact) = top.as_mut() {
                let loops = params.loops.generate(contact, &self.interface_flow)?;
                out.support_interface_fills.extend(loops);
            }
            if could_merge(&top, &interface) {
                merge_into(&mut top, &mut interface);
            }
        }

        // Base enclosed by the interface anchors it, and becomes interface.
        if let (Some(iface), Some(base)) = (interface.as_mut(), base.as_mut()) {
            let islands = clipper::top_level_islands(&iface.polygons);
            let enclosed = clipper::intersection(&base.polygons, &islands);
            iface.polygons.extend(enclosed);
            base.polygons = clipper::difference(&base.polygons, &islands);
        }

        let interface_angle = if params.interface_as_base {
            params.base_angle(id)
        } else {
            params.interface_angle
        };
        for layer in [&top, &bottom, &interface].into_iter().flatten() {
            if layer.is_empty() {
                continue;
            }
            let width = if layer.bridging {
                layer.height
            } else {
                self.interface_flow.width()
            };
            let flow = Flow::with_bridge(
                width,
                layer.height,
                self.interface_flow.nozzle_diameter(),
                layer.bridging,
            )?;
            let fill_params = FillParams::new(
                params.interface_density,
                interface_angle,
                self.interface_flow.spacing(),
            );
            let polylines = params
                .interface_filler
                .fill_expolygons(&clipper::union_ex(&layer.polygons), &fill_params);
            out.support_interface_fills.append_paths_with_flow(
                polylines,
                ExtrusionRole::SupportMaterialInterface,
                &flow,
            )?;
        }

        if let Some(base) = base.filter(|b| !b.is_empty()) {
            let width = if base.bridging {
                base.height
            } else {
                self.support_flow.width()
            };
            let flow = Flow::with_bridge(
                width,
                base.height,
                self.support_flow.nozzle_diameter(),
                base.bridging,
            )?;
            self.fill_base_area(
                params,
                &base.polygons,
                params.base_angle(id),
                base.bottom_z < EPSILON,
                &flow,
                &mut out.support_fills,
            )?;
        }

        trace!(
            "Support generator - layer {} at z={:.3}: {} base, {} interface entities",
            id,
            print_z,
            out.support_fills.len(),
            out.support_interface_fills.len()
        );
        Ok(out)
    }

    /// Every raft layer below the contact is printed with the support
    /// filler at angle 0, the one on the bed as a flange.
    fn raft_toolpaths(
        &self,
        params: &ToolpathParams,
        raft: &Layer,
        out: &mut SupportLayer,
    ) -> SupportResult<()> {
        let flange = raft.bottom_z < EPSILON;
        let flow = self.support_flow.with_height(raft.height)?;
        self.fill_base_area(params, &raft.polygons, 0.0, flange, &flow, &mut out.support_fills)
    }

    /// Sparse base infill. The first layer gets a flange instead; otherwise a
    /// sheath loop goes around the infill when enabled.
    fn fill_base_area(
        &self,
        params: &ToolpathParams,
        polygons: &[ExPolygon],
        angle: CoordF,
        flange: bool,
        flow: &Flow,
        out: &mut ExtrusionEntityCollection,
    ) -> SupportResult<()> {
        let sheath = params.with_sheath && !flange;
        let shrink = if sheath { 0.5 * flow.width() } else { 0.0 };
        let mut to_infill =
            clipper::offset2_ex(polygons, EPSILON, -EPSILON - shrink, SUPPORT_SURFACES_JOIN);
        if to_infill.is_empty() {
            return Ok(());
        }

        if flange {
            let flow = &self.first_layer_flow;
            let fill_params =
                FillParams::new(FLANGE_DENSITY, params.interface_angle, flow.spacing());
            let polylines = params.interface_filler.fill_expolygons(&to_infill, &fill_params);
            out.append_paths_with_flow(polylines, ExtrusionRole::SupportMaterial, flow)?;
            return Ok(());
        }

        if sheath {
            let mm3_per_mm = flow.mm3_per_mm()?;
            for polygon in to_polygons(&to_infill) {
                out.push(ExtrusionLoop::from_polygon(
                    &polygon,
                    ExtrusionRole::SupportMaterial,
                    ExtrusionLoopRole::Default,
                    mm3_per_mm,
                    flow.width(),
                    flow.height(),
                ));
            }
            to_infill =
                clipper::offset_expolygons(&to_infill, -flow.spacing(), SUPPORT_SURFACES_JOIN);
        }

        let fill_params =
            FillParams::new(params.support_density, angle, self.support_flow.spacing());
        let polylines = params.base_filler.fill_expolygons(&to_infill, &fill_params);
        out.append_paths_with_flow(polylines, ExtrusionRole::SupportMaterial, flow)?;
        Ok(())
    }
}

/// Both present and non-empty, same height and same bridging.
fn could_merge(a: &Option<Layer>, b: &Option<Layer>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            !a.is_empty()
                && !b.is_empty()
                && (a.height - b.height).abs() < EPSILON
                && a.bridging == b.bridging
        }
        _ => false,
    }
}

/// Move the polygons of `other` into `into`.
fn merge_into(into: &mut Option<Layer>, other: &mut Option<Layer>) {
    if let (Some(into), Some(other)) = (into.as_mut(), other.take()) {
        into.polygons = clipper::union(&into.polygons, &other.polygons);
    }
}

/// Merge `other` into `into`, or let it take the place of a missing `into`
/// unless it is bridging.
fn merge_or_swap(into: &mut Option<Layer>, other: &mut Option<Layer>) {
    if could_merge(into, other) {
        merge_into(into, other);
    } else if into.as_ref().map_or(true, Layer::is_empty)
        && other.as_ref().is_some_and(|o| !o.is_empty() && !o.bridging)
    {
        std::mem::swap(into, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrintConfig, PrintObjectConfig};
    use crate::extrusion::ExtrusionEntity;
    use crate::geometry::Point;
    use crate::slice::SlicingParams;
    use crate::support::layer::{LayerIdxs, SupportLayerType};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn square_mm(x0: f64, y0: f64, x1: f64, y1: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(x0, y0), Point::new_scale(x1, y1))
    }

    fn generator(config: PrintObjectConfig) -> SupportMaterial {
        SupportMaterial::new(
            &config.with_support_material(true),
            &PrintConfig::new(),
            &SlicingParams::new(0.2, 0.2),
        )
        .unwrap()
    }

    fn layer(layer_type: SupportLayerType, bottom_z: f64, print_z: f64, area: ExPolygon) -> Layer {
        let mut layer = Layer::with_z_range(layer_type, bottom_z, print_z);
        layer.polygons = vec![area];
        layer
    }

    /// Five base layers from the bed up, a bridging top contact above them.
    fn column_stack() -> SupportStack {
        let mut stack = SupportStack::default();
        let intermediate: LayerIdxs = (0..5)
            .map(|i| {
                stack.arena.alloc(layer(
                    SupportLayerType::Intermediate,
                    i as f64 * 0.2,
                    (i + 1) as f64 * 0.2,
                    square_mm(0.0, 0.0, 20.0, 20.0),
                ))
            })
            .collect();
        let mut contact = layer(
            SupportLayerType::TopContact,
            1.0,
            1.2,
            square_mm(0.0, 0.0, 20.0, 20.0),
        );
        contact.bridging = true;
        let contact = stack.arena.alloc(contact);
        stack.intermediate_layers = intermediate;
        stack.top_contacts = vec![contact];
        stack
    }

    fn widths(collection: &ExtrusionEntityCollection) -> Vec<f64> {
        collection.paths().iter().map(|p| p.width).collect()
    }

    #[test]
    fn test_density_law() {
        assert!(approx_eq(fill_density(0.4, 0.0), 1.0));
        assert!(approx_eq(fill_density(0.4, 0.4), 0.5));
        assert!(approx_eq(fill_density(0.5, 2.0), 0.2));

        let sm = generator(PrintObjectConfig::new());
        let params = sm.toolpath_params();
        let sp = sm.support_flow().spacing();
        assert!(approx_eq(params.support_density, sp / (2.5 + sp)));
        assert!(approx_eq(params.interface_density, 1.0));

        let sm = generator(PrintObjectConfig::new().with_interface_layers(0));
        let params = sm.toolpath_params();
        assert!(approx_eq(params.interface_density, params.support_density));
    }

    #[test]
    fn test_grid_alternates_angles() {
        let sm = generator(
            PrintObjectConfig::new().with_pattern(SupportMaterialPattern::RectilinearGrid),
        );
        let params = sm.toolpath_params();
        assert!(approx_eq(params.base_angle(0), 0.0));
        assert!(approx_eq(params.base_angle(1), 90.0));
        assert!(approx_eq(params.base_angle(2), 0.0));
        assert!(approx_eq(params.interface_angle, 90.0));
    }

    #[test]
    fn test_one_layer_per_z_with_roles_routed() {
        let sm = generator(PrintObjectConfig::new());
        let stack = column_stack();
        let layers = sm.generate_toolpaths(&stack).unwrap();

        assert_eq!(layers.len(), 6);
        for (i, l) in layers.iter().enumerate() {
            assert_eq!(l.id, i);
            assert!(l.has_only_support_roles());
            assert!(!l.support_islands.is_empty());
        }
        assert!(layers.windows(2).all(|w| w[0].print_z < w[1].print_z));

        // The contact layer is all interface.
        let contact = &layers[5];
        assert!(contact.support_fills.is_empty());
        assert!(!contact.support_interface_fills.is_empty());
        assert!(contact
            .support_interface_fills
            .paths()
            .iter()
            .all(|p| p.role == ExtrusionRole::SupportMaterialInterface && approx_eq(p.height, 0.2)));

        // Base layers only carry base extrusions.
        assert!(layers[2].support_interface_fills.is_empty());
        assert!(layers[2]
            .support_fills
            .paths()
            .iter()
            .all(|p| p.role == ExtrusionRole::SupportMaterial));
    }

    #[test]
    fn test_first_layer_flange() {
        let sm = generator(PrintObjectConfig::new());
        let layers = sm.generate_toolpaths(&column_stack()).unwrap();
        let first_width = sm.first_layer_flow().width();
        let flange = widths(&layers[0].support_fills);
        assert!(!flange.is_empty());
        assert!(flange.iter().all(|w| approx_eq(*w, first_width)));
        // No sheath on the flange.
        assert!(!layers[0].support_fills.iter().any(ExtrusionEntity::is_loop));
    }

    #[test]
    fn test_sheath_around_base() {
        let sm = generator(PrintObjectConfig::new().with_sheath(true));
        let layers = sm.generate_toolpaths(&column_stack()).unwrap();
        assert!(layers[1].support_fills.iter().any(ExtrusionEntity::is_loop));

        let sm = generator(PrintObjectConfig::new().with_sheath(false));
        let layers = sm.generate_toolpaths(&column_stack()).unwrap();
        assert!(!layers[1].support_fills.iter().any(ExtrusionEntity::is_loop));
        assert!(!layers[1].support_fills.is_empty());
    }

    #[test]
    fn test_zero_interface_layers_merge_contact_into_base() {
        let sm = generator(PrintObjectConfig::new().with_interface_layers(0));
        let mut stack = SupportStack::default();
        let base = stack.arena.alloc(layer(
            SupportLayerType::Intermediate,
            0.8,
            1.0,
            square_mm(0.0, 0.0, 10.0, 10.0),
        ));
        let contact = stack.arena.alloc(layer(
            SupportLayerType::TopContact,
            0.8,
            1.0,
            square_mm(5.0, 0.0, 15.0, 10.0),
        ));
        stack.intermediate_layers = vec![base];
        stack.top_contacts = vec![contact];

        let layers = sm.generate_toolpaths(&stack).unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].support_interface_fills.is_empty());
        assert!(!layers[0].support_fills.is_empty());
        // The merged area spans both footprints.
        let bbox = layers[0].support_fills.bounding_box();
        assert!(bbox.max.x > Point::new_scale(12.0, 0.0).x);
    }

    #[test]
    fn test_bridging_contact_keeps_own_flow() {
        let sm = generator(PrintObjectConfig::new().with_interface_layers(0));
        let layers = sm.generate_toolpaths(&column_stack()).unwrap();
        let contact = &layers[5];
        // Bridging contacts do not merge into the base; round section.
        assert!(!contact.support_interface_fills.is_empty());
        assert!(widths(&contact.support_interface_fills)
            .iter()
            .all(|w| approx_eq(*w, 0.2)));
    }

    #[test]
    fn test_contact_loops_face_the_overhang() {
        let flow = Flow::new(0.4, 0.2, 0.4).unwrap();
        let processor = LoopInterfaceProcessor::new(1, 1.5 * flow.width());
        assert!(approx_eq(processor.circle_radius(), 0.6));

        // Overhang flush with the lower edge of the contact.
        let mut contact = layer(
            SupportLayerType::TopContact,
            1.0,
            1.2,
            square_mm(0.0, 0.0, 10.0, 10.0),
        );
        contact.aux_polygons = vec![square_mm(0.0, 0.0, 10.0, 5.0)];
        let area_before = clipper::total_area(&contact.polygons);

        let loops = processor.generate(&mut contact, &flow).unwrap();
        assert!(!loops.is_empty());
        assert!(loops
            .paths()
            .iter()
            .all(|p| p.role == ExtrusionRole::SupportMaterialInterface && approx_eq(p.height, 0.2)));
        assert!(clipper::total_area(&contact.polygons) < area_before);

        // Loops stay within the margin of the overhang.
        let reach = clipper::offset_expolygons(
            &contact.aux_polygons,
            SUPPORT_MATERIAL_MARGIN + 0.01,
            SUPPORT_SURFACES_JOIN,
        );
        assert!(clipper::diff_polylines_with_expolygons(&loops.as_polylines(), &reach)
            .iter()
            .all(|p| p.length() < scale(0.01) as f64));
    }

    #[test]
    fn test_no_loops_when_disabled_or_far() {
        let flow = Flow::new(0.4, 0.2, 0.4).unwrap();
        let mut contact = layer(
            SupportLayerType::TopContact,
            1.0,
            1.2,
            square_mm(0.0, 0.0, 10.0, 10.0),
        );
        contact.aux_polygons = vec![square_mm(3.0, 3.0, 7.0, 7.0)];
        let before = contact.polygons.clone();

        let disabled = LoopInterfaceProcessor::new(0, 0.6);
        assert!(disabled.generate(&mut contact, &flow).unwrap().is_empty());
        // The overhang is well inside: no contour faces it.
        let enabled = LoopInterfaceProcessor::new(1, 0.6);
        assert!(enabled.generate(&mut contact, &flow).unwrap().is_empty());
        assert_eq!(contact.polygons, before);
    }

    #[test]
    fn test_raft_layers_come_first() {
        let sm = SupportMaterial::new(
            &PrintObjectConfig::new().with_support_material(true),
            &PrintConfig::new(),
            &SlicingParams::new(0.2, 0.2).with_raft(2, 1),
        )
        .unwrap();
        let mut stack = column_stack();
        let raft: LayerIdxs = [
            (SupportLayerType::RaftBase, 0.0, 0.2),
            (SupportLayerType::RaftInterface, 0.2, 0.4),
        ]
            .iter()
            .map(|&(kind, b, t)| {
                stack.arena.alloc(layer(
                    kind,
                    b,
                    t,
                    square_mm(-3.0, -3.0, 23.0, 23.0),
                ))
            })
            .collect();
        stack.raft_layers = raft;
        // Base layers above the raft.
        for (i, idx) in stack.intermediate_layers.clone().iter().enumerate() {
            let l = &mut stack.arena[*idx];
            l.bottom_z = 0.4 + i as f64 * 0.2;
            l.print_z = l.bottom_z + 0.2;
        }
        let contact = stack.top_contacts[0];
        stack.arena[contact].bottom_z = 1.4;
        stack.arena[contact].print_z = 1.6;

        let layers = sm.generate_toolpaths(&stack).unwrap();
        assert_eq!(layers.len(), 8);
        assert!(approx_eq(layers[0].print_z, 0.2));
        // Flange on the bed, support infill at angle 0 above it, interface
        // raft layers included.
        let flange_width = sm.first_layer_flow().width();
        assert!(widths(&layers[0].support_fills)
            .iter()
            .all(|w| approx_eq(*w, flange_width)));
        assert!(!layers[1].support_fills.is_empty());
        assert!(layers[1].support_interface_fills.is_empty());
        let support_width = sm.support_flow().width();
        assert!(widths(&layers[1].support_fills)
            .iter()
            .all(|w| approx_eq(*w, support_width)));
    }
}
