//! Top contact layers: the dense support surfaces directly below overhangs.
//!
//! For every object layer the overhang is the part of its slices that the
//! layer below does not carry. The overhang is grown by
//! [`SUPPORT_MATERIAL_MARGIN`] in [`NUM_MARGIN_STEPS`] steps, each step
//! clipped against the lower layer, so a contact does not wrap around a thin
//! wall onto the far side of the object.

use super::layer::{Layer, LayerArena, LayerIdxs, SupportLayerType};
use super::{SupportMaterial, SupportResult, NUM_MARGIN_STEPS, SUPPORT_MATERIAL_MARGIN};
use crate::clipper::{self, OffsetJoinType};
use crate::flow::{Flow, FlowRole};
use crate::geometry::{ExPolygon, ExPolygons, Polylines};
use crate::slice::{Layer as ObjectLayer, LayerRegion, SurfaceType};
use crate::{scale, unscale, CoordF, EPSILON};
use log::{debug, trace, warn};

/// Join used when growing or shrinking support areas.
pub(crate) const SUPPORT_SURFACES_JOIN: OffsetJoinType = OffsetJoinType::Square;

/// Growth applied to each lower layer before it is merged into the
/// buildplate-only accumulator (mm).
const BUILDPLATE_ONLY_OFFSET: CoordF = 0.01;

/// Arc tolerance of the margin growth steps (mm).
const MARGIN_ARC_TOLERANCE: CoordF = 0.05;

/// Everything the object has printed so far, as seen from above.
///
/// With buildplate-only support an overhang must not be supported from an
/// object surface, so each layer's contacts are clipped by the union of all
/// layers below it. The accumulator only grows and must be fed the object
/// layers in ascending order.
#[derive(Debug, Clone, Default)]
pub struct BuildplateAccumulator {
    enabled: bool,
    top_surfaces: ExPolygons,
    last_layer_id: Option<usize>,
}

impl BuildplateAccumulator {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Merge `lower` into the accumulated area. Layers at or below the last
    /// accumulated one are ignored.
    pub fn accumulate(&mut self, lower: &ObjectLayer) {
        if !self.enabled {
            return;
        }
        if self.last_layer_id.is_some_and(|last| lower.id() <= last) {
            warn!(
                "Support generator - layer {} fed to the buildplate accumulator out of order",
                lower.id()
            );
            return;
        }
        self.last_layer_id = Some(lower.id());

        // Only the new layer is grown; growing the union would inflate it
        // again on every layer.
        let grown = clipper::offset_expolygons(
            lower.slices(),
            BUILDPLATE_ONLY_OFFSET,
            SUPPORT_SURFACES_JOIN,
        );
        self.top_surfaces = clipper::union(&self.top_surfaces, &grown);
    }

    /// Area no contact may be placed over.
    #[inline]
    pub fn surfaces(&self) -> &[ExPolygon] {
        &self.top_surfaces
    }
}

impl SupportMaterial {
    /// Generate the top contact layers, sorted by ascending `print_z`.
    pub(crate) fn top_contact_layers(
        &self,
        object: &[ObjectLayer],
        arena: &mut LayerArena,
    ) -> SupportResult<LayerIdxs> {
        let threshold = self.object_config.support_material_threshold;
        // One degree is added so that the configured angle itself is supported.
        let threshold_rad = if threshold > 0 {
            ((threshold + 1) as CoordF).to_radians()
        } else {
            0.0
        };

        let mut accumulator =
            BuildplateAccumulator::new(self.object_config.support_material_buildplate_only);
        let mut contacts = Vec::new();

        // Without support, only the raft footprint under layer 0 is needed.
        let num_layers = if self.object_config.has_support() {
            object.len()
        } else {
            object.len().min(1)
        };
        let first_layer = if self.slicing_params.has_raft() { 0 } else { 1 };

        for layer_id in first_layer..num_layers {
            let layer = &object[layer_id];

            let (overhangs, contact) = if layer_id == 0 {
                // Footprint for the raft, holes dropped for a continuous raft.
                let outer: ExPolygons = layer
                    .slices()
                    .iter()
                    .map(|e| ExPolygon::new(e.contour.clone()))
                    .collect();
                let contact = clipper::offset_expolygons(
                    &outer,
                    SUPPORT_MATERIAL_MARGIN,
                    SUPPORT_SURFACES_JOIN,
                );
                (outer, contact)
            } else {
                let lower = &object[layer_id - 1];
                accumulator.accumulate(lower);
                self.layer_overhangs(layer_id, layer, lower, threshold_rad, &accumulator)?
            };

            if contact.is_empty() {
                continue;
            }

            let mut new_layer = Layer::new(SupportLayerType::TopContact);
            if self.slicing_params.soluble_interface {
                // In phase with the object: the contact replaces the layer below.
                new_layer.height = if layer_id > 0 {
                    object[layer_id - 1].height()
                } else {
                    0.0
                };
                new_layer.print_z = layer.print_z() - layer.height();
                new_layer.bottom_z = new_layer.print_z - new_layer.height;
            } else {
                let nozzle_dmr = self.average_nozzle_diameter(layer)?;
                new_layer.print_z = layer.print_z()
                    - nozzle_dmr
                    - self.object_config.support_material_contact_distance;
                new_layer.bottom_z = new_layer.print_z;
                new_layer.height = 0.0;
            }

            if new_layer.print_z < self.slicing_params.first_layer_height - EPSILON {
                debug!(
                    "Support generator - top contact of layer {} at z={:.3} is below the first layer, skipped",
                    layer_id, new_layer.print_z
                );
                continue;
            }

            trace!(
                "Support generator - top contact at z={:.3}: {} islands",
                new_layer.print_z,
                contact.len()
            );
            new_layer.polygons = contact;
            new_layer.aux_polygons = overhangs;
            contacts.push(arena.alloc(new_layer));
        }

        Ok(contacts)
    }

    /// Overhang and contact area of one object layer over all its regions.
    fn layer_overhangs(
        &self,
        layer_id: usize,
        layer: &ObjectLayer,
        lower: &ObjectLayer,
        threshold_rad: CoordF,
        accumulator: &BuildplateAccumulator,
    ) -> SupportResult<(ExPolygons, ExPolygons)> {
        let mut overhangs: ExPolygons = Vec::new();
        let mut contacts: ExPolygons = Vec::new();
        let mut slices_margin: Option<(CoordF, ExPolygons)> = None;

        for region in layer.regions() {
            let nozzle = self
                .print_config
                .nozzle_diameter_at(region.config.perimeter_extruder)?;
            let fw = region
                .flow(FlowRole::ExternalPerimeter, layer.height(), nozzle)?
                .width();

            let lower_layer_offset =
                if (layer_id as u32) < self.object_config.support_material_enforce_layers {
                    0.0
                } else if threshold_rad > 0.0 {
                    lower.height() / threshold_rad.tan()
                } else {
                    0.5 * fw
                };

            let mut diff = unsupported_area(region, lower.slices(), lower_layer_offset, fw);
            if diff.is_empty() {
                continue;
            }

            if self.object_config.dont_support_bridges {
                diff = self.remove_bridges(diff, layer, region, lower.slices(), fw, nozzle)?;
            }

            if accumulator.is_enabled() {
                diff = clipper::difference(&diff, accumulator.surfaces());
            }

            if diff.is_empty() {
                continue;
            }

            overhangs.extend(diff.iter().cloned());

            // Lower slices grown by half an extrusion width, cached per width.
            let margin_offset = 0.5 * fw;
            if slices_margin
                .as_ref()
                .map_or(true, |(offset, _)| *offset != margin_offset)
            {
                let mut margin = clipper::offset_expolygons(
                    lower.slices(),
                    margin_offset,
                    SUPPORT_SURFACES_JOIN,
                );
                if accumulator.is_enabled() {
                    margin = clipper::union(&margin, accumulator.surfaces());
                }
                slices_margin = Some((margin_offset, margin));
            }
            let margin = slices_margin
                .as_ref()
                .map(|(_, m)| m.as_slice())
                .unwrap_or(&[]);

            for _ in 0..NUM_MARGIN_STEPS {
                diff = clipper::difference(
                    &clipper::offset_expolygons(
                        &diff,
                        SUPPORT_MATERIAL_MARGIN / NUM_MARGIN_STEPS as CoordF,
                        OffsetJoinType::RoundArc(MARGIN_ARC_TOLERANCE),
                    ),
                    margin,
                );
            }
            contacts.extend(diff);
        }

        Ok((overhangs, clipper::union_ex(&contacts)))
    }

    /// Take bridges out of the overhang, keeping only a band along their
    /// unanchored edges.
    fn remove_bridges(
        &self,
        diff: ExPolygons,
        layer: &ObjectLayer,
        region: &LayerRegion,
        lower_slices: &[ExPolygon],
        fw: CoordF,
        nozzle: CoordF,
    ) -> SupportResult<ExPolygons> {
        let bridge_flow = Flow::bridging_flow(nozzle, nozzle);
        let bridged_perimeters =
            bridged_perimeter_areas(region, layer.slices(), lower_slices, &bridge_flow, fw, nozzle);

        let mut bridges: ExPolygons = region
            .fill_surfaces
            .filter_expolygons(|s| {
                s.surface_type == SurfaceType::BottomBridge && s.bridge_angle.is_some()
            });
        bridges.extend(bridged_perimeters);
        let bridges = clipper::union_ex(&bridges);

        let diff = clipper::difference_safety(&diff, &bridges);
        if region.unsupported_bridge_edges.is_empty() {
            return Ok(diff);
        }
        let edges =
            clipper::offset_polylines(&region.unsupported_bridge_edges, SUPPORT_MATERIAL_MARGIN);
        Ok(clipper::union(&diff, &clipper::intersection(&edges, &bridges)))
    }

    /// Mean nozzle diameter of the extruders printing `layer`.
    fn average_nozzle_diameter(&self, layer: &ObjectLayer) -> SupportResult<CoordF> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for region in layer.regions() {
            sum += self
                .print_config
                .nozzle_diameter_at(region.config.perimeter_extruder)?;
            count += 1;
        }
        if count == 0 {
            return Ok(self.support_flow.nozzle_diameter());
        }
        Ok(sum / count as CoordF)
    }
}

/// Part of a region that the lower layer, grown by `lower_layer_offset`, does
/// not reach. Slivers narrower than a fifth of `fw` are dropped.
fn unsupported_area(
    region: &LayerRegion,
    lower_slices: &[ExPolygon],
    lower_layer_offset: CoordF,
    fw: CoordF,
) -> ExPolygons {
    let region_slices = region.slices.to_expolygons();
    if lower_layer_offset == 0.0 {
        return clipper::difference(&region_slices, lower_slices);
    }

    let lower_grown =
        clipper::offset_expolygons(lower_slices, lower_layer_offset, SUPPORT_SURFACES_JOIN);
    let diff = clipper::offset2_ex(
        &clipper::difference(&region_slices, &lower_grown),
        -0.1 * fw,
        0.1 * fw,
        SUPPORT_SURFACES_JOIN,
    );
    if diff.is_empty() {
        return diff;
    }
    // Back to the full overhang, restricted to the region.
    let full = clipper::intersection(
        &clipper::offset_expolygons(&diff, lower_layer_offset, SUPPORT_SURFACES_JOIN),
        &region_slices,
    );
    clipper::difference(&full, lower_slices)
}

/// Areas of the straight perimeter runs that span air between two anchors.
fn bridged_perimeter_areas(
    region: &LayerRegion,
    layer_slices: &[ExPolygon],
    lower_slices: &[ExPolygon],
    bridge_flow: &Flow,
    fw: CoordF,
    nozzle: CoordF,
) -> ExPolygons {
    let lower_grown = clipper::offset_expolygons(lower_slices, 0.5 * nozzle, SUPPORT_SURFACES_JOIN);
    let overhang_perimeters: Polylines = clipper::diff_polylines_with_expolygons(
        &region.perimeters.as_polylines(),
        &lower_grown,
    );

    let w = bridge_flow.width().max(bridge_flow.spacing());
    let inside = |p: Option<crate::geometry::Point>| {
        p.is_some_and(|p| layer_slices.iter().any(|s| s.contains_point(&p)))
    };

    let mut areas = Vec::new();
    for mut polyline in overhang_perimeters {
        if !polyline.is_straight() {
            continue;
        }
        polyline.extend_start(scale(fw));
        polyline.extend_end(scale(fw));
        if inside(polyline.first_point()) && inside(polyline.last_point()) {
            areas.extend(clipper::offset_polylines(
                std::slice::from_ref(&polyline),
                0.5 * w + unscale(10),
            ));
        }
    }
    clipper::union_ex(&areas)
}
