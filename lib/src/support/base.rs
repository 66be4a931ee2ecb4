//! Base support polygons and the raft below them.

use super::layer::{Layer, LayerArena, LayerIdx, LayerIdxs, SupportLayerType};
use super::top_contacts::SUPPORT_SURFACES_JOIN;
use super::trim::object_clearance;
use super::z_iter::overlapping;
use super::SupportMaterial;
use crate::clipper;
use crate::geometry::ExPolygons;
use crate::slice::Layer as ObjectLayer;
use crate::{CoordF, EPSILON};
use log::{debug, trace};

/// How far the bottom of the support columns is widened for adhesion (mm).
const COLUMNS_BASE_INFLATE: CoordF = 3.0;

impl SupportMaterial {
    /// Fill the intermediate layers, top-down. Each layer carries the layer
    /// above it plus any top contact resting on it, minus the contacts
    /// printed at its own height and the object with its clearance gap.
    pub(crate) fn generate_base_layers(
        &self,
        object: &[ObjectLayer],
        arena: &mut LayerArena,
        bottom_contacts: &[LayerIdx],
        top_contacts: &[LayerIdx],
        intermediate_layers: &[LayerIdx],
        gap_xy: CoordF,
    ) {
        if top_contacts.is_empty() {
            return;
        }
        let gap = self.support_layer_height_min;
        let mut above: ExPolygons = Vec::new();

        for (i, &idx) in intermediate_layers.iter().enumerate().rev() {
            let (bottom_z, print_z) = (arena[idx].bottom_z, arena[idx].print_z);

            // Step 1: carry the layer above, add contacts sitting on this one.
            let mut polygons_new = std::mem::take(&mut above);
            let first_above = top_contacts.partition_point(|t| arena[*t].print_z <= print_z);
            for &t in &top_contacts[first_above..] {
                if (arena[t].bottom_z - print_z).abs() <= EPSILON {
                    polygons_new.extend(arena[t].polygons.iter().cloned());
                }
            }
            if polygons_new.is_empty() {
                continue;
            }

            // Step 2: contacts occupying this height.
            let trimming: ExPolygons = overlapping(arena, top_contacts, bottom_z, print_z)
                .chain(overlapping(arena, bottom_contacts, bottom_z, print_z))
                .flat_map(|c| arena[c].polygons.iter().cloned())
                .collect();
            let mut polygons = if trimming.is_empty() {
                clipper::union_ex(&polygons_new)
            } else {
                clipper::difference_safety(&polygons_new, &trimming)
            };

            // Step 3: the object and its clearance.
            let clearance = object_clearance(object, bottom_z, print_z, gap, gap, gap_xy);
            if !clearance.is_empty() {
                polygons = clipper::difference(&polygons, &clearance);
            }

            trace!(
                "Support generator - base layer {} at z={:.3}: {} islands",
                i,
                print_z,
                polygons.len()
            );
            above = polygons.clone();
            arena[idx].polygons = polygons;
        }
    }

    /// Widen the foot of the support columns and, with a raft, stack the
    /// raft layers under it. Returns the raft layers, sorted by `print_z`.
    pub(crate) fn generate_raft_base(
        &self,
        object: &[ObjectLayer],
        arena: &mut LayerArena,
        top_contacts: &[LayerIdx],
        intermediate_layers: &[LayerIdx],
        gap_xy: CoordF,
    ) -> LayerIdxs {
        let params = &self.slicing_params;
        let mut raft_layers = Vec::new();

        // Only a contact at the raft top is the raft contact layer.
        let contacts = top_contacts
            .first()
            .copied()
            .filter(|c| arena[*c].print_z <= params.raft_contact_top_z + EPSILON);

        let mut base: ExPolygons = Vec::new();
        if let Some(&columns_base) = intermediate_layers.first() {
            base = clipper::offset_expolygons(
                &arena[columns_base].polygons,
                COLUMNS_BASE_INFLATE,
                SUPPORT_SURFACES_JOIN,
            );
            let first_object_layer = object
                .first()
                .map(|l| {
                    clipper::offset_expolygons(l.slices(), gap_xy, SUPPORT_SURFACES_JOIN)
                })
                .unwrap_or_default();
            let mut polygons = clipper::difference(&base, &first_object_layer);
            if let Some(c) = contacts {
                polygons = clipper::difference(&polygons, &arena[c].polygons);
            }
            arena[columns_base].polygons = polygons;
        }

        if !params.has_raft() {
            return raft_layers;
        }
        if let Some(c) = contacts {
            let grown = clipper::offset_expolygons(
                &arena[c].polygons,
                COLUMNS_BASE_INFLATE,
                SUPPORT_SURFACES_JOIN,
            );
            base = clipper::union(&base, &grown);
        }
        if params.raft_layers() <= 1 || base.is_empty() {
            return raft_layers;
        }

        // The first layer, then the remaining base and interface layers; the
        // raft contact layer is a top contact.
        let first_type = if params.base_raft_layers > 0 {
            SupportLayerType::RaftBase
        } else {
            SupportLayerType::RaftInterface
        };
        let mut print_z = params.first_layer_height;
        let mut first = Layer::with_z_range(first_type, 0.0, print_z);
        first.polygons = base.clone();
        raft_layers.push(arena.alloc(first));

        let stacked = std::iter::repeat((SupportLayerType::RaftBase, params.base_raft_layer_height))
            .take(params.base_raft_layers.saturating_sub(1))
            .chain(
                std::iter::repeat((
                    SupportLayerType::RaftInterface,
                    params.interface_raft_layer_height,
                ))
                .take(params.interface_raft_layers.saturating_sub(1)),
            );
        for (layer_type, height) in stacked {
            let mut layer = Layer::with_z_range(layer_type, print_z, print_z + height);
            layer.polygons = base.clone();
            print_z += height;
            raft_layers.push(arena.alloc(layer));
        }

        debug!(
            "Support generator - {} raft layers up to z={:.3}",
            raft_layers.len(),
            print_z
        );
        raft_layers
    }
}
