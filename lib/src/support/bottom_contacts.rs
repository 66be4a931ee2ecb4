//! Bottom contact layers: support resting on top surfaces of the object.

use super::layer::{Layer, LayerArena, LayerIdx, LayerIdxs, SupportLayerType};
use super::top_contacts::SUPPORT_SURFACES_JOIN;
use super::SupportMaterial;
use crate::clipper;
use crate::geometry::ExPolygons;
use crate::slice::Layer as ObjectLayer;
use crate::{unscale, SCALED_EPSILON};
use log::trace;

impl SupportMaterial {
    /// Project the top contacts downwards and emit a bottom contact wherever
    /// the projection lands on a top surface. Sorted by ascending `print_z`.
    pub(crate) fn bottom_contact_layers(
        &self,
        object: &[ObjectLayer],
        top_contacts: &[LayerIdx],
        arena: &mut LayerArena,
    ) -> LayerIdxs {
        let mut bottom_contacts = Vec::new();
        if top_contacts.is_empty() || self.object_config.support_material_buildplate_only {
            return bottom_contacts;
        }

        let soluble = self.slicing_params.soluble_interface;
        let grow = unscale(SCALED_EPSILON);
        let mut projection: ExPolygons = Vec::new();
        // Top contacts not yet added to the projection, highest last.
        let mut pending = top_contacts.len();

        for layer_id in (0..object.len().saturating_sub(1)).rev() {
            let layer = &object[layer_id];

            let mut added = false;
            while pending > 0 && arena[top_contacts[pending - 1]].print_z >= layer.print_z() {
                pending -= 1;
                let contact = &arena[top_contacts[pending]];
                let mut polygons_new = clipper::offset_expolygons(
                    &contact.polygons,
                    grow,
                    SUPPORT_SURFACES_JOIN,
                );
                polygons_new.extend(clipper::offset_expolygons(
                    &contact.aux_polygons,
                    grow,
                    SUPPORT_SURFACES_JOIN,
                ));
                projection.extend(polygons_new);
                added = true;
            }
            if projection.is_empty() {
                continue;
            }
            if added {
                projection = clipper::union_ex(&projection);
            }

            let top = layer.top_surfaces();
            if !top.is_empty() {
                let touching = clipper::intersection(&top, &projection);
                if !touching.is_empty() {
                    let height = if soluble {
                        object[layer_id + 1].height()
                    } else {
                        self.interface_flow.nozzle_diameter()
                    };
                    let contact_distance = if soluble {
                        0.0
                    } else {
                        self.object_config.support_material_contact_distance
                    };

                    let mut new_layer = Layer::new(SupportLayerType::BottomContact);
                    new_layer.height = height;
                    new_layer.print_z = layer.print_z() + height + contact_distance;
                    new_layer.bottom_z = layer.print_z();
                    new_layer.bridging = !soluble;
                    new_layer.polygons = clipper::offset_expolygons(
                        &touching,
                        self.support_flow.width(),
                        SUPPORT_SURFACES_JOIN,
                    );
                    trace!(
                        "Support generator - bottom contact over layer {} at z={:.3}",
                        layer_id,
                        new_layer.print_z
                    );
                    bottom_contacts.push(arena.alloc(new_layer));
                }
            }

            // What landed here does not continue further down.
            projection = clipper::difference_safety(&projection, layer.slices());
        }

        bottom_contacts.reverse();
        bottom_contacts
    }
}
