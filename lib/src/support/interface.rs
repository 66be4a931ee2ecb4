//! Dense interface layers carved out of the intermediate layers.

use super::layer::{Layer, LayerArena, LayerIdx, LayerIdxs, SupportLayerType};
use super::SupportMaterial;
use crate::clipper;
use crate::geometry::ExPolygons;
use crate::EPSILON;
use log::trace;

impl SupportMaterial {
    /// Turn the parts of intermediate layers lying within
    /// `interface_layers - 1` layers of a contact into interface layers.
    ///
    /// The contact itself counts as one interface layer, so nothing happens
    /// for fewer than two.
    pub(crate) fn generate_interface_layers(
        &self,
        arena: &mut LayerArena,
        bottom_contacts: &[LayerIdx],
        top_contacts: &[LayerIdx],
        intermediate_layers: &[LayerIdx],
    ) -> LayerIdxs {
        let mut interface_layers = Vec::new();
        let num_interface = self.object_config.support_material_interface_layers as usize;
        if intermediate_layers.is_empty() || num_interface <= 1 {
            return interface_layers;
        }

        let last = intermediate_layers.len() - 1;
        let mut idx_top_first = 0;
        let mut idx_bottom_first = 0;

        for (i, &idx) in intermediate_layers.iter().enumerate() {
            if arena[idx].is_empty() {
                continue;
            }
            let (layer_bottom_z, layer_print_z) = (arena[idx].bottom_z, arena[idx].print_z);
            // Z window over which contacts are collected.
            let top_z = arena[intermediate_layers[(i + num_interface - 1).min(last)]].print_z;
            let bottom_z =
                arena[intermediate_layers[i.saturating_sub(num_interface - 1)]].bottom_z;

            while idx_top_first < top_contacts.len()
                && arena[top_contacts[idx_top_first]].print_z < layer_print_z
            {
                idx_top_first += 1;
            }
            let top_projected: ExPolygons = top_contacts[idx_top_first..]
                .iter()
                .take_while(|t| arena[**t].bottom_z - EPSILON <= top_z)
                .flat_map(|t| arena[*t].polygons.iter().cloned())
                .collect();

            while idx_bottom_first < bottom_contacts.len()
                && arena[bottom_contacts[idx_bottom_first]].print_z + EPSILON < bottom_z
            {
                idx_bottom_first += 1;
            }
            let bottom_projected: ExPolygons = bottom_contacts[idx_bottom_first..]
                .iter()
                .take_while(|b| arena[**b].print_z - EPSILON <= layer_bottom_z)
                .flat_map(|b| arena[*b].polygons.iter().cloned())
                .collect();

            if top_projected.is_empty() && bottom_projected.is_empty() {
                continue;
            }
            let layer_type = if top_projected.is_empty() {
                SupportLayerType::BottomInterface
            } else {
                SupportLayerType::TopInterface
            };

            let mut projected = top_projected;
            projected.extend(bottom_projected);
            let projected = clipper::union_safety(&projected);

            let intermediate = &arena[idx];
            let polygons = clipper::intersection(&intermediate.polygons, &projected);
            if polygons.is_empty() {
                continue;
            }
            let remaining = clipper::difference(&intermediate.polygons, &projected);
            let mut new_layer = Layer::with_z_range(layer_type, layer_bottom_z, layer_print_z);
            new_layer.height = intermediate.height;
            new_layer.bridging = intermediate.bridging;
            new_layer.polygons = polygons;

            trace!(
                "Support generator - {} at z={:.3}",
                layer_type,
                layer_print_z
            );
            arena[idx].polygons = remaining;
            interface_layers.push(arena.alloc(new_layer));
        }

        interface_layers
    }
}
