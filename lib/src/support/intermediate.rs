//! Intermediate support layers between the contact extremes.

use super::layer::{Layer, LayerArena, LayerIdx, LayerIdxs, SupportLayerType};
use super::SupportMaterial;
use crate::slice::Layer as ObjectLayer;
use crate::{CoordF, EPSILON};
use log::{debug, trace};

/// Z level where a contact meets the support column below or above it.
///
/// A top contact is reached at its bottom, which moves once its height is
/// assigned. A bottom contact is reached at its top.
#[derive(Debug, Clone, Copy)]
struct LayerExtreme {
    layer: LayerIdx,
    is_top_contact: bool,
}

impl LayerExtreme {
    fn z(&self, arena: &LayerArena) -> CoordF {
        let layer = &arena[self.layer];
        if self.is_top_contact {
            layer.print_z - layer.height
        } else {
            layer.print_z
        }
    }
}

impl SupportMaterial {
    /// Split every gap between consecutive extremes into layers no thicker
    /// than the maximum support layer height. Top contacts that had no height
    /// yet get the step of the gap below them.
    pub(crate) fn raft_and_intermediate_support_layers(
        &self,
        object: &[ObjectLayer],
        arena: &mut LayerArena,
        bottom_contacts: &[LayerIdx],
        top_contacts: &[LayerIdx],
    ) -> LayerIdxs {
        let mut intermediate_layers: LayerIdxs = Vec::new();

        let mut extremes: Vec<LayerExtreme> = top_contacts
            .iter()
            .map(|&layer| LayerExtreme {
                layer,
                is_top_contact: true,
            })
            .chain(bottom_contacts.iter().map(|&layer| LayerExtreme {
                layer,
                is_top_contact: false,
            }))
            .collect();
        if extremes.is_empty() {
            return intermediate_layers;
        }
        extremes.sort_by(|a, b| a.z(arena).total_cmp(&b.z(arena)));

        let max_object_layer_height = object
            .iter()
            .map(|l| l.height())
            .fold(0.0, CoordF::max);
        // Thick nozzles may print support well above the object's layer height.
        let max_h = self
            .support_layer_height_max
            .max(max_object_layer_height)
            .max(0.75 * self.support_flow.nozzle_diameter());
        let flh = self.slicing_params.first_layer_height;
        let has_height = |arena: &LayerArena, idx: LayerIdx| arena[idx].has_height();

        for i in 0..extremes.len() {
            let mut z1 = if i == 0 {
                self.slicing_params.raft_interface_top_z
            } else {
                extremes[i - 1].z(arena)
            };
            let extreme = extremes[i];
            let mut z2 = extreme.z(arena);
            let mut dist = z2 - z1;
            if dist < EPSILON {
                continue;
            }
            let mut n = layer_count(dist, max_h);
            let mut step = dist / n as CoordF;

            if extreme.is_top_contact && !has_height(arena, extreme.layer) {
                let contact = &mut arena[extreme.layer];
                contact.height = step;
                contact.bottom_z = contact.print_z - step;
                n -= 1;
                if contact.bottom_z < flh && contact.print_z <= flh + EPSILON {
                    // The contact is the first layer itself.
                    contact.bottom_z = z1;
                    contact.height = contact.print_z - z1;
                    continue;
                }
                if contact.bottom_z < flh {
                    // Top contact down to the first layer, one first layer below it.
                    contact.bottom_z = flh;
                    contact.height = contact.print_z - flh;
                    if z1 < flh - EPSILON {
                        intermediate_layers.push(self.alloc_intermediate(arena, z1, flh));
                    }
                    continue;
                }
                z2 = contact.bottom_z;
                dist = z2 - z1;
                if n == 0 || dist < EPSILON {
                    continue;
                }
                step = dist / n as CoordF;
            }

            if z1 < flh - EPSILON && z2 > flh + EPSILON {
                intermediate_layers.push(self.alloc_intermediate(arena, z1, flh));
                z1 = flh;
                dist = z2 - z1;
                n = layer_count(dist, max_h);
                step = dist / n as CoordF;
            }

            trace!(
                "Support generator - {} intermediate layers in [{:.3}, {:.3}]",
                n,
                z1,
                z2
            );
            for k in 0..n {
                let bottom_z = z1 + k as CoordF * step;
                // The last layer lands exactly on the extreme.
                let print_z = if k + 1 == n { z2 } else { bottom_z + step };
                intermediate_layers.push(self.alloc_intermediate(arena, bottom_z, print_z));
            }
        }

        debug!(
            "Support generator - {} intermediate layers, max height {:.3}",
            intermediate_layers.len(),
            max_h
        );
        intermediate_layers
    }

    fn alloc_intermediate(&self, arena: &mut LayerArena, bottom_z: CoordF, print_z: CoordF) -> LayerIdx {
        arena.alloc(Layer::with_z_range(
            SupportLayerType::Intermediate,
            bottom_z,
            print_z,
        ))
    }
}

/// Number of layers no thicker than `max_h` needed to span `dist`.
fn layer_count(dist: CoordF, max_h: CoordF) -> usize {
    ((dist / max_h - EPSILON).ceil() as usize).max(1)
}
