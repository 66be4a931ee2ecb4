//! Printable support layers.

use crate::extrusion::{ExtrusionEntityCollection, ExtrusionRole};
use crate::geometry::{ExPolygons, Polylines};
use crate::{CoordF, SCALING_FACTOR};

/// Support printed at one Z level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportLayer {
    /// Position in the output, counting from the bed.
    pub id: usize,
    /// Thickness (mm), the thinnest of the layers merged into this one.
    pub height: CoordF,
    /// Z of the top of the layer (mm).
    pub print_z: CoordF,
    /// Footprint of everything printed on this layer.
    pub support_islands: ExPolygons,
    /// Sparse base infill, sheaths and flanges.
    pub support_fills: ExtrusionEntityCollection,
    /// Dense interface infill and contact loops.
    pub support_interface_fills: ExtrusionEntityCollection,
}

impl SupportLayer {
    pub fn new(id: usize, height: CoordF, print_z: CoordF) -> Self {
        Self {
            id,
            height,
            print_z,
            ..Default::default()
        }
    }

    #[inline]
    pub fn bottom_z(&self) -> CoordF {
        self.print_z - self.height
    }

    /// No extrusions on this layer.
    pub fn is_empty(&self) -> bool {
        self.support_fills.is_empty() && self.support_interface_fills.is_empty()
    }

    /// Footprint area (mm²).
    pub fn total_area(&self) -> CoordF {
        self.support_islands.iter().map(|e| e.area().abs()).sum::<CoordF>()
            / (SCALING_FACTOR * SCALING_FACTOR)
    }

    /// Centerline length of all extrusions (mm).
    pub fn total_length(&self) -> CoordF {
        self.support_fills.total_length() + self.support_interface_fills.total_length()
    }

    /// Centerlines of both collections, base first.
    pub fn polylines(&self) -> Polylines {
        let mut out = self.support_fills.as_polylines();
        out.extend(self.support_interface_fills.as_polylines());
        out
    }

    /// Whether every extrusion of this layer carries a support role.
    pub fn has_only_support_roles(&self) -> bool {
        self.support_fills
            .paths()
            .into_iter()
            .chain(self.support_interface_fills.paths())
            .all(|p| p.role.is_support())
    }

    /// Interface extrusions only.
    pub fn interface_extrusions(&self) -> ExtrusionEntityCollection {
        let mut out = self
            .support_fills
            .filter_by_role(ExtrusionRole::SupportMaterialInterface);
        out.extend(
            self.support_interface_fills
                .filter_by_role(ExtrusionRole::SupportMaterialInterface),
        );
        out
    }
}
