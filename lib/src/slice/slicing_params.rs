//! Slicing parameters.
//!
//! Layer height limits and the raft layout shared by the object layering and
//! the support generator. Raft Z tops are derived once, at construction.

use crate::config::{ConfigResult, PrintConfig, PrintObjectConfig};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters describing how an object is layered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlicingParams {
    /// Regular layer height (mm).
    pub layer_height: CoordF,

    /// First printed layer height (mm).
    pub first_layer_height: CoordF,

    /// Minimum layer height any extruder involved can print (mm).
    pub min_layer_height: CoordF,

    /// Maximum layer height any extruder involved can print (mm).
    pub max_layer_height: CoordF,

    /// Number of raft base layers.
    pub base_raft_layers: usize,

    /// Number of raft interface layers (the contact layer included).
    pub interface_raft_layers: usize,

    /// Height of raft base layers (mm).
    pub base_raft_layer_height: CoordF,

    /// Thickness of each raft layer above the base (mm).
    pub interface_raft_layer_height: CoordF,

    /// Height of the raft contact layer (mm).
    pub contact_raft_layer_height: CoordF,

    /// Interface printed in a soluble material, needing no Z gap.
    pub soluble_interface: bool,

    /// Gap between the raft and the object (mm).
    pub gap_raft_object: CoordF,

    /// Top of the raft base layers (mm).
    pub raft_base_top_z: CoordF,

    /// Top of the raft interface layers (mm).
    pub raft_interface_top_z: CoordF,

    /// Top of the raft contact layer (mm).
    pub raft_contact_top_z: CoordF,

    /// Bottom of the first object layer (mm).
    pub object_print_z_min: CoordF,
}

impl SlicingParams {
    /// Parameters without a raft.
    pub fn new(layer_height: CoordF, first_layer_height: CoordF) -> Self {
        Self {
            layer_height,
            first_layer_height,
            min_layer_height: 0.07_f64.min(layer_height),
            max_layer_height: 0.3_f64.max(layer_height),
            ..Default::default()
        }
    }

    /// Derive the parameters from the print and object configuration.
    pub fn from_config(
        print_config: &PrintConfig,
        object_config: &PrintObjectConfig,
    ) -> ConfigResult<Self> {
        let layer_height = object_config.layer_height;
        let first_layer_height = match print_config.first_layer_height.get_abs_value(layer_height) {
            h if h > 0.0 => h,
            _ => layer_height,
        };
        let support_dmr = print_config.nozzle_diameter_at(object_config.support_material_extruder)?;
        let interface_dmr =
            print_config.nozzle_diameter_at(object_config.support_material_interface_extruder)?;

        let mut params = Self::new(layer_height, first_layer_height);
        params.soluble_interface = object_config.soluble_interface();
        params.min_layer_height = print_config.min_layer_height.min(layer_height);

        let mut max_layer_height = print_config.max_layer_height_for(0)?;
        if object_config.has_support() || object_config.raft_layers > 0 {
            max_layer_height = max_layer_height
                .min(print_config.max_layer_height_for(object_config.support_material_extruder)?)
                .min(
                    print_config
                        .max_layer_height_for(object_config.support_material_interface_extruder)?,
                );
        }
        params.max_layer_height = max_layer_height.max(layer_height);

        if !params.soluble_interface {
            params.gap_raft_object = object_config.support_material_contact_distance;
        }

        let raft_layers = object_config.raft_layers as usize;
        if raft_layers > 0 {
            params.interface_raft_layers = (raft_layers + 1) / 2;
            params.base_raft_layers = raft_layers - params.interface_raft_layers;
            params.base_raft_layer_height = layer_height.max(0.75 * support_dmr);
            params.interface_raft_layer_height = layer_height.max(0.75 * interface_dmr);
            params.contact_raft_layer_height = layer_height.max(0.75 * interface_dmr);
        }
        params.update_raft_tops();
        Ok(params)
    }

    /// Builder method: set the raft layer counts and recompute the raft tops.
    pub fn with_raft(mut self, base_layers: usize, interface_layers: usize) -> Self {
        self.base_raft_layers = base_layers;
        self.interface_raft_layers = interface_layers;
        self.update_raft_tops();
        self
    }

    /// Builder method: set the layer height limits.
    pub fn with_layer_height_range(mut self, min: CoordF, max: CoordF) -> Self {
        self.min_layer_height = min;
        self.max_layer_height = max;
        self
    }

    /// Builder method: mark the interface as soluble.
    pub fn with_soluble_interface(mut self, soluble: bool) -> Self {
        self.soluble_interface = soluble;
        if soluble {
            self.gap_raft_object = 0.0;
        }
        self.update_raft_tops();
        self
    }

    fn update_raft_tops(&mut self) {
        self.raft_base_top_z = 0.0;
        self.raft_interface_top_z = 0.0;
        self.raft_contact_top_z = 0.0;
        self.object_print_z_min = 0.0;

        match self.raft_layers() {
            0 => return,
            1 => {
                self.contact_raft_layer_height = self.first_layer_height;
                self.raft_contact_top_z = self.first_layer_height;
            }
            _ => {
                // The first layer replaces one base layer, the contact layer one interface layer.
                self.raft_base_top_z = self.first_layer_height
                    + self.base_raft_layers.saturating_sub(1) as CoordF * self.base_raft_layer_height;
                self.raft_interface_top_z = self.raft_base_top_z
                    + self.interface_raft_layers.saturating_sub(1) as CoordF
                        * self.interface_raft_layer_height;
                self.raft_contact_top_z = self.raft_interface_top_z + self.contact_raft_layer_height;
            }
        }
        self.object_print_z_min = self.raft_contact_top_z + self.gap_raft_object;
    }

    /// Check if parameters are valid.
    pub fn is_valid(&self) -> bool {
        self.layer_height > 0.0
            && self.first_layer_height > 0.0
            && self.min_layer_height > 0.0
            && self.max_layer_height >= self.min_layer_height
    }

    /// Check if raft is enabled.
    pub fn has_raft(&self) -> bool {
        self.raft_layers() > 0
    }

    /// Get the total number of raft layers.
    pub fn raft_layers(&self) -> usize {
        self.base_raft_layers + self.interface_raft_layers
    }
}

impl Default for SlicingParams {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            first_layer_height: 0.2,
            min_layer_height: 0.07,
            max_layer_height: 0.3,
            base_raft_layers: 0,
            interface_raft_layers: 0,
            base_raft_layer_height: 0.3,
            interface_raft_layer_height: 0.3,
            contact_raft_layer_height: 0.3,
            soluble_interface: false,
            gap_raft_object: 0.2,
            raft_base_top_z: 0.0,
            raft_interface_top_z: 0.0,
            raft_contact_top_z: 0.0,
            object_print_z_min: 0.0,
        }
    }
}

impl fmt::Display for SlicingParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlicingParams(layer_height={:.3}mm, first_layer={:.3}mm, raft={})",
            self.layer_height,
            self.first_layer_height,
            self.raft_layers()
        )
    }
}
