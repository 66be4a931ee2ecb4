//! Print region configuration.
//!
//! A region is a part of a print object with its own extrusion settings.
//! Support generation only needs the perimeter widths (to size overhang
//! margins and bridge anchors) and the perimeter count.

use super::FloatOrPercent;
use crate::flow::{Flow, FlowResult, FlowRole};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-region settings read when computing perimeter flows.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintRegionConfig {
    /// Number of perimeters/shells.
    pub perimeters: u32,

    /// External perimeter extrusion width (mm or % of layer height, 0 = auto).
    pub external_perimeter_extrusion_width: FloatOrPercent,

    /// Perimeter extrusion width (mm or % of layer height, 0 = auto).
    pub perimeter_extrusion_width: FloatOrPercent,

    /// Infill extrusion width (mm or % of layer height, 0 = auto).
    pub infill_extrusion_width: FloatOrPercent,

    /// Print external perimeters before the inner ones.
    pub external_perimeters_first: bool,

    /// 0-based extruder printing the region.
    pub perimeter_extruder: usize,
}

impl PrintRegionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Perimeter count of the region's walls.
    pub fn perimeters(mut self, count: u32) -> Self {
        self.perimeters = count;
        self
    }

    /// Builder method: set external perimeter width (mm).
    pub fn external_perimeter_extrusion_width(mut self, width: CoordF) -> Self {
        self.external_perimeter_extrusion_width = FloatOrPercent::Absolute(width);
        self
    }

    /// Builder method: print external perimeters first.
    pub fn external_perimeters_first(mut self, enabled: bool) -> Self {
        self.external_perimeters_first = enabled;
        self
    }

    /// Flow for one of this region's roles.
    pub fn flow(&self, role: FlowRole, layer_height: CoordF, nozzle: CoordF) -> FlowResult<Flow> {
        let width = match role {
            FlowRole::ExternalPerimeter => self.external_perimeter_extrusion_width,
            FlowRole::Perimeter => self.perimeter_extrusion_width,
            _ => self.infill_extrusion_width,
        };
        Flow::new_from_config_width(role, width.get_abs_value(layer_height), nozzle, layer_height)
    }
}

impl Default for PrintRegionConfig {
    fn default() -> Self {
        Self {
            perimeters: 3,
            external_perimeter_extrusion_width: FloatOrPercent::Absolute(0.0),
            perimeter_extrusion_width: FloatOrPercent::Absolute(0.0),
            infill_extrusion_width: FloatOrPercent::Absolute(0.0),
            external_perimeters_first: false,
            perimeter_extruder: 0,
        }
    }
}

impl fmt::Display for PrintRegionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PrintRegionConfig(perimeters={}, external_width={})",
            self.perimeters, self.external_perimeter_extrusion_width
        )
    }
}
