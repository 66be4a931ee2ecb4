//! Printer-wide configuration.

use super::{ConfigError, ConfigResult, FloatOrPercent};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Printer-wide settings consumed by support generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Nozzle diameter per extruder (mm).
    pub nozzle_diameter: Vec<CoordF>,

    /// First layer extrusion width (mm or % of first layer height, 0 = use role default).
    pub first_layer_extrusion_width: FloatOrPercent,

    /// First layer height (mm or % of the object layer height).
    pub first_layer_height: FloatOrPercent,

    /// Lowest layer height the extruders can print (mm).
    pub min_layer_height: CoordF,

    /// Highest layer height the extruders can print (mm, 0 = 75% of the nozzle).
    pub max_layer_height: CoordF,
}

impl PrintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set a single nozzle diameter.
    pub fn with_nozzle_diameter(mut self, diameter: CoordF) -> Self {
        self.nozzle_diameter = vec![diameter];
        self
    }

    /// Nozzle diameter for a 0-based extruder index.
    pub fn nozzle_diameter_at(&self, extruder: usize) -> ConfigResult<CoordF> {
        self.nozzle_diameter
            .get(extruder)
            .copied()
            .ok_or(ConfigError::InvalidExtruder(extruder))
    }

    /// Tallest layer printable with the given extruder.
    pub fn max_layer_height_for(&self, extruder: usize) -> ConfigResult<CoordF> {
        let nozzle = self.nozzle_diameter_at(extruder)?;
        let max = if self.max_layer_height > 0.0 {
            self.max_layer_height
        } else {
            0.75 * nozzle
        };
        Ok(max.max(self.min_layer_height))
    }

    /// Largest configured nozzle.
    pub fn max_nozzle_diameter(&self) -> CoordF {
        self.nozzle_diameter.iter().copied().fold(0.0, CoordF::max)
    }

    /// Check that every nozzle is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.nozzle_diameter.is_empty() {
            return Err(ConfigError::InvalidNozzle(0.0));
        }
        if let Some(bad) = self
            .nozzle_diameter
            .iter()
            .find(|d| !d.is_finite() || **d <= 0.0)
        {
            return Err(ConfigError::InvalidNozzle(*bad));
        }
        if !(self.min_layer_height > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: "min_layer_height",
                value: self.min_layer_height,
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            nozzle_diameter: vec![0.4],
            first_layer_extrusion_width: FloatOrPercent::Percent(200.0),
            first_layer_height: FloatOrPercent::Absolute(0.35),
            min_layer_height: 0.07,
            max_layer_height: 0.0,
        }
    }
}

impl fmt::Display for PrintConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PrintConfig(nozzles={:?}, first_layer_width={})",
            self.nozzle_diameter, self.first_layer_extrusion_width
        )
    }
}
