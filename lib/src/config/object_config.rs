//! Per-object configuration, including the support material options.

use super::{ConfigError, ConfigResult, FloatOrPercent};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound accepted for `support_material_interface_layers`.
pub const MAX_INTERFACE_LAYERS: u32 = 100;

/// Pattern used for the base (non-interface) support layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupportMaterialPattern {
    /// Parallel lines.
    #[default]
    Rectilinear,
    /// Parallel lines, crossed every other layer.
    RectilinearGrid,
    /// Hexagonal zigzag.
    Honeycomb,
    /// Pillars. Filled like honeycomb; the capitals are not built.
    Pillars,
}

impl SupportMaterialPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportMaterialPattern::Rectilinear => "rectilinear",
            SupportMaterialPattern::RectilinearGrid => "rectilinear-grid",
            SupportMaterialPattern::Honeycomb => "honeycomb",
            SupportMaterialPattern::Pillars => "pillars",
        }
    }
}

impl FromStr for SupportMaterialPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectilinear" => Ok(SupportMaterialPattern::Rectilinear),
            "rectilinear-grid" => Ok(SupportMaterialPattern::RectilinearGrid),
            "honeycomb" => Ok(SupportMaterialPattern::Honeycomb),
            "pillars" => Ok(SupportMaterialPattern::Pillars),
            other => Err(ConfigError::UnknownPattern(other.to_string())),
        }
    }
}

impl fmt::Display for SupportMaterialPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a print object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintObjectConfig {
    /// Object layer height (mm).
    pub layer_height: CoordF,

    /// Default extrusion width (mm or % of layer height, 0 = auto).
    pub extrusion_width: FloatOrPercent,

    /// Number of raft layers below the object.
    pub raft_layers: u32,

    /// Do not generate support under bridges.
    pub dont_support_bridges: bool,

    // === Support material ===
    /// Generate support material.
    pub support_material: bool,

    /// Base pattern rotation (degrees).
    pub support_material_angle: CoordF,

    /// Only create support that stands on the build plate.
    pub support_material_buildplate_only: bool,

    /// Vertical gap between object and support (mm, 0 = soluble interface).
    pub support_material_contact_distance: CoordF,

    /// Force support under the first N object layers.
    pub support_material_enforce_layers: u32,

    /// Extruder for base support (0-based).
    pub support_material_extruder: usize,

    /// Support extrusion width (mm or % of layer height, 0 = `extrusion_width`).
    pub support_material_extrusion_width: FloatOrPercent,

    /// Print loops around top contact areas.
    pub support_material_interface_contact_loops: bool,

    /// Extruder for interface support (0-based).
    pub support_material_interface_extruder: usize,

    /// Number of interface layers between object and base support.
    pub support_material_interface_layers: u32,

    /// Gap between interface lines (mm, 0 = solid).
    pub support_material_interface_spacing: CoordF,

    /// Base support pattern.
    pub support_material_pattern: SupportMaterialPattern,

    /// Gap between base support lines (mm).
    pub support_material_spacing: CoordF,

    /// Overhang threshold (degrees from horizontal, 0 = automatic).
    pub support_material_threshold: u32,

    /// Trace a perimeter around base support islands.
    pub support_material_with_sheath: bool,

    /// Horizontal clearance between object and support
    /// (mm or % of the external perimeter width).
    pub support_material_xy_spacing: FloatOrPercent,
}

impl PrintObjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable/disable support material.
    pub fn with_support_material(mut self, enabled: bool) -> Self {
        self.support_material = enabled;
        self
    }

    /// Builder method: set the object layer height.
    pub fn with_layer_height(mut self, height: CoordF) -> Self {
        self.layer_height = height;
        self
    }

    /// Builder method: set the contact Z distance.
    pub fn with_contact_distance(mut self, distance: CoordF) -> Self {
        self.support_material_contact_distance = distance;
        self
    }

    /// Builder method: set number of interface layers.
    pub fn with_interface_layers(mut self, layers: u32) -> Self {
        self.support_material_interface_layers = layers;
        self
    }

    /// Builder method: set the base pattern.
    pub fn with_pattern(mut self, pattern: SupportMaterialPattern) -> Self {
        self.support_material_pattern = pattern;
        self
    }

    /// Builder method: set the overhang threshold angle.
    pub fn with_threshold(mut self, degrees: u32) -> Self {
        self.support_material_threshold = degrees;
        self
    }

    /// Builder method: restrict support to the build plate.
    pub fn with_buildplate_only(mut self, enabled: bool) -> Self {
        self.support_material_buildplate_only = enabled;
        self
    }

    /// Builder method: set raft layer count.
    pub fn with_raft_layers(mut self, layers: u32) -> Self {
        self.raft_layers = layers;
        self
    }

    /// Builder method: enable/disable contact loops.
    pub fn with_contact_loops(mut self, enabled: bool) -> Self {
        self.support_material_interface_contact_loops = enabled;
        self
    }

    /// Builder method: enable/disable sheath.
    pub fn with_sheath(mut self, enabled: bool) -> Self {
        self.support_material_with_sheath = enabled;
        self
    }

    /// Builder method: set the base line spacing.
    pub fn with_spacing(mut self, spacing: CoordF) -> Self {
        self.support_material_spacing = spacing;
        self
    }

    /// Zero contact distance means the support is dissolved rather than broken off.
    #[inline]
    pub fn soluble_interface(&self) -> bool {
        self.support_material_contact_distance == 0.0
    }

    /// Support is generated when enabled or when layers are enforced.
    #[inline]
    pub fn has_support(&self) -> bool {
        self.support_material || self.support_material_enforce_layers > 0
    }

    /// Check option ranges. `max_nozzle` bounds the extrusion widths.
    pub fn validate(&self, max_nozzle: CoordF) -> ConfigResult<()> {
        fn check(key: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
            if !value.is_finite() || value < min || value > max {
                Err(ConfigError::OutOfRange { key, value })
            } else {
                Ok(())
            }
        }

        check("layer_height", self.layer_height, 1e-3, f64::MAX)?;
        check(
            "support_material_threshold",
            self.support_material_threshold as f64,
            0.0,
            90.0,
        )?;
        check(
            "support_material_interface_layers",
            self.support_material_interface_layers as f64,
            0.0,
            MAX_INTERFACE_LAYERS as f64,
        )?;
        check(
            "support_material_contact_distance",
            self.support_material_contact_distance,
            0.0,
            f64::MAX,
        )?;
        check(
            "support_material_spacing",
            self.support_material_spacing,
            0.0,
            f64::MAX,
        )?;
        check(
            "support_material_interface_spacing",
            self.support_material_interface_spacing,
            0.0,
            f64::MAX,
        )?;
        check(
            "support_material_angle",
            self.support_material_angle,
            -360.0,
            360.0,
        )?;

        let width_limit = 10.0 * max_nozzle;
        check(
            "extrusion_width",
            self.extrusion_width.get_abs_value(self.layer_height),
            0.0,
            width_limit,
        )?;
        check(
            "support_material_extrusion_width",
            self.support_material_extrusion_width
                .get_abs_value(self.layer_height),
            0.0,
            width_limit,
        )?;
        check(
            "support_material_xy_spacing",
            self.support_material_xy_spacing.value(),
            0.0,
            f64::MAX,
        )?;
        Ok(())
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PrintObjectConfig {
    fn default() -> Self {
        Self {
            layer_height: 0.3,
            extrusion_width: FloatOrPercent::Absolute(0.0),
            raft_layers: 0,
            dont_support_bridges: true,

            support_material: false,
            support_material_angle: 0.0,
            support_material_buildplate_only: false,
            support_material_contact_distance: 0.2,
            support_material_enforce_layers: 0,
            support_material_extruder: 0,
            support_material_extrusion_width: FloatOrPercent::Absolute(0.0),
            support_material_interface_contact_loops: false,
            support_material_interface_extruder: 0,
            support_material_interface_layers: 3,
            support_material_interface_spacing: 0.0,
            support_material_pattern: SupportMaterialPattern::Rectilinear,
            support_material_spacing: 2.5,
            support_material_threshold: 0,
            support_material_with_sheath: true,
            support_material_xy_spacing: FloatOrPercent::Percent(100.0),
        }
    }
}

impl fmt::Display for PrintObjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PrintObjectConfig(support={}, pattern={}, interface_layers={}, contact_distance={})",
            self.support_material,
            self.support_material_pattern,
            self.support_material_interface_layers,
            self.support_material_contact_distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_object_config_default() {
        let config = PrintObjectConfig::default();
        assert!(!config.support_material);
        assert_eq!(config.support_material_interface_layers, 3);
        assert_eq!(
            config.support_material_pattern,
            SupportMaterialPattern::Rectilinear
        );
        assert!((config.support_material_spacing - 2.5).abs() < 1e-12);
        assert!(config.support_material_with_sheath);
        // One full external perimeter width of clearance.
        assert_eq!(
            config.support_material_xy_spacing,
            FloatOrPercent::Percent(100.0)
        );
        assert!(!config.soluble_interface());
        assert!(config.validate(0.4).is_ok());
    }

    #[test]
    fn test_print_object_config_builder() {
        let config = PrintObjectConfig::new()
            .with_support_material(true)
            .with_interface_layers(2)
            .with_contact_distance(0.0)
            .with_pattern(SupportMaterialPattern::Honeycomb)
            .with_raft_layers(3);

        assert!(config.has_support());
        assert_eq!(config.support_material_interface_layers, 2);
        assert!(config.soluble_interface());
        assert_eq!(config.raft_layers, 3);
    }

    #[test]
    fn test_pattern_parse() {
        assert_eq!(
            "rectilinear-grid".parse::<SupportMaterialPattern>().unwrap(),
            SupportMaterialPattern::RectilinearGrid
        );
        assert_eq!(SupportMaterialPattern::Pillars.to_string(), "pillars");
        assert!(matches!(
            "gyroid".parse::<SupportMaterialPattern>(),
            Err(ConfigError::UnknownPattern(p)) if p == "gyroid"
        ));
    }

    #[test]
    fn test_unknown_pattern_in_json_fails() {
        let err = PrintObjectConfig::from_json(r#"{ "support_material_pattern": "gyroid" }"#);
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_pattern() {
        let config = PrintObjectConfig::new().with_pattern(SupportMaterialPattern::RectilinearGrid);
        let json = config.to_json().unwrap();
        assert!(json.contains("rectilinear-grid"));
        let back = PrintObjectConfig::from_json(&json).unwrap();
        assert_eq!(
            back.support_material_pattern,
            SupportMaterialPattern::RectilinearGrid
        );
    }

    #[test]
    fn test_validate_ranges() {
        let config = PrintObjectConfig::new().with_threshold(95);
        assert!(matches!(
            config.validate(0.4),
            Err(ConfigError::OutOfRange {
                key: "support_material_threshold",
                ..
            })
        ));

        let mut wide = PrintObjectConfig::new();
        wide.support_material_extrusion_width = FloatOrPercent::Absolute(5.0);
        assert!(wide.validate(0.4).is_err());

        let negative = PrintObjectConfig::new().with_spacing(-1.0);
        assert!(negative.validate(0.4).is_err());

        let many = PrintObjectConfig::new().with_interface_layers(MAX_INTERFACE_LAYERS + 1);
        assert!(many.validate(0.4).is_err());
        assert!(PrintObjectConfig::new().validate(0.4).is_ok());
    }
}
