//! Configuration module for support generation settings.
//!
//! This module provides the configuration types read by the support pipeline:
//! - `PrintConfig` - printer-wide settings (nozzles, first layer width)
//! - `PrintObjectConfig` - per-object settings, including all `support_material_*` options
//! - `PrintRegionConfig` - per-region extrusion widths
//!
//! All of them (de)serialize with serde and fall back to defaults for missing keys.

mod object_config;
mod print_config;
mod region_config;

pub use object_config::{PrintObjectConfig, SupportMaterialPattern};
pub use print_config::PrintConfig;
pub use region_config::PrintRegionConfig;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors. These are raised before any geometry is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown support material pattern: {0}")]
    UnknownPattern(String),

    #[error("Value out of range for {key}: {value}")]
    OutOfRange { key: &'static str, value: f64 },

    #[error("Invalid nozzle diameter: {0}")]
    InvalidNozzle(f64),

    #[error("Extruder {0} is not defined")]
    InvalidExtruder(usize),

    #[error("Cannot parse '{0}' as a number or percentage")]
    InvalidFloatOrPercent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A length given either in mm or as a percentage of some reference value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FloatOrPercent {
    Absolute(f64),
    Percent(f64),
}

impl FloatOrPercent {
    /// Resolve against `ratio_over`.
    #[inline]
    pub fn get_abs_value(&self, ratio_over: f64) -> f64 {
        match *self {
            FloatOrPercent::Absolute(v) => v,
            FloatOrPercent::Percent(p) => ratio_over * p / 100.0,
        }
    }

    /// The raw number regardless of its kind.
    #[inline]
    pub fn value(&self) -> f64 {
        match *self {
            FloatOrPercent::Absolute(v) | FloatOrPercent::Percent(v) => v,
        }
    }
}

impl Default for FloatOrPercent {
    fn default() -> Self {
        FloatOrPercent::Absolute(0.0)
    }
}

impl FromStr for FloatOrPercent {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidFloatOrPercent(s.to_string()))
        };
        match trimmed.strip_suffix('%') {
            Some(number) => Ok(FloatOrPercent::Percent(parse(number)?)),
            None => Ok(FloatOrPercent::Absolute(parse(trimmed)?)),
        }
    }
}

impl fmt::Display for FloatOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatOrPercent::Absolute(v) => write!(f, "{}", v),
            FloatOrPercent::Percent(p) => write!(f, "{}%", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_or_percent_parse() {
        assert_eq!(
            "50%".parse::<FloatOrPercent>().unwrap(),
            FloatOrPercent::Percent(50.0)
        );
        assert_eq!(
            " 0.45 ".parse::<FloatOrPercent>().unwrap(),
            FloatOrPercent::Absolute(0.45)
        );
        assert!("abc".parse::<FloatOrPercent>().is_err());
    }

    #[test]
    fn test_float_or_percent_abs_value() {
        assert!((FloatOrPercent::Percent(50.0).get_abs_value(0.45) - 0.225).abs() < 1e-12);
        assert!((FloatOrPercent::Absolute(0.3).get_abs_value(0.45) - 0.3).abs() < 1e-12);
        assert_eq!(FloatOrPercent::Percent(150.0).to_string(), "150%");
    }
}
