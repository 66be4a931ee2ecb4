//! Extrusion flow.
//!
//! A [`Flow`] ties the size of an extruded thread to the plastic it consumes
//! and to the distance between neighbouring centerlines. Support toolpaths use
//! two profiles:
//!
//! ```text
//! flat thread:   section = h * (w - h * (1 - pi/4))     spacing = w - h * (1 - pi/4)
//! bridge thread: section = pi * w^2 / 4                  spacing = w + BRIDGE_EXTRA_SPACING
//! ```
//!
//! A flat thread is squashed against the layer below into a rectangle with
//! round ends. A bridge thread sags freely and stays round, so its height is
//! only recorded, never used in the section.

use std::f64::consts::PI;
use thiserror::Error;

/// Gap left between neighbouring bridge threads (mm).
pub const BRIDGE_EXTRA_SPACING: f64 = 0.05;

/// Share of the `w * h` rectangle lost to the rounded thread ends.
const ROUNDING_LOSS: f64 = 1.0 - 0.25 * PI;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("extrusion of width {width}mm is too narrow for a {height}mm layer")]
    NegativeSpacing { width: f64, height: f64 },

    #[error("extrusion section is not positive for width {0}mm")]
    NegativeFlow(f64),

    #[error("invalid flow argument: {0}")]
    InvalidArgument(String),
}

pub type FlowResult<T> = Result<T, FlowError>;

/// What an extrusion is used for, which picks its automatic width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowRole {
    ExternalPerimeter,
    Perimeter,
    Infill,
    SupportMaterial,
    SupportMaterialInterface,
}

impl FlowRole {
    /// Width used when the configuration leaves it at 0.
    pub fn auto_width(self, nozzle_diameter: f64) -> f64 {
        match self {
            FlowRole::SupportMaterial | FlowRole::SupportMaterialInterface => nozzle_diameter,
            FlowRole::ExternalPerimeter | FlowRole::Perimeter | FlowRole::Infill => {
                1.125 * nozzle_diameter
            }
        }
    }
}

/// Size of one extruded thread, all in mm.
///
/// For a bridge `width` is the thread diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flow {
    width: f64,
    height: f64,
    spacing: f64,
    nozzle_diameter: f64,
    bridge: bool,
}

impl Flow {
    /// Flat thread of the given size.
    pub fn new(width: f64, height: f64, nozzle_diameter: f64) -> FlowResult<Self> {
        Ok(Self {
            width,
            height,
            spacing: flat_spacing(width, height)?,
            nozzle_diameter,
            bridge: false,
        })
    }

    /// Flat or round thread. Support layers switch to round threads over
    /// air, keeping `height` as the layer thickness.
    pub fn with_bridge(
        width: f64,
        height: f64,
        nozzle_diameter: f64,
        bridge: bool,
    ) -> FlowResult<Self> {
        if !bridge {
            return Self::new(width, height, nozzle_diameter);
        }
        if width <= 0.0 {
            return Err(FlowError::InvalidArgument(format!(
                "bridge diameter must be positive, got {}",
                width
            )));
        }
        Ok(Self {
            width,
            height,
            spacing: width + BRIDGE_EXTRA_SPACING,
            nozzle_diameter,
            bridge: true,
        })
    }

    /// Round thread as thick as it is wide.
    pub fn bridging_flow(diameter: f64, nozzle_diameter: f64) -> Self {
        Self {
            width: diameter,
            height: diameter,
            spacing: diameter + BRIDGE_EXTRA_SPACING,
            nozzle_diameter,
            bridge: true,
        }
    }

    /// Flat thread from a configured width, 0 meaning automatic.
    pub fn new_from_config_width(
        role: FlowRole,
        width: f64,
        nozzle_diameter: f64,
        height: f64,
    ) -> FlowResult<Self> {
        if height <= 0.0 {
            return Err(FlowError::InvalidArgument(format!(
                "layer height must be positive, got {}",
                height
            )));
        }
        let width = if width == 0.0 {
            role.auto_width(nozzle_diameter)
        } else {
            width
        };
        Self::new(width, height, nozzle_diameter)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    #[inline]
    pub fn nozzle_diameter(&self) -> f64 {
        self.nozzle_diameter
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.bridge
    }

    /// Plastic per mm of travel (mm³/mm), the thread section.
    pub fn mm3_per_mm(&self) -> FlowResult<f64> {
        let section = if self.bridge {
            0.25 * PI * self.width * self.width
        } else {
            self.height * (self.width - self.height * ROUNDING_LOSS)
        };
        if section > 0.0 {
            Ok(section)
        } else {
            Err(FlowError::NegativeFlow(self.width))
        }
    }

    /// Same thread on a layer of another thickness. A round thread keeps
    /// its section and spacing.
    pub fn with_height(&self, height: f64) -> FlowResult<Self> {
        if self.bridge {
            Ok(Self { height, ..*self })
        } else {
            Self::new(self.width, height, self.nozzle_diameter)
        }
    }
}

fn flat_spacing(width: f64, height: f64) -> FlowResult<f64> {
    let spacing = width - height * ROUNDING_LOSS;
    if spacing > 0.0 {
        Ok(spacing)
    } else {
        Err(FlowError::NegativeSpacing { width, height })
    }
}

/// Flat support thread whose width is the first positive entry of `widths`,
/// or the automatic width of `role` when none is set.
///
/// Widths are listed most specific first, e.g. first layer width, support
/// width, then the object default.
pub fn support_flow(
    role: FlowRole,
    widths: &[f64],
    nozzle_diameter: f64,
    height: f64,
) -> FlowResult<Flow> {
    let width = widths.iter().copied().find(|w| *w > 0.0).unwrap_or(0.0);
    Flow::new_from_config_width(role, width, nozzle_diameter, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_flat_thread_section_and_spacing() {
        let flow = Flow::new(0.4, 0.2, 0.4).unwrap();
        assert!(!flow.is_bridge());
        let spacing = 0.4 - 0.2 * ROUNDING_LOSS;
        assert!(approx_eq(flow.spacing(), spacing));
        assert!(approx_eq(flow.mm3_per_mm().unwrap(), 0.2 * spacing));
    }

    #[test]
    fn test_round_thread_ignores_height() {
        let flow = Flow::with_bridge(0.2, 0.3, 0.4, true).unwrap();
        assert!(flow.is_bridge());
        assert!(approx_eq(flow.spacing(), 0.25));
        assert!(approx_eq(flow.mm3_per_mm().unwrap(), PI * 0.01));

        let thicker = flow.with_height(0.5).unwrap();
        assert_eq!(thicker.mm3_per_mm().unwrap(), flow.mm3_per_mm().unwrap());
        assert!(approx_eq(thicker.height(), 0.5));

        assert!(Flow::with_bridge(0.0, 0.2, 0.4, true).is_err());
        assert!(Flow::bridging_flow(0.4, 0.4).is_bridge());
    }

    #[test]
    fn test_thicker_layer_narrows_spacing() {
        let flow = Flow::new(0.4, 0.2, 0.4).unwrap();
        let taller = flow.with_height(0.3).unwrap();
        assert!(taller.spacing() < flow.spacing());
        assert!(approx_eq(taller.width(), 0.4));
    }

    #[test]
    fn test_thread_too_narrow_for_layer() {
        assert!(matches!(
            Flow::new(0.1, 0.5, 0.4),
            Err(FlowError::NegativeSpacing { .. })
        ));
    }

    #[test]
    fn test_automatic_width() {
        assert!(approx_eq(FlowRole::SupportMaterial.auto_width(0.4), 0.4));
        assert!(approx_eq(FlowRole::ExternalPerimeter.auto_width(0.4), 0.45));
        let flow = Flow::new_from_config_width(FlowRole::Perimeter, 0.0, 0.4, 0.2).unwrap();
        assert!(approx_eq(flow.width(), 0.45));
        assert!(Flow::new_from_config_width(FlowRole::Perimeter, 0.0, 0.4, 0.0).is_err());
    }

    #[test]
    fn test_support_flow_width_chain() {
        let auto = support_flow(FlowRole::SupportMaterial, &[0.0, 0.0], 0.4, 0.2).unwrap();
        assert!(approx_eq(auto.width(), 0.4));

        let support = support_flow(FlowRole::SupportMaterialInterface, &[0.5, 0.0], 0.4, 0.15)
            .unwrap();
        assert!(approx_eq(support.width(), 0.5));
        assert!(approx_eq(support.height(), 0.15));

        let first = support_flow(FlowRole::SupportMaterial, &[0.0, 0.6, 0.5], 0.4, 0.3).unwrap();
        assert!(approx_eq(first.width(), 0.6));
    }
}
