//! Classified regions of a layer.
//!
//! Support generation reads two classifications: top surfaces, where support
//! may land on the object, and bottom bridges, which the object spans on its
//! own and which may be left unsupported.

use crate::geometry::{ExPolygon, ExPolygons};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a surface within a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Top surface (visible from above).
    Top,
    /// Bottom surface resting on the build plate or on support.
    Bottom,
    /// Bottom surface that bridges over air.
    BottomBridge,
    /// Internal solid surface.
    InternalSolid,
    /// Internal surface that will receive sparse infill.
    #[default]
    Internal,
    /// Internal bridge over sparse infill.
    InternalBridge,
}

impl SurfaceType {
    #[inline]
    pub fn is_top(&self) -> bool {
        matches!(self, SurfaceType::Top)
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        matches!(self, SurfaceType::Bottom | SurfaceType::BottomBridge)
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        matches!(
            self,
            SurfaceType::BottomBridge | SurfaceType::InternalBridge
        )
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SurfaceType::Internal | SurfaceType::InternalSolid | SurfaceType::InternalBridge
        )
    }

    /// Get a human-readable name for this surface type.
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceType::Top => "top",
            SurfaceType::Bottom => "bottom",
            SurfaceType::BottomBridge => "bottom bridge",
            SurfaceType::InternalSolid => "internal solid",
            SurfaceType::Internal => "internal",
            SurfaceType::InternalBridge => "internal bridge",
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A classified region within a layer.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Surface {
    /// The geometry of this surface.
    pub expolygon: ExPolygon,

    /// The classification of this surface.
    pub surface_type: SurfaceType,

    /// Bridge direction in radians, once detected.
    pub bridge_angle: Option<CoordF>,
}

impl Surface {
    pub fn new(expolygon: ExPolygon, surface_type: SurfaceType) -> Self {
        Self {
            expolygon,
            surface_type,
            bridge_angle: None,
        }
    }

    pub fn top(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::Top)
    }

    pub fn bottom(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::Bottom)
    }

    pub fn internal(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::Internal)
    }

    /// Bottom bridge with an optional direction.
    pub fn bridge(expolygon: ExPolygon, angle: Option<CoordF>) -> Self {
        Self {
            expolygon,
            surface_type: SurfaceType::BottomBridge,
            bridge_angle: angle,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expolygon.is_empty()
    }

    /// Area in scaled units squared.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.expolygon.area()
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.surface_type.is_top()
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.surface_type.is_bridge()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surface({:?}, area={:.2}mm²)",
            self.surface_type,
            self.area() / (crate::SCALING_FACTOR * crate::SCALING_FACTOR)
        )
    }
}

impl From<ExPolygon> for Surface {
    fn from(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::default())
    }
}

pub type Surfaces = Vec<Surface>;

/// Surfaces of one layer region.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SurfaceCollection {
    pub surfaces: Surfaces,
}

impl SurfaceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every ExPolygon tagged with `surface_type`.
    pub fn from_expolygons(expolygons: ExPolygons, surface_type: SurfaceType) -> Self {
        Self {
            surfaces: expolygons
                .into_iter()
                .map(|e| Surface::new(e, surface_type))
                .collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn push(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Surface> {
        self.surfaces.iter()
    }

    /// Geometry of all surfaces matching `pred`.
    pub fn filter_expolygons<F>(&self, pred: F) -> ExPolygons
    where
        F: Fn(&Surface) -> bool,
    {
        self.surfaces
            .iter()
            .filter(|s| pred(s))
            .map(|s| s.expolygon.clone())
            .collect()
    }

    /// Geometry of all surfaces of one type.
    pub fn expolygons_of(&self, surface_type: SurfaceType) -> ExPolygons {
        self.filter_expolygons(|s| s.surface_type == surface_type)
    }

    /// Geometry of every surface.
    pub fn to_expolygons(&self) -> ExPolygons {
        self.filter_expolygons(|_| true)
    }

    pub fn has_type(&self, surface_type: SurfaceType) -> bool {
        self.surfaces.iter().any(|s| s.surface_type == surface_type)
    }
}

impl fmt::Debug for SurfaceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceCollection({} surfaces)", self.surfaces.len())
    }
}

impl<'a> IntoIterator for &'a SurfaceCollection {
    type Item = &'a Surface;
    type IntoIter = std::slice::Iter<'a, Surface>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.iter()
    }
}
