//! # Slicer Support
//!
//! Support material generation for layered 3D printing.
//!
//! Given an object that has already been sliced into layers, this library
//! decides where sacrificial support is needed, builds a stack of support
//! layers whose heights are independent of the object's own layering, and
//! turns that stack into extrusion paths:
//! - Overhang detection and top contact generation
//! - Bottom contacts where support lands on the object
//! - Intermediate layer synthesis and base polygon propagation
//! - Interface layers, raft layers and first layer flanges
//! - Toolpaths: contact loops, sheaths and pattern infill
//!
//! ## Example
//!
//! ```rust,ignore
//! use slicer_support::{PrintConfig, PrintObjectConfig, SlicingParams, SupportMaterial};
//!
//! let object_config = PrintObjectConfig::default().with_support_material(true);
//! let print_config = PrintConfig::default();
//! let params = SlicingParams::new(0.2, 0.2);
//! let generator = SupportMaterial::new(&object_config, &print_config, &params)?;
//! let support_layers = generator.generate(&object_layers)?;
//! ```

pub mod clipper;
pub mod config;
pub mod extrusion;
pub mod fill;
pub mod flow;
pub mod geometry;
pub mod perimeter;
pub mod slice;
pub mod support;

pub use config::{
    ConfigError, FloatOrPercent, PrintConfig, PrintObjectConfig, PrintRegionConfig,
    SupportMaterialPattern,
};
pub use extrusion::{
    ExtrusionEntity, ExtrusionEntityCollection, ExtrusionLoop, ExtrusionLoopRole,
    ExtrusionMultiPath, ExtrusionPath, ExtrusionRole,
};
pub use fill::{Fill, FillHoneycomb, FillParams, FillRectilinear};
pub use flow::{support_flow, Flow, FlowError, FlowResult, FlowRole, BRIDGE_EXTRA_SPACING};
pub use geometry::{
    BoundingBox, ExPolygon, ExPolygons, Line, Point, PointF, Points, Polygon, Polygons, Polyline,
    Polylines,
};
pub use perimeter::{PerimeterGenerator, PerimeterGeneratorLoop};
pub use slice::{Layer, LayerRegion, SlicingParams, Surface, SurfaceType};
pub use support::{
    ActiveLayers, BuildplateAccumulator, LayerArena, LayerIdx, LayerTrack, LoopInterfaceProcessor,
    SupportError, SupportLayer, SupportLayerType, SupportMaterial, SupportResult, SupportStack,
    ZSortedLayers,
};

/// Coordinate type used throughout the library.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid floating-point issues.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values.
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Tolerance for comparing Z heights and other unscaled lengths (mm).
pub const EPSILON: CoordF = 1e-4;

/// `EPSILON` in scaled units.
pub const SCALED_EPSILON: Coord = 100;

/// Scale a floating-point coordinate to integer.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer coordinate to floating-point.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for support generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Support generation failed: {0}")]
    Support(#[from] SupportError),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
