//! Sliced object data.
//!
//! The support generator consumes an object that is already sliced:
//! - `Layer` / `LayerRegion` - per-layer islands, classified surfaces and perimeters
//! - `Surface` / `SurfaceType` - top, bottom, bridge and internal regions
//! - `SlicingParams` - layer height limits and the raft layout

mod layer;
mod slicing_params;
mod surface;

pub use layer::{build_object_layers, Layer, LayerRegion, Layers};
pub use slicing_params::SlicingParams;
pub use surface::{Surface, SurfaceCollection, SurfaceType, Surfaces};
