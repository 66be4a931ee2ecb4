//! Object layers.
//!
//! A [`Layer`] is one horizontal slice of a print object. Its regions carry
//! the classified surfaces and the perimeters the support generator reads:
//! top surfaces (where support lands), bottom bridges (which may stay
//! unsupported) and the perimeter loops (to find bridging perimeters).

use super::{SlicingParams, Surface, SurfaceCollection, SurfaceType};
use crate::clipper::{
    diff_polylines_with_expolygons, difference, intersection, offset_expolygons, union, union_ex,
    OffsetJoinType,
};
use crate::config::PrintRegionConfig;
use crate::extrusion::ExtrusionEntityCollection;
use crate::flow::{Flow, FlowResult, FlowRole};
use crate::geometry::{ExPolygon, ExPolygons, PointF, Polylines};
use crate::perimeter::PerimeterGenerator;
use crate::CoordF;
use log::debug;
use std::fmt;

/// A single layer of a sliced object.
#[derive(Clone, Default)]
pub struct Layer {
    /// Layer index (0-based).
    id: usize,

    /// Z of the top of this layer (mm).
    print_z: CoordF,

    /// Thickness of this layer (mm).
    height: CoordF,

    /// Union of all region slices.
    slices: ExPolygons,

    /// Regions, each with its own print settings.
    regions: Vec<LayerRegion>,
}

impl Layer {
    pub fn new(id: usize, print_z: CoordF, height: CoordF) -> Self {
        Self {
            id,
            print_z,
            height,
            slices: Vec::new(),
            regions: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn print_z(&self) -> CoordF {
        self.print_z
    }

    #[inline]
    pub fn height(&self) -> CoordF {
        self.height
    }

    #[inline]
    pub fn bottom_z(&self) -> CoordF {
        self.print_z - self.height
    }

    /// Islands of this layer, all regions merged.
    #[inline]
    pub fn slices(&self) -> &ExPolygons {
        &self.slices
    }

    #[inline]
    pub fn regions(&self) -> &[LayerRegion] {
        &self.regions
    }

    #[inline]
    pub fn region(&self, idx: usize) -> Option<&LayerRegion> {
        self.regions.get(idx)
    }

    /// Add a region and merge its slices into the layer islands.
    pub fn add_region(&mut self, region: LayerRegion) {
        self.regions.push(region);
        self.make_slices();
    }

    /// Recompute the layer islands from the region slices.
    pub fn make_slices(&mut self) {
        let all: ExPolygons = self
            .regions
            .iter()
            .flat_map(|r| r.slices.to_expolygons())
            .collect();
        self.slices = union_ex(&all);
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Region slices of one surface type, all regions merged.
    pub fn region_slices_by_type(&self, surface_type: SurfaceType) -> ExPolygons {
        self.regions
            .iter()
            .flat_map(|r| r.slices.expolygons_of(surface_type))
            .collect()
    }

    /// Top surfaces, where the object can carry support resting on it.
    pub fn top_surfaces(&self) -> ExPolygons {
        self.region_slices_by_type(SurfaceType::Top)
    }

    /// Generate perimeters for every region.
    pub fn make_perimeters(&mut self, nozzle_diameter: CoordF) -> FlowResult<()> {
        let height = self.height;
        for region in &mut self.regions {
            region.make_perimeters(height, nozzle_diameter)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer(id={}, z={:.3}mm, height={:.3}mm, {} regions)",
            self.id,
            self.print_z,
            self.height,
            self.regions.len()
        )
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer {} at z={:.3}mm (height={:.3}mm)",
            self.id, self.print_z, self.height
        )
    }
}

/// A region within a layer.
#[derive(Clone, Default)]
pub struct LayerRegion {
    /// Classified slices of this region.
    pub slices: SurfaceCollection,

    /// Classified area left for infill, inside the perimeters.
    pub fill_surfaces: SurfaceCollection,

    /// Perimeter loops in print order.
    pub perimeters: ExtrusionEntityCollection,

    /// Edges of detected bridges that are not anchored on the layer below.
    pub unsupported_bridge_edges: Polylines,

    /// Print settings of this region.
    pub config: PrintRegionConfig,
}

impl LayerRegion {
    pub fn new(config: PrintRegionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Region whose slices are all of one type.
    pub fn with_slices(
        slices: ExPolygons,
        surface_type: SurfaceType,
        config: PrintRegionConfig,
    ) -> Self {
        Self {
            slices: SurfaceCollection::from_expolygons(slices, surface_type),
            config,
            ..Default::default()
        }
    }

    /// Flow of one of this region's roles.
    pub fn flow(&self, role: FlowRole, layer_height: CoordF, nozzle: CoordF) -> FlowResult<Flow> {
        self.config.flow(role, layer_height, nozzle)
    }

    /// Total slice area (scaled units squared).
    pub fn area(&self) -> CoordF {
        self.slices.iter().map(|s| s.area()).sum()
    }

    /// Generate the perimeters and derive the fill surfaces from what they enclose.
    pub fn make_perimeters(&mut self, layer_height: CoordF, nozzle: CoordF) -> FlowResult<()> {
        let generator = PerimeterGenerator::new(&self.config, layer_height, nozzle)?;
        let result = generator.process(&self.slices.to_expolygons())?;
        self.perimeters = result.perimeters;

        let mut fill_surfaces = SurfaceCollection::new();
        for surface in &self.slices {
            for expolygon in intersection(std::slice::from_ref(&surface.expolygon), &result.fill_area)
            {
                fill_surfaces.push(Surface {
                    expolygon,
                    surface_type: surface.surface_type,
                    bridge_angle: surface.bridge_angle,
                });
            }
        }
        self.fill_surfaces = fill_surfaces;
        Ok(())
    }
}

impl fmt::Debug for LayerRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LayerRegion({} slices, {} fill surfaces, {} perimeters)",
            self.slices.len(),
            self.fill_surfaces.len(),
            self.perimeters.len()
        )
    }
}

/// Type alias for a collection of layers.
pub type Layers = Vec<Layer>;

/// Build classified object layers from per-layer islands, bottom to top.
///
/// Each layer gets a single region with `region_config`. Surfaces are
/// classified against the neighbouring layers, bridges over air are
/// detected, and perimeters are generated.
pub fn build_object_layers(
    islands: Vec<ExPolygons>,
    params: &SlicingParams,
    region_config: &PrintRegionConfig,
    nozzle_diameter: CoordF,
) -> FlowResult<Layers> {
    let merged: Vec<ExPolygons> = islands.iter().map(|i| union_ex(i)).collect();
    let ext_width = region_config
        .flow(FlowRole::ExternalPerimeter, params.layer_height, nozzle_diameter)?
        .width();

    let mut layers = Vec::with_capacity(merged.len());
    let mut print_z = params.object_print_z_min;
    for (id, slices) in merged.iter().enumerate() {
        let height = if id == 0 && !params.has_raft() {
            params.first_layer_height
        } else {
            params.layer_height
        };
        print_z += height;

        let lower = if id > 0 { Some(&merged[id - 1]) } else { None };
        let upper = merged.get(id + 1);
        let (surfaces, unsupported_edges) =
            classify_surfaces(slices, lower, upper, ext_width, params.has_raft());

        let mut region = LayerRegion::new(region_config.clone());
        region.slices = surfaces;
        region.unsupported_bridge_edges = unsupported_edges;

        let mut layer = Layer::new(id, print_z, height);
        layer.add_region(region);
        layer.make_perimeters(nozzle_diameter)?;
        layers.push(layer);
    }

    debug!("Built {} object layers", layers.len());
    Ok(layers)
}

/// Split `slices` into top, bottom and internal surfaces.
///
/// A part visible both from above and from below is a bottom. Bottoms over
/// air, and the first layer over a raft, become bridges; a bridge gets a
/// direction only when it is anchored on at least two separate islands of the
/// layer below.
fn classify_surfaces(
    slices: &ExPolygons,
    lower: Option<&ExPolygons>,
    upper: Option<&ExPolygons>,
    anchor_width: CoordF,
    on_raft: bool,
) -> (SurfaceCollection, Polylines) {
    let empty = Vec::new();
    let lower_slices = lower.unwrap_or(&empty);
    let upper_slices = upper.unwrap_or(&empty);

    let bottom = difference(slices, lower_slices);
    let top = difference(&difference(slices, upper_slices), &bottom);
    let internal = difference(slices, &union(&top, &bottom));

    let mut surfaces = SurfaceCollection::new();
    let mut unsupported_edges = Vec::new();
    for expolygon in top {
        surfaces.push(Surface::top(expolygon));
    }
    for expolygon in bottom {
        if lower.is_none() && !on_raft {
            surfaces.push(Surface::bottom(expolygon));
            continue;
        }
        let angle = bridge_direction(&expolygon, lower_slices, anchor_width);
        if angle.is_some() {
            let anchored = offset_expolygons(lower_slices, anchor_width, OffsetJoinType::Miter);
            unsupported_edges.extend(diff_polylines_with_expolygons(
                &expolygon.to_polylines(),
                &anchored,
            ));
        }
        surfaces.push(Surface::bridge(expolygon, angle));
    }
    for expolygon in internal {
        surfaces.push(Surface::internal(expolygon));
    }
    (surfaces, unsupported_edges)
}

/// Direction joining the two largest anchors of a bridge, if it has two.
fn bridge_direction(
    bridge: &ExPolygon,
    lower_slices: &ExPolygons,
    anchor_width: CoordF,
) -> Option<CoordF> {
    let grown = offset_expolygons(std::slice::from_ref(bridge), anchor_width, OffsetJoinType::Miter);
    let mut anchors = intersection(&grown, lower_slices);
    if anchors.len() < 2 {
        return None;
    }
    anchors.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap_or(std::cmp::Ordering::Equal));
    let a = anchors[0].bounding_box().center();
    let b = anchors[1].bounding_box().center();
    let direction = PointF::new((b.x - a.x) as CoordF, (b.y - a.y) as CoordF);
    Some(direction.y.atan2(direction.x).rem_euclid(std::f64::consts::PI))
}
