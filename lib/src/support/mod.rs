//! Support material generation.
//!
//! The generator works on an object that has already been sliced and
//! classified. Support is built as a stack of layers independent of the
//! object's own layering:
//!
//! 1. **Top contacts**: overhangs grown by a margin, placed one contact
//!    distance below the overhanging layer.
//! 2. **Bottom contacts**: where the support column lands on a top surface of
//!    the object.
//! 3. **Intermediate layers**: the gaps between contact extremes are split into
//!    evenly spaced layers, raft layers added at the bottom.
//! 4. **Base polygons**: contact areas propagated downwards and trimmed by the
//!    object with a clearance gap.
//! 5. **Interfaces**: intermediate layers close to a contact are made dense.
//! 6. **Toolpaths**: contact loops, sheaths and infill per printed Z level.
//!
//! Every layer lives in a [`LayerArena`]; the stages pass typed lists of
//! [`LayerIdx`] between each other.

mod base;
mod bottom_contacts;
mod interface;
mod intermediate;
mod layer;
mod output;
mod toolpaths;
mod top_contacts;
mod trim;
mod z_iter;

pub use layer::{Layer, LayerArena, LayerIdx, LayerIdxs, SupportLayerType};
pub use output::SupportLayer;
pub use toolpaths::LoopInterfaceProcessor;
pub use top_contacts::BuildplateAccumulator;
pub use z_iter::{overlapping, ActiveLayers, LayerTrack, ZSortedLayers};

use crate::config::{ConfigError, PrintConfig, PrintObjectConfig};
use crate::flow::{support_flow, Flow, FlowError, FlowRole};
use crate::slice::{Layer as ObjectLayer, SlicingParams};
use crate::CoordF;
use log::{debug, info};
use thiserror::Error;

/// How far contacts reach beyond the overhang they support (mm).
pub const SUPPORT_MATERIAL_MARGIN: CoordF = 1.5;

/// Number of steps the margin is grown in, each clipped by the layer below.
pub const NUM_MARGIN_STEPS: usize = 3;

/// Error raised by the support generator.
#[derive(Debug, Error)]
pub enum SupportError {
    #[error("Object has no layers")]
    EmptyObject,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

pub type SupportResult<T> = Result<T, SupportError>;

/// The support stack before toolpaths are generated.
///
/// Every typed list is sorted by ascending `print_z`.
#[derive(Debug, Clone, Default)]
pub struct SupportStack {
    pub arena: LayerArena,
    pub raft_layers: LayerIdxs,
    pub bottom_contacts: LayerIdxs,
    pub top_contacts: LayerIdxs,
    pub intermediate_layers: LayerIdxs,
    pub interface_layers: LayerIdxs,
}

impl SupportStack {
    /// All typed lists merged and grouped by printed Z.
    pub fn z_sorted(&self) -> ZSortedLayers<'_> {
        ZSortedLayers::new(&self.arena)
            .with_track(LayerTrack::Raft, &self.raft_layers)
            .with_track(LayerTrack::BottomContact, &self.bottom_contacts)
            .with_track(LayerTrack::TopContact, &self.top_contacts)
            .with_track(LayerTrack::Interface, &self.interface_layers)
            .with_track(LayerTrack::Intermediate, &self.intermediate_layers)
    }

    /// The typed lists, tagged.
    pub fn tracks(&self) -> [(LayerTrack, &[LayerIdx]); 5] {
        [
            (LayerTrack::Raft, &self.raft_layers),
            (LayerTrack::BottomContact, &self.bottom_contacts),
            (LayerTrack::TopContact, &self.top_contacts),
            (LayerTrack::Interface, &self.interface_layers),
            (LayerTrack::Intermediate, &self.intermediate_layers),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.tracks().iter().all(|(_, layers)| layers.is_empty())
    }
}

/// Support generator for one print object.
#[derive(Debug, Clone)]
pub struct SupportMaterial {
    object_config: PrintObjectConfig,
    print_config: PrintConfig,
    slicing_params: SlicingParams,

    first_layer_flow: Flow,
    support_flow: Flow,
    interface_flow: Flow,

    support_layer_height_min: CoordF,
    support_layer_height_max: CoordF,
}

impl SupportMaterial {
    /// Validate the configuration and derive the extrusion flows.
    pub fn new(
        object_config: &PrintObjectConfig,
        print_config: &PrintConfig,
        slicing_params: &SlicingParams,
    ) -> SupportResult<Self> {
        print_config.validate()?;
        object_config.validate(print_config.max_nozzle_diameter())?;

        let support_nozzle =
            print_config.nozzle_diameter_at(object_config.support_material_extruder)?;
        let interface_nozzle =
            print_config.nozzle_diameter_at(object_config.support_material_interface_extruder)?;

        let min_h = slicing_params.min_layer_height;
        let max_h = slicing_params.max_layer_height;
        if !(min_h > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: "min_layer_height",
                value: min_h,
            }
            .into());
        }
        if max_h < min_h {
            return Err(ConfigError::OutOfRange {
                key: "max_layer_height",
                value: max_h,
            }
            .into());
        }
        if let Some(nozzle) = [support_nozzle, interface_nozzle]
            .into_iter()
            .find(|d| *d < min_h)
        {
            return Err(ConfigError::InvalidNozzle(nozzle).into());
        }

        let lh = slicing_params.layer_height;
        let flh = slicing_params.first_layer_height;
        let support_width = object_config.support_material_extrusion_width.get_abs_value(lh);
        let default_width = object_config.extrusion_width.get_abs_value(lh);

        let first_layer_width = print_config.first_layer_extrusion_width.get_abs_value(flh);
        let widths = [support_width, default_width];

        let first_layer_flow = support_flow(
            FlowRole::SupportMaterial,
            &[first_layer_width, support_width, default_width],
            support_nozzle,
            flh,
        )?;
        let base_flow = support_flow(FlowRole::SupportMaterial, &widths, support_nozzle, lh)?;
        let interface_flow = if object_config.support_material_interface_layers == 0 {
            base_flow
        } else {
            support_flow(
                FlowRole::SupportMaterialInterface,
                &widths,
                interface_nozzle,
                lh,
            )?
        };

        debug!(
            "Support generator - flows: first layer {:.3}mm, support {:.3}mm, interface {:.3}mm",
            first_layer_flow.width(),
            base_flow.width(),
            interface_flow.width()
        );

        Ok(Self {
            object_config: object_config.clone(),
            print_config: print_config.clone(),
            slicing_params: slicing_params.clone(),
            first_layer_flow,
            support_flow: base_flow,
            interface_flow,
            support_layer_height_min: min_h,
            support_layer_height_max: max_h,
        })
    }

    /// Build the support stack and its toolpaths, one [`SupportLayer`] per
    /// printed Z level.
    pub fn generate(&self, object: &[ObjectLayer]) -> SupportResult<Vec<SupportLayer>> {
        let stack = self.generate_layers(object)?;
        info!("Support generator - Generating tool paths");
        let layers = self.generate_toolpaths(&stack)?;
        info!("Support generator - End, {} support layers", layers.len());
        Ok(layers)
    }

    /// Build the support stack without toolpaths.
    pub fn generate_layers(&self, object: &[ObjectLayer]) -> SupportResult<SupportStack> {
        if object.is_empty() {
            return Err(SupportError::EmptyObject);
        }
        info!("Support generator - Start");

        let gap_xy = self.gap_xy(object)?;
        let mut stack = SupportStack::default();
        let arena = &mut stack.arena;

        info!("Support generator - Creating top contacts");
        let mut top_contacts = self.top_contact_layers(object, arena)?;
        if top_contacts.is_empty() {
            info!("Support generator - No overhangs, no support");
            return Ok(stack);
        }

        info!("Support generator - Creating bottom contacts");
        let bottom_contacts = self.bottom_contact_layers(object, &top_contacts, arena);
        self.trim_support_layers_by_object(
            object,
            arena,
            &bottom_contacts,
            self.support_layer_height_min,
            0.0,
            gap_xy,
        );

        info!("Support generator - Trimming top contacts by bottom contacts");
        self.trim_top_contacts_by_bottom_contacts(arena, &bottom_contacts, &top_contacts);

        info!("Support generator - Creating intermediate layers - indices");
        let mut intermediate_layers =
            self.raft_and_intermediate_support_layers(object, arena, &bottom_contacts, &top_contacts);

        top_contacts.retain(|idx| {
            let keep = arena[*idx].has_height();
            if !keep {
                debug!(
                    "Support generator - top contact at z={:.3} got no height, dropped",
                    arena[*idx].print_z
                );
            }
            keep
        });
        let top_gap_above = if self.slicing_params.soluble_interface {
            0.0
        } else {
            self.support_layer_height_min
        };
        self.trim_support_layers_by_object(object, arena, &top_contacts, top_gap_above, 0.0, gap_xy);

        info!("Support generator - Creating base layers");
        self.generate_base_layers(
            object,
            arena,
            &bottom_contacts,
            &top_contacts,
            &intermediate_layers,
            gap_xy,
        );

        info!("Support generator - Creating raft");
        let raft_layers =
            self.generate_raft_base(object, arena, &top_contacts, &intermediate_layers, gap_xy);

        info!("Support generator - Creating interfaces");
        let interface_layers = self.generate_interface_layers(
            arena,
            &bottom_contacts,
            &top_contacts,
            &intermediate_layers,
        );

        intermediate_layers.retain(|idx| !arena[*idx].is_empty());
        info!(
            "Support generator - {} raft, {} bottom contact, {} top contact, {} interface, {} base layers",
            raft_layers.len(),
            bottom_contacts.len(),
            top_contacts.len(),
            interface_layers.len(),
            intermediate_layers.len()
        );

        stack.raft_layers = raft_layers;
        stack.bottom_contacts = bottom_contacts;
        stack.top_contacts = top_contacts;
        stack.intermediate_layers = intermediate_layers;
        stack.interface_layers = interface_layers;
        Ok(stack)
    }

    /// Horizontal clearance between the object and the support (mm).
    fn gap_xy(&self, object: &[ObjectLayer]) -> SupportResult<CoordF> {
        let mut external_width: CoordF = 0.0;
        for layer in object {
            for region in layer.regions() {
                let nozzle = self
                    .print_config
                    .nozzle_diameter_at(region.config.perimeter_extruder)?;
                let width = region
                    .flow(FlowRole::ExternalPerimeter, layer.height(), nozzle)?
                    .width();
                external_width = external_width.max(width);
            }
        }
        Ok(self
            .object_config
            .support_material_xy_spacing
            .get_abs_value(external_width))
    }

    pub fn first_layer_flow(&self) -> &Flow {
        &self.first_layer_flow
    }

    pub fn support_flow(&self) -> &Flow {
        &self.support_flow
    }

    pub fn interface_flow(&self) -> &Flow {
        &self.interface_flow
    }

    pub fn slicing_params(&self) -> &SlicingParams {
        &self.slicing_params
    }

    #[inline]
    fn has_contact_loops(&self) -> bool {
        self.object_config.support_material_interface_contact_loops
    }
}
