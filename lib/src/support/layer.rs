//! Support layers under construction.
//!
//! Every layer the pipeline creates lives in one [`LayerArena`] and is
//! referenced by a stable [`LayerIdx`]. The typed layer lists (top contacts,
//! bottom contacts, intermediate layers, ...) are plain `Vec<LayerIdx>` sorted
//! by `print_z`, so a layer never moves once allocated.

use crate::geometry::ExPolygons;
use crate::{CoordF, EPSILON};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Role of a support layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportLayerType {
    /// Dense layer directly below an overhang.
    TopContact,
    /// Dense layer resting on a top surface of the object.
    BottomContact,
    /// Regular support body.
    Intermediate,
    /// Intermediate layer reclassified as dense, below a top contact.
    TopInterface,
    /// Intermediate layer reclassified as dense, above a bottom contact.
    BottomInterface,
    /// Sparse raft layer.
    RaftBase,
    /// Dense raft layer.
    RaftInterface,
}

impl SupportLayerType {
    pub fn name(&self) -> &'static str {
        match self {
            SupportLayerType::TopContact => "top contact",
            SupportLayerType::BottomContact => "bottom contact",
            SupportLayerType::Intermediate => "intermediate",
            SupportLayerType::TopInterface => "top interface",
            SupportLayerType::BottomInterface => "bottom interface",
            SupportLayerType::RaftBase => "raft base",
            SupportLayerType::RaftInterface => "raft interface",
        }
    }

    #[inline]
    pub fn is_contact(&self) -> bool {
        matches!(
            self,
            SupportLayerType::TopContact | SupportLayerType::BottomContact
        )
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        matches!(
            self,
            SupportLayerType::TopInterface | SupportLayerType::BottomInterface
        )
    }

    #[inline]
    pub fn is_raft(&self) -> bool {
        matches!(
            self,
            SupportLayerType::RaftBase | SupportLayerType::RaftInterface
        )
    }
}

impl fmt::Display for SupportLayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One slab of the support stack.
#[derive(Clone)]
pub struct Layer {
    pub layer_type: SupportLayerType,

    /// Top of the layer (mm).
    pub print_z: CoordF,

    /// Bottom of the layer (mm).
    pub bottom_z: CoordF,

    /// Thickness (mm). Zero until the intermediate layers are synthesized for
    /// top contacts that are not in phase with the object.
    pub height: CoordF,

    /// Support footprint.
    pub polygons: ExPolygons,

    /// Raw overhang this contact supports, before the margin was added.
    /// Empty for every layer type but top contacts.
    pub aux_polygons: ExPolygons,

    /// Extrude with a bridging flow.
    pub bridging: bool,
}

impl Layer {
    pub fn new(layer_type: SupportLayerType) -> Self {
        Self {
            layer_type,
            print_z: 0.0,
            bottom_z: 0.0,
            height: 0.0,
            polygons: Vec::new(),
            aux_polygons: Vec::new(),
            bridging: false,
        }
    }

    /// Layer spanning `[bottom_z, print_z]`.
    pub fn with_z_range(layer_type: SupportLayerType, bottom_z: CoordF, print_z: CoordF) -> Self {
        Self {
            print_z,
            bottom_z,
            height: print_z - bottom_z,
            ..Self::new(layer_type)
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Whether the thickness is still to be decided.
    #[inline]
    pub fn has_height(&self) -> bool {
        self.height > 0.0
    }

    /// Whether this layer shares any Z with `[bottom_z, print_z]`.
    #[inline]
    pub fn overlaps_z(&self, bottom_z: CoordF, print_z: CoordF) -> bool {
        self.bottom_z < print_z - EPSILON && self.print_z > bottom_z + EPSILON
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer({}, z=[{:.3}, {:.3}], {} islands{})",
            self.layer_type,
            self.bottom_z,
            self.print_z,
            self.polygons.len(),
            if self.bridging { ", bridging" } else { "" }
        )
    }
}

/// Stable handle of a layer inside a [`LayerArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerIdx(usize);

impl LayerIdx {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Owner of every support layer created during one generation run.
#[derive(Debug, Clone, Default)]
pub struct LayerArena {
    layers: Vec<Layer>,
}

impl LayerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a layer, returning its handle.
    pub fn alloc(&mut self, layer: Layer) -> LayerIdx {
        self.layers.push(layer);
        LayerIdx(self.layers.len() - 1)
    }

    #[inline]
    pub fn get(&self, idx: LayerIdx) -> Option<&Layer> {
        self.layers.get(idx.0)
    }

    #[inline]
    pub fn get_mut(&mut self, idx: LayerIdx) -> Option<&mut Layer> {
        self.layers.get_mut(idx.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerIdx, &Layer)> {
        self.layers.iter().enumerate().map(|(i, l)| (LayerIdx(i), l))
    }

    /// Sort handles by ascending `print_z`, thicker layers first on ties.
    pub fn sort_by_z(&self, idxs: &mut [LayerIdx]) {
        idxs.sort_by(|a, b| {
            let (la, lb) = (&self[*a], &self[*b]);
            la.print_z
                .total_cmp(&lb.print_z)
                .then(lb.height.total_cmp(&la.height))
        });
    }

    /// Whether `print_z` strictly increases along `idxs`.
    pub fn is_z_sorted(&self, idxs: &[LayerIdx]) -> bool {
        idxs.windows(2)
            .all(|w| self[w[0]].print_z < self[w[1]].print_z)
    }

    /// Union of the footprints of the given layers, unmerged.
    pub fn collect_polygons<'a, I>(&self, idxs: I) -> ExPolygons
    where
        I: IntoIterator<Item = &'a LayerIdx>,
    {
        idxs.into_iter()
            .flat_map(|idx| self[*idx].polygons.iter().cloned())
            .collect()
    }
}

impl Index<LayerIdx> for LayerArena {
    type Output = Layer;

    fn index(&self, idx: LayerIdx) -> &Layer {
        &self.layers[idx.0]
    }
}

impl IndexMut<LayerIdx> for LayerArena {
    fn index_mut(&mut self, idx: LayerIdx) -> &mut Layer {
        &mut self.layers[idx.0]
    }
}

/// Handles of one typed layer list.
pub type LayerIdxs = Vec<LayerIdx>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point};

    fn square(size: i64) -> ExPolygon {
        ExPolygon::rectangle(Point::new(0, 0), Point::new(size, size))
    }

    #[test]
    fn test_arena_handles_are_stable() {
        let mut arena = LayerArena::new();
        let a = arena.alloc(Layer::with_z_range(SupportLayerType::Intermediate, 0.0, 0.2));
        let b = arena.alloc(Layer::with_z_range(SupportLayerType::TopContact, 0.2, 0.4));
        assert_eq!(arena.len(), 2);
        assert_eq!(a.index(), 0);

        arena[b].polygons.push(square(1_000_000));
        assert_eq!(arena[b].layer_type, SupportLayerType::TopContact);
        assert!(!arena[b].is_empty());
        assert!(arena[a].is_empty());
        assert!(arena.get(LayerIdx(5)).is_none());
    }

    #[test]
    fn test_sort_by_z() {
        let mut arena = LayerArena::new();
        let high = arena.alloc(Layer::with_z_range(SupportLayerType::Intermediate, 0.4, 0.6));
        let thin = arena.alloc(Layer::with_z_range(SupportLayerType::Intermediate, 0.3, 0.4));
        let thick = arena.alloc(Layer::with_z_range(SupportLayerType::Intermediate, 0.2, 0.4));
        let mut idxs = vec![high, thin, thick];
        arena.sort_by_z(&mut idxs);
        assert_eq!(idxs, vec![thick, thin, high]);
        assert!(!arena.is_z_sorted(&idxs));
        assert!(arena.is_z_sorted(&[thin, high]));
    }

    #[test]
    fn test_overlaps_z() {
        let layer = Layer::with_z_range(SupportLayerType::BottomContact, 1.0, 1.4);
        assert!((layer.height - 0.4).abs() < 1e-9);
        assert!(layer.overlaps_z(1.2, 1.6));
        assert!(!layer.overlaps_z(1.4, 1.6));
        assert!(!layer.overlaps_z(0.6, 1.0));
    }

    #[test]
    fn test_layer_type_predicates() {
        assert!(SupportLayerType::TopContact.is_contact());
        assert!(SupportLayerType::BottomInterface.is_interface());
        assert!(SupportLayerType::RaftBase.is_raft());
        assert!(!SupportLayerType::Intermediate.is_contact());
        assert_eq!(SupportLayerType::RaftInterface.to_string(), "raft interface");
    }
}
