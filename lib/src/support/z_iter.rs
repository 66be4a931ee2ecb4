//! Z-ordered walks over several typed layer lists at once.
//!
//! Each typed list is sorted by `print_z` on its own. [`ZSortedLayers`] merges
//! them and yields one group per printed Z level. Layers whose `print_z`
//! differs by no more than `EPSILON` from the lowest layer of the group fall
//! into the same group.

use super::layer::{LayerArena, LayerIdx};
use crate::{CoordF, EPSILON};

/// Which typed list a layer was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerTrack {
    Raft,
    BottomContact,
    TopContact,
    Interface,
    Intermediate,
}

/// Layers printed at one Z level, tagged by the list they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveLayers {
    entries: Vec<(LayerTrack, LayerIdx)>,
}

impl ActiveLayers {
    /// First layer of the group taken from `track`.
    pub fn get(&self, track: LayerTrack) -> Option<LayerIdx> {
        self.entries
            .iter()
            .find(|(t, _)| *t == track)
            .map(|(_, idx)| *idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerTrack, LayerIdx)> + '_ {
        self.entries.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Thinnest layer of the group (mm).
    pub fn min_height(&self, arena: &LayerArena) -> CoordF {
        self.entries
            .iter()
            .map(|(_, idx)| arena[*idx].height)
            .fold(CoordF::INFINITY, CoordF::min)
    }
}

/// Merged iterator over typed layer lists, yielding `(z, ActiveLayers)` in
/// ascending Z. `z` is the midpoint of the lowest and highest `print_z` of
/// the group.
pub struct ZSortedLayers<'a> {
    arena: &'a LayerArena,
    tracks: Vec<(LayerTrack, &'a [LayerIdx])>,
    cursors: Vec<usize>,
}

impl<'a> ZSortedLayers<'a> {
    pub fn new(arena: &'a LayerArena) -> Self {
        Self {
            arena,
            tracks: Vec::new(),
            cursors: Vec::new(),
        }
    }

    /// Builder method: add a list sorted by ascending `print_z`.
    pub fn with_track(mut self, track: LayerTrack, layers: &'a [LayerIdx]) -> Self {
        self.tracks.push((track, layers));
        self.cursors.push(0);
        self
    }

    fn head_z(&self, t: usize) -> Option<CoordF> {
        let (_, layers) = self.tracks[t];
        layers
            .get(self.cursors[t])
            .map(|idx| self.arena[*idx].print_z)
    }
}

impl Iterator for ZSortedLayers<'_> {
    type Item = (CoordF, ActiveLayers);

    fn next(&mut self) -> Option<Self::Item> {
        let z_min = (0..self.tracks.len())
            .filter_map(|t| self.head_z(t))
            .fold(None, |acc: Option<CoordF>, z| {
                Some(acc.map_or(z, |a| a.min(z)))
            })?;
        let z_max = z_min + EPSILON;

        let mut active = ActiveLayers::default();
        let mut z_top = z_min;
        for t in 0..self.tracks.len() {
            let (track, layers) = self.tracks[t];
            while let Some(idx) = layers.get(self.cursors[t]) {
                let z = self.arena[*idx].print_z;
                if z > z_max {
                    break;
                }
                active.entries.push((track, *idx));
                z_top = z_top.max(z);
                self.cursors[t] += 1;
            }
        }
        Some((0.5 * (z_min + z_top), active))
    }
}

/// Layers of a Z-sorted list whose Z span overlaps `[bottom_z, print_z]`,
/// ignoring contact shallower than `EPSILON`.
pub fn overlapping<'a>(
    arena: &'a LayerArena,
    layers: &'a [LayerIdx],
    bottom_z: CoordF,
    print_z: CoordF,
) -> impl Iterator<Item = LayerIdx> + 'a {
    let start = layers.partition_point(|idx| arena[*idx].print_z <= bottom_z + EPSILON);
    layers[start..]
        .iter()
        .copied()
        .filter(move |idx| arena[*idx].overlaps_z(bottom_z, print_z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::layer::{Layer, SupportLayerType};

    fn alloc(arena: &mut LayerArena, bottom_z: CoordF, print_z: CoordF) -> LayerIdx {
        arena.alloc(Layer::with_z_range(
            SupportLayerType::Intermediate,
            bottom_z,
            print_z,
        ))
    }

    #[test]
    fn test_merged_iteration_groups_by_z() {
        let mut arena = LayerArena::new();
        let i0 = alloc(&mut arena, 0.0, 0.2);
        let i1 = alloc(&mut arena, 0.2, 0.4);
        let i2 = alloc(&mut arena, 0.4, 0.6);
        let t0 = alloc(&mut arena, 0.2, 0.40005);
        let b0 = alloc(&mut arena, 0.5, 0.7);

        let intermediate = vec![i0, i1, i2];
        let top = vec![t0];
        let bottom = vec![b0];
        let groups: Vec<_> = ZSortedLayers::new(&arena)
            .with_track(LayerTrack::Intermediate, &intermediate)
            .with_track(LayerTrack::TopContact, &top)
            .with_track(LayerTrack::BottomContact, &bottom)
            .collect();

        assert_eq!(groups.len(), 4);
        let zs: Vec<CoordF> = groups.iter().map(|(z, _)| *z).collect();
        assert!(zs.windows(2).all(|w| w[0] < w[1]));

        let (z, second) = &groups[1];
        assert!((z - 0.400025).abs() < 1e-9);
        assert_eq!(second.len(), 2);
        assert_eq!(second.get(LayerTrack::Intermediate), Some(i1));
        assert_eq!(second.get(LayerTrack::TopContact), Some(t0));
        assert_eq!(second.get(LayerTrack::Raft), None);
        assert!((second.min_height(&arena) - 0.2).abs() < 1e-9);

        assert_eq!(groups[3].1.get(LayerTrack::BottomContact), Some(b0));
    }

    #[test]
    fn test_empty_tracks() {
        let arena = LayerArena::new();
        let empty: Vec<LayerIdx> = Vec::new();
        let mut it = ZSortedLayers::new(&arena).with_track(LayerTrack::Raft, &empty);
        assert!(it.next().is_none());
    }

    #[test]
    fn test_overlapping_lookup() {
        let mut arena = LayerArena::new();
        let layers: Vec<LayerIdx> = (0..5)
            .map(|i| alloc(&mut arena, i as f64 * 0.2, (i + 1) as f64 * 0.2))
            .collect();

        let hits: Vec<_> = overlapping(&arena, &layers, 0.3, 0.5).collect();
        assert_eq!(hits, vec![layers[1], layers[2]]);

        let touching: Vec<_> = overlapping(&arena, &layers, 0.4, 0.4).collect();
        assert!(touching.is_empty());
    }
}
