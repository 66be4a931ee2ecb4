//! Trimming support layers against each other and against the object.

use super::layer::{LayerArena, LayerIdx};
use super::top_contacts::SUPPORT_SURFACES_JOIN;
use super::SupportMaterial;
use crate::clipper;
use crate::geometry::ExPolygons;
use crate::slice::Layer as ObjectLayer;
use crate::{CoordF, EPSILON};
use log::trace;

impl SupportMaterial {
    /// Remove from the top contacts whatever a bottom contact occupies at the
    /// same height, leaving a gap instead of over-extruding.
    pub(crate) fn trim_top_contacts_by_bottom_contacts(
        &self,
        arena: &mut LayerArena,
        bottom_contacts: &[LayerIdx],
        top_contacts: &[LayerIdx],
    ) {
        let mut idx_top_first = 0;
        for &bottom_idx in bottom_contacts {
            if idx_top_first >= top_contacts.len() {
                break;
            }
            let (bottom_print_z, bottom_low) = {
                let bottom = &arena[bottom_idx];
                (bottom.print_z, bottom.print_z - bottom.height)
            };
            while idx_top_first < top_contacts.len()
                && arena[top_contacts[idx_top_first]].print_z <= bottom_low
            {
                idx_top_first += 1;
            }

            for &top_idx in &top_contacts[idx_top_first..] {
                let top = &arena[top_idx];
                let interface_z = if top.print_z == top.bottom_z {
                    // Height not decided yet.
                    top.bottom_z - self.support_layer_height_min
                } else {
                    top.bottom_z + EPSILON
                };
                if interface_z >= bottom_print_z {
                    break;
                }
                let trimmed = clipper::difference(&top.polygons, &arena[bottom_idx].polygons);
                arena[top_idx].polygons = trimmed;
            }
        }
    }

    /// Subtract the object, grown by `gap_xy`, from every layer. Object layers
    /// count when they overlap the support layer's Z span widened by
    /// `gap_extra_below` and `gap_extra_above`.
    pub(crate) fn trim_support_layers_by_object(
        &self,
        object: &[ObjectLayer],
        arena: &mut LayerArena,
        support_layers: &[LayerIdx],
        gap_extra_above: CoordF,
        gap_extra_below: CoordF,
        gap_xy: CoordF,
    ) {
        for (i, &idx) in support_layers.iter().enumerate() {
            let layer = &arena[idx];
            if layer.is_empty() {
                continue;
            }
            trace!(
                "Support generator - trimming layer {} of {} by the object",
                i,
                support_layers.len()
            );
            let clearance = object_clearance(
                object,
                layer.print_z - layer.height,
                layer.print_z,
                gap_extra_above,
                gap_extra_below,
                gap_xy,
            );
            if clearance.is_empty() {
                continue;
            }
            let trimmed = clipper::difference(&layer.polygons, &clearance);
            arena[idx].polygons = trimmed;
        }
    }
}

/// Slices of the object layers overlapping `[bottom_z - gap_below, print_z +
/// gap_above]`, grown by `gap_xy`. `object` is sorted by ascending Z.
pub(crate) fn object_clearance(
    object: &[ObjectLayer],
    bottom_z: CoordF,
    print_z: CoordF,
    gap_above: CoordF,
    gap_below: CoordF,
    gap_xy: CoordF,
) -> ExPolygons {
    let start = object.partition_point(|l| l.print_z() < bottom_z - gap_below + EPSILON);
    let top_z = print_z + gap_above - EPSILON;
    let slices: ExPolygons = object[start..]
        .iter()
        .take_while(|l| l.bottom_z() <= top_z)
        .flat_map(|l| l.slices().iter().cloned())
        .collect();
    if slices.is_empty() {
        return slices;
    }
    clipper::offset_expolygons(&slices, gap_xy, SUPPORT_SURFACES_JOIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrintConfig, PrintObjectConfig, PrintRegionConfig};
    use crate::geometry::{ExPolygon, Point};
    use crate::slice::{build_object_layers, SlicingParams};
    use crate::support::layer::{Layer, SupportLayerType};

    fn square_mm(x0: f64, y0: f64, x1: f64, y1: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(x0, y0), Point::new_scale(x1, y1))
    }

    fn generator() -> SupportMaterial {
        let config = PrintObjectConfig::new().with_support_material(true);
        SupportMaterial::new(&config, &PrintConfig::new(), &SlicingParams::new(0.2, 0.2)).unwrap()
    }

    fn layer(layer_type: SupportLayerType, bottom_z: f64, print_z: f64, area: ExPolygon) -> Layer {
        let mut layer = Layer::with_z_range(layer_type, bottom_z, print_z);
        layer.polygons = vec![area];
        layer
    }

    #[test]
    fn test_top_contact_trimmed_by_close_bottom_contact() {
        let sm = generator();
        let mut arena = LayerArena::new();
        let bottom = arena.alloc(layer(
            SupportLayerType::BottomContact,
            1.0,
            1.6,
            square_mm(0.0, 0.0, 10.0, 10.0),
        ));
        // Height not assigned: print_z == bottom_z.
        let mut close = layer(
            SupportLayerType::TopContact,
            1.5,
            1.5,
            square_mm(5.0, 0.0, 15.0, 10.0),
        );
        close.height = 0.0;
        let close = arena.alloc(close);
        let mut far = layer(
            SupportLayerType::TopContact,
            4.0,
            4.0,
            square_mm(5.0, 0.0, 15.0, 10.0),
        );
        far.height = 0.0;
        let far = arena.alloc(far);

        sm.trim_top_contacts_by_bottom_contacts(&mut arena, &[bottom], &[close, far]);

        let trimmed = &arena[close].polygons;
        assert!(!trimmed.is_empty());
        assert!(!clipper::polygons_overlap(trimmed, &arena[bottom].polygons));
        assert_eq!(arena[far].polygons.len(), 1);
        assert!(clipper::polygons_overlap(
            &arena[far].polygons,
            &[square_mm(5.0, 0.0, 10.0, 10.0)]
        ));
    }

    #[test]
    fn test_trim_by_object_leaves_clearance() {
        let sm = generator();
        let params = SlicingParams::new(0.2, 0.2);
        let islands = vec![vec![square_mm(0.0, 0.0, 10.0, 10.0)]; 10];
        let object =
            build_object_layers(islands, &params, &PrintRegionConfig::default(), 0.4).unwrap();

        let mut arena = LayerArena::new();
        let support = arena.alloc(layer(
            SupportLayerType::Intermediate,
            0.8,
            1.0,
            square_mm(-5.0, 0.0, 15.0, 10.0),
        ));
        let above = arena.alloc(layer(
            SupportLayerType::Intermediate,
            2.5,
            2.7,
            square_mm(-5.0, 0.0, 15.0, 10.0),
        ));
        sm.trim_support_layers_by_object(&object, &mut arena, &[support, above], 0.07, 0.07, 0.5);

        let trimmed = &arena[support].polygons;
        assert_eq!(trimmed.len(), 2);
        let grown = clipper::offset_expolygons(
            &[square_mm(0.0, 0.0, 10.0, 10.0)],
            0.49,
            SUPPORT_SURFACES_JOIN,
        );
        assert!(!clipper::polygons_overlap(trimmed, &grown));
        // Above the object: untouched.
        assert_eq!(arena[above].polygons.len(), 1);
    }
}
