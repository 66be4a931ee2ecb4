//! Support Pipeline Integration Tests
//!
//! These tests run the whole generator on small synthetic objects and check
//! the properties the support stack must hold: ordering, clearance from the
//! object, contact trimming, buildplate-only behaviour and the first layer
//! boundary.

use slicer_support::clipper;
use slicer_support::geometry::{ExPolygon, ExPolygons, Point};
use slicer_support::slice::{build_object_layers, Layer as ObjectLayer, SlicingParams};
use slicer_support::{
    scale, ExtrusionEntityCollection, ExtrusionRole, PrintConfig, PrintObjectConfig,
    PrintRegionConfig, SupportLayerType, SupportMaterial, SupportStack, EPSILON,
};

const LAYER_HEIGHT: f64 = 0.2;

fn disk(radius: f64) -> ExPolygon {
    ExPolygon::circle(Point::new(0, 0), scale(radius), 64)
}

fn params() -> SlicingParams {
    SlicingParams::new(LAYER_HEIGHT, LAYER_HEIGHT)
}

/// Object layers from `(layer count, island)` runs, bottom first.
fn build(runs: &[(usize, ExPolygon)]) -> Vec<ObjectLayer> {
    let islands: Vec<ExPolygons> = runs
        .iter()
        .flat_map(|(n, island)| std::iter::repeat(vec![island.clone()]).take(*n))
        .collect();
    build_object_layers(islands, &params(), &PrintRegionConfig::default(), 0.4).unwrap()
}

/// A wide disk held up by a thin pillar.
fn disk_over_pillar() -> Vec<ObjectLayer> {
    build(&[(15, disk(3.0)), (5, disk(12.0))])
}

/// A wide disk on a pillar standing on a lower disk.
fn stacked_disks(upper_radius: f64) -> Vec<ObjectLayer> {
    build(&[(5, disk(10.0)), (10, disk(2.0)), (5, disk(upper_radius))])
}

fn generator(config: PrintObjectConfig) -> SupportMaterial {
    SupportMaterial::new(
        &config.with_support_material(true),
        &PrintConfig::new(),
        &params(),
    )
    .unwrap()
}

fn stack_layers(stack: &SupportStack) -> impl Iterator<Item = &slicer_support::support::Layer> {
    stack
        .tracks()
        .into_iter()
        .flat_map(|(_, layers)| layers.iter())
        .map(move |idx| &stack.arena[*idx])
}

/// Plan area covered by the extrusions of `fills` (mm²).
fn extruded_area(fills: &ExtrusionEntityCollection) -> f64 {
    fills.paths().iter().map(|p| p.length() * p.width).sum()
}

#[test]
fn test_disk_over_pillar_is_supported() {
    let object = disk_over_pillar();
    let sm = generator(PrintObjectConfig::new());
    let layers = sm.generate(&object).unwrap();

    assert!(!layers.is_empty());
    // Disk bottom at 3.0: contact one nozzle and one contact distance below.
    let disk_print_z = object[15].print_z();
    let contact_z = disk_print_z - 0.4 - 0.2;
    assert!(layers
        .iter()
        .any(|l| (l.print_z - contact_z).abs() < EPSILON));
    assert!(layers.iter().all(|l| l.print_z <= contact_z + EPSILON));

    for layer in &layers {
        assert!(layer.has_only_support_roles());
    }
    // Something is printed on the bed.
    assert!(!layers[0].support_fills.is_empty());
    assert!(layers
        .iter()
        .any(|l| !l.support_interface_fills.filter_by_role(ExtrusionRole::SupportMaterialInterface).is_empty()));
}

#[test]
fn test_two_interface_layers_under_close_contact() {
    let object = disk_over_pillar();
    let config = PrintObjectConfig::new()
        .with_contact_distance(0.1)
        .with_interface_layers(2)
        .with_threshold(0);
    let sm = generator(config);
    let stack = sm.generate_layers(&object).unwrap();

    assert_eq!(stack.top_contacts.len(), 1);
    let contact = &stack.arena[stack.top_contacts[0]];
    // One nozzle and the contact distance below the top of the disk's first layer.
    assert!((contact.print_z - (object[15].print_z() - 0.4 - 0.1)).abs() < EPSILON);

    let mut interfaces: Vec<_> = stack
        .interface_layers
        .iter()
        .map(|idx| &stack.arena[*idx])
        .filter(|l| l.layer_type == SupportLayerType::TopInterface)
        .collect();
    interfaces.sort_by(|a, b| a.print_z.total_cmp(&b.print_z));
    assert_eq!(interfaces.len(), 2, "{:?}", interfaces);
    assert!((interfaces[1].print_z - contact.bottom_z).abs() < EPSILON);
    assert!((interfaces[0].print_z - interfaces[1].bottom_z).abs() < EPSILON);

    // Everything further down is plain base.
    let lowest_interface = interfaces[0].bottom_z;
    let below: Vec<_> = stack
        .intermediate_layers
        .iter()
        .map(|idx| &stack.arena[*idx])
        .filter(|l| l.print_z < lowest_interface + EPSILON)
        .collect();
    assert!(!below.is_empty());
    assert!(below
        .iter()
        .all(|l| l.layer_type == SupportLayerType::Intermediate && !l.is_empty()));

    for layer in sm.generate(&object).unwrap() {
        if layer.print_z < lowest_interface + EPSILON {
            assert!(layer.support_interface_fills.is_empty(), "z={}", layer.print_z);
            assert!(!layer.support_fills.is_empty(), "z={}", layer.print_z);
        }
    }
}

#[test]
fn test_every_typed_list_is_z_sorted() {
    let object = stacked_disks(12.0);
    let sm = generator(PrintObjectConfig::new());
    let stack = sm.generate_layers(&object).unwrap();
    assert!(!stack.is_empty());

    for (track, layers) in stack.tracks() {
        assert!(stack.arena.is_z_sorted(layers), "{:?} not sorted", track);
    }
    for layer in stack_layers(&stack) {
        assert!(layer.print_z >= params().first_layer_height - EPSILON);
        assert!(layer.height > 0.0, "{:?} has no height", layer);
    }

    let output = sm.generate(&object).unwrap();
    assert!(output.windows(2).all(|w| w[0].print_z < w[1].print_z));
    assert!(output.iter().enumerate().all(|(i, l)| l.id == i));
}

#[test]
fn test_support_keeps_clear_of_object() {
    let object = stacked_disks(12.0);
    let sm = generator(PrintObjectConfig::new());
    let stack = sm.generate_layers(&object).unwrap();
    // One full support thread must fit between the object and the support.
    let clearance = sm.support_flow().width();

    let lists = [
        &stack.top_contacts,
        &stack.bottom_contacts,
        &stack.intermediate_layers,
        &stack.interface_layers,
    ];
    let mut checked = 0;
    for idx in lists.into_iter().flatten() {
        let support = &stack.arena[*idx];
        let occupied: ExPolygons = object
            .iter()
            .filter(|l| {
                l.bottom_z() < support.print_z - EPSILON && l.print_z() > support.bottom_z + EPSILON
            })
            .flat_map(|l| l.slices().iter().cloned())
            .collect();
        if occupied.is_empty() {
            continue;
        }
        let grown = clipper::offset_expolygons(&occupied, clearance, clipper::OffsetJoinType::Square);
        assert!(
            !clipper::polygons_overlap(&support.polygons, &grown),
            "{:?} closer than {}mm to the object",
            support,
            clearance
        );
        checked += 1;
    }
    assert!(checked > 0);
}

#[test]
fn test_close_contacts_do_not_overlap() {
    // The upper disk's contact sits inside the bottom contact's Z range.
    let object = build(&[(5, disk(10.0)), (4, disk(2.0)), (5, disk(10.0))]);
    let sm = generator(PrintObjectConfig::new());
    let stack = sm.generate_layers(&object).unwrap();
    assert!(!stack.bottom_contacts.is_empty());

    let min_h = params().min_layer_height;
    let mut checked = 0;
    for b in &stack.bottom_contacts {
        let bottom = &stack.arena[*b];
        for t in &stack.top_contacts {
            let top = &stack.arena[*t];
            let close = top.print_z > bottom.print_z - bottom.height + EPSILON
                && top.print_z - min_h < bottom.print_z - EPSILON;
            if close {
                checked += 1;
                assert!(!clipper::polygons_overlap(&top.polygons, &bottom.polygons));
            }
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_buildplate_only_stacked_disks() {
    let object = stacked_disks(15.0);

    let anywhere = generator(PrintObjectConfig::new())
        .generate_layers(&object)
        .unwrap();
    assert!(!anywhere.bottom_contacts.is_empty());

    let sm = generator(PrintObjectConfig::new().with_buildplate_only(true));
    let stack = sm.generate_layers(&object).unwrap();
    assert!(stack.bottom_contacts.is_empty());
    assert!(!stack.top_contacts.is_empty());

    // Nothing rests on the lower disk.
    let lower_disk = vec![disk(9.9)];
    for layer in stack_layers(&stack) {
        assert!(!clipper::polygons_overlap(&layer.polygons, &lower_disk));
    }
    for layer in sm.generate(&object).unwrap() {
        assert!(!clipper::polygons_overlap(&layer.support_islands, &lower_disk));
    }
}

#[test]
fn test_overhang_below_first_layer_is_discarded() {
    // Overhang at layer 2: the contact would sit on the bed.
    let low = build(&[(2, disk(3.0)), (8, disk(10.0))]);
    let sm = generator(PrintObjectConfig::new());
    assert!(sm.generate_layers(&low).unwrap().is_empty());
    assert!(sm.generate(&low).unwrap().is_empty());

    // One layer higher the contact lands exactly on the first layer.
    let higher = build(&[(3, disk(3.0)), (8, disk(10.0))]);
    let layers = sm.generate(&higher).unwrap();
    assert!(!layers.is_empty());
    let flh = params().first_layer_height;
    assert!(layers.iter().all(|l| l.print_z >= flh - EPSILON));
}

#[test]
fn test_generation_is_idempotent() {
    let object = stacked_disks(12.0);
    let sm = generator(PrintObjectConfig::new().with_contact_loops(true));
    let first = sm.generate(&object).unwrap();
    let second = sm.generate(&object).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_interface_count_is_monotonic() {
    let object = disk_over_pillar();
    let mut counts = Vec::new();
    let mut interface_areas = Vec::new();
    let mut base_areas = Vec::new();
    for k in 1..=4 {
        let sm = generator(PrintObjectConfig::new().with_interface_layers(k));
        counts.push(sm.generate_layers(&object).unwrap().interface_layers.len());
        let layers = sm.generate(&object).unwrap();
        interface_areas.push(
            layers
                .iter()
                .map(|l| extruded_area(&l.support_interface_fills))
                .sum::<f64>(),
        );
        base_areas.push(layers.iter().map(|l| extruded_area(&l.support_fills)).sum::<f64>());
    }

    assert_eq!(counts[0], 0);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{:?}", counts);
    assert!(counts[3] > counts[0]);

    assert!(
        interface_areas.windows(2).all(|w| w[1] >= w[0] - 1e-6),
        "interface {:?}",
        interface_areas
    );
    assert!(
        base_areas.windows(2).all(|w| w[1] <= w[0] + 1e-6),
        "base {:?}",
        base_areas
    );
    assert!(interface_areas[3] > interface_areas[0]);
    assert!(base_areas[3] < base_areas[0]);
}

#[test]
fn test_denser_spacing_prints_more() {
    let object = disk_over_pillar();
    let base_length = |spacing: f64| -> f64 {
        let layers = generator(PrintObjectConfig::new().with_spacing(spacing))
            .generate(&object)
            .unwrap();
        layers[5].support_fills.total_length()
    };
    assert!(base_length(1.0) > base_length(2.5));
}

#[test]
fn test_base_fill_follows_density_law() {
    let object = disk_over_pillar();
    let spacing = 2.5;
    let sm = generator(
        PrintObjectConfig::new()
            .with_spacing(spacing)
            .with_sheath(false),
    );
    let layers = sm.generate(&object).unwrap();

    let flow_spacing = sm.support_flow().spacing();
    let density = flow_spacing / (spacing + flow_spacing);
    // A mid-height base layer, away from the bed and the interface.
    let layer = &layers[5];
    assert!(layer.support_interface_fills.is_empty());

    let area = layer.total_area();
    let expected = density * area / flow_spacing;
    let length = layer.support_fills.total_length();
    assert!(
        (length - expected).abs() / expected < 0.15,
        "{}mm of base over {}mm², expected about {}mm",
        length,
        area,
        expected
    );
}
