//! Extrusion entities.
//!
//! An extrusion entity is anything the printer will lay down as one unit:
//!
//! - [`ExtrusionPath`] - an open polyline with a single role and flow
//! - [`ExtrusionMultiPath`] - consecutive paths printed without lifting
//! - [`ExtrusionLoop`] - a closed chain of paths (perimeters, contact loops)
//! - [`ExtrusionEntityCollection`] - an ordered group of any of the above
//!
//! [`ExtrusionEntity`] is the closed sum type over these four kinds. Consumers
//! walk it with the recursive visitors on [`ExtrusionEntity`] instead of
//! matching on each kind themselves.

use crate::flow::{Flow, FlowResult};
use crate::geometry::{BoundingBox, Point, Polygon, Polyline, Polylines};
use crate::{CoordF, SCALING_FACTOR};
use std::fmt;

/// Type of extrusion for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtrusionRole {
    #[default]
    None,
    /// External (outer) perimeter.
    ExternalPerimeter,
    /// Internal perimeter.
    Perimeter,
    /// Perimeter printed over air.
    OverhangPerimeter,
    /// Sparse infill.
    InternalInfill,
    /// Support material base.
    SupportMaterial,
    /// Support interface and contact surfaces.
    SupportMaterialInterface,
    /// Collection of entities with different roles.
    Mixed,
}

impl ExtrusionRole {

    /// Check if this role is support.
    pub fn is_support(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::SupportMaterial | ExtrusionRole::SupportMaterialInterface
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtrusionRole::None => "none",
            ExtrusionRole::ExternalPerimeter => "external perimeter",
            ExtrusionRole::Perimeter => "perimeter",
            ExtrusionRole::OverhangPerimeter => "overhang perimeter",
            ExtrusionRole::InternalInfill => "internal infill",
            ExtrusionRole::SupportMaterial => "support material",
            ExtrusionRole::SupportMaterialInterface => "support interface",
            ExtrusionRole::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ExtrusionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of a closed loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtrusionLoopRole {
    /// Outer contour, or an island's only loop.
    #[default]
    Default,
    /// Contour loop that encloses other loops of the same island.
    ContourInternalPerimeter,
    /// Loop around a hole.
    Hole,
}

/// A single open extrusion path.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionPath {
    /// Centerline (scaled coordinates).
    pub polyline: Polyline,

    /// The role/type of this extrusion.
    pub role: ExtrusionRole,

    /// Volumetric rate (mm³ per mm of travel).
    pub mm3_per_mm: CoordF,

    /// Extrusion width (mm).
    pub width: CoordF,

    /// Layer height (mm).
    pub height: CoordF,
}

impl ExtrusionPath {
    pub fn new(
        polyline: Polyline,
        role: ExtrusionRole,
        mm3_per_mm: CoordF,
        width: CoordF,
        height: CoordF,
    ) -> Self {
        Self {
            polyline,
            role,
            mm3_per_mm,
            width,
            height,
        }
    }

    /// Create a path carrying the dimensions and rate of `flow`.
    pub fn from_flow(polyline: Polyline, role: ExtrusionRole, flow: &Flow) -> FlowResult<Self> {
        Ok(Self::new(
            polyline,
            role,
            flow.mm3_per_mm()?,
            flow.width(),
            flow.height(),
        ))
    }

    pub fn first_point(&self) -> Option<Point> {
        self.polyline.first_point()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.polyline.last_point()
    }

    /// Length in mm.
    pub fn length(&self) -> CoordF {
        self.polyline.length() / SCALING_FACTOR
    }

    pub fn reverse(&mut self) {
        self.polyline.reverse();
    }

    /// Material volume of the path (mm³).
    pub fn volume(&self) -> CoordF {
        self.length() * self.mm3_per_mm
    }
}

/// Paths printed one after another without a travel move.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionMultiPath {
    pub paths: Vec<ExtrusionPath>,
}

impl ExtrusionMultiPath {
    pub fn new(paths: Vec<ExtrusionPath>) -> Self {
        Self { paths }
    }

    pub fn role(&self) -> ExtrusionRole {
        self.paths.first().map(|p| p.role).unwrap_or_default()
    }

    /// Concatenated centerline.
    pub fn as_polyline(&self) -> Polyline {
        join_paths(&self.paths)
    }
}

/// A closed chain of paths. The last point of the last path meets the first
/// point of the first path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionLoop {
    pub paths: Vec<ExtrusionPath>,
    pub loop_role: ExtrusionLoopRole,
}

impl ExtrusionLoop {
    pub fn new(paths: Vec<ExtrusionPath>, loop_role: ExtrusionLoopRole) -> Self {
        Self { paths, loop_role }
    }

    /// Single-path loop around `polygon`, split at its first point.
    pub fn from_polygon(
        polygon: &Polygon,
        role: ExtrusionRole,
        loop_role: ExtrusionLoopRole,
        mm3_per_mm: CoordF,
        width: CoordF,
        height: CoordF,
    ) -> Self {
        let path = ExtrusionPath::new(
            polygon.split_at_first_point(),
            role,
            mm3_per_mm,
            width,
            height,
        );
        Self::new(vec![path], loop_role)
    }

    pub fn role(&self) -> ExtrusionRole {
        self.paths.first().map(|p| p.role).unwrap_or_default()
    }

    /// The loop as a closed polygon (closing point dropped).
    pub fn polygon(&self) -> Polygon {
        let mut points = join_paths(&self.paths).into_points();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Polygon::from_points(points)
    }

    /// The loop as an open polyline ending on its start point.
    pub fn as_polyline(&self) -> Polyline {
        join_paths(&self.paths)
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.polygon().is_counter_clockwise()
    }

    /// Reverse the loop if needed. Returns true if it was clockwise.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if self.is_counter_clockwise() {
            return false;
        }
        self.reverse();
        true
    }

    /// Reverse the loop if needed. Returns true if it was counter-clockwise.
    pub fn make_clockwise(&mut self) -> bool {
        if !self.is_counter_clockwise() {
            return false;
        }
        self.reverse();
        true
    }

    fn reverse(&mut self) {
        self.paths.reverse();
        for path in &mut self.paths {
            path.reverse();
        }
    }
}

fn join_paths(paths: &[ExtrusionPath]) -> Polyline {
    let mut out = Polyline::new();
    for path in paths {
        for p in path.polyline.points() {
            if out.last_point() != Some(*p) {
                out.push(*p);
            }
        }
    }
    out
}

/// An ordered group of extrusion entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionEntityCollection {
    pub entities: Vec<ExtrusionEntity>,

    /// Keep the stored order when printing.
    pub no_sort: bool,
}

impl ExtrusionEntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: impl Into<ExtrusionEntity>) {
        self.entities.push(entity.into());
    }

    /// Append one path per valid polyline, all with the same role and flow.
    pub fn append_paths(
        &mut self,
        polylines: Polylines,
        role: ExtrusionRole,
        mm3_per_mm: CoordF,
        width: CoordF,
        height: CoordF,
    ) {
        self.entities.extend(
            polylines
                .into_iter()
                .filter(|p| p.is_valid())
                .map(|p| ExtrusionPath::new(p, role, mm3_per_mm, width, height).into()),
        );
    }

    /// [`append_paths`](Self::append_paths) with the dimensions of `flow`.
    pub fn append_paths_with_flow(
        &mut self,
        polylines: Polylines,
        role: ExtrusionRole,
        flow: &Flow,
    ) -> FlowResult<()> {
        self.append_paths(polylines, role, flow.mm3_per_mm()?, flow.width(), flow.height());
        Ok(())
    }

    pub fn extend(&mut self, other: ExtrusionEntityCollection) {
        self.entities.extend(other.entities);
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtrusionEntity> {
        self.entities.iter()
    }

    /// Role shared by all members, or `Mixed`.
    pub fn role(&self) -> ExtrusionRole {
        let mut role = ExtrusionRole::None;
        for entity in &self.entities {
            let r = entity.role();
            if role == ExtrusionRole::None {
                role = r;
            } else if r != role {
                return ExtrusionRole::Mixed;
            }
        }
        role
    }

    /// Copy without nested collections. Loops and multi-paths are kept whole.
    pub fn flatten(&self) -> ExtrusionEntityCollection {
        let mut out = ExtrusionEntityCollection {
            entities: Vec::new(),
            no_sort: self.no_sort,
        };
        for entity in &self.entities {
            entity.flatten_into(&mut out.entities);
        }
        out
    }

    /// Number of leaf entities (paths, multi-paths and loops).
    pub fn items_count(&self) -> usize {
        self.entities.iter().map(|e| e.items_count()).sum()
    }

    /// Total centerline length in mm.
    pub fn total_length(&self) -> CoordF {
        self.entities.iter().map(|e| e.total_length()).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        for entity in &self.entities {
            entity.merge_bounding_box(&mut bbox);
        }
        bbox
    }

    /// Every path in print order, descending into loops and sub-collections.
    pub fn paths(&self) -> Vec<&ExtrusionPath> {
        let mut out = Vec::new();
        for entity in &self.entities {
            entity.for_each_path(&mut |p| out.push(p));
        }
        out
    }

    /// Keep only entities with `role`, recursively. Empty sub-collections vanish.
    pub fn filter_by_role(&self, role: ExtrusionRole) -> ExtrusionEntityCollection {
        ExtrusionEntityCollection {
            entities: self
                .entities
                .iter()
                .filter_map(|e| e.filter_by_role(role))
                .collect(),
            no_sort: self.no_sort,
        }
    }

    /// Centerlines of every leaf entity, loops joined into one polyline each.
    pub fn as_polylines(&self) -> Polylines {
        let mut out = Vec::new();
        for entity in &self.entities {
            entity.collect_polylines(&mut out);
        }
        out
    }

    /// Smallest volumetric rate over all paths, 0 when empty.
    pub fn min_mm3_per_mm(&self) -> CoordF {
        let mut min = CoordF::MAX;
        for entity in &self.entities {
            entity.for_each_path(&mut |p| min = min.min(p.mm3_per_mm));
        }
        if min == CoordF::MAX {
            0.0
        } else {
            min
        }
    }
}

impl<'a> IntoIterator for &'a ExtrusionEntityCollection {
    type Item = &'a ExtrusionEntity;
    type IntoIter = std::slice::Iter<'a, ExtrusionEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// Closed sum type over the extrusion kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtrusionEntity {
    Path(ExtrusionPath),
    MultiPath(ExtrusionMultiPath),
    Loop(ExtrusionLoop),
    Collection(ExtrusionEntityCollection),
}

impl ExtrusionEntity {
    pub fn role(&self) -> ExtrusionRole {
        match self {
            ExtrusionEntity::Path(p) => p.role,
            ExtrusionEntity::MultiPath(mp) => mp.role(),
            ExtrusionEntity::Loop(l) => l.role(),
            ExtrusionEntity::Collection(c) => c.role(),
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, ExtrusionEntity::Loop(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ExtrusionEntity::Collection(_))
    }

    /// Visit every path in print order.
    pub fn for_each_path<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a ExtrusionPath),
    {
        match self {
            ExtrusionEntity::Path(p) => f(p),
            ExtrusionEntity::MultiPath(mp) => mp.paths.iter().for_each(|p| f(p)),
            ExtrusionEntity::Loop(l) => l.paths.iter().for_each(|p| f(p)),
            ExtrusionEntity::Collection(c) => {
                for entity in &c.entities {
                    entity.for_each_path(f);
                }
            }
        }
    }

    /// Centerlines of the leaf entities. A loop or multi-path yields one
    /// joined polyline.
    pub fn collect_polylines(&self, out: &mut Polylines) {
        match self {
            ExtrusionEntity::Path(p) => out.push(p.polyline.clone()),
            ExtrusionEntity::MultiPath(mp) => out.push(mp.as_polyline()),
            ExtrusionEntity::Loop(l) => out.push(l.as_polyline()),
            ExtrusionEntity::Collection(c) => {
                for entity in &c.entities {
                    entity.collect_polylines(out);
                }
            }
        }
    }

    /// Centerline length in mm.
    pub fn total_length(&self) -> CoordF {
        let mut length = 0.0;
        self.for_each_path(&mut |p| length += p.length());
        length
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        self.merge_bounding_box(&mut bbox);
        bbox
    }

    fn merge_bounding_box(&self, bbox: &mut BoundingBox) {
        self.for_each_path(&mut |p| {
            for point in p.polyline.points() {
                bbox.merge_point(*point);
            }
        });
    }

    fn items_count(&self) -> usize {
        match self {
            ExtrusionEntity::Collection(c) => c.items_count(),
            _ => 1,
        }
    }

    fn flatten_into(&self, out: &mut Vec<ExtrusionEntity>) {
        match self {
            ExtrusionEntity::Collection(c) => {
                for entity in &c.entities {
                    entity.flatten_into(out);
                }
            }
            other => out.push(other.clone()),
        }
    }

    fn filter_by_role(&self, role: ExtrusionRole) -> Option<ExtrusionEntity> {
        match self {
            ExtrusionEntity::Collection(c) => {
                let filtered = c.filter_by_role(role);
                (!filtered.is_empty()).then(|| ExtrusionEntity::Collection(filtered))
            }
            other => (other.role() == role).then(|| other.clone()),
        }
    }
}

impl From<ExtrusionPath> for ExtrusionEntity {
    fn from(path: ExtrusionPath) -> Self {
        ExtrusionEntity::Path(path)
    }
}

impl From<ExtrusionMultiPath> for ExtrusionEntity {
    fn from(multi: ExtrusionMultiPath) -> Self {
        ExtrusionEntity::MultiPath(multi)
    }
}

impl From<ExtrusionLoop> for ExtrusionEntity {
    fn from(lp: ExtrusionLoop) -> Self {
        ExtrusionEntity::Loop(lp)
    }
}

impl From<ExtrusionEntityCollection> for ExtrusionEntity {
    fn from(collection: ExtrusionEntityCollection) -> Self {
        ExtrusionEntity::Collection(collection)
    }
}
