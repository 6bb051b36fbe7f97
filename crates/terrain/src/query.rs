//! Query contexts and result accumulators.
//!
//! A query is split in two halves:
//!
//! - the **context** ([`LineQuery`], [`BoxQuery`], [`PointQuery`]) holds the
//!   request already converted to section-local space and never changes
//!   during the walk
//! - the **result** ([`HitResult`], [`PointHitResult`]) is the only mutable
//!   state, improved in place as the tree is traversed
//!
//! Contexts borrow the terrain they were built against, so a tree can answer
//! queries for any number of threads at once.

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::{BoundingVolume, LocalRay};
use crate::source::TerrainSource;
use crate::triangle::{SeparatingAxis, StandardSat};

/// Flags controlling how a trace walks the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TraceFlags(pub u32);

impl TraceFlags {
    /// Find the closest hit.
    pub const NONE: Self = Self(0);

    /// Return as soon as anything is hit. The reported hit is not
    /// necessarily the closest.
    pub const STOP_AT_ANY_HIT: Self = Self(1 << 0);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for TraceFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Opaque handle to a terrain material, resolved by the terrain owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialRef(pub u32);

/// Order in which the four quadrants of a node are visited.
pub type TraversalOrder = [usize; 4];

/// Order used when there is no direction to favour.
pub const DEFAULT_ORDER: TraversalOrder = [0, 1, 2, 3];

/// Near-to-far quadrant orders, indexed by [`order_index`].
///
/// Quadrant bit 0 is +X, bit 1 is +Y. The first entry is the quadrant the
/// ray starts in, the last is the one diagonally opposite, and the second
/// is the neighbour along the dominant axis.
const TRAVERSAL_ORDERS: [TraversalOrder; 8] = [
    // X dominant
    [0, 1, 2, 3],
    [1, 0, 3, 2],
    [2, 3, 0, 1],
    [3, 2, 1, 0],
    // Y dominant
    [0, 2, 1, 3],
    [1, 3, 0, 2],
    [2, 0, 3, 1],
    [3, 1, 2, 0],
];

#[inline]
fn order_index(dir: Vec3) -> usize {
    let neg_x = usize::from(dir.x < 0.0);
    let neg_y = usize::from(dir.y < 0.0);
    let y_dominant = usize::from(dir.x.abs() < dir.y.abs());
    neg_x | (neg_y << 1) | (y_dominant << 2)
}

/// Quadrant visiting order for a segment heading along `dir`.
pub fn traversal_order(dir: Vec3) -> TraversalOrder {
    TRAVERSAL_ORDERS[order_index(dir)]
}

/// Bring a section-local normal into world space.
///
/// Applies the transpose of the adjugate of the linear part, which is the
/// inverse transpose scaled by the determinant, then undoes the sign flip a
/// mirroring transform introduces.
pub fn local_normal_to_world(local_to_world: &Affine3A, local_normal: Vec3) -> Vec3 {
    let m = local_to_world.matrix3;
    let (c0, c1, c2) = (Vec3::from(m.x_axis), Vec3::from(m.y_axis), Vec3::from(m.z_axis));
    let cofactor = c1.cross(c2) * local_normal.x
        + c2.cross(c0) * local_normal.y
        + c0.cross(c1) * local_normal.z;

    let normal = cofactor.normalize_or_zero();
    if m.determinant() < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Extent of a world-space box of half size `extent` once brought into local
/// space, given the local images of the world axes.
fn local_aabb_extent(extent: Vec3, box_axes: &[Vec3; 3]) -> Vec3 {
    box_axes[0].abs() * extent.x + box_axes[1].abs() * extent.y + box_axes[2].abs() * extent.z
}

fn local_box_axes(world_to_local: &Affine3A) -> [Vec3; 3] {
    [
        world_to_local.transform_vector3(Vec3::X),
        world_to_local.transform_vector3(Vec3::Y),
        world_to_local.transform_vector3(Vec3::Z),
    ]
}

// ============================================================================
// Results
// ============================================================================

/// Closest hit found so far by a line or box check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// Parametric time along the segment. `f32::MAX` until something is hit.
    pub time: f32,

    /// Normal at the hit, in section-local space.
    pub local_normal: Vec3,

    /// Material of the hit surface. Terrain collision never fills this in.
    pub material: Option<MaterialRef>,
}

impl Default for HitResult {
    fn default() -> Self {
        Self {
            time: f32::MAX,
            local_normal: Vec3::ZERO,
            material: None,
        }
    }
}

impl HitResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any hit has been recorded.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.time != f32::MAX
    }
}

/// Shallowest push-out found so far by a point check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointHitResult {
    /// Push-out direction in section-local space.
    pub local_normal: Vec3,

    /// Push-out distance along `local_normal`.
    pub best_distance: f32,
}

impl PointHitResult {
    /// Distance a point result starts at before anything is found.
    pub const NO_HIT_DISTANCE: f32 = 100_000.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any overlap has been recorded.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.best_distance < Self::NO_HIT_DISTANCE
    }
}

impl Default for PointHitResult {
    fn default() -> Self {
        Self {
            local_normal: Vec3::ZERO,
            best_distance: Self::NO_HIT_DISTANCE,
        }
    }
}

// ============================================================================
// Contexts
// ============================================================================

/// A segment trace against one terrain section.
#[derive(Clone, Copy)]
pub struct LineQuery<'a> {
    pub source: &'a dyn TerrainSource,
    pub ray: LocalRay,
    pub flags: TraceFlags,
    pub order: TraversalOrder,
    pub local_to_world: Affine3A,
}

impl<'a> LineQuery<'a> {
    /// Prepare a world-space segment trace from `start` to `end`.
    pub fn new(start: Vec3, end: Vec3, flags: TraceFlags, source: &'a dyn TerrainSource) -> Self {
        let local_to_world = source.local_to_world();
        let world_to_local = local_to_world.inverse();
        let ray = LocalRay::new(
            world_to_local.transform_point3(start),
            world_to_local.transform_point3(end),
        );

        Self {
            source,
            ray,
            flags,
            order: traversal_order(ray.dir),
            local_to_world,
        }
    }

    #[inline]
    pub fn stop_at_any_hit(&self) -> bool {
        self.flags.contains(TraceFlags::STOP_AT_ANY_HIT)
    }

    /// World-space normal of a hit recorded by this query.
    pub fn hit_normal(&self, result: &HitResult) -> Vec3 {
        local_normal_to_world(&self.local_to_world, result.local_normal)
    }

    /// World-space position of a hit recorded by this query.
    pub fn hit_location(&self, result: &HitResult) -> Vec3 {
        self.local_to_world.transform_point3(self.ray.at(result.time))
    }
}

/// An axis-aligned box swept along a segment.
#[derive(Clone, Copy)]
pub struct BoxQuery<'a> {
    pub line: LineQuery<'a>,

    /// World-space half size of the box.
    pub extent: Vec3,

    /// Half size of the local-space AABB enclosing the box.
    pub local_extent: Vec3,

    /// World X/Y/Z axes in local space, scaled by the inverse transform.
    pub box_axes: [Vec3; 3],

    pub sat: &'a dyn SeparatingAxis,
}

impl<'a> BoxQuery<'a> {
    /// Prepare a sweep of a box with half size `extent` from `start` to `end`.
    pub fn new(
        start: Vec3,
        end: Vec3,
        extent: Vec3,
        flags: TraceFlags,
        source: &'a dyn TerrainSource,
    ) -> Self {
        let line = LineQuery::new(start, end, flags, source);
        let box_axes = local_box_axes(&line.local_to_world.inverse());

        Self {
            line,
            extent,
            local_extent: local_aabb_extent(extent, &box_axes),
            box_axes,
            sat: &StandardSat,
        }
    }

    /// Use a different separating-axis routine for triangle tests.
    pub fn with_separating_axis(mut self, sat: &'a dyn SeparatingAxis) -> Self {
        self.sat = sat;
        self
    }

    #[inline]
    pub fn stop_at_any_hit(&self) -> bool {
        self.line.stop_at_any_hit()
    }

    /// Grow node bounds by the box so the sweep can be slab-tested as a ray.
    #[inline]
    pub fn expand(&self, bounds: &BoundingVolume) -> BoundingVolume {
        bounds.expanded(self.local_extent)
    }

    pub fn hit_normal(&self, result: &HitResult) -> Vec3 {
        self.line.hit_normal(result)
    }

    /// World-space box center at the time of the hit.
    pub fn hit_location(&self, result: &HitResult) -> Vec3 {
        self.line.hit_location(result)
    }
}

/// A box at rest, tested for overlap with the terrain.
#[derive(Clone, Copy)]
pub struct PointQuery<'a> {
    pub source: &'a dyn TerrainSource,

    /// Box center in local space.
    pub point: Vec3,

    pub extent: Vec3,
    pub local_extent: Vec3,
    pub box_axes: [Vec3; 3],
    pub order: TraversalOrder,
    pub local_to_world: Affine3A,
    pub sat: &'a dyn SeparatingAxis,
}

impl<'a> PointQuery<'a> {
    /// Prepare an overlap test of a box with half size `extent` centered on
    /// the world-space `point`.
    pub fn new(point: Vec3, extent: Vec3, source: &'a dyn TerrainSource) -> Self {
        let local_to_world = source.local_to_world();
        let world_to_local = local_to_world.inverse();
        let box_axes = local_box_axes(&world_to_local);

        Self {
            source,
            point: world_to_local.transform_point3(point),
            extent,
            local_extent: local_aabb_extent(extent, &box_axes),
            box_axes,
            order: DEFAULT_ORDER,
            local_to_world,
            sat: &StandardSat,
        }
    }

    pub fn with_separating_axis(mut self, sat: &'a dyn SeparatingAxis) -> Self {
        self.sat = sat;
        self
    }

    #[inline]
    pub fn expand(&self, bounds: &BoundingVolume) -> BoundingVolume {
        bounds.expanded(self.local_extent)
    }

    pub fn hit_normal(&self, result: &PointHitResult) -> Vec3 {
        local_normal_to_world(&self.local_to_world, result.local_normal)
    }

    /// World-space position the box must move to in order to stop
    /// overlapping.
    pub fn hit_location(&self, result: &PointHitResult) -> Vec3 {
        let local = self.point + result.local_normal * result.best_distance;
        self.local_to_world.transform_point3(local)
    }
}
