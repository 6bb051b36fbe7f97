//! Tree nodes: construction by recursive quadrant splitting, and the
//! recursive halves of every query.

use serde::{Deserialize, Serialize};

use crate::bounds::BoundingVolume;
use crate::config::BvTreeConfig;
use crate::debug::DebugDraw;
use crate::query::{BoxQuery, HitResult, LineQuery, PointHitResult, PointQuery};
use crate::region::SubRegion;
use crate::source::TerrainSource;
use crate::triangle::{line_triangle, OrientedBox};

/// Position of a node in the tree's node array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Returns `None` if `index` does not fit in 32 bits.
    #[inline]
    pub fn new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Position in the tree's node array.
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// What a node holds besides its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Quads tested directly.
    Leaf(SubRegion),
    /// Children per quadrant: -X-Y, +X-Y, -X+Y, +X+Y.
    Internal([Option<NodeIndex>; 4]),
}

/// One node of the tree: the bounds of a sub-region plus either its quads or
/// its children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BvNode {
    pub bounds: BoundingVolume,
    pub kind: NodeKind,
}

impl BvNode {
    /// A leaf covering `region`. Internal nodes start out this way and are
    /// converted once their children exist.
    pub fn new(region: &SubRegion, source: &dyn TerrainSource, fudge: f32) -> Self {
        Self {
            bounds: BoundingVolume::from_region(region, source, fudge),
            kind: NodeKind::Leaf(*region),
        }
    }

    /// True if the node tests its quads directly.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Child indices, or `None` for a leaf.
    #[inline]
    pub fn children(&self) -> Option<&[Option<NodeIndex>; 4]> {
        match &self.kind {
            NodeKind::Internal(children) => Some(children),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Resolve the child in `quadrant`, if there is one.
    #[inline]
    fn child<'n>(&self, nodes: &'n [BvNode], quadrant: usize) -> Option<&'n BvNode> {
        let index = self.children()?.get(quadrant).copied().flatten()?;
        nodes.get(index.get())
    }
}

/// Whether any quad of `region` is visible.
fn has_visible_quad(region: &SubRegion, source: &dyn TerrainSource) -> bool {
    region.quads().any(|(x, y)| {
        let (gx, gy) = source.to_global(x, y);
        source.is_quad_visible(gx, gy)
    })
}

// ============================================================================
// Build
// ============================================================================

pub(crate) struct Builder<'a> {
    pub nodes: &'a mut Vec<BvNode>,
    pub source: &'a dyn TerrainSource,
    pub config: &'a BvTreeConfig,
}

impl Builder<'_> {
    /// Fill in the node at `index`, which must already cover `region`.
    pub fn split_terrain(&mut self, index: usize, region: SubRegion) {
        if region.fits_leaf(self.config.max_leaf_size) {
            return;
        }

        let mut children = [None; 4];
        for (slot, quadrant) in children.iter_mut().zip(region.split()) {
            if quadrant.is_empty() || !has_visible_quad(&quadrant, self.source) {
                continue;
            }

            let child = self.nodes.len();
            let Some(child_index) = NodeIndex::new(child) else {
                tracing::warn!("terrain node index {child} out of range, dropping quadrant {quadrant:?}");
                continue;
            };

            self.nodes
                .push(BvNode::new(&quadrant, self.source, self.config.bounds_fudge));
            self.split_terrain(child, quadrant);
            *slot = Some(child_index);
        }

        if let Some(node) = self.nodes.get_mut(index) {
            node.kind = NodeKind::Internal(children);
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// State shared by every step of one query.
pub(crate) struct Walk<'n, 'd> {
    pub nodes: &'n [BvNode],
    pub fudge: f32,
    pub draw: &'d mut dyn DebugDraw,
}

impl BvNode {
    pub(crate) fn line_check(
        &self,
        walk: &mut Walk<'_, '_>,
        query: &LineQuery<'_>,
        result: &mut HitResult,
    ) -> bool {
        match self.kind {
            NodeKind::Leaf(region) => line_check_leaf(&region, walk, query, result),
            NodeKind::Internal(_) => {
                let nodes = walk.nodes;
                let mut hit = false;
                for &quadrant in &query.order {
                    let Some(child) = self.child(nodes, quadrant) else {
                        continue;
                    };
                    let entry = child.bounds.line_check(&query.ray, walk.fudge);
                    walk.draw.draw_bounds(&child.bounds, entry.is_some());

                    if entry.is_some_and(|time| time < result.time) {
                        hit |= child.line_check(walk, query, result);
                        if hit && query.stop_at_any_hit() {
                            return true;
                        }
                    }
                }
                hit
            }
        }
    }

    pub(crate) fn box_check(
        &self,
        walk: &mut Walk<'_, '_>,
        query: &BoxQuery<'_>,
        result: &mut HitResult,
    ) -> bool {
        match self.kind {
            NodeKind::Leaf(region) => box_check_leaf(&region, walk, query, result),
            NodeKind::Internal(_) => {
                let nodes = walk.nodes;
                let mut hit = false;
                for &quadrant in &query.line.order {
                    let Some(child) = self.child(nodes, quadrant) else {
                        continue;
                    };
                    let bounds = query.expand(&child.bounds);
                    let entry = bounds.line_check(&query.line.ray, walk.fudge);
                    walk.draw.draw_bounds(&bounds, entry.is_some());

                    if entry.is_some_and(|time| time < result.time) {
                        hit |= child.box_check(walk, query, result);
                        if hit && query.stop_at_any_hit() {
                            return true;
                        }
                    }
                }
                hit
            }
        }
    }

    pub(crate) fn point_check(
        &self,
        walk: &mut Walk<'_, '_>,
        query: &PointQuery<'_>,
        result: &mut PointHitResult,
    ) -> bool {
        match self.kind {
            NodeKind::Leaf(region) => point_check_leaf(&region, walk, query, result),
            NodeKind::Internal(_) => {
                let nodes = walk.nodes;
                let mut hit = false;
                for &quadrant in &query.order {
                    let Some(child) = self.child(nodes, quadrant) else {
                        continue;
                    };
                    let bounds = query.expand(&child.bounds);
                    let inside = bounds.point_check(query.point);
                    walk.draw.draw_bounds(&bounds, inside);

                    if inside {
                        hit |= child.point_check(walk, query, result);
                    }
                }
                hit
            }
        }
    }

    /// Collect every visible quad whose vertex bounds overlap `aabb`.
    pub(crate) fn collect_quads(
        &self,
        nodes: &[BvNode],
        source: &dyn TerrainSource,
        aabb: &BoundingVolume,
        out: &mut Vec<(u32, u32)>,
    ) {
        match self.kind {
            NodeKind::Leaf(region) => {
                for (x, y) in region.quads() {
                    let (gx, gy) = source.to_global(x, y);
                    if !source.is_quad_visible(gx, gy) {
                        continue;
                    }
                    let quad = SubRegion::new(x, y, 1, 1);
                    if BoundingVolume::from_region(&quad, source, 0.0).overlaps(aabb) {
                        out.push((x, y));
                    }
                }
            }
            NodeKind::Internal(_) => {
                for quadrant in 0..4 {
                    if let Some(child) = self.child(nodes, quadrant) {
                        if child.bounds.overlaps(aabb) {
                            child.collect_quads(nodes, source, aabb, out);
                        }
                    }
                }
            }
        }
    }

    /// Depth of the subtree rooted here, counting this node.
    pub(crate) fn depth(&self, nodes: &[BvNode]) -> usize {
        let below = (0..4)
            .filter_map(|quadrant| self.child(nodes, quadrant))
            .map(|child| child.depth(nodes))
            .max()
            .unwrap_or(0);
        below + 1
    }
}

fn line_check_leaf(
    region: &SubRegion,
    walk: &mut Walk<'_, '_>,
    query: &LineQuery<'_>,
    result: &mut HitResult,
) -> bool {
    let source = query.source;
    let mut hit = false;

    for (x, y) in region.quads() {
        let (gx, gy) = source.to_global(x, y);
        if !source.is_quad_visible(gx, gy) {
            continue;
        }

        for triangle in source.quad_triangles(x, y) {
            let found = line_triangle(&triangle, &query.ray, result.time);
            walk.draw.draw_triangle(&triangle, found.is_some());

            if let Some(found) = found {
                result.time = found.time;
                result.local_normal = found.normal;
                result.material = None;
                hit = true;
                if query.stop_at_any_hit() {
                    return true;
                }
            }
        }
    }
    hit
}

fn box_check_leaf(
    region: &SubRegion,
    walk: &mut Walk<'_, '_>,
    query: &BoxQuery<'_>,
    result: &mut HitResult,
) -> bool {
    let source = query.line.source;
    let shape = OrientedBox {
        center: query.line.ray.start,
        extent: query.extent,
        axes: query.box_axes,
    };
    let mut hit = false;

    for (x, y) in region.quads() {
        let (gx, gy) = source.to_global(x, y);
        if !source.is_quad_visible(gx, gy) {
            continue;
        }

        for triangle in source.quad_triangles(x, y) {
            let found = query
                .sat
                .sweep_box(&triangle, &shape, query.line.ray.dir)
                .filter(|found| found.time < result.time);
            walk.draw.draw_triangle(&triangle, found.is_some());

            if let Some(found) = found {
                result.time = found.time;
                result.local_normal = found.normal;
                result.material = None;
                hit = true;
                if query.stop_at_any_hit() {
                    return true;
                }
            }
        }
    }
    hit
}

fn point_check_leaf(
    region: &SubRegion,
    walk: &mut Walk<'_, '_>,
    query: &PointQuery<'_>,
    result: &mut PointHitResult,
) -> bool {
    let source = query.source;
    let shape = OrientedBox {
        center: query.point,
        extent: query.extent,
        axes: query.box_axes,
    };
    let mut hit = false;

    for (x, y) in region.quads() {
        let (gx, gy) = source.to_global(x, y);
        if !source.is_quad_visible(gx, gy) {
            continue;
        }

        for triangle in source.quad_triangles(x, y) {
            let found = query
                .sat
                .point_overlap(&triangle, &shape)
                .filter(|found| found.distance < result.best_distance);
            walk.draw.draw_triangle(&triangle, found.is_some());

            if let Some(found) = found {
                result.best_distance = found.distance;
                result.local_normal = found.normal;
                hit = true;
            }
        }
    }
    hit
}
