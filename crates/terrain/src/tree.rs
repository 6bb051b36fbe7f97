//! The terrain collision tree.

use serde::{Deserialize, Serialize};

use crate::bounds::BoundingVolume;
use crate::config::BvTreeConfig;
use crate::debug::{DebugDraw, NoDebugDraw};
use crate::error::Result;
use crate::node::{Builder, BvNode, Walk};
use crate::query::{BoxQuery, HitResult, LineQuery, PointHitResult, PointQuery};
use crate::region::SubRegion;
use crate::source::TerrainSource;

/// A quad returned by [`BvTree::quads_in_box`], in section-local grid
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuadRef {
    pub x: u32,
    pub y: u32,
}

/// Shape of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
}

/// Bounding-volume quad-tree over one terrain section.
///
/// Nodes live in a flat array with the root at index 0. The tree stores no
/// geometry of its own: queries read triangles back from the
/// [`TerrainSource`] the query was built against, which must be the one the
/// tree was built from.
#[derive(Debug, Clone, Default)]
pub struct BvTree {
    nodes: Vec<BvNode>,
    config: BvTreeConfig,
}

impl BvTree {
    /// Create an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with a custom configuration.
    pub fn with_config(config: BvTreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: Vec::new(),
            config,
        })
    }

    /// The configuration the tree builds with.
    pub fn config(&self) -> &BvTreeConfig {
        &self.config
    }

    /// Rebuild the tree over `source`, discarding any previous contents.
    pub fn build(&mut self, source: &dyn TerrainSource) {
        self.nodes.clear();

        let (size_x, size_y) = source.section_size();
        let root = SubRegion::new(0, 0, size_x, size_y);
        if root.is_empty() {
            tracing::debug!("skipping terrain collision tree for empty {size_x}x{size_y} section");
            return;
        }

        let quads = usize::try_from(root.area()).unwrap_or(usize::MAX);
        self.nodes
            .reserve(quads.saturating_mul(self.config.reserve_factor));
        self.nodes
            .push(BvNode::new(&root, source, self.config.bounds_fudge));

        Builder {
            nodes: &mut self.nodes,
            source,
            config: &self.config,
        }
        .split_terrain(0, root);

        let stats = self.stats();
        tracing::debug!(
            "built terrain collision tree for {size_x}x{size_y} section: {} nodes, {} leaves, depth {}",
            stats.nodes,
            stats.leaves,
            stats.depth
        );
    }

    /// True before the first build and after building an empty section.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, root first.
    pub fn nodes(&self) -> &[BvNode] {
        &self.nodes
    }

    /// The root node, or `None` before a build or for an empty section.
    pub fn root(&self) -> Option<&BvNode> {
        self.nodes.first()
    }

    /// Trace a segment. Returns true if `result` was improved.
    pub fn line_check(&self, query: &LineQuery<'_>, result: &mut HitResult) -> bool {
        self.line_check_with(query, result, &mut NoDebugDraw)
    }

    /// [`line_check`](Self::line_check), reporting every bounds and triangle
    /// test to `draw`.
    pub fn line_check_with(
        &self,
        query: &LineQuery<'_>,
        result: &mut HitResult,
        draw: &mut dyn DebugDraw,
    ) -> bool {
        let Some(root) = self.root() else {
            return false;
        };

        let entry = root.bounds.line_check(&query.ray, self.config.bounds_fudge);
        draw.draw_bounds(&root.bounds, entry.is_some());
        if entry.is_none() {
            tracing::trace!("line check missed terrain bounds");
            return false;
        }

        let mut walk = self.walk(draw);
        root.line_check(&mut walk, query, result)
    }

    /// Sweep a box along a segment. Returns true if `result` was improved.
    pub fn box_check(&self, query: &BoxQuery<'_>, result: &mut HitResult) -> bool {
        self.box_check_with(query, result, &mut NoDebugDraw)
    }

    /// [`box_check`](Self::box_check), reporting every bounds and triangle
    /// test to `draw`.
    pub fn box_check_with(
        &self,
        query: &BoxQuery<'_>,
        result: &mut HitResult,
        draw: &mut dyn DebugDraw,
    ) -> bool {
        let Some(root) = self.root() else {
            return false;
        };

        let bounds = query.expand(&root.bounds);
        let entry = bounds.line_check(&query.line.ray, self.config.bounds_fudge);
        draw.draw_bounds(&bounds, entry.is_some());
        if entry.is_none() {
            tracing::trace!("box check missed terrain bounds");
            return false;
        }

        let mut walk = self.walk(draw);
        root.box_check(&mut walk, query, result)
    }

    /// Test a resting box for overlap. Returns true if `result` was improved.
    pub fn point_check(&self, query: &PointQuery<'_>, result: &mut PointHitResult) -> bool {
        self.point_check_with(query, result, &mut NoDebugDraw)
    }

    /// [`point_check`](Self::point_check), reporting every bounds and
    /// triangle test to `draw`.
    pub fn point_check_with(
        &self,
        query: &PointQuery<'_>,
        result: &mut PointHitResult,
        draw: &mut dyn DebugDraw,
    ) -> bool {
        let Some(root) = self.root() else {
            return false;
        };

        let bounds = query.expand(&root.bounds);
        let inside = bounds.point_check(query.point);
        draw.draw_bounds(&bounds, inside);
        if !inside {
            tracing::trace!("point check missed terrain bounds");
            return false;
        }

        let mut walk = self.walk(draw);
        root.point_check(&mut walk, query, result)
    }

    /// Every visible quad whose vertices' bounds overlap `aabb`, given in
    /// section-local space. Sorted row-major.
    pub fn quads_in_box(&self, source: &dyn TerrainSource, aabb: &BoundingVolume) -> Vec<QuadRef> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        if !root.bounds.overlaps(aabb) {
            return Vec::new();
        }

        let mut found = Vec::new();
        root.collect_quads(&self.nodes, source, aabb, &mut found);

        let mut quads: Vec<QuadRef> = found.into_iter().map(|(x, y)| QuadRef { x, y }).collect();
        quads.sort_unstable_by_key(|quad| (quad.y, quad.x));
        quads
    }

    /// Node, leaf and depth counts of the built tree.
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes: self.nodes.len(),
            leaves: self.nodes.iter().filter(|node| node.is_leaf()).count(),
            depth: self.root().map_or(0, |root| root.depth(&self.nodes)),
        }
    }

    fn walk<'d>(&self, draw: &'d mut dyn DebugDraw) -> Walk<'_, 'd> {
        Walk {
            nodes: &self.nodes,
            fudge: self.config.bounds_fudge,
            draw,
        }
    }
}
