//! Astranyx Terrain Collision
//!
//! A bounding-volume quad-tree over a terrain section's quad grid, answering
//! segment traces, swept-box traces and resting-box overlap tests against
//! the terrain surface.
//!
//! # Architecture
//!
//! - **Source**: [`TerrainSource`] supplies vertices, visibility and
//!   triangulation. [`HeightGrid`] is an in-memory implementation
//! - **Tree**: [`BvTree`] stores a flat array of [`BvNode`]s, each bounding a
//!   [`SubRegion`] of quads; leaves hold at most 2x2 quads
//! - **Queries**: [`LineQuery`], [`BoxQuery`] and [`PointQuery`] carry a
//!   request in section-local space; [`HitResult`] and [`PointHitResult`]
//!   accumulate the best answer as the tree is walked
//!
//! ```text
//! TerrainSource ──build──> BvTree
//!                            │
//!   LineQuery / BoxQuery ────┤ root bounds ─> children near-to-far ─> leaf quads
//!   PointQuery ──────────────┘                                        │
//!                                       HitResult / PointHitResult <──┘
//! ```
//!
//! # Design Principles
//!
//! 1. **Conservative bounds**: every node encloses its quads plus a margin, so
//!    pruning never loses a hit
//! 2. **Closest hit**: children are only entered before the best hit so far
//! 3. **Read-only queries**: a built tree can serve many threads at once

mod bounds;
mod config;
mod debug;
mod error;
mod node;
mod query;
mod region;
mod source;
mod tree;
mod triangle;

pub use bounds::{BoundingVolume, LocalRay};
pub use config::BvTreeConfig;
pub use debug::{DebugDraw, NoDebugDraw, RecordingDraw};
pub use error::{Result, TerrainError};
pub use node::{BvNode, NodeIndex, NodeKind};
pub use query::{
    local_normal_to_world, traversal_order, BoxQuery, HitResult, LineQuery, MaterialRef,
    PointHitResult, PointQuery, TraceFlags, TraversalOrder, DEFAULT_ORDER,
};
pub use region::SubRegion;
pub use source::{HeightGrid, TerrainSource, Triangle, MAX_SECTION_SIZE};
pub use tree::{BvTree, QuadRef, TreeStats};
pub use triangle::{
    line_triangle, OrientedBox, Penetration, SeparatingAxis, StandardSat, TriangleHit,
    AXIS_EPSILON_SQ, PARALLEL_EPSILON, PLANE_EPSILON,
};
