//! Visualization hooks for tree queries.

use crate::bounds::BoundingVolume;
use crate::source::Triangle;

/// Receives the geometry a query touches.
///
/// Everything is reported in section-local space. All methods default to
/// doing nothing.
pub trait DebugDraw {
    /// Called for every node whose bounds a query tests.
    fn draw_bounds(&mut self, _bounds: &BoundingVolume, _hit: bool) {}

    /// Called for every triangle a query tests.
    fn draw_triangle(&mut self, _triangle: &Triangle, _hit: bool) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebugDraw;

impl DebugDraw for NoDebugDraw {}

/// Keeps everything it is given, for inspection in tests and tools.
#[derive(Debug, Clone, Default)]
pub struct RecordingDraw {
    pub bounds: Vec<(BoundingVolume, bool)>,
    pub triangles: Vec<(Triangle, bool)>,
}

impl RecordingDraw {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of node bounds that passed their test.
    pub fn bounds_hit(&self) -> usize {
        self.bounds.iter().filter(|(_, hit)| *hit).count()
    }
}

impl DebugDraw for RecordingDraw {
    fn draw_bounds(&mut self, bounds: &BoundingVolume, hit: bool) {
        self.bounds.push((*bounds, hit));
    }

    fn draw_triangle(&mut self, triangle: &Triangle, hit: bool) {
        self.triangles.push((*triangle, hit));
    }
}
