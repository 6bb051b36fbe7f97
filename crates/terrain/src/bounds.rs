//! Axis-aligned bounding volumes for tree nodes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::region::SubRegion;
use crate::source::TerrainSource;

/// A segment in section-local space, prepared for slab tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalRay {
    pub start: Vec3,
    pub end: Vec3,
    /// `end - start`.
    pub dir: Vec3,
    /// Per-axis `1 / dir`, or 0 where `dir` is 0.
    pub inv_dir: Vec3,
}

impl LocalRay {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        let dir = end - start;
        let inv = |d: f32| if d == 0.0 { 0.0 } else { 1.0 / d };
        Self {
            start,
            end,
            dir,
            inv_dir: Vec3::new(inv(dir.x), inv(dir.y), inv(dir.z)),
        }
    }

    /// Point at parametric time `t` along the segment.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.start + self.dir * t
    }
}

/// Axis-aligned bounds of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingVolume {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of every vertex touched by `region`, grown by `fudge` on each
    /// axis.
    pub fn from_region(region: &SubRegion, source: &dyn TerrainSource, fudge: f32) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for (x, y) in region.vertices() {
            let v = source.vertex(x, y);
            min = min.min(v);
            max = max.max(v);
        }
        Self::new(min - Vec3::splat(fudge), max + Vec3::splat(fudge))
    }

    /// Minkowski sum with a box of the given half extent.
    #[inline]
    pub fn expanded(&self, extent: Vec3) -> Self {
        Self::new(self.min - extent, self.max + extent)
    }

    /// Slab test of a segment against these bounds.
    ///
    /// Returns the entry time along the segment, 0 if the segment starts
    /// inside. The entry point must land strictly within the bounds grown by
    /// `fudge`.
    pub fn line_check(&self, ray: &LocalRay, fudge: f32) -> Option<f32> {
        let mut time = Vec3::ZERO;
        let mut inside = true;

        for axis in 0..3 {
            let start = ray.start[axis];
            let dir = ray.dir[axis];
            if start < self.min[axis] {
                if dir <= 0.0 {
                    return None;
                }
                inside = false;
                time[axis] = (self.min[axis] - start) * ray.inv_dir[axis];
            } else if start > self.max[axis] {
                if dir >= 0.0 {
                    return None;
                }
                inside = false;
                time[axis] = (self.max[axis] - start) * ray.inv_dir[axis];
            }
        }

        if inside {
            return Some(0.0);
        }

        let hit_time = time.max_element();
        if !(0.0..=1.0).contains(&hit_time) {
            return None;
        }

        let hit = ray.at(hit_time);
        let lo = self.min - Vec3::splat(fudge);
        let hi = self.max + Vec3::splat(fudge);
        let within = hit.cmpgt(lo).all() && hit.cmplt(hi).all();
        within.then_some(hit_time)
    }

    /// Inclusive point containment.
    #[inline]
    pub fn point_check(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Inclusive overlap with another box.
    #[inline]
    pub fn overlaps(&self, other: &BoundingVolume) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Check if `other` lies entirely inside these bounds.
    #[inline]
    pub fn contains(&self, other: &BoundingVolume) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Bounds of a segment swept by a box of half extent `extent`.
    pub fn from_segment(start: Vec3, end: Vec3, extent: Vec3) -> Self {
        Self::new(start.min(end) - extent, start.max(end) + extent)
    }
}
