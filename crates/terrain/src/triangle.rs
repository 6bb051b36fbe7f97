//! Triangle-level intersection tests.
//!
//! Segment tests use the triangle plane plus three edge half-spaces. Box
//! sweeps and box overlaps go through a [`SeparatingAxis`] implementation,
//! [`StandardSat`] unless the caller injects another one.

use glam::Vec3;

use crate::bounds::LocalRay;
use crate::source::Triangle;

/// Tolerance for plane distances and edge half-space tests.
pub const PLANE_EPSILON: f32 = 0.001;

/// Candidate axes shorter than this (squared) are ignored.
pub const AXIS_EPSILON_SQ: f32 = 1e-12;

/// A sweep that moves less than this along an axis is treated as parallel
/// to it.
pub const PARALLEL_EPSILON: f32 = 0.001;

/// Where and how a segment or swept box first touches a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Parametric time along the sweep, in `[0, 1]`.
    pub time: f32,
    /// Unit normal facing the incoming shape.
    pub normal: Vec3,
}

/// Smallest move that separates a box from a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub distance: f32,
    /// Unit direction to move the box along.
    pub normal: Vec3,
}

/// A box in section-local space, possibly skewed by the section transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vec3,
    /// Half size along each of `axes`.
    pub extent: Vec3,
    /// Edge directions. Not necessarily unit length or orthogonal.
    pub axes: [Vec3; 3],
}

impl OrientedBox {
    /// Half the length of the box's shadow on a unit axis.
    #[inline]
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        self.extent.x * axis.dot(self.axes[0]).abs()
            + self.extent.y * axis.dot(self.axes[1]).abs()
            + self.extent.z * axis.dot(self.axes[2]).abs()
    }
}

/// Intersect a segment with a triangle.
///
/// Only hits within the segment and strictly earlier than `best_time` are
/// reported.
pub fn line_triangle(triangle: &Triangle, ray: &LocalRay, best_time: f32) -> Option<TriangleHit> {
    let normal = triangle.face_normal();
    let plane = normal.dot(triangle.v1);
    let start_dist = normal.dot(ray.start) - plane;
    let end_dist = normal.dot(ray.end) - plane;

    if (start_dist < -PLANE_EPSILON && end_dist < -PLANE_EPSILON)
        || (start_dist > PLANE_EPSILON && end_dist > PLANE_EPSILON)
        || start_dist == end_dist
    {
        return None;
    }

    let time = start_dist / (start_dist - end_dist);
    if !(0.0..=1.0).contains(&time) || time >= best_time {
        return None;
    }

    let point = ray.at(time);
    let anchors = triangle.vertices();
    for (edge, anchor) in triangle.edges().into_iter().zip(anchors) {
        let side = normal.cross(edge);
        if side.dot(point) - side.dot(anchor) >= PLANE_EPSILON {
            return None;
        }
    }

    Some(TriangleHit {
        time,
        normal: normal.normalize(),
    })
}

/// Box-versus-triangle tests based on the separating axis theorem.
pub trait SeparatingAxis {
    /// First time a box moving by `dir` touches the triangle.
    fn sweep_box(&self, triangle: &Triangle, shape: &OrientedBox, dir: Vec3) -> Option<TriangleHit>;

    /// Minimum push-out for a box overlapping the triangle.
    fn point_overlap(&self, triangle: &Triangle, shape: &OrientedBox) -> Option<Penetration>;
}

/// Separating-axis tests over the triangle normal, the box axes and the
/// pairwise cross products of triangle edges, box axes and sweep direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSat;

impl StandardSat {
    /// Up to 19 candidate axes. Zero entries stand in for unused slots.
    fn candidate_axes(triangle: &Triangle, shape: &OrientedBox, dir: Vec3) -> [Vec3; 19] {
        let edges = triangle.edges();
        let mut axes = [Vec3::ZERO; 19];
        axes[0] = triangle.face_normal();
        axes[1..4].copy_from_slice(&shape.axes);

        let mut i = 4;
        for edge in edges {
            for box_axis in shape.axes {
                axes[i] = edge.cross(box_axis);
                i += 1;
            }
        }
        for box_axis in shape.axes {
            axes[i] = box_axis.cross(dir);
            i += 1;
        }
        for edge in edges {
            axes[i] = edge.cross(dir);
            i += 1;
        }
        axes
    }

    #[inline]
    fn unit_axis(axis: Vec3) -> Option<Vec3> {
        let len_sq = axis.length_squared();
        (len_sq >= AXIS_EPSILON_SQ).then(|| axis / len_sq.sqrt())
    }

    /// Triangle shadow on `axis`, widened by the box's shadow.
    #[inline]
    fn interval(triangle: &Triangle, shape: &OrientedBox, axis: Vec3) -> (f32, f32) {
        let a = axis.dot(triangle.v1);
        let b = axis.dot(triangle.v2);
        let c = axis.dot(triangle.v3);
        let radius = shape.projected_radius(axis);
        (a.min(b).min(c) - radius, a.max(b).max(c) + radius)
    }

    /// Normal to report when no axis constrained the entry time.
    fn facing_normal(triangle: &Triangle, center: Vec3) -> Vec3 {
        let normal = triangle.face_normal().normalize_or_zero();
        if normal.dot(center - triangle.v1) >= 0.0 {
            normal
        } else {
            -normal
        }
    }
}

impl SeparatingAxis for StandardSat {
    fn sweep_box(&self, triangle: &Triangle, shape: &OrientedBox, dir: Vec3) -> Option<TriangleHit> {
        let mut min_time = f32::MIN;
        let mut max_time = f32::MAX;
        let mut hit_normal = Vec3::ZERO;

        for axis in Self::candidate_axes(triangle, shape, dir) {
            let Some(axis) = Self::unit_axis(axis) else {
                continue;
            };

            let (lo, hi) = Self::interval(triangle, shape, axis);
            let start = axis.dot(shape.center);
            let moved = axis.dot(dir);

            if moved.abs() < PARALLEL_EPSILON {
                if start < lo || start > hi {
                    return None;
                }
                continue;
            }

            let inv = moved.recip();
            let (entry, exit, normal) = if moved > 0.0 {
                ((lo - start) * inv, (hi - start) * inv, -axis)
            } else {
                ((hi - start) * inv, (lo - start) * inv, axis)
            };

            if entry > min_time {
                min_time = entry;
                hit_normal = normal;
            }
            max_time = max_time.min(exit);

            if max_time < min_time || max_time < 0.0 {
                return None;
            }
        }

        if min_time > 1.0 {
            return None;
        }
        if hit_normal == Vec3::ZERO {
            hit_normal = Self::facing_normal(triangle, shape.center);
        }

        Some(TriangleHit {
            time: min_time.max(0.0),
            normal: hit_normal,
        })
    }

    fn point_overlap(&self, triangle: &Triangle, shape: &OrientedBox) -> Option<Penetration> {
        let mut best = Penetration {
            distance: f32::MAX,
            normal: Vec3::ZERO,
        };

        // Sweep-direction slots come back zero and are skipped
        for axis in Self::candidate_axes(triangle, shape, Vec3::ZERO) {
            let Some(axis) = Self::unit_axis(axis) else {
                continue;
            };

            let (lo, hi) = Self::interval(triangle, shape, axis);
            let center = axis.dot(shape.center);
            let push_pos = hi - center;
            let push_neg = center - lo;
            if push_pos < 0.0 || push_neg < 0.0 {
                return None;
            }

            let (distance, normal) = if push_pos <= push_neg {
                (push_pos, axis)
            } else {
                (push_neg, -axis)
            };
            if distance < best.distance {
                best = Penetration { distance, normal };
            }
        }

        (best.distance < f32::MAX).then_some(best)
    }
}
