//! Rectangular sub-regions of a terrain section's quad grid.

use serde::{Deserialize, Serialize};

/// A rectangle of quads, in section-local grid coordinates.
///
/// A region of `width x height` quads touches `(width + 1) x (height + 1)`
/// vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SubRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SubRegion {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the region covers no quads.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of quads covered.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Check if both sides fit within `max_size` quads.
    #[inline]
    pub fn fits_leaf(&self, max_size: u32) -> bool {
        self.width <= max_size && self.height <= max_size
    }

    /// Split into four quadrants: -X-Y, +X-Y, -X+Y, +X+Y.
    ///
    /// The split point is half of the longer side rounded up to a power of
    /// two, so the -X/-Y quadrants stay power-of-two sized and the +X/+Y
    /// quadrants absorb the remainder. Quadrants past the far edge come back
    /// empty.
    pub fn split(&self) -> [SubRegion; 4] {
        let split = self.width.max(self.height).next_power_of_two() / 2;

        let near_w = split.min(self.width);
        let near_h = split.min(self.height);
        let far_w = self.width.saturating_sub(split);
        let far_h = self.height.saturating_sub(split);

        [
            SubRegion::new(self.x, self.y, near_w, near_h),
            SubRegion::new(self.x + split, self.y, far_w, near_h),
            SubRegion::new(self.x, self.y + split, near_w, far_h),
            SubRegion::new(self.x + split, self.y + split, far_w, far_h),
        ]
    }

    /// Iterate over every quad in row-major order as `(x, y)`.
    pub fn quads(&self) -> impl Iterator<Item = (u32, u32)> {
        let SubRegion {
            x,
            y,
            width,
            height,
        } = *self;
        (y..y + height).flat_map(move |qy| (x..x + width).map(move |qx| (qx, qy)))
    }

    /// Iterate over every corner vertex in row-major order as `(x, y)`.
    pub fn vertices(&self) -> impl Iterator<Item = (u32, u32)> {
        let SubRegion {
            x,
            y,
            width,
            height,
        } = *self;
        (y..=y + height).flat_map(move |vy| (x..=x + width).map(move |vx| (vx, vy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_even_square() {
        let quadrants = SubRegion::new(0, 0, 4, 4).split();
        assert_eq!(quadrants[0], SubRegion::new(0, 0, 2, 2));
        assert_eq!(quadrants[1], SubRegion::new(2, 0, 2, 2));
        assert_eq!(quadrants[2], SubRegion::new(0, 2, 2, 2));
        assert_eq!(quadrants[3], SubRegion::new(2, 2, 2, 2));
    }

    #[test]
    fn test_split_odd_remainder_goes_far() {
        let quadrants = SubRegion::new(10, 20, 3, 3).split();
        assert_eq!(quadrants[0], SubRegion::new(10, 20, 2, 2));
        assert_eq!(quadrants[1], SubRegion::new(12, 20, 1, 2));
        assert_eq!(quadrants[2], SubRegion::new(10, 22, 2, 1));
        assert_eq!(quadrants[3], SubRegion::new(12, 22, 1, 1));
    }

    #[test]
    fn test_split_long_strip_leaves_empty_quadrants() {
        let quadrants = SubRegion::new(0, 0, 8, 2).split();
        assert_eq!(quadrants[0], SubRegion::new(0, 0, 4, 2));
        assert_eq!(quadrants[1], SubRegion::new(4, 0, 4, 2));
        assert!(quadrants[2].is_empty());
        assert!(quadrants[3].is_empty());
    }

    #[test]
    fn test_split_covers_every_quad_once() {
        let region = SubRegion::new(3, 5, 7, 5);
        let mut covered: Vec<(u32, u32)> = region
            .split()
            .iter()
            .flat_map(|q| q.quads().collect::<Vec<_>>())
            .collect();
        covered.sort_unstable();

        let mut expected: Vec<(u32, u32)> = region.quads().collect();
        expected.sort_unstable();

        assert_eq!(covered, expected);
    }

    #[test]
    fn test_quads_row_major() {
        let quads: Vec<_> = SubRegion::new(1, 1, 2, 2).quads().collect();
        assert_eq!(quads, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
        assert_eq!(SubRegion::new(0, 0, 2, 3).vertices().count(), 12);
    }
}
