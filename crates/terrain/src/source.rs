//! Terrain data consumed by the collision tree.
//!
//! The tree never owns terrain geometry. Everything it needs at build and
//! query time comes through [`TerrainSource`], which the owning terrain
//! component implements. [`HeightGrid`] is a self-contained implementation
//! backed by plain arrays.

use glam::{Affine3A, Vec3};

use crate::error::{Result, TerrainError};

/// Largest section side, in quads, that a [`HeightGrid`] accepts.
///
/// Keeps the worst-case node count of a tree well inside `u32`.
pub const MAX_SECTION_SIZE: u32 = 4096;

/// One section of terrain, as seen by the collision tree.
///
/// Coordinates come in two flavours:
///
/// - **local**: quad/vertex coordinates inside the section, starting at 0
/// - **global**: local + [`section_base`](Self::section_base), used for the
///   per-quad visibility and orientation lookups shared across sections
pub trait TerrainSource {
    /// Section size in quads (`TrueSectionSizeX`, `TrueSectionSizeY`).
    fn section_size(&self) -> (u32, u32);

    /// Global coordinate of the section's first quad.
    fn section_base(&self) -> (i32, i32) {
        (0, 0)
    }

    /// Position of the vertex at section-local grid coordinates.
    ///
    /// Valid for `0..=size_x` by `0..=size_y`.
    fn vertex(&self, x: u32, y: u32) -> Vec3;

    /// Tessellation patch size in quads. Visibility is stored per patch.
    fn max_tessellation_level(&self) -> u32 {
        1
    }

    /// Raw visibility flag stored for the quad at global coordinates.
    fn patch_visibility(&self, global_x: i32, global_y: i32) -> bool;

    /// Whether the quad's triangulation uses the other diagonal.
    fn is_quad_flipped(&self, global_x: i32, global_y: i32) -> bool;

    /// Transform from section-local collision space to world space.
    fn local_to_world(&self) -> Affine3A {
        Affine3A::IDENTITY
    }

    /// Whether the quad at global coordinates is visible.
    ///
    /// Coordinates are snapped down to the tessellation patch that contains
    /// them before the lookup, so a hole always covers whole patches.
    fn is_quad_visible(&self, global_x: i32, global_y: i32) -> bool {
        let level = self.max_tessellation_level().max(1) as i32;
        let patch_x = global_x.div_euclid(level) * level;
        let patch_y = global_y.div_euclid(level) * level;
        self.patch_visibility(patch_x, patch_y)
    }

    /// Convert a section-local quad coordinate to global coordinates.
    #[inline]
    fn to_global(&self, x: u32, y: u32) -> (i32, i32) {
        let (base_x, base_y) = self.section_base();
        (base_x.wrapping_add(x as i32), base_y.wrapping_add(y as i32))
    }

    /// The two triangles of a section-local quad, honouring its flip flag.
    fn quad_triangles(&self, x: u32, y: u32) -> [Triangle; 2] {
        let (gx, gy) = self.to_global(x, y);
        let v00 = self.vertex(x, y);
        let v10 = self.vertex(x + 1, y);
        let v01 = self.vertex(x, y + 1);
        let v11 = self.vertex(x + 1, y + 1);

        if self.is_quad_flipped(gx, gy) {
            [Triangle::new(v00, v01, v10), Triangle::new(v10, v01, v11)]
        } else {
            [Triangle::new(v00, v01, v11), Triangle::new(v00, v11, v10)]
        }
    }
}

/// A triangle in section-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
}

impl Triangle {
    #[inline]
    pub const fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Self { v1, v2, v3 }
    }

    /// Unnormalized face normal, `(v2 - v3) x (v1 - v3)`.
    #[inline]
    pub fn face_normal(&self) -> Vec3 {
        (self.v2 - self.v3).cross(self.v1 - self.v3)
    }

    #[inline]
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v1, self.v2, self.v3]
    }

    #[inline]
    pub fn edges(&self) -> [Vec3; 3] {
        [self.v2 - self.v1, self.v3 - self.v2, self.v1 - self.v3]
    }
}

/// An in-memory terrain section: a regular height grid with per-quad
/// visibility and orientation flags.
///
/// Vertices are laid out row-major, `y * (size_x + 1) + x`. Flags are stored
/// per local quad; lookups outside the section report invisible/unflipped.
#[derive(Debug, Clone)]
pub struct HeightGrid {
    size_x: u32,
    size_y: u32,
    base_x: i32,
    base_y: i32,
    max_tessellation_level: u32,
    vertices: Vec<Vec3>,
    visible: Vec<bool>,
    flipped: Vec<bool>,
    local_to_world: Affine3A,
}

impl HeightGrid {
    /// Create a grid from explicit vertex positions.
    pub fn new(size_x: u32, size_y: u32, vertices: Vec<Vec3>) -> Result<Self> {
        if size_x == 0 || size_y == 0 {
            return Err(TerrainError::EmptySection { size_x, size_y });
        }
        if size_x > MAX_SECTION_SIZE || size_y > MAX_SECTION_SIZE {
            return Err(TerrainError::SectionTooLarge {
                size_x,
                size_y,
                max: MAX_SECTION_SIZE,
            });
        }

        let expected = (size_x as usize + 1) * (size_y as usize + 1);
        if vertices.len() != expected {
            return Err(TerrainError::VertexCountMismatch {
                expected,
                got: vertices.len(),
            });
        }

        let quads = size_x as usize * size_y as usize;
        Ok(Self {
            size_x,
            size_y,
            base_x: 0,
            base_y: 0,
            max_tessellation_level: 1,
            vertices,
            visible: vec![true; quads],
            flipped: vec![false; quads],
            local_to_world: Affine3A::IDENTITY,
        })
    }

    /// Create a grid with unit quad spacing from a row-major height array.
    pub fn from_heights(size_x: u32, size_y: u32, heights: &[f32]) -> Result<Self> {
        let expected = (size_x as usize + 1) * (size_y as usize + 1);
        if heights.len() != expected {
            return Err(TerrainError::VertexCountMismatch {
                expected,
                got: heights.len(),
            });
        }

        let row = size_x as usize + 1;
        let vertices = heights
            .iter()
            .enumerate()
            .map(|(i, &z)| Vec3::new((i % row) as f32, (i / row) as f32, z))
            .collect();

        Self::new(size_x, size_y, vertices)
    }

    /// Create a flat grid with unit quad spacing at the given height.
    pub fn flat(size_x: u32, size_y: u32, height: f32) -> Result<Self> {
        let count = (size_x as usize + 1) * (size_y as usize + 1);
        Self::from_heights(size_x, size_y, &vec![height; count])
    }

    /// Place this section at a global quad offset.
    ///
    /// The offset must be a multiple of the tessellation level, and the
    /// whole section must stay addressable in global coordinates.
    pub fn with_section_base(mut self, base_x: i32, base_y: i32) -> Result<Self> {
        let fits = |base: i32, size: u32| base.checked_add(size as i32).is_some();
        if !fits(base_x, self.size_x) || !fits(base_y, self.size_y) {
            return Err(TerrainError::SectionBaseOutOfRange { base_x, base_y });
        }
        self.base_x = base_x;
        self.base_y = base_y;
        self.check_patch_alignment()?;
        Ok(self)
    }

    /// Set the tessellation patch size used for visibility lookups.
    ///
    /// The section base must be a multiple of `level`.
    pub fn with_tessellation_level(mut self, level: u32) -> Result<Self> {
        if level == 0 {
            return Err(TerrainError::ZeroTessellationLevel);
        }
        self.max_tessellation_level = level;
        self.check_patch_alignment()?;
        Ok(self)
    }

    /// Every patch origin must fall inside the section.
    fn check_patch_alignment(&self) -> Result<()> {
        let level = i64::from(self.max_tessellation_level);
        if i64::from(self.base_x) % level != 0 || i64::from(self.base_y) % level != 0 {
            return Err(TerrainError::MisalignedSectionBase {
                base_x: self.base_x,
                base_y: self.base_y,
                level: self.max_tessellation_level,
            });
        }
        Ok(())
    }

    /// Set the local-to-world transform.
    pub fn with_transform(mut self, local_to_world: Affine3A) -> Self {
        self.local_to_world = local_to_world;
        self
    }

    /// Set the visibility flag of a section-local quad.
    pub fn set_quad_visible(&mut self, x: u32, y: u32, visible: bool) -> Result<()> {
        let index = self.quad_index(x, y)?;
        self.visible[index] = visible;
        Ok(())
    }

    /// Set the flip flag of a section-local quad.
    pub fn set_quad_flipped(&mut self, x: u32, y: u32, flipped: bool) -> Result<()> {
        let index = self.quad_index(x, y)?;
        self.flipped[index] = flipped;
        Ok(())
    }

    /// Change the height of a section-local vertex.
    pub fn set_height(&mut self, x: u32, y: u32, height: f32) -> Result<()> {
        if x > self.size_x || y > self.size_y {
            return Err(TerrainError::QuadOutOfBounds {
                x,
                y,
                size_x: self.size_x,
                size_y: self.size_y,
            });
        }
        let index = self.vertex_index(x, y);
        self.vertices[index].z = height;
        Ok(())
    }

    /// All vertex positions, row-major.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    fn vertex_index(&self, x: u32, y: u32) -> usize {
        y as usize * (self.size_x as usize + 1) + x as usize
    }

    fn quad_index(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.size_x || y >= self.size_y {
            return Err(TerrainError::QuadOutOfBounds {
                x,
                y,
                size_x: self.size_x,
                size_y: self.size_y,
            });
        }
        Ok(y as usize * self.size_x as usize + x as usize)
    }

    /// Map global quad coordinates to a flag index, if inside the section.
    fn global_quad_index(&self, global_x: i32, global_y: i32) -> Option<usize> {
        let x = u32::try_from(global_x.checked_sub(self.base_x)?).ok()?;
        let y = u32::try_from(global_y.checked_sub(self.base_y)?).ok()?;
        self.quad_index(x, y).ok()
    }
}

impl TerrainSource for HeightGrid {
    fn section_size(&self) -> (u32, u32) {
        (self.size_x, self.size_y)
    }

    fn section_base(&self) -> (i32, i32) {
        (self.base_x, self.base_y)
    }

    fn vertex(&self, x: u32, y: u32) -> Vec3 {
        self.vertices[self.vertex_index(x, y)]
    }

    fn max_tessellation_level(&self) -> u32 {
        self.max_tessellation_level
    }

    fn patch_visibility(&self, global_x: i32, global_y: i32) -> bool {
        self.global_quad_index(global_x, global_y)
            .is_some_and(|index| self.visible[index])
    }

    fn is_quad_flipped(&self, global_x: i32, global_y: i32) -> bool {
        self.global_quad_index(global_x, global_y)
            .is_some_and(|index| self.flipped[index])
    }

    fn local_to_world(&self) -> Affine3A {
        self.local_to_world
    }
}
