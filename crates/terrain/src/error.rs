//! Errors raised while constructing terrain sources and tree configuration.
//!
//! Queries and tree builds never fail; only the inputs that feed them are
//! validated.

use thiserror::Error;

/// Errors that can occur while setting up terrain collision data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("terrain section must be at least one quad wide and tall, got {size_x}x{size_y}")]
    EmptySection { size_x: u32, size_y: u32 },

    #[error("terrain section {size_x}x{size_y} exceeds the maximum of {max} quads per side")]
    SectionTooLarge { size_x: u32, size_y: u32, max: u32 },

    #[error("expected {expected} vertices for the section, got {got}")]
    VertexCountMismatch { expected: usize, got: usize },

    #[error("quad ({x}, {y}) is outside the {size_x}x{size_y} section")]
    QuadOutOfBounds {
        x: u32,
        y: u32,
        size_x: u32,
        size_y: u32,
    },

    #[error("max tessellation level must be non-zero")]
    ZeroTessellationLevel,

    #[error("section base ({base_x}, {base_y}) is not a multiple of tessellation level {level}")]
    MisalignedSectionBase {
        base_x: i32,
        base_y: i32,
        level: u32,
    },

    #[error("section base ({base_x}, {base_y}) puts the section outside global coordinates")]
    SectionBaseOutOfRange {
        base_x: i32,
        base_y: i32,
    },

    #[error("invalid tree configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Result type for terrain setup.
pub type Result<T> = std::result::Result<T, TerrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TerrainError::VertexCountMismatch {
            expected: 16,
            got: 9,
        };
        assert_eq!(err.to_string(), "expected 16 vertices for the section, got 9");

        let err = TerrainError::EmptySection {
            size_x: 0,
            size_y: 4,
        };
        assert_eq!(
            err.to_string(),
            "terrain section must be at least one quad wide and tall, got 0x4"
        );

        let err = TerrainError::MisalignedSectionBase {
            base_x: 1,
            base_y: 1,
            level: 2,
        };
        assert_eq!(
            err.to_string(),
            "section base (1, 1) is not a multiple of tessellation level 2"
        );
    }
}
