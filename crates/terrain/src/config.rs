//! Tree construction parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Configuration for building a [`BvTree`](crate::BvTree).
///
/// The defaults match the values terrain collision has always shipped with;
/// most callers never change them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BvTreeConfig {
    /// Largest region (in quads per side) stored directly in a leaf.
    pub max_leaf_size: u32,

    /// Margin added to every node's bounds on each axis (world units).
    ///
    /// Keeps rays that graze a flat patch from slipping past its bounds
    /// through floating-point error.
    pub bounds_fudge: f32,

    /// Nodes reserved per quad of the section before building.
    pub reserve_factor: usize,
}

impl Default for BvTreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 2,
            bounds_fudge: 0.1,
            reserve_factor: 2,
        }
    }
}

impl BvTreeConfig {
    /// Check that the configuration can build a well-formed tree.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_size == 0 {
            return Err(TerrainError::InvalidConfig("max_leaf_size must be at least 1"));
        }
        if !self.bounds_fudge.is_finite() || self.bounds_fudge < 0.0 {
            return Err(TerrainError::InvalidConfig(
                "bounds_fudge must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BvTreeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_leaf_size, 2);
        assert_eq!(config.bounds_fudge, 0.1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_leaf = BvTreeConfig {
            max_leaf_size: 0,
            ..Default::default()
        };
        assert!(matches!(zero_leaf.validate(), Err(TerrainError::InvalidConfig(_))));

        let negative_fudge = BvTreeConfig {
            bounds_fudge: -0.5,
            ..Default::default()
        };
        assert!(negative_fudge.validate().is_err());

        let nan_fudge = BvTreeConfig {
            bounds_fudge: f32::NAN,
            ..Default::default()
        };
        assert!(nan_fudge.validate().is_err());
    }
}
