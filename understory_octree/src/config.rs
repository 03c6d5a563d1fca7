// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time configuration shared by static and dynamic trees.

use crate::error::{Error, Result};

/// What a plain octree does with entities that straddle a cut plane.
///
/// Icosep trees ignore this setting: their straddlers always go to the icosep
/// bucket of the node whose planes they cross.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StraddlePolicy {
    /// Keep straddlers in the internal node's own entry list.
    #[default]
    Retain,
    /// Refuse any cut that leaves straddlers; the population stays in a leaf.
    ///
    /// Entities inserted later into a dynamic tree that straddle an existing
    /// internal node are retained there, since no leaf can hold them.
    ForceLeaf,
}

/// What a dynamic tree does with an entity that is not inside its universe.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UniverseOverflow {
    /// Fail the insertion with [`Error::OutOfUniverse`].
    #[default]
    Reject,
    /// Index the entity by its bounds projected onto the universe.
    Clamp,
    /// Grow the universe to the union with the entity bounds.
    ///
    /// Existing cut points stay valid; only the outermost regions grow.
    Expand,
}

/// Tree configuration.
///
/// ```
/// use understory_octree::{StraddlePolicy, TreeConfig};
///
/// let config = TreeConfig::new()
///     .with_splitting_count(4)
///     .with_straddle(StraddlePolicy::ForceLeaf);
/// assert_eq!(config.splitting_count, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum number of entities in a leaf before it is subdivided.
    pub splitting_count: usize,
    /// Maximum number of levels, root included. Nodes on the last level stay leaves.
    pub max_depth: usize,
    /// Straddle handling for plain octrees.
    pub straddle: StraddlePolicy,
    /// Out-of-universe handling for dynamic trees. Static builders always reject.
    pub overflow: UniverseOverflow,
    /// Whether icosep buckets holding more than `splitting_count` entities are
    /// subdivided like any other node. When off, buckets are always leaves.
    /// Plain octrees ignore it.
    pub decompose_icosep: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            splitting_count: 8,
            max_depth: 32,
            straddle: StraddlePolicy::Retain,
            overflow: UniverseOverflow::Reject,
            decompose_icosep: true,
        }
    }
}

impl TreeConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the splitting count.
    pub fn with_splitting_count(mut self, count: usize) -> Self {
        self.splitting_count = count;
        self
    }

    /// Set the depth limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the straddle policy for plain octrees.
    pub fn with_straddle(mut self, straddle: StraddlePolicy) -> Self {
        self.straddle = straddle;
        self
    }

    /// Set the out-of-universe policy for dynamic trees.
    pub fn with_overflow(mut self, overflow: UniverseOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set whether icosep buckets are subdivided.
    pub fn with_icosep_decomposition(mut self, decompose: bool) -> Self {
        self.decompose_icosep = decompose;
        self
    }

    /// Check the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.splitting_count == 0 {
            return Err(Error::InvalidSplittingCount);
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidDepthLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = TreeConfig::default();
        assert_eq!(c.splitting_count, 8);
        assert_eq!(c.straddle, StraddlePolicy::Retain);
        assert_eq!(c.overflow, UniverseOverflow::Reject);
        assert!(c.decompose_icosep);
        assert!(!c.with_icosep_decomposition(false).decompose_icosep);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(
            TreeConfig::new().with_splitting_count(0).validate(),
            Err(Error::InvalidSplittingCount)
        );
        assert_eq!(
            TreeConfig::new().with_max_depth(0).validate(),
            Err(Error::InvalidDepthLimit)
        );
    }
}
