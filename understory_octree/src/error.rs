// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for tree construction and mutation.

use thiserror::Error;

/// Result alias used by fallible tree operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by builders and dynamic trees.
///
/// Straddling entities, empty leaves and removal of an absent entity are not
/// errors; they are ordinary outcomes of the corresponding operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The universe has no volume (flat, inverted or NaN on some axis).
    #[error("universe bounds have no volume")]
    InvalidBounds,

    /// Entity bounds are inverted or contain NaN.
    #[error("entity bounds are inverted or not a number")]
    InvalidEntityBounds,

    /// Entity bounds are not contained in the universe.
    #[error("entity bounds extend outside the universe")]
    OutOfUniverse,

    /// The entity is already present in the dynamic tree.
    #[error("entity is already indexed")]
    DuplicateEntity,

    /// The splitting count must allow at least one entity per leaf.
    #[error("splitting count must be at least 1")]
    InvalidSplittingCount,

    /// The depth limit must allow at least the root level.
    #[error("depth limit must be at least 1")]
    InvalidDepthLimit,
}
