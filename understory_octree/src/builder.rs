// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch construction of immutable trees.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::marker::PhantomData;

use crate::config::TreeConfig;
use crate::error::{Error, Result};
use crate::node::Entry;
use crate::policy::{BoundCenter, PartitionPolicy};
use crate::tree::{ICOSEP_ARITY, OCTREE_ARITY, Tree};
use crate::types::{Aabb3D, Scalar};

/// Builds a tree from a fixed batch of entities, top-down.
///
/// Populations larger than the splitting count are cut by the partition
/// policy and distributed into octant children (and the icosep bucket for
/// icosep trees). Empty octants get no child. The result has no public
/// mutators.
///
/// ```
/// use understory_octree::{Aabb3D, OctreeBuilder, Point3D, TreeConfig};
///
/// let config = TreeConfig::new().with_splitting_count(1);
/// let tree = OctreeBuilder::<f64>::with_config(config)
///     .build(
///         Some(Aabb3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)),
///         [
///             ("near", Aabb3D::new(0.1, 0.1, 0.1, 0.2, 0.2, 0.2)),
///             ("far", Aabb3D::new(0.8, 0.8, 0.8, 0.9, 0.9, 0.9)),
///         ],
///     )
///     .unwrap();
///
/// let seen: Vec<_> = tree.query_point(Point3D::new(0.15, 0.15, 0.15)).collect();
/// assert_eq!(seen, ["near"]);
/// ```
pub struct StaticTreeBuilder<T, P = BoundCenter, const ARITY: usize = OCTREE_ARITY> {
    config: TreeConfig,
    policy: P,
    _scalar: PhantomData<fn() -> T>,
}

/// Builder for plain octrees.
pub type OctreeBuilder<T, P = BoundCenter> = StaticTreeBuilder<T, P, OCTREE_ARITY>;

/// Builder for icosep octrees.
pub type IcosepOctreeBuilder<T, P = BoundCenter> = StaticTreeBuilder<T, P, ICOSEP_ARITY>;

impl<T, P, const ARITY: usize> StaticTreeBuilder<T, P, ARITY>
where
    T: Scalar,
    P: PartitionPolicy<T>,
{
    /// Create a builder with an explicit configuration and policy.
    pub fn new(config: TreeConfig, policy: P) -> Self {
        Self {
            config,
            policy,
            _scalar: PhantomData,
        }
    }

    /// Build the tree.
    ///
    /// With `universe` set to `None`, the universe is the union of the entity
    /// bounds. Fails when the configuration is invalid, when the universe has
    /// no volume, when some entity bounds are malformed, and when some entity
    /// is not contained in the universe; the universe is never expanded.
    pub fn build<E, I>(
        self,
        universe: Option<Aabb3D<T>>,
        entities: I,
    ) -> Result<Tree<T, E, P, ARITY>>
    where
        E: Copy + Debug,
        I: IntoIterator<Item = (E, Aabb3D<T>)>,
    {
        let population: Vec<Entry<T, E>> = entities
            .into_iter()
            .map(|(entity, bounds)| Entry { entity, bounds })
            .collect();
        if population.iter().any(|e| !e.bounds.is_valid()) {
            return Err(Error::InvalidEntityBounds);
        }
        let universe = match universe {
            Some(universe) => universe,
            None => population
                .iter()
                .map(|e| e.bounds)
                .reduce(|a, b| a.union(&b))
                .ok_or(Error::InvalidBounds)?,
        };
        let mut tree = Tree::empty(universe, self.config, self.policy)?;
        if population.iter().any(|e| !universe.contains(&e.bounds)) {
            return Err(Error::OutOfUniverse);
        }
        log::debug!(
            "building tree of arity {ARITY} over {} entities in {universe:?}",
            population.len()
        );
        tree.len = population.len();
        let root = tree.root();
        tree.subdivide(root, universe, population);
        Ok(tree)
    }
}

impl<T, P, const ARITY: usize> StaticTreeBuilder<T, P, ARITY>
where
    T: Scalar,
    P: PartitionPolicy<T> + Default,
{
    /// Create a builder with the policy's default value.
    pub fn with_config(config: TreeConfig) -> Self {
        Self::new(config, P::default())
    }
}

impl<T, P, const ARITY: usize> Default for StaticTreeBuilder<T, P, ARITY>
where
    T: Scalar,
    P: PartitionPolicy<T> + Default,
{
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<T, P: Debug, const ARITY: usize> Debug for StaticTreeBuilder<T, P, ARITY> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticTreeBuilder")
            .field("arity", &ARITY)
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3D;
    use crate::policy::MedianCenter;
    use alloc::vec;

    fn unit() -> Aabb3D<f64> {
        Aabb3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn missing_universe_is_the_union_of_entities() {
        let tree = OctreeBuilder::<i64>::default()
            .build(
                None,
                [
                    (1_u8, Aabb3D::new(0, 0, 0, 2, 2, 2)),
                    (2, Aabb3D::new(5, -3, 1, 9, 4, 6)),
                ],
            )
            .unwrap();
        assert_eq!(tree.universe(), Aabb3D::new(0, -3, 0, 9, 4, 6));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn empty_batch_needs_a_universe() {
        let err = OctreeBuilder::<f64>::default()
            .build(None, Vec::<(u32, Aabb3D<f64>)>::new())
            .unwrap_err();
        assert_eq!(err, Error::InvalidBounds);

        let tree = OctreeBuilder::<f64>::default()
            .build(Some(unit()), Vec::<(u32, Aabb3D<f64>)>::new())
            .unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn entity_outside_universe_is_rejected() {
        let err = OctreeBuilder::<f64>::default()
            .build(
                Some(unit()),
                [(1_u32, Aabb3D::new(0.5, 0.5, 0.5, 1.5, 0.6, 0.6))],
            )
            .unwrap_err();
        assert_eq!(err, Error::OutOfUniverse);
    }

    #[test]
    fn malformed_entity_bounds_are_rejected() {
        let err = IcosepOctreeBuilder::<f64>::default()
            .build(
                Some(unit()),
                [(1_u32, Aabb3D::new(0.6, 0.5, 0.5, 0.4, 0.6, 0.6))],
            )
            .unwrap_err();
        assert_eq!(err, Error::InvalidEntityBounds);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TreeConfig::new().with_splitting_count(0);
        let err = OctreeBuilder::<f64>::with_config(config)
            .build(Some(unit()), [(1_u32, unit())])
            .unwrap_err();
        assert_eq!(err, Error::InvalidSplittingCount);
    }

    #[test]
    fn sparse_children_for_empty_octants() {
        let config = TreeConfig::new().with_splitting_count(2);
        let entities = vec![
            (0_u32, Aabb3D::from_point(Point3D::new(0.1, 0.1, 0.1))),
            (1, Aabb3D::from_point(Point3D::new(0.2, 0.1, 0.1))),
            (2, Aabb3D::from_point(Point3D::new(0.8, 0.9, 0.9))),
            (3, Aabb3D::from_point(Point3D::new(0.9, 0.9, 0.9))),
        ];
        let tree = OctreeBuilder::new(config, MedianCenter)
            .build(Some(unit()), entities)
            .unwrap();
        // Two populated octants, no empty siblings.
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.leaf_count(), 2);
    }
}
