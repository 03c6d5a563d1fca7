// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental trees: single-entity insert and remove against a lazily grown tree.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::ops::Deref;

use hashbrown::HashMap;

use crate::config::{TreeConfig, UniverseOverflow};
use crate::error::{Error, Result};
use crate::node::{Arena, Entry, NodeId};
use crate::policy::{BoundCenter, PartitionPolicy};
use crate::tree::{ICOSEP_ARITY, OCTREE_ARITY, StraddleMode, Tree};
use crate::types::{Aabb3D, Scalar};
use crate::zone::{Classification, Zone, classify, sub_area};

/// A tree that grows one entity at a time.
///
/// A leaf is turned into an internal node exactly when an insertion would push
/// it over the splitting count. Removal never merges nodes back.
///
/// The tree keeps the bounds each entity was inserted with and uses them to
/// find it again. It does not follow entities that move: when an entity's
/// bounds change, call [`relocate`](Self::relocate) (or remove it and insert it
/// again) before the next query.
///
/// Queries and diagnostics are available through `Deref` to [`Tree`].
///
/// ```
/// use understory_octree::{Aabb3D, DynamicOctree, Point3D, TreeConfig};
///
/// let universe = Aabb3D::new(0.0, 0.0, 0.0, 100.0, 100.0, 100.0);
/// let config = TreeConfig::new().with_splitting_count(2);
/// let mut tree: DynamicOctree<f64, u32> = DynamicOctree::with_config(universe, config).unwrap();
///
/// tree.insert(1, Aabb3D::new(10.0, 10.0, 10.0, 12.0, 12.0, 12.0)).unwrap();
/// tree.insert(2, Aabb3D::new(80.0, 80.0, 80.0, 82.0, 82.0, 82.0)).unwrap();
/// tree.insert(3, Aabb3D::new(11.0, 80.0, 10.0, 13.0, 82.0, 12.0)).unwrap();
///
/// let near: Vec<_> = tree
///     .query_rect(Aabb3D::new(0.0, 0.0, 0.0, 50.0, 50.0, 50.0))
///     .collect();
/// assert_eq!(near, [1]);
///
/// // Entities do not move by themselves.
/// tree.relocate(1, Aabb3D::new(90.0, 90.0, 90.0, 91.0, 91.0, 91.0)).unwrap();
/// assert_eq!(tree.query_point(Point3D::new(11.0, 11.0, 11.0)).count(), 0);
///
/// assert!(tree.remove(2).is_some());
/// assert!(tree.remove(2).is_none());
/// assert_eq!(tree.len(), 2);
/// ```
pub struct DynamicTree<T, E, P = BoundCenter, const ARITY: usize = OCTREE_ARITY> {
    tree: Tree<T, E, P, ARITY>,
    snapshots: HashMap<E, Aabb3D<T>>,
}

/// Dynamic plain octree.
pub type DynamicOctree<T, E, P = BoundCenter> = DynamicTree<T, E, P, OCTREE_ARITY>;

/// Dynamic icosep octree.
pub type DynamicIcosepOctree<T, E, P = BoundCenter> = DynamicTree<T, E, P, ICOSEP_ARITY>;

impl<T, E, P, const ARITY: usize> DynamicTree<T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Eq + Hash + Debug,
    P: PartitionPolicy<T>,
{
    /// Empty tree over `universe`.
    ///
    /// Fails when the configuration is invalid or the universe has no volume.
    pub fn new(universe: Aabb3D<T>, config: TreeConfig, policy: P) -> Result<Self> {
        Ok(Self {
            tree: Tree::empty(universe, config, policy)?,
            snapshots: HashMap::new(),
        })
    }

    /// Tree seeded with a batch of entities, built top-down like a static tree.
    ///
    /// Entities are admitted one by one exactly as [`insert`](Self::insert)
    /// would, so the universe overflow setting applies.
    pub fn with_entities<I>(
        universe: Aabb3D<T>,
        config: TreeConfig,
        policy: P,
        entities: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (E, Aabb3D<T>)>,
    {
        let mut this = Self::new(universe, config, policy)?;
        let mut population = Vec::new();
        for (entity, bounds) in entities {
            let bounds = this.admit(entity, bounds)?;
            this.snapshots.insert(entity, bounds);
            population.push(Entry { entity, bounds });
        }
        this.tree.len = population.len();
        let root = this.tree.root();
        let universe = this.tree.universe;
        this.tree.subdivide(root, universe, population);
        Ok(this)
    }

    /// Insert an entity.
    ///
    /// Fails on malformed bounds, on an entity that is already present, and,
    /// depending on [`TreeConfig::overflow`], on bounds not inside the universe.
    /// A failed insertion leaves the tree unchanged.
    pub fn insert(&mut self, entity: E, bounds: Aabb3D<T>) -> Result<()> {
        let bounds = self.admit(entity, bounds)?;
        self.place(Entry { entity, bounds });
        self.snapshots.insert(entity, bounds);
        self.tree.len += 1;
        Ok(())
    }

    /// Remove an entity, returning the bounds it was indexed with.
    ///
    /// Returns `None` when the entity is not present; removing twice is harmless.
    pub fn remove(&mut self, entity: E) -> Option<Aabb3D<T>> {
        let bounds = *self.snapshots.get(&entity)?;
        let id = self.locate(&bounds);
        let entries = &mut self.tree.arena.get_mut(id).entries;
        let pos = entries.iter().position(|e| e.entity == entity)?;
        entries.remove(pos);
        self.snapshots.remove(&entity);
        self.tree.len -= 1;
        log::trace!("removed {entity:?} from node {id:?}");
        Some(bounds)
    }

    /// Move an entity to new bounds: remove it, then insert it again.
    ///
    /// Returns the previous indexed bounds, or `None` if the entity was not
    /// present (in which case it is simply inserted). On error the entity keeps
    /// its previous place.
    pub fn relocate(&mut self, entity: E, bounds: Aabb3D<T>) -> Result<Option<Aabb3D<T>>> {
        self.check(&bounds)?;
        let previous = self.remove(entity);
        self.insert(entity, bounds)?;
        Ok(previous)
    }

    /// Whether the entity is present.
    pub fn contains(&self, entity: E) -> bool {
        self.snapshots.contains_key(&entity)
    }

    /// Bounds the entity is indexed with.
    pub fn bounds_of(&self, entity: E) -> Option<Aabb3D<T>> {
        self.snapshots.get(&entity).copied()
    }

    /// Remove every entity and node. The universe is kept as it is.
    pub fn clear(&mut self) {
        self.tree.arena = Arena::with_root();
        self.tree.len = 0;
        self.snapshots.clear();
    }

    /// The underlying tree.
    pub fn tree(&self) -> &Tree<T, E, P, ARITY> {
        &self.tree
    }

    /// Validation shared by every insertion path; never mutates.
    fn check(&self, bounds: &Aabb3D<T>) -> Result<()> {
        if !bounds.is_valid() {
            return Err(Error::InvalidEntityBounds);
        }
        if self.tree.config.overflow == UniverseOverflow::Reject
            && !self.tree.universe.contains(bounds)
        {
            return Err(Error::OutOfUniverse);
        }
        Ok(())
    }

    /// Validate a new entity and return the bounds it will be indexed with.
    fn admit(&mut self, entity: E, bounds: Aabb3D<T>) -> Result<Aabb3D<T>> {
        self.check(&bounds)?;
        if self.snapshots.contains_key(&entity) {
            return Err(Error::DuplicateEntity);
        }
        let universe = self.tree.universe;
        if universe.contains(&bounds) {
            return Ok(bounds);
        }
        match self.tree.config.overflow {
            UniverseOverflow::Reject => Err(Error::OutOfUniverse),
            UniverseOverflow::Clamp => Ok(bounds.clamp_into(&universe)),
            UniverseOverflow::Expand => {
                self.tree.universe = universe.union(&bounds);
                log::debug!(
                    "universe expanded from {universe:?} to {:?} for {entity:?}",
                    self.tree.universe
                );
                Ok(bounds)
            }
        }
    }

    /// Descend from the root and store the entry, splitting an overflowing leaf.
    fn place(&mut self, entry: Entry<T, E>) {
        let mode = self.tree.straddle_mode();
        let splitting_count = self.tree.config.splitting_count;
        let decompose = self.tree.config.decompose_icosep;
        let mut id = self.tree.root();
        let mut region = self.tree.universe;
        loop {
            let node = self.tree.arena.get(id);
            let Some(cut) = node.cut else {
                let limit = node.retry_at.unwrap_or(splitting_count);
                if node.entries.len() < limit {
                    self.tree.arena.get_mut(id).entries.push(entry);
                } else {
                    let mut population =
                        core::mem::take(&mut self.tree.arena.get_mut(id).entries).into_vec();
                    population.push(entry);
                    self.tree.subdivide(id, region, population);
                }
                return;
            };
            let zone = match classify(&entry.bounds, cut) {
                Classification::Octant(zone) => zone,
                Classification::Straddles if mode == StraddleMode::Icosep => {
                    let bucket = self.tree.arena.child_or_insert(id, Zone::Icosep);
                    self.tree.arena.grow_extent(bucket, &entry.bounds);
                    log::trace!("{:?} straddles node {id:?}; icosep bucket", entry.entity);
                    let extent = self.tree.arena.get(bucket).extent;
                    match extent {
                        Some(extent) if decompose => {
                            id = bucket;
                            region = extent;
                            continue;
                        }
                        _ => {
                            self.tree.arena.get_mut(bucket).entries.push(entry);
                            return;
                        }
                    }
                }
                Classification::Straddles => {
                    self.tree.arena.get_mut(id).entries.push(entry);
                    log::trace!("{:?} straddles node {id:?}; retained", entry.entity);
                    return;
                }
            };
            match node.children[zone.index()] {
                Some(child) => {
                    id = child;
                    region = sub_area(&region, zone, cut).unwrap_or(region);
                }
                None => {
                    let child = self.tree.arena.add_child(id, zone);
                    self.tree.arena.get_mut(child).entries.push(entry);
                    return;
                }
            }
        }
    }

    /// Node holding an entry with `bounds`, found by the same descent as `place`.
    fn locate(&self, bounds: &Aabb3D<T>) -> NodeId {
        let mode = self.tree.straddle_mode();
        let mut id = self.tree.root();
        loop {
            let node = self.tree.arena.get(id);
            let Some(cut) = node.cut else {
                return id;
            };
            let next = match classify(bounds, cut) {
                Classification::Octant(zone) => node.children[zone.index()],
                Classification::Straddles if mode == StraddleMode::Icosep => {
                    node.children[Zone::Icosep.index()]
                }
                Classification::Straddles => None,
            };
            match next {
                Some(child) => id = child,
                None => return id,
            }
        }
    }
}

impl<T, E, P, const ARITY: usize> DynamicTree<T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Eq + Hash + Debug,
    P: PartitionPolicy<T> + Default,
{
    /// Empty tree using the policy's default value.
    pub fn with_config(universe: Aabb3D<T>, config: TreeConfig) -> Result<Self> {
        Self::new(universe, config, P::default())
    }
}

impl<T, E, P, const ARITY: usize> Deref for DynamicTree<T, E, P, ARITY> {
    type Target = Tree<T, E, P, ARITY>;

    fn deref(&self) -> &Self::Target {
        &self.tree
    }
}

impl<T, E, P, const ARITY: usize> Debug for DynamicTree<T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Eq + Hash + Debug,
    P: PartitionPolicy<T>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicTree")
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}
