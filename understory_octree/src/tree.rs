// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree core shared by static and dynamic trees: storage, queries and traversal.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::{StraddlePolicy, TreeConfig};
use crate::error::{Error, Result};
use crate::frustum::{Coverage, Frustum};
use crate::node::{Arena, Entry, NodeId};
use crate::policy::{BoundCenter, PartitionPolicy};
use crate::types::{Aabb3D, Point3D, Scalar};
use crate::zone::{OCTANT_COUNT, Zone, sub_area};

/// Child slots of a plain octree node.
pub const OCTREE_ARITY: usize = OCTANT_COUNT;

/// Child slots of an icosep octree node: the eight octants plus the icosep bucket.
pub const ICOSEP_ARITY: usize = OCTANT_COUNT + 1;

/// How straddling entities are handled, resolved from the arity and the config.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StraddleMode {
    Icosep,
    Retain,
    ForceLeaf,
}

/// A perception tree over entities of type `E` with `T` coordinates.
///
/// `ARITY` selects the flavour: [`OCTREE_ARITY`] for a plain octree and
/// [`ICOSEP_ARITY`] for an icosep octree, whose ninth child slot is a bucket
/// holding the entities that straddle the node's cut planes. Use the
/// [`Octree`] and [`IcosepOctree`] aliases rather than spelling the arity.
///
/// Octant regions are not stored: they are derived from the universe and the
/// cut points while descending (see [`Tree::child_region`]). Icosep buckets
/// keep the union of the bounds routed to them.
///
/// A `Tree` has no public mutators. Build one with a
/// [`StaticTreeBuilder`](crate::StaticTreeBuilder), or use a
/// [`DynamicTree`](crate::DynamicTree), which dereferences to its `Tree`.
pub struct Tree<T, E, P = BoundCenter, const ARITY: usize = OCTREE_ARITY> {
    pub(crate) arena: Arena<T, E, ARITY>,
    pub(crate) universe: Aabb3D<T>,
    pub(crate) config: TreeConfig,
    pub(crate) policy: P,
    pub(crate) len: usize,
}

/// Plain octree: straddlers are handled per [`StraddlePolicy`].
pub type Octree<T, E, P = BoundCenter> = Tree<T, E, P, OCTREE_ARITY>;

/// Icosep octree: straddlers go to the icosep bucket of the node they straddle.
pub type IcosepOctree<T, E, P = BoundCenter> = Tree<T, E, P, ICOSEP_ARITY>;

/// Role of a node in the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// No cut point; holds entities directly.
    Leaf,
    /// Has a cut point and children. May hold retained straddlers.
    Internal,
    /// Icosep bucket of an internal node. Holds entities directly, or has a
    /// cut point and children of its own when it was decomposed.
    Icosep,
}

/// Traversal order for [`Tree::nodes`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Depth first, parents before children, children in slot order.
    #[default]
    PreOrder,
    /// Breadth first, level by level.
    LevelOrder,
}

/// Read-only view of one node, as yielded by [`Tree::nodes`].
#[derive(Copy, Clone, Debug)]
pub struct NodeView<'a, T, E> {
    /// Node identifier.
    pub id: NodeId,
    /// Distance from the root (the root is at depth 0).
    pub depth: usize,
    /// Slot in the parent, `None` for the root.
    pub zone: Option<Zone>,
    /// Role of the node.
    pub kind: NodeKind,
    /// Region derived for this node. For icosep buckets, the union of the bounds routed to them.
    pub region: Aabb3D<T>,
    /// Cut point of internal nodes.
    pub cut: Option<Point3D<T>>,
    /// Entities stored directly in this node.
    pub entries: &'a [Entry<T, E>],
}

impl<T, E, P, const ARITY: usize> Tree<T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Debug,
    P: PartitionPolicy<T>,
{
    /// Whether this flavour routes straddlers to an icosep bucket.
    pub const HAS_ICOSEP: bool = ARITY > OCTANT_COUNT;

    /// Empty tree: a single root leaf covering `universe`.
    pub(crate) fn empty(universe: Aabb3D<T>, config: TreeConfig, policy: P) -> Result<Self> {
        const {
            assert!(
                ARITY == OCTREE_ARITY || ARITY == ICOSEP_ARITY,
                "tree arity must be 8 (octree) or 9 (icosep octree)"
            );
        };
        config.validate()?;
        if universe.is_empty() {
            return Err(Error::InvalidBounds);
        }
        Ok(Self {
            arena: Arena::with_root(),
            universe,
            config,
            policy,
            len: 0,
        })
    }

    pub(crate) fn straddle_mode(&self) -> StraddleMode {
        if Self::HAS_ICOSEP {
            StraddleMode::Icosep
        } else {
            match self.config.straddle {
                StraddlePolicy::Retain => StraddleMode::Retain,
                StraddlePolicy::ForceLeaf => StraddleMode::ForceLeaf,
            }
        }
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree indexes no entity.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Overall indexed volume.
    pub fn universe(&self) -> Aabb3D<T> {
        self.universe
    }

    /// Configuration the tree was created with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Active partition policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Identifier of the root node.
    pub fn root(&self) -> NodeId {
        Arena::<T, E, ARITY>::ROOT
    }

    /// Number of allocated nodes, icosep buckets included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Number of leaves, icosep buckets excluded.
    pub fn leaf_count(&self) -> usize {
        self.arena
            .iter()
            .filter(|n| n.is_leaf() && n.zone != Some(Zone::Icosep))
            .count()
    }

    /// Number of levels, root included.
    pub fn height(&self) -> usize {
        self.arena.iter().map(|n| n.depth).max().unwrap_or(0) + 1
    }

    /// All indexed entries, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<T, E>> + '_ {
        self.arena.iter().flat_map(|n| n.entries.iter())
    }

    /// Derive the region of `child`, found in `zone` of `parent`, from the parent's region.
    ///
    /// Octant regions come from the parent's cut point; the icosep bucket's
    /// region is the union of the bounds routed to it (the cut point itself
    /// when there is no bucket). Octant regions are recomputed on each descent
    /// instead of being stored per node.
    pub fn child_region(
        &self,
        parent: NodeId,
        parent_region: &Aabb3D<T>,
        zone: Zone,
    ) -> Aabb3D<T> {
        let Some(node) = self.arena.try_get(parent) else {
            return *parent_region;
        };
        let Some(cut) = node.cut else {
            return *parent_region;
        };
        if let Some(area) = sub_area(parent_region, zone, cut) {
            return area;
        }
        node.children
            .get(zone.index())
            .copied()
            .flatten()
            .and_then(|bucket| self.arena.get(bucket).extent)
            .unwrap_or(Aabb3D::from_point(cut))
    }

    /// Visit populated children of `id` together with their derived regions.
    fn for_each_child(
        &self,
        id: NodeId,
        region: &Aabb3D<T>,
        mut f: impl FnMut(NodeId, Zone, Aabb3D<T>),
    ) {
        for (slot, child) in self.arena.get(id).children.iter().enumerate() {
            let (Some(child), Some(zone)) = (*child, Zone::from_index(slot)) else {
                continue;
            };
            f(child, zone, self.child_region(id, region, zone));
        }
    }

    /// Walk the tree, pruning regions with `cover` and testing entries with `hit`.
    ///
    /// Once a region is `Inside`, its whole subtree is reported without tests.
    fn walk<C, H, F>(&self, cover: C, hit: H, mut f: F)
    where
        C: Fn(&Aabb3D<T>) -> Coverage,
        H: Fn(&Aabb3D<T>) -> bool,
        F: FnMut(E, &Aabb3D<T>),
    {
        let mut stack: Vec<(NodeId, Aabb3D<T>, bool)> =
            alloc::vec![(self.root(), self.universe, false)];
        while let Some((id, region, covered)) = stack.pop() {
            let inside = covered
                || match cover(&region) {
                    Coverage::Outside => continue,
                    Coverage::Inside => true,
                    Coverage::Partial => false,
                };
            for e in &self.arena.get(id).entries {
                if inside || hit(&e.bounds) {
                    f(e.entity, &e.bounds);
                }
            }
            self.for_each_child(id, &region, |child, _, r| stack.push((child, r, inside)));
        }
    }

    /// Visit entities whose bounds contain the point (boundary inclusive).
    ///
    /// Calls `f(entity, bounds)` for each match without collecting results.
    pub fn visit_point<F: FnMut(E, &Aabb3D<T>)>(&self, p: Point3D<T>, f: F) {
        self.walk(
            |r| {
                if r.contains_point(p) {
                    Coverage::Partial
                } else {
                    Coverage::Outside
                }
            },
            |b| b.contains_point(p),
            f,
        );
    }

    /// Entities whose bounds contain the point.
    pub fn query_point(&self, p: Point3D<T>) -> impl Iterator<Item = E> {
        let mut out = Vec::new();
        self.visit_point(p, |e, _| out.push(e));
        out.into_iter()
    }

    /// Visit entities whose bounds overlap `rect` (shared faces count).
    pub fn visit_rect<F: FnMut(E, &Aabb3D<T>)>(&self, rect: Aabb3D<T>, f: F) {
        self.walk(
            |r| {
                if !r.overlaps(&rect) {
                    Coverage::Outside
                } else if rect.contains(r) {
                    Coverage::Inside
                } else {
                    Coverage::Partial
                }
            },
            |b| b.overlaps(&rect),
            f,
        );
    }

    /// Entities whose bounds overlap `rect`.
    pub fn query_rect(&self, rect: Aabb3D<T>) -> impl Iterator<Item = E> {
        let mut out = Vec::new();
        self.visit_rect(rect, |e, _| out.push(e));
        out.into_iter()
    }

    /// Visit entities potentially visible in `frustum`.
    ///
    /// Whole subtrees inside the frustum are reported without per-entity tests.
    /// Elsewhere the per-entity test is conservative: a box near a frustum
    /// corner may be reported although it is outside.
    pub fn visit_frustum<F: FnMut(E, &Aabb3D<T>)>(&self, frustum: &Frustum<T>, f: F) {
        self.walk(
            |r| frustum.classify_aabb(r),
            |b| frustum.intersects_aabb(b),
            f,
        );
    }

    /// Entities potentially visible in `frustum`.
    pub fn query_frustum(&self, frustum: &Frustum<T>) -> impl Iterator<Item = E> {
        let mut out = Vec::new();
        self.visit_frustum(frustum, |e, _| out.push(e));
        out.into_iter()
    }

    /// Iterate over every node in the given order, with derived regions.
    pub fn nodes(&self, order: Traversal) -> Nodes<'_, T, E, P, ARITY> {
        let mut queue = VecDeque::new();
        queue.push_back((self.root(), self.universe));
        Nodes {
            tree: self,
            order,
            queue,
        }
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: NodeId) -> Option<NodeView<'_, T, E>> {
        let mut path = Vec::new();
        let mut cur = self.arena.try_get(id)?;
        while let Some(parent) = cur.parent {
            path.push((parent, cur.zone?));
            cur = self.arena.get(parent);
        }
        let mut region = self.universe;
        for &(parent, zone) in path.iter().rev() {
            region = self.child_region(parent, &region, zone);
        }
        Some(self.view(id, region))
    }

    fn view(&self, id: NodeId, region: Aabb3D<T>) -> NodeView<'_, T, E> {
        let node = self.arena.get(id);
        let kind = if node.zone == Some(Zone::Icosep) {
            NodeKind::Icosep
        } else if node.is_leaf() {
            NodeKind::Leaf
        } else {
            NodeKind::Internal
        };
        NodeView {
            id,
            depth: node.depth,
            zone: node.zone,
            kind,
            region,
            cut: node.cut,
            entries: &node.entries,
        }
    }
}

impl<T, E, P, const ARITY: usize> Debug for Tree<T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Debug,
    P: PartitionPolicy<T>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("arity", &ARITY)
            .field("universe", &self.universe)
            .field("len", &self.len)
            .field("nodes", &self.arena.len())
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Iterator over the nodes of a tree; see [`Tree::nodes`].
pub struct Nodes<'a, T, E, P, const ARITY: usize> {
    tree: &'a Tree<T, E, P, ARITY>,
    order: Traversal,
    queue: VecDeque<(NodeId, Aabb3D<T>)>,
}

impl<'a, T, E, P, const ARITY: usize> Iterator for Nodes<'a, T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Debug,
    P: PartitionPolicy<T>,
{
    type Item = NodeView<'a, T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, region) = match self.order {
            Traversal::PreOrder => self.queue.pop_back()?,
            Traversal::LevelOrder => self.queue.pop_front()?,
        };
        let tree = self.tree;
        let mut children: Vec<(NodeId, Aabb3D<T>)> = Vec::new();
        tree.for_each_child(id, &region, |child, _, r| children.push((child, r)));
        match self.order {
            // Reversed so that the first slot is popped first.
            Traversal::PreOrder => self.queue.extend(children.into_iter().rev()),
            Traversal::LevelOrder => self.queue.extend(children),
        }
        Some(tree.view(id, region))
    }
}

impl<T: Debug, E, P, const ARITY: usize> Debug for Nodes<'_, T, E, P, ARITY> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Nodes")
            .field("order", &self.order)
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticTreeBuilder;
    use crate::policy::RegionCenter;
    use alloc::vec;

    fn unit() -> Aabb3D<f64> {
        Aabb3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)
    }

    fn point(x: f64, y: f64, z: f64) -> Aabb3D<f64> {
        Aabb3D::from_point(Point3D::new(x, y, z))
    }

    fn corners() -> Octree<f64, u32, RegionCenter> {
        let config = TreeConfig::new().with_splitting_count(1);
        StaticTreeBuilder::new(config, RegionCenter)
            .build(
                Some(unit()),
                vec![
                    (1, point(0.1, 0.1, 0.1)),
                    (2, point(0.9, 0.9, 0.9)),
                    (3, point(0.9, 0.1, 0.1)),
                ],
            )
            .unwrap()
    }

    #[test]
    fn degenerate_universe_is_rejected() {
        let flat = Aabb3D::new(0.0, 0.0, 0.0, 1.0, 0.0, 1.0);
        let err = <Octree<f64, u32>>::empty(flat, TreeConfig::default(), BoundCenter).unwrap_err();
        assert_eq!(err, Error::InvalidBounds);
    }

    #[test]
    fn stats_of_a_split_root() {
        let tree = corners();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.height(), 2);
        assert!(!<Octree<f64, u32>>::HAS_ICOSEP);
        assert!(<IcosepOctree<f64, u32>>::HAS_ICOSEP);
    }

    #[test]
    fn child_region_refines_the_parent() {
        let tree = corners();
        let root = tree.root();
        let region = tree.child_region(root, &unit(), Zone::NorthEastBack);
        assert_eq!(region, Aabb3D::new(0.5, 0.5, 0.5, 1.0, 1.0, 1.0));
        let view = tree.node(NodeId::new(2)).unwrap();
        assert_eq!(view.kind, NodeKind::Leaf);
        assert!(view.region.contains(&view.entries[0].bounds));
    }

    #[test]
    fn traversal_orders_visit_every_node_once() {
        let tree = corners();
        let pre: Vec<_> = tree.nodes(Traversal::PreOrder).collect();
        let level: Vec<_> = tree.nodes(Traversal::LevelOrder).collect();
        assert_eq!(pre.len(), tree.node_count());
        assert_eq!(level.len(), tree.node_count());
        assert_eq!(pre[0].kind, NodeKind::Internal);
        assert_eq!(pre[0].region, unit());
        // Children follow slot order: NEB (3) before SWF (4) before SEF (6).
        let zones: Vec<_> = pre[1..].iter().filter_map(|v| v.zone).collect();
        assert_eq!(
            zones,
            vec![Zone::NorthEastBack, Zone::SouthWestFront, Zone::SouthEastFront]
        );
        for v in &level {
            for e in v.entries {
                assert!(v.region.contains(&e.bounds));
            }
        }
    }

    #[test]
    fn point_and_rect_queries() {
        let tree = corners();
        let hits: Vec<u32> = tree.query_point(Point3D::new(0.9, 0.9, 0.9)).collect();
        assert_eq!(hits, vec![2]);
        let mut hits: Vec<u32> = tree
            .query_rect(Aabb3D::new(0.0, 0.0, 0.0, 1.0, 0.5, 0.5))
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 3]);
        assert_eq!(tree.query_rect(unit()).count(), 3);
    }

    #[test]
    fn frustum_query_prunes_outside_regions() {
        let tree = corners();
        let f = Frustum::from_aabb(&Aabb3D::new(0.6, 0.0, 0.0, 1.0, 0.4, 0.4));
        let hits: Vec<u32> = tree.query_frustum(&f).collect();
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn debug_is_concise() {
        let tree = corners();
        let s = alloc::format!("{tree:?}");
        assert!(s.starts_with("Tree"));
        assert!(s.contains("len: 3"));
        assert!(s.ends_with(".. }"));
    }
}
