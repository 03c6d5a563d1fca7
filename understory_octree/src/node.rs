// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node arena: nodes addressed by index, parent/child links as indices.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::types::{Aabb3D, Point3D};
use crate::zone::Zone;

/// Identifier for a node in a tree's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Node ids are intentionally 32-bit; trees never hold 2^32 nodes."
    )]
    pub(crate) const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// An indexed entity with the bounds it was classified with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Entry<T, E> {
    /// Caller's entity handle.
    pub entity: E,
    /// Bounds snapshot taken at insertion.
    pub bounds: Aabb3D<T>,
}

pub(crate) type Entries<T, E> = SmallVec<[Entry<T, E>; 4]>;

#[derive(Clone, Debug)]
pub(crate) struct Node<T, E, const ARITY: usize> {
    pub(crate) parent: Option<NodeId>,
    /// Slot in the parent (`None` for the root).
    pub(crate) zone: Option<Zone>,
    pub(crate) depth: usize,
    /// Present exactly when the node is internal.
    pub(crate) cut: Option<Point3D<T>>,
    pub(crate) children: [Option<NodeId>; ARITY],
    pub(crate) entries: Entries<T, E>,
    /// Union of the bounds routed to an icosep bucket; `None` for other nodes.
    pub(crate) extent: Option<Aabb3D<T>>,
    /// Population at which a leaf that could not be separated tries again.
    pub(crate) retry_at: Option<usize>,
}

impl<T, E, const ARITY: usize> Node<T, E, ARITY> {
    fn new(parent: Option<NodeId>, zone: Option<Zone>, depth: usize) -> Self {
        Self {
            parent,
            zone,
            depth,
            cut: None,
            children: [None; ARITY],
            entries: SmallVec::new(),
            extent: None,
            retry_at: None,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.cut.is_none()
    }
}

/// Flat node storage. Nodes are only ever appended; ids stay valid until `clear`.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T, E, const ARITY: usize> {
    nodes: Vec<Node<T, E, ARITY>>,
}

impl<T, E, const ARITY: usize> Arena<T, E, ARITY> {
    /// Arena holding a single empty root leaf.
    pub(crate) fn with_root() -> Self {
        Self {
            nodes: alloc::vec![Node::new(None, None, 0)],
        }
    }

    pub(crate) const ROOT: NodeId = NodeId(0);

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node<T, E, ARITY> {
        &self.nodes[id.idx()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<T, E, ARITY> {
        &mut self.nodes[id.idx()]
    }

    pub(crate) fn try_get(&self, id: NodeId) -> Option<&Node<T, E, ARITY>> {
        self.nodes.get(id.idx())
    }

    /// Allocate an empty leaf in `zone` of `parent` and link it.
    pub(crate) fn add_child(&mut self, parent: NodeId, zone: Zone) -> NodeId {
        let depth = self.get(parent).depth + 1;
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(Some(parent), Some(zone), depth));
        let slot = &mut self.get_mut(parent).children[zone.index()];
        debug_assert!(slot.is_none(), "child slot {zone:?} already populated");
        *slot = Some(id);
        id
    }

    /// Child of `parent` in `zone`, created on demand.
    pub(crate) fn child_or_insert(&mut self, parent: NodeId, zone: Zone) -> NodeId {
        match self.get(parent).children[zone.index()] {
            Some(id) => id,
            None => self.add_child(parent, zone),
        }
    }

    /// Grow the extent of the icosep bucket `id` to cover `bounds`.
    pub(crate) fn grow_extent(&mut self, id: NodeId, bounds: &Aabb3D<T>)
    where
        T: Copy + PartialOrd,
    {
        let node = self.get_mut(id);
        node.extent = Some(match node.extent {
            Some(extent) => extent.union(bounds),
            None => *bounds,
        });
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Node<T, E, ARITY>> + '_ {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_link_back_to_parent() {
        let mut arena: Arena<f64, u32, 9> = Arena::with_root();
        let root = Arena::<f64, u32, 9>::ROOT;
        let a = arena.add_child(root, Zone::NorthEastBack);
        let b = arena.child_or_insert(root, Zone::Icosep);
        assert_eq!(arena.child_or_insert(root, Zone::NorthEastBack), a);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.get(a).parent, Some(root));
        assert_eq!(arena.get(b).zone, Some(Zone::Icosep));
        assert_eq!(arena.get(b).depth, 1);
        assert_eq!(arena.get(root).children[Zone::Icosep.index()], Some(b));
        assert!(arena.get(a).is_leaf());
    }

    #[test]
    fn bucket_extent_grows_to_cover_its_entries() {
        let mut arena: Arena<f64, u32, 9> = Arena::with_root();
        let bucket = arena.add_child(Arena::<f64, u32, 9>::ROOT, Zone::Icosep);
        assert_eq!(arena.get(bucket).extent, None);
        arena.grow_extent(bucket, &Aabb3D::new(0.4, 0.1, 0.1, 0.6, 0.2, 0.2));
        arena.grow_extent(bucket, &Aabb3D::new(0.1, 0.4, 0.7, 0.2, 0.6, 0.8));
        assert_eq!(
            arena.get(bucket).extent,
            Some(Aabb3D::new(0.1, 0.1, 0.1, 0.6, 0.6, 0.8))
        );
    }
}
