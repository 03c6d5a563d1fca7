// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subdivision shared by the static builder and dynamic leaf overflow.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::node::{Entry, NodeId};
use crate::policy::PartitionPolicy;
use crate::tree::{StraddleMode, Tree};
use crate::types::{Aabb3D, Point3D, Scalar};
use crate::zone::{Classification, OCTANT_COUNT, Zone, classify, sub_area};

/// A population classified against a cut point.
struct Groups<T, E> {
    octants: [Vec<Entry<T, E>>; OCTANT_COUNT],
    straddlers: Vec<Entry<T, E>>,
}

impl<T, E, P, const ARITY: usize> Tree<T, E, P, ARITY>
where
    T: Scalar,
    E: Copy + Debug,
    P: PartitionPolicy<T>,
{
    /// Distribute `population` below `node`, an empty leaf covering `region`.
    ///
    /// Work is kept on an explicit open list, so deep trees do not recurse.
    /// A population that no cut can separate ends up in a leaf, whatever its
    /// size; that leaf tries again once its population has doubled.
    pub(crate) fn subdivide(
        &mut self,
        node: NodeId,
        region: Aabb3D<T>,
        population: Vec<Entry<T, E>>,
    ) {
        let mut open = alloc::vec![(node, region, population)];
        while let Some((id, region, population)) = open.pop() {
            let n = population.len();
            let (depth, bucket, retried) = {
                let node = self.arena.get(id);
                (node.depth, node.zone == Some(Zone::Icosep), node.retry_at.is_some())
            };
            if n <= self.config.splitting_count {
                self.make_leaf(id, population);
                continue;
            }
            if depth + 1 >= self.config.max_depth {
                log::debug!(
                    "node {id:?} at depth limit {}: keeping {n} entities in a leaf",
                    self.config.max_depth,
                );
                self.arena.get_mut(id).retry_at = Some(usize::MAX);
                self.make_leaf(id, population);
                continue;
            }
            let Some((cut, groups)) = self.find_cut(&region, &population, bucket) else {
                if retried {
                    log::debug!("{n} entities in node {id:?} still cannot be separated");
                } else {
                    log::warn!("{n} entities in node {id:?} cannot be separated; forcing a leaf");
                }
                self.arena.get_mut(id).retry_at = Some(n.saturating_mul(2));
                self.make_leaf(id, population);
                continue;
            };
            log::debug!(
                "subdividing node {id:?} at depth {depth}: {n} entities, cut {cut:?}, {} straddling",
                groups.straddlers.len()
            );

            let Groups {
                octants,
                straddlers,
            } = groups;
            let node = self.arena.get_mut(id);
            node.cut = Some(cut);
            node.retry_at = None;
            if !straddlers.is_empty() {
                if self.straddle_mode() == StraddleMode::Icosep {
                    let child = self.arena.add_child(id, Zone::Icosep);
                    for e in &straddlers {
                        self.arena.grow_extent(child, &e.bounds);
                    }
                    let extent = self.arena.get(child).extent;
                    match extent {
                        Some(extent) if self.config.decompose_icosep => {
                            open.push((child, extent, straddlers));
                        }
                        _ => self.make_leaf(child, straddlers),
                    }
                } else {
                    self.arena.get_mut(id).entries.extend(straddlers);
                }
            }
            for (zone, group) in Zone::OCTANTS.into_iter().zip(octants) {
                if group.is_empty() {
                    continue;
                }
                if let Some(area) = sub_area(&region, zone, cut) {
                    let child = self.arena.add_child(id, zone);
                    open.push((child, area, group));
                }
            }
        }
    }

    fn make_leaf(&mut self, id: NodeId, population: Vec<Entry<T, E>>) {
        self.arena.get_mut(id).entries.extend(population);
    }

    /// Ask the policy for a cut; fall back to the region centre once.
    ///
    /// `bucket` is set when `population` is the content of an icosep bucket.
    fn find_cut(
        &self,
        region: &Aabb3D<T>,
        population: &[Entry<T, E>],
        bucket: bool,
    ) -> Option<(Point3D<T>, Groups<T, E>)> {
        let bounds: Vec<Aabb3D<T>> = population.iter().map(|e| e.bounds).collect();
        let proposed = self.policy.cut_point(region, &bounds);
        if let Some(groups) = self.try_cut(population, proposed, bucket) {
            return Some((proposed, groups));
        }
        let centre = region.center();
        if centre == proposed {
            return None;
        }
        log::trace!("cut {proposed:?} made no progress, retrying at {centre:?}");
        self.try_cut(population, centre, bucket)
            .map(|groups| (centre, groups))
    }

    /// Classify the population; `None` when the cut makes no progress.
    ///
    /// A cut makes no progress when one octant receives everybody. It also
    /// fails when everybody straddles, except at a regular icosep node, which
    /// moves them into a fresh bucket. Under `ForceLeaf` it fails when anybody
    /// straddles.
    fn try_cut(
        &self,
        population: &[Entry<T, E>],
        cut: Point3D<T>,
        bucket: bool,
    ) -> Option<Groups<T, E>> {
        let mut octants: [Vec<Entry<T, E>>; OCTANT_COUNT] = core::array::from_fn(|_| Vec::new());
        let mut straddlers = Vec::new();
        for e in population {
            match classify(&e.bounds, cut) {
                Classification::Octant(zone) => octants[zone.index()].push(*e),
                Classification::Straddles => straddlers.push(*e),
            }
        }
        let n = population.len();
        let stuck = octants.iter().any(|g| g.len() == n)
            || match self.straddle_mode() {
                StraddleMode::Icosep => bucket && straddlers.len() == n,
                StraddleMode::Retain => straddlers.len() == n,
                StraddleMode::ForceLeaf => !straddlers.is_empty(),
            };
        (!stuck).then_some(Groups {
            octants,
            straddlers,
        })
    }
}
