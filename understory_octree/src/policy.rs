// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition policies: how a node picks its cut point.
//!
//! A policy receives the region being split and the bounds of the entities
//! that live in it, and returns the point where the three splitting planes
//! meet. Results are clamped into the region so that every derived sub-area
//! stays inside its parent.
//!
//! - [`BoundCenter`]: mean of the entity centres. A good default for
//!   scattered populations.
//! - [`MedianCenter`]: per-axis median of the entity centres. Balances counts
//!   even with outliers.
//! - [`RegionCenter`]: geometric centre of the region. Ignores the
//!   population entirely, like a classic loose octree.
//! - [`MinStraddle`]: per axis, the candidate plane that minimises
//!   `2 * straddlers + |low - high|`, which keeps the icosep set small.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::types::{Aabb3D, Point3D, Scalar, cmp_t};

/// Strategy computing a node's cut point.
pub trait PartitionPolicy<T: Scalar>: Debug {
    /// Compute the cut point for `population` inside `region`.
    ///
    /// Implementations must return a point inside `region` (see [`clamp_point`]).
    /// An empty population yields the region centre.
    fn cut_point(&self, region: &Aabb3D<T>, population: &[Aabb3D<T>]) -> Point3D<T>;
}

/// Clamp a point into a region, axis by axis.
pub fn clamp_point<T: Scalar>(region: &Aabb3D<T>, p: Point3D<T>) -> Point3D<T> {
    Point3D::new(
        T::max(region.min_x, T::min(p.x, region.max_x)),
        T::max(region.min_y, T::min(p.y, region.max_y)),
        T::max(region.min_z, T::min(p.z, region.max_z)),
    )
}

/// Mean of the entity centres.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundCenter;

impl<T: Scalar> PartitionPolicy<T> for BoundCenter {
    fn cut_point(&self, region: &Aabb3D<T>, population: &[Aabb3D<T>]) -> Point3D<T> {
        if population.is_empty() {
            return region.center();
        }
        let zero = T::widen(T::zero());
        let (mut sx, mut sy, mut sz) = (zero, zero, zero);
        for b in population {
            let c = b.center();
            sx = T::acc_add(sx, T::widen(c.x));
            sy = T::acc_add(sy, T::widen(c.y));
            sz = T::acc_add(sz, T::widen(c.z));
        }
        let n = T::acc_from_usize(population.len());
        clamp_point(
            region,
            Point3D::new(T::narrow(sx / n), T::narrow(sy / n), T::narrow(sz / n)),
        )
    }
}

/// Per-axis median of the entity centres.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MedianCenter;

fn median<T: Scalar>(values: &mut [T]) -> T {
    values.sort_unstable_by(cmp_t);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        T::mid(values[n / 2 - 1], values[n / 2])
    }
}

impl<T: Scalar> PartitionPolicy<T> for MedianCenter {
    fn cut_point(&self, region: &Aabb3D<T>, population: &[Aabb3D<T>]) -> Point3D<T> {
        if population.is_empty() {
            return region.center();
        }
        let centers: Vec<Point3D<T>> = population.iter().map(Aabb3D::center).collect();
        let mut axis: Vec<T> = centers.iter().map(|c| c.x).collect();
        let x = median(&mut axis);
        axis.clear();
        axis.extend(centers.iter().map(|c| c.y));
        let y = median(&mut axis);
        axis.clear();
        axis.extend(centers.iter().map(|c| c.z));
        let z = median(&mut axis);
        clamp_point(region, Point3D::new(x, y, z))
    }
}

/// Geometric centre of the region being split.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionCenter;

impl<T: Scalar> PartitionPolicy<T> for RegionCenter {
    fn cut_point(&self, region: &Aabb3D<T>, _population: &[Aabb3D<T>]) -> Point3D<T> {
        region.center()
    }
}

/// Per-axis plane minimising straddlers and imbalance.
///
/// Candidate planes are the entity faces strictly inside the region plus the
/// region centre. For a candidate `c` with `low` entities entirely below it,
/// `high` entities entirely above it and `s` straddlers, the cost is
/// `2 * s + |low - high|`; ties keep the earliest candidate in ascending order.
/// Each axis is evaluated in O(n log n) from sorted face coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MinStraddle;

fn best_plane<T: Scalar>(lo: T, hi: T, extents: &[(T, T)]) -> T {
    let n = extents.len();
    let mut mins: Vec<T> = extents.iter().map(|e| e.0).collect();
    let mut maxs: Vec<T> = extents.iter().map(|e| e.1).collect();
    let mut flats: Vec<T> = extents.iter().filter(|e| e.0 >= e.1).map(|e| e.0).collect();
    mins.sort_unstable_by(cmp_t);
    maxs.sort_unstable_by(cmp_t);
    flats.sort_unstable_by(cmp_t);

    let mut candidates: Vec<T> = Vec::with_capacity(2 * n + 1);
    candidates.push(T::mid(lo, hi));
    candidates.extend(
        mins.iter()
            .chain(maxs.iter())
            .copied()
            .filter(|&v| lo < v && v < hi),
    );
    candidates.sort_unstable_by(cmp_t);
    candidates.dedup_by(|a, b| cmp_t(&*a, &*b).is_eq());

    let mut best = T::mid(lo, hi);
    let mut best_cost = usize::MAX;
    for c in candidates {
        // Entities with max <= c are low; entities with min >= c are high,
        // except flat ones lying on the plane, which classify low.
        let low = maxs.partition_point(|&m| m <= c);
        let on_plane = flats.partition_point(|&m| m <= c) - flats.partition_point(|&m| m < c);
        let high = n - mins.partition_point(|&m| m < c) - on_plane;
        let straddle = n - low - high;
        let cost = 2 * straddle + low.abs_diff(high);
        if cost < best_cost {
            best_cost = cost;
            best = c;
        }
    }
    best
}

impl<T: Scalar> PartitionPolicy<T> for MinStraddle {
    fn cut_point(&self, region: &Aabb3D<T>, population: &[Aabb3D<T>]) -> Point3D<T> {
        if population.is_empty() {
            return region.center();
        }
        let mut extents: Vec<(T, T)> = population.iter().map(|b| (b.min_x, b.max_x)).collect();
        let x = best_plane(region.min_x, region.max_x, &extents);

        extents.clear();
        extents.extend(population.iter().map(|b| (b.min_y, b.max_y)));
        let y = best_plane(region.min_y, region.max_y, &extents);

        extents.clear();
        extents.extend(population.iter().map(|b| (b.min_z, b.max_z)));
        let z = best_plane(region.min_z, region.max_z, &extents);

        clamp_point(region, Point3D::new(x, y, z))
    }
}
