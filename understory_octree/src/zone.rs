// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Octant labels, entity classification and sub-area derivation.
//!
//! Axis conventions used throughout the crate:
//!
//! | axis | min side | max side |
//! |------|----------|----------|
//! | x    | west     | east     |
//! | y    | south    | north    |
//! | z    | front    | back     |
//!
//! The eight octants are numbered so that bit 0 selects the back half, bit 1
//! the east half and bit 2 the south half. Index 8 is reserved for the icosep
//! bucket.

use crate::types::{Aabb3D, Point3D};

/// Number of octant zones.
pub const OCTANT_COUNT: usize = 8;

/// Child slot of the icosep bucket in icosep trees.
pub const ICOSEP_SLOT: usize = 8;

/// One of the eight octants around a cut point, or the icosep bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Zone {
    /// North (y max), west (x min), front (z min).
    NorthWestFront = 0,
    /// North (y max), west (x min), back (z max).
    NorthWestBack = 1,
    /// North (y max), east (x max), front (z min).
    NorthEastFront = 2,
    /// North (y max), east (x max), back (z max).
    NorthEastBack = 3,
    /// South (y min), west (x min), front (z min).
    SouthWestFront = 4,
    /// South (y min), west (x min), back (z max).
    SouthWestBack = 5,
    /// South (y min), east (x max), front (z min).
    SouthEastFront = 6,
    /// South (y min), east (x max), back (z max).
    SouthEastBack = 7,
    /// Entities that straddle at least one cut plane.
    Icosep = 8,
}

impl Zone {
    /// The eight octants in index order.
    pub const OCTANTS: [Self; OCTANT_COUNT] = [
        Self::NorthWestFront,
        Self::NorthWestBack,
        Self::NorthEastFront,
        Self::NorthEastBack,
        Self::SouthWestFront,
        Self::SouthWestBack,
        Self::SouthEastFront,
        Self::SouthEastBack,
    ];

    /// Child slot index of this zone (0–7 for octants, 8 for icosep).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Zone for a child slot index, or `None` when out of range.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < OCTANT_COUNT {
            Some(Self::OCTANTS[index])
        } else if index == ICOSEP_SLOT {
            Some(Self::Icosep)
        } else {
            None
        }
    }

    /// Build an octant from its side on each axis (`true` = max side).
    #[inline]
    pub const fn from_sides(east: bool, north: bool, back: bool) -> Self {
        let idx = (back as usize) | ((east as usize) << 1) | ((!north as usize) << 2);
        Self::OCTANTS[idx]
    }

    /// Whether this is the icosep sentinel.
    #[inline]
    pub const fn is_icosep(self) -> bool {
        matches!(self, Self::Icosep)
    }

    /// Whether the zone covers the max side of the x axis.
    #[inline]
    pub const fn is_east(self) -> bool {
        !self.is_icosep() && self.index() & 0b010 != 0
    }

    /// Whether the zone covers the max side of the y axis.
    #[inline]
    pub const fn is_north(self) -> bool {
        !self.is_icosep() && self.index() & 0b100 == 0
    }

    /// Whether the zone covers the max side of the z axis.
    #[inline]
    pub const fn is_back(self) -> bool {
        !self.is_icosep() && self.index() & 0b001 != 0
    }
}

/// Where an entity falls relative to a cut point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Entirely within one octant.
    Octant(Zone),
    /// Crosses at least one of the three cut planes.
    Straddles,
}

/// Side of a single plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Low,
    High,
    Across,
}

#[inline]
fn side<T: PartialOrd>(min: T, max: T, cut: T) -> Side {
    if max <= cut {
        Side::Low
    } else if min >= cut {
        Side::High
    } else {
        Side::Across
    }
}

/// Classify entity bounds against the three planes through `cut`.
///
/// An entity is on the low side of an axis when its maximum is `<= cut`, and on
/// the high side when its minimum is `>= cut`; a flat box lying on the plane is
/// put on the low side. Straddling is a regular outcome, not an error.
pub fn classify<T: Copy + PartialOrd>(bounds: &Aabb3D<T>, cut: Point3D<T>) -> Classification {
    let sx = side(bounds.min_x, bounds.max_x, cut.x);
    let sy = side(bounds.min_y, bounds.max_y, cut.y);
    let sz = side(bounds.min_z, bounds.max_z, cut.z);
    if sx == Side::Across || sy == Side::Across || sz == Side::Across {
        return Classification::Straddles;
    }
    Classification::Octant(Zone::from_sides(
        sx == Side::High,
        sy == Side::High,
        sz == Side::High,
    ))
}

/// Derive the region of an octant from its parent region and the cut point.
///
/// Each axis takes either `[parent.min, cut]` or `[cut, parent.max]` depending
/// on the zone label. The icosep bucket has no region of its own (it is the
/// union of its entities' bounds), so `Zone::Icosep` yields `None`.
pub fn sub_area<T: Copy>(parent: &Aabb3D<T>, zone: Zone, cut: Point3D<T>) -> Option<Aabb3D<T>> {
    if zone.is_icosep() {
        return None;
    }
    let (min_x, max_x) = if zone.is_east() {
        (cut.x, parent.max_x)
    } else {
        (parent.min_x, cut.x)
    };
    let (min_y, max_y) = if zone.is_north() {
        (cut.y, parent.max_y)
    } else {
        (parent.min_y, cut.y)
    };
    let (min_z, max_z) = if zone.is_back() {
        (cut.z, parent.max_z)
    } else {
        (parent.min_z, cut.z)
    };
    Some(Aabb3D::new(min_x, min_y, min_z, max_x, max_y, max_z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Aabb3D<f64> {
        Aabb3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn zone_labels_match_index_bits() {
        assert_eq!(Zone::from_sides(true, true, true), Zone::NorthEastBack);
        assert_eq!(Zone::from_sides(false, false, false), Zone::SouthWestFront);
        assert_eq!(Zone::from_sides(false, true, false), Zone::NorthWestFront);
        assert_eq!(Zone::from_sides(true, false, true), Zone::SouthEastBack);
        for (i, z) in Zone::OCTANTS.iter().enumerate() {
            assert_eq!(z.index(), i);
            assert_eq!(Zone::from_index(i), Some(*z));
            assert_eq!(Zone::from_sides(z.is_east(), z.is_north(), z.is_back()), *z);
        }
        assert_eq!(Zone::from_index(ICOSEP_SLOT), Some(Zone::Icosep));
        assert_eq!(Zone::from_index(9), None);
    }

    #[test]
    fn north_east_back_takes_cut_as_minimum() {
        let cut = Point3D::new(0.25, 0.5, 0.75);
        let area = sub_area(&unit(), Zone::NorthEastBack, cut).unwrap();
        assert_eq!(area, Aabb3D::new(0.25, 0.5, 0.75, 1.0, 1.0, 1.0));
        let area = sub_area(&unit(), Zone::SouthWestFront, cut).unwrap();
        assert_eq!(area, Aabb3D::new(0.0, 0.0, 0.0, 0.25, 0.5, 0.75));
    }

    #[test]
    fn icosep_has_no_sub_area() {
        assert!(sub_area(&unit(), Zone::Icosep, Point3D::new(0.5, 0.5, 0.5)).is_none());
    }

    #[test]
    fn octant_regions_tile_the_parent() {
        let parent = Aabb3D::<f64>::new(-2.0, 0.0, 1.0, 6.0, 3.0, 2.0);
        let cut = Point3D::new(1.0, 2.5, 1.2);
        let areas: alloc::vec::Vec<_> = Zone::OCTANTS
            .iter()
            .map(|z| sub_area(&parent, *z, cut).unwrap())
            .collect();
        let total: f64 = areas.iter().map(Aabb3D::volume).sum();
        let pv: f64 = parent.volume();
        assert!((total - pv).abs() < 1e-9);
        let mut hull = areas[0];
        for a in &areas {
            assert!(parent.contains(a));
            hull = hull.union(a);
        }
        assert_eq!(hull, parent);
        for (i, a) in areas.iter().enumerate() {
            for b in &areas[i + 1..] {
                assert!(a.intersect(b).is_empty(), "octants share only faces");
            }
        }
    }

    #[test]
    fn classify_sides_and_straddle() {
        let cut = Point3D::new(0.5, 0.5, 0.5);
        let low = Aabb3D::new(0.1, 0.1, 0.1, 0.2, 0.2, 0.2);
        let high = Aabb3D::new(0.6, 0.6, 0.6, 0.9, 0.9, 0.9);
        let across = Aabb3D::new(0.4, 0.1, 0.1, 0.6, 0.2, 0.2);
        assert_eq!(
            classify(&low, cut),
            Classification::Octant(Zone::SouthWestFront)
        );
        assert_eq!(
            classify(&high, cut),
            Classification::Octant(Zone::NorthEastBack)
        );
        assert_eq!(classify(&across, cut), Classification::Straddles);
    }

    #[test]
    fn touching_the_plane_is_not_straddling() {
        let cut = Point3D::new(0.5, 0.5, 0.5);
        let touching_low = Aabb3D::new(0.1, 0.6, 0.6, 0.5, 0.9, 0.9);
        let touching_high = Aabb3D::new(0.5, 0.6, 0.6, 0.9, 0.9, 0.9);
        let flat_on_plane = Aabb3D::new(0.5, 0.6, 0.6, 0.5, 0.9, 0.9);
        assert_eq!(
            classify(&touching_low, cut),
            Classification::Octant(Zone::NorthWestBack)
        );
        assert_eq!(
            classify(&touching_high, cut),
            Classification::Octant(Zone::NorthEastBack)
        );
        assert_eq!(
            classify(&flat_on_plane, cut),
            Classification::Octant(Zone::NorthWestBack)
        );
    }

    #[test]
    fn classified_entity_lies_in_its_sub_area() {
        let parent = unit();
        let cut = Point3D::new(0.3, 0.7, 0.5);
        let e = Aabb3D::new(0.35, 0.1, 0.55, 0.4, 0.2, 0.9);
        let Classification::Octant(zone) = classify(&e, cut) else {
            panic!("entity should fit one octant");
        };
        assert_eq!(zone, Zone::SouthEastBack);
        assert!(sub_area(&parent, zone, cut).unwrap().contains(&e));
    }
}
