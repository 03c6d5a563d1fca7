// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;

/// A point in 3D space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point3D<T> {
    /// x (west → east)
    pub x: T,
    /// y (south → north)
    pub y: T,
    /// z (front → back)
    pub z: T,
}

impl<T> Point3D<T> {
    /// Create a new point.
    #[inline(always)]
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb3D<T> {
    /// Minimum x (west)
    pub min_x: T,
    /// Minimum y (south)
    pub min_y: T,
    /// Minimum z (front)
    pub min_z: T,
    /// Maximum x (east)
    pub max_x: T,
    /// Maximum y (north)
    pub max_y: T,
    /// Maximum z (back)
    pub max_z: T,
}

impl<T> Aabb3D<T> {
    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, min_z: T, max_x: T, max_y: T, max_z: T) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }
}

impl<T: Copy> Aabb3D<T> {
    /// Zero-extent box located at a single point.
    #[inline]
    pub const fn from_point(p: Point3D<T>) -> Self {
        Self::new(p.x, p.y, p.z, p.x, p.y, p.z)
    }

    /// Minimum corner.
    #[inline]
    pub const fn min(&self) -> Point3D<T> {
        Point3D::new(self.min_x, self.min_y, self.min_z)
    }

    /// Maximum corner.
    #[inline]
    pub const fn max(&self) -> Point3D<T> {
        Point3D::new(self.max_x, self.max_y, self.max_z)
    }
}

impl<T: Copy + PartialOrd> Aabb3D<T> {
    /// Whether this AABB contains the point (boundary inclusive).
    #[inline]
    pub fn contains_point(&self, p: Point3D<T>) -> bool {
        self.min_x <= p.x
            && self.min_y <= p.y
            && self.min_z <= p.z
            && p.x <= self.max_x
            && p.y <= self.max_y
            && p.z <= self.max_z
    }

    /// Whether `other` lies entirely inside this AABB (boundary inclusive).
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.min_z <= other.min_z
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
            && other.max_z <= self.max_z
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// The boundary is part of the box, so two AABBs that share a face are
    /// considered to overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use understory_octree::Aabb3D;
    ///
    /// let a = Aabb3D::new(0.0, 0.0, 0.0, 10.0, 10.0, 10.0);
    /// let b = Aabb3D::new(10.0, 0.0, 0.0, 20.0, 10.0, 10.0);
    /// assert!(a.overlaps(&b));
    ///
    /// let c = Aabb3D::new(11.0, 0.0, 0.0, 20.0, 10.0, 10.0);
    /// assert!(!a.overlaps(&c));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
            && self.min_z <= other.max_z
            && self.max_z >= other.min_z
    }

    /// The intersection of two AABBs. The result may be inverted when they are disjoint.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min_x: max_t(self.min_x, other.min_x),
            min_y: max_t(self.min_y, other.min_y),
            min_z: max_t(self.min_z, other.min_z),
            max_x: min_t(self.max_x, other.max_x),
            max_y: min_t(self.max_y, other.max_y),
            max_z: min_t(self.max_z, other.max_z),
        }
    }

    /// The smallest AABB enclosing two AABBs.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: min_t(self.min_x, other.min_x),
            min_y: min_t(self.min_y, other.min_y),
            min_z: min_t(self.min_z, other.min_z),
            max_x: max_t(self.max_x, other.max_x),
            max_y: max_t(self.max_y, other.max_y),
            max_z: max_t(self.max_z, other.max_z),
        }
    }

    /// Project this box onto `target`: every coordinate is clamped into the target's range.
    ///
    /// A box lying fully outside `target` becomes a flat box on its nearest face.
    #[inline]
    pub fn clamp_into(&self, target: &Self) -> Self {
        let c = |v: T, lo: T, hi: T| max_t(lo, min_t(v, hi));
        Self {
            min_x: c(self.min_x, target.min_x, target.max_x),
            min_y: c(self.min_y, target.min_y, target.max_y),
            min_z: c(self.min_z, target.min_z, target.max_z),
            max_x: c(self.max_x, target.min_x, target.max_x),
            max_y: c(self.max_y, target.min_y, target.max_y),
            max_z: c(self.max_z, target.min_z, target.max_z),
        }
    }

    /// Return true if the AABB has no volume (flat, inverted or NaN on some axis).
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.max_x > self.min_x && self.max_y > self.min_y && self.max_z > self.min_z)
    }

    /// Return true if `min <= max` on every axis. NaN coordinates are invalid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y && self.min_z <= self.max_z
    }
}

impl<T: Scalar> Aabb3D<T> {
    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Point3D<T> {
        Point3D::new(
            T::mid(self.min_x, self.max_x),
            T::mid(self.min_y, self.max_y),
            T::mid(self.min_z, self.max_z),
        )
    }

    /// Compute the volume of an AABB using the scalar's widened accumulator type.
    #[inline]
    pub fn volume(&self) -> T::Acc {
        let w = T::max(T::sub(self.max_x, self.min_x), T::zero());
        let h = T::max(T::sub(self.max_y, self.min_y), T::zero());
        let d = T::max(T::sub(self.max_z, self.min_z), T::zero());
        T::acc_mul(T::acc_mul(T::widen(w), T::widen(h)), T::widen(d))
    }
}

/// Numeric scalar abstraction for 3D AABBs.
///
/// This trait provides the operations required by partition policies and
/// frustum tests, and an associated widened accumulator type used for means,
/// volumes and plane distances (e.g., f32→f64, i64→i128).
///
/// Products and sums of accumulators go through [`Scalar::acc_mul`] and
/// [`Scalar::acc_add`]. For `i64` these saturate at the `i128` range, so the
/// volume of a box spanning the whole `i64` range is `i128::MAX`.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type suitable for sums and products.
    type Acc: Copy
        + PartialOrd
        + core::ops::Add<Output = Self::Acc>
        + core::ops::Sub<Output = Self::Acc>
        + core::ops::Mul<Output = Self::Acc>
        + core::ops::Div<Output = Self::Acc>
        + Debug;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// One, used for unit plane normals.
    fn one() -> Self;

    /// Max of the two scalar values.
    fn max(a: Self, b: Self) -> Self;

    /// Min of the two scalar values.
    fn min(a: Self, b: Self) -> Self;

    /// Midpoint between a and b.
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// Convert an accumulator value back to the scalar type, saturating if needed.
    fn narrow(v: Self::Acc) -> Self;

    /// Convert a `usize` to the accumulator type (for averaging).
    fn acc_from_usize(n: usize) -> Self::Acc;

    /// Sum of two accumulator values, saturating for integers.
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// Product of two accumulator values, saturating for integers.
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc;
}

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        Self::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        Self::min(a, b)
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as f64
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Narrowing an f64 mean of f32 inputs stays within f32 range."
    )]
    #[inline]
    fn narrow(v: Self::Acc) -> Self {
        v as Self
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as f64
    }

    #[inline]
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a + b
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a * b
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        Self::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        Self::min(a, b)
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline(always)]
    fn widen(v: Self) -> Self::Acc {
        v
    }

    #[inline(always)]
    fn narrow(v: Self::Acc) -> Self {
        v
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as Self::Acc
    }

    #[inline]
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a + b
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a * b
    }
}

impl Scalar for i64 {
    type Acc = i128;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a.saturating_add(b)
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline(always)]
    fn one() -> Self {
        1
    }

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        core::cmp::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        core::cmp::min(a, b)
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        // Average without overflow: (a & b) + ((a ^ b) >> 1)
        (a & b) + ((a ^ b) >> 1)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as i128
    }

    #[inline]
    fn narrow(v: Self::Acc) -> Self {
        Self::try_from(v).unwrap_or(if v < 0 { Self::MIN } else { Self::MAX })
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as i128
    }

    #[inline]
    fn acc_add(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_add(b)
    }

    #[inline]
    fn acc_mul(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_mul(b)
    }
}

/// Helper alias for the widened accumulator type `Scalar::Acc` associated with a `T: Scalar`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

/// Total order helper for sorting scalars that may be floats. Assumes no NaN.
pub(crate) fn cmp_t<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::{Aabb3D, Point3D, Scalar};

    #[test]
    fn aabb_volume_and_empty() {
        const EPSILON: f64 = 1e-10;

        let mut aabb = Aabb3D::<f64>::new(5., 7., 1., 10., 9., 4.);
        assert!((aabb.volume() - 5. * 2. * 3.).abs() < EPSILON);
        assert!(!aabb.is_empty());
        assert!(aabb.is_valid());

        // "negative" AABBs are considered empty (and get zero volume)
        aabb.max_z = -aabb.max_z;
        assert!(aabb.volume() < EPSILON);
        assert!(aabb.is_empty());
        assert!(!aabb.is_valid());

        // flat AABBs are considered empty but are still valid entity bounds
        aabb.max_z = aabb.min_z;
        assert!(aabb.volume() < EPSILON);
        assert!(aabb.is_empty());
        assert!(aabb.is_valid());
    }

    #[test]
    fn nan_bounds_are_invalid_and_empty() {
        let aabb = Aabb3D::new(0.0, f64::NAN, 0.0, 1.0, 1.0, 1.0);
        assert!(!aabb.is_valid());
        assert!(aabb.is_empty());
    }

    #[test]
    fn union_contains_both_inputs() {
        let a = Aabb3D::new(0, 0, 0, 2, 2, 2);
        let b = Aabb3D::new(-1, 1, 1, 1, 5, 3);
        let u = a.union(&b);
        assert_eq!(u, Aabb3D::new(-1, 0, 0, 2, 5, 3));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }

    #[test]
    fn clamp_into_projects_onto_target() {
        let universe = Aabb3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let outside = Aabb3D::new(2.0, 0.2, 0.2, 3.0, 0.4, 0.4);
        let clamped = outside.clamp_into(&universe);
        assert_eq!(clamped, Aabb3D::new(1.0, 0.2, 0.2, 1.0, 0.4, 0.4));
        assert!(universe.contains(&clamped));
    }

    #[test]
    fn center_of_integer_box_does_not_overflow() {
        let aabb = Aabb3D::new(i64::MAX - 2, 0, 0, i64::MAX, 4, 8);
        assert_eq!(aabb.center(), Point3D::new(i64::MAX - 1, 2, 4));
    }

    #[test]
    fn i64_narrow_saturates() {
        assert_eq!(<i64 as Scalar>::narrow(i128::MAX), i64::MAX);
        assert_eq!(<i64 as Scalar>::narrow(i128::MIN), i64::MIN);
        assert_eq!(<i64 as Scalar>::narrow(42), 42);
    }

    #[test]
    fn full_range_integer_volume_saturates() {
        assert_eq!(Aabb3D::new(0_i64, 0, 0, 2, 3, 4).volume(), 24);
        let all = Aabb3D::new(i64::MIN, i64::MIN, i64::MIN, i64::MAX, i64::MAX, i64::MAX);
        assert_eq!(all.volume(), i128::MAX);
    }
}
