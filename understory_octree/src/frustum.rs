// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex volumes bounded by planes, used for visibility queries.
//!
//! Plane normals point inward: a point `p` is inside a plane when
//! `nx * p.x + ny * p.y + nz * p.z + d >= 0`, and inside the frustum when it
//! is inside every plane. Distances are evaluated in the scalar's widened
//! accumulator, so integer frusta do not overflow.

use smallvec::SmallVec;

use crate::types::{Aabb3D, Point3D, Scalar};

/// Result of a 3-way region classification.
///
/// Used by tree queries for hierarchical pruning:
/// - `Outside`: skip the entire subtree
/// - `Inside`: collect every entity in the subtree without further tests
/// - `Partial`: test entities individually and descend
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// Entirely outside the query volume.
    Outside,
    /// Entirely inside the query volume.
    Inside,
    /// Partially overlapping the query volume.
    Partial,
}

/// Plane `nx * x + ny * y + nz * z + d = 0` with an inward normal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane3D<T> {
    /// Normal x component.
    pub nx: T,
    /// Normal y component.
    pub ny: T,
    /// Normal z component.
    pub nz: T,
    /// Offset.
    pub d: T,
}

impl<T: Scalar> Plane3D<T> {
    /// Create a plane from its inward normal and offset.
    #[inline]
    pub const fn new(nx: T, ny: T, nz: T, d: T) -> Self {
        Self { nx, ny, nz, d }
    }

    /// Signed distance (scaled by the normal length) of a point to the plane.
    #[inline]
    pub fn signed_distance(&self, p: Point3D<T>) -> T::Acc {
        let x = T::acc_mul(T::widen(self.nx), T::widen(p.x));
        let y = T::acc_mul(T::widen(self.ny), T::widen(p.y));
        let z = T::acc_mul(T::widen(self.nz), T::widen(p.z));
        T::acc_add(T::acc_add(T::acc_add(x, y), z), T::widen(self.d))
    }

    /// Box corner furthest along the normal.
    #[inline]
    fn positive_vertex(&self, b: &Aabb3D<T>) -> Point3D<T> {
        let zero = T::zero();
        Point3D::new(
            if self.nx >= zero { b.max_x } else { b.min_x },
            if self.ny >= zero { b.max_y } else { b.min_y },
            if self.nz >= zero { b.max_z } else { b.min_z },
        )
    }

    /// Box corner furthest against the normal.
    #[inline]
    fn negative_vertex(&self, b: &Aabb3D<T>) -> Point3D<T> {
        let zero = T::zero();
        Point3D::new(
            if self.nx >= zero { b.min_x } else { b.max_x },
            if self.ny >= zero { b.min_y } else { b.max_y },
            if self.nz >= zero { b.min_z } else { b.max_z },
        )
    }
}

/// Convex volume bounded by inward-facing planes (six for a view frustum).
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum<T> {
    planes: SmallVec<[Plane3D<T>; 6]>,
}

impl<T: Scalar> Frustum<T> {
    /// Build a frustum from its planes.
    ///
    /// The caller computes the planes (for example from an agent's view
    /// projection); any number of planes is accepted.
    pub fn new(planes: impl IntoIterator<Item = Plane3D<T>>) -> Self {
        Self {
            planes: planes.into_iter().collect(),
        }
    }

    /// The six planes of an axis-aligned box, useful for range perception.
    pub fn from_aabb(b: &Aabb3D<T>) -> Self {
        let (z, o) = (T::zero(), T::one());
        let neg = |v: T| T::sub(z, v);
        Self::new([
            Plane3D::new(o, z, z, neg(b.min_x)),
            Plane3D::new(neg(o), z, z, b.max_x),
            Plane3D::new(z, o, z, neg(b.min_y)),
            Plane3D::new(z, neg(o), z, b.max_y),
            Plane3D::new(z, z, o, neg(b.min_z)),
            Plane3D::new(z, z, neg(o), b.max_z),
        ])
    }

    /// Planes bounding this frustum.
    pub fn planes(&self) -> &[Plane3D<T>] {
        &self.planes
    }

    /// Whether the point is inside every plane.
    pub fn contains_point(&self, p: Point3D<T>) -> bool {
        let zero = T::widen(T::zero());
        self.planes.iter().all(|pl| pl.signed_distance(p) >= zero)
    }

    /// Conservative box test: `false` only when the box is certainly outside.
    pub fn intersects_aabb(&self, b: &Aabb3D<T>) -> bool {
        let zero = T::widen(T::zero());
        self.planes
            .iter()
            .all(|pl| pl.signed_distance(pl.positive_vertex(b)) >= zero)
    }

    /// Classify a box against the frustum.
    ///
    /// If the positive vertex is outside any plane the box is `Outside`; if the
    /// negative vertex is inside every plane the box is `Inside`; otherwise it
    /// is `Partial`.
    pub fn classify_aabb(&self, b: &Aabb3D<T>) -> Coverage {
        let zero = T::widen(T::zero());
        let mut result = Coverage::Inside;
        for pl in &self.planes {
            if pl.signed_distance(pl.positive_vertex(b)) < zero {
                return Coverage::Outside;
            }
            if pl.signed_distance(pl.negative_vertex(b)) < zero {
                result = Coverage::Partial;
            }
        }
        result
    }
}
