// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Octree: 3D perception trees over bounded entities.
//!
//! Understory Octree indexes externally owned entities by their axis-aligned
//! bounds so that perception queries (point, range and frustum) do not scan
//! every entity.
//!
//! - Two flavours: a plain [`Octree`] and an [`IcosepOctree`], whose nodes have
//!   a ninth "icosep" bucket for entities that straddle the node's cut planes.
//! - Two ways to grow them: [`StaticTreeBuilder`] builds an immutable tree from
//!   a batch, and [`DynamicTree`] inserts and removes one entity at a time,
//!   splitting a leaf exactly when it overflows.
//! - Pluggable [`PartitionPolicy`] choosing where each node is cut:
//!   [`BoundCenter`] (default), [`MedianCenter`], [`RegionCenter`] and
//!   [`MinStraddle`].
//!
//! It is generic over the scalar type `T` (`f32`, `f64` or `i64`) and over the
//! entity handle `E`, and does not depend on any geometry crate. The tree never
//! owns entities; it keeps a copy of each handle and of the bounds it was
//! indexed with.
//!
//! # Example
//!
//! ```rust
//! use understory_octree::{Aabb3D, Frustum, IcosepOctreeBuilder, Point3D, TreeConfig};
//!
//! let universe = Aabb3D::new(0.0, 0.0, 0.0, 100.0, 100.0, 100.0);
//! let config = TreeConfig::new().with_splitting_count(2);
//! let tree = IcosepOctreeBuilder::<f64>::with_config(config)
//!     .build(
//!         Some(universe),
//!         [
//!             ("rock", Aabb3D::new(5.0, 5.0, 5.0, 10.0, 10.0, 10.0)),
//!             ("tree", Aabb3D::new(70.0, 0.0, 70.0, 75.0, 30.0, 75.0)),
//!             ("wall", Aabb3D::new(0.0, 0.0, 48.0, 100.0, 20.0, 52.0)),
//!         ],
//!     )
//!     .unwrap();
//!
//! // What does an agent looking at the south-west corner perceive?
//! let view = Frustum::from_aabb(&Aabb3D::new(0.0, 0.0, 0.0, 30.0, 30.0, 60.0));
//! let mut seen: Vec<_> = tree.query_frustum(&view).collect();
//! seen.sort();
//! assert_eq!(seen, ["rock", "wall"]);
//!
//! let hits: Vec<_> = tree.query_point(Point3D::new(72.0, 10.0, 72.0)).collect();
//! assert_eq!(hits, ["tree"]);
//! ```
//!
//! ## Axes and zones
//!
//! x runs from west (min) to east (max), y from south (min) to north (max) and
//! z from front (min) to back (max). The octants around a cut point are the
//! eight [`Zone`]s; [`Zone::Icosep`] names the bucket slot of icosep trees.
//! An entity touching a cut plane from one side is not straddling it.
//!
//! ## Straddlers and the universe
//!
//! Icosep trees send straddling entities to the icosep bucket of the node they
//! straddle. Plain octrees follow [`StraddlePolicy`]. Dynamic trees handle
//! entities reaching outside the universe according to [`UniverseOverflow`]
//! (rejected by default); static builders always reject them.
//!
//! ## Logging
//!
//! Subdivisions and universe growth are reported through the `log` facade at
//! `debug` level, descents at `trace` level, and populations that cannot be
//! separated at `warn` level. No logger is installed by this crate.
//!
//! ### Float semantics
//!
//! NaN coordinates are rejected as malformed bounds. Means, volumes and plane
//! distances use widened accumulators (f32→f64, f64→f64, i64→i128).

#![no_std]

extern crate alloc;

mod builder;
mod config;
mod dynamic;
mod error;
mod frustum;
mod node;
mod policy;
mod split;
mod tree;
mod types;
mod zone;

pub use builder::{IcosepOctreeBuilder, OctreeBuilder, StaticTreeBuilder};
pub use config::{StraddlePolicy, TreeConfig, UniverseOverflow};
pub use dynamic::{DynamicIcosepOctree, DynamicOctree, DynamicTree};
pub use error::{Error, Result};
pub use frustum::{Coverage, Frustum, Plane3D};
pub use node::{Entry, NodeId};
pub use policy::{
    BoundCenter, MedianCenter, MinStraddle, PartitionPolicy, RegionCenter, clamp_point,
};
pub use tree::{
    ICOSEP_ARITY, IcosepOctree, NodeKind, NodeView, Nodes, OCTREE_ARITY, Octree, Traversal, Tree,
};
pub use types::{Aabb3D, Point3D, Scalar, ScalarAcc};
pub use zone::{Classification, ICOSEP_SLOT, OCTANT_COUNT, Zone, classify, sub_area};
