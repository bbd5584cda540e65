// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Multigrid: a hierarchical grid-of-grids index over 2D AABBs.
//!
//! Understory Multigrid is a broad-phase building block for many moving objects in a
//! bounded world.
//!
//! - Describe the world's subdivision once with a [`Subdivision`] tree: a root grid
//!   whose cells are either leaves or nested grids, to any depth.
//! - [`MultiGrid::build`] flattens that tree into two arrays ([`Cell`]s and
//!   [`GridPartition`]s) addressed by index, plus one bucket per leaf cell.
//! - Insert, move and remove caller-owned [`Object`]s; each lives in the bucket of every
//!   leaf cell its AABB overlaps.
//! - Query by point or by rectangle. Rectangle queries report each object once.
//!
//! Subdividing only the busy parts of the world keeps buckets small where objects
//! cluster, without paying for fine cells everywhere else. The tree shape is fixed after
//! the build; moving an object only touches the buckets it enters or leaves.
//!
//! Geometry is generic over the scalar type (`f32` or `f64`) and uses closed intervals:
//! boxes that touch along an edge or a corner overlap. Inside a partition, a coordinate
//! exactly on a grid line belongs to the cell above or to the right of it.
//!
//! # Example
//!
//! ```rust
//! use understory_multigrid::{Aabb2D, MultiGrid, Object, Subdivision};
//!
//! // A 4×4 world grid whose bottom-left cell is refined into 8×8.
//! let mut subdivision = Subdivision::new(4, 4);
//! subdivision.subdivide(0, 0, 8, 8);
//! let mut grid: MultiGrid<f64, u32> =
//!     MultiGrid::with_layout(Aabb2D::new(0.0, 0.0, 400.0, 400.0), &subdivision).unwrap();
//!
//! let mut a = Object::new(Aabb2D::new(10.0, 10.0, 20.0, 20.0), 1);
//! let mut b = Object::new(Aabb2D::new(90.0, 90.0, 150.0, 150.0), 2);
//! grid.insert(&mut a);
//! grid.insert(&mut b);
//!
//! // Move `a` next to `b`; only the buckets it leaves or enters change.
//! grid.update(&mut a, Aabb2D::new(140.0, 140.0, 160.0, 160.0));
//!
//! let hits = grid.query_rect(Aabb2D::new(145.0, 145.0, 146.0, 146.0));
//! assert_eq!(hits.len(), 2);
//! let at: Vec<_> = grid.query_point(15.0, 15.0).collect();
//! assert!(at.is_empty());
//! ```
//!
//! ## Objects outside the world
//!
//! The parts of an object's AABB beyond the world edge are attributed to the edge cells,
//! so a partially outside object is still found by queries inside the world. Objects
//! entirely outside the world are tracked but sit in no bucket, and queries that do
//! not reach the world return nothing.
//!
//! ## Features
//!
//! - `std` (default): forwards to Kurbo's `std` feature when `kurbo` is enabled.
//! - `libm`: forwards to Kurbo's `libm` feature for `no_std` builds.
//! - `kurbo`: conversions between `kurbo::Rect` and [`Aabb2D<f64>`], plus
//!   `hit_test_point`/`intersect_rect` helpers on `MultiGrid<f64, P>`.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in coordinates. A NaN coordinate is mapped to the first
//! row or column rather than rejected.
//!
//! Debug logging goes through the [`log`] facade: the build reports its array sizes at
//! `debug`, rejected builds at `warn`, and individual mutations at `trace`.

#![no_std]

extern crate alloc;

pub mod cell;
pub mod error;
pub mod grid;
pub mod layout;
pub mod object;
pub mod partition;
pub mod subdivision;
pub mod types;

#[cfg(feature = "kurbo")]
mod interop;

pub use cell::{Cell, CellKind};
pub use error::BuildError;
pub use grid::{Footprint, MultiGrid, MultiGridF32, MultiGridF64};
pub use layout::Layout;
pub use object::{Key, Object};
pub use partition::GridPartition;
pub use subdivision::{LayoutCounts, Subdivision};
pub use types::{Aabb2D, Scalar};
