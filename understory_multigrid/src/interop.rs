// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions to and from [`kurbo`] geometry (feature `kurbo`).

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Point, Rect};

use crate::grid::MultiGrid;
use crate::object::Key;
use crate::types::Aabb2D;

impl From<Rect> for Aabb2D<f64> {
    /// Normalizes the rectangle, so a rect with negative width still maps to a valid box.
    fn from(r: Rect) -> Self {
        Self::new(r.min_x(), r.min_y(), r.max_x(), r.max_y())
    }
}

impl From<Aabb2D<f64>> for Rect {
    fn from(a: Aabb2D<f64>) -> Self {
        Self::new(a.min_x, a.min_y, a.max_x, a.max_y)
    }
}

impl<P: Copy + Debug> MultiGrid<f64, P> {
    /// [`MultiGrid::query_point`] for a [`Point`].
    pub fn hit_test_point(&self, pt: Point) -> impl Iterator<Item = (Key, P)> + '_ {
        self.query_point(pt.x, pt.y)
    }

    /// [`MultiGrid::query_rect`] for a [`Rect`].
    pub fn intersect_rect(&mut self, rect: Rect) -> Vec<(Key, P)> {
        self.query_rect(rect.into())
    }
}
