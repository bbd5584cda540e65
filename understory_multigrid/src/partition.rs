// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform rows × columns decomposition of one rectangular region.

use alloc::vec::Vec;

use crate::types::{Aabb2D, Scalar, lt};

/// A single uniform grid over one region of the world.
///
/// Row `r` spans the `r`-th band of the y extent starting at `min_y`, and column `c`
/// the `c`-th band of the x extent starting at `min_x`. The cells of a partition
/// are stored contiguously in the flattened cell array, row-major, starting at
/// [`GridPartition::first_cell`].
///
/// ## Boundary rule
///
/// Cell ranges are half-open, `[low, high)`, on both axes. A coordinate lying exactly
/// on an internal grid line belongs to the cell whose low edge it is. Coordinates at
/// or beyond the partition's max edge saturate into the last row/column, and
/// coordinates at or below the min edge into the first, so every lookup resolves to
/// exactly one cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridPartition<T> {
    bounds: Aabb2D<T>,
    rows: u8,
    columns: u8,
    inv_x: T,
    inv_y: T,
    first_cell: u32,
}

impl<T: Scalar> GridPartition<T> {
    /// Create a partition of `bounds` into `rows × columns` cells whose flat indices
    /// start at `first_cell`.
    ///
    /// # Panics
    ///
    /// Panics if `rows` or `columns` is zero, or if `bounds` has non-positive width or height.
    pub fn new(rows: u8, columns: u8, bounds: Aabb2D<T>, first_cell: u32) -> Self {
        assert!(
            rows > 0 && columns > 0,
            "a grid partition needs at least one row and one column"
        );
        assert!(
            bounds.has_area(),
            "grid partition bounds must have positive width and height"
        );
        Self {
            bounds,
            rows,
            columns,
            inv_x: T::from_count(columns) / bounds.width(),
            inv_y: T::from_count(rows) / bounds.height(),
            first_cell,
        }
    }

    /// The region this partition covers.
    pub fn bounds(&self) -> Aabb2D<T> {
        self.bounds
    }

    /// Number of rows.
    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> u8 {
        self.columns
    }

    /// Flat index of this partition's first cell.
    pub fn first_cell(&self) -> usize {
        self.first_cell as usize
    }

    /// Number of cells (`rows × columns`), never zero.
    pub fn cell_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.columns)
    }

    /// Whether `offset` is a valid row-major offset into this partition.
    pub fn is_valid_offset(&self, offset: usize) -> bool {
        offset < self.cell_count()
    }

    /// Flat cell index of `(row, col)`.
    #[inline]
    pub fn cell_index(&self, row: usize, col: usize) -> usize {
        debug_assert!(
            row < usize::from(self.rows) && col < usize::from(self.columns),
            "row/column out of range"
        );
        self.first_cell() + row * usize::from(self.columns) + col
    }

    /// Flat cell index of the row-major `offset`.
    #[inline]
    pub fn cell_index_at_offset(&self, offset: usize) -> usize {
        debug_assert!(self.is_valid_offset(offset), "cell offset out of range");
        self.first_cell() + offset
    }

    /// Column containing `x`, saturating at the edges.
    #[inline]
    pub fn column_of(&self, x: T) -> usize {
        Self::band(x, self.bounds.min_x, self.bounds.max_x, self.inv_x, self.columns)
    }

    /// Row containing `y`, saturating at the edges.
    #[inline]
    pub fn row_of(&self, y: T) -> usize {
        Self::band(y, self.bounds.min_y, self.bounds.max_y, self.inv_y, self.rows)
    }

    /// Flat index of the cell containing `(x, y)`.
    ///
    /// Positions outside the partition are clamped onto its nearest edge cell.
    #[inline]
    pub fn cell_at(&self, x: T, y: T) -> usize {
        self.cell_index(self.row_of(y), self.column_of(x))
    }

    /// Append the flat indices of every cell `rect` overlaps, in row-major order.
    ///
    /// Nothing is appended if `rect` does not overlap [`GridPartition::bounds`]. The
    /// result is the covered row/column rectangle, so it may include cells that only
    /// the coarse range touches; callers apply a precise AABB test afterwards.
    pub fn cells_overlapping(&self, rect: &Aabb2D<T>, out: &mut Vec<usize>) {
        if !rect.overlaps(&self.bounds) {
            return;
        }
        self.cells_saturating(rect, out);
    }

    /// Like [`GridPartition::cells_overlapping`] without the bounds check: parts of
    /// `rect` outside the partition saturate into the edge cells.
    pub fn cells_saturating(&self, rect: &Aabb2D<T>, out: &mut Vec<usize>) {
        let (col_begin, col_end) = (self.column_of(rect.min_x), self.column_of(rect.max_x));
        let (row_begin, row_end) = (self.row_of(rect.min_y), self.row_of(rect.max_y));
        for row in row_begin..=row_end {
            for col in col_begin..=col_end {
                out.push(self.cell_index(row, col));
            }
        }
    }

    /// World-space box of cell `(row, col)`.
    ///
    /// The last row and column end exactly on the partition's max edges.
    pub fn cell_bounds(&self, row: u8, col: u8) -> Aabb2D<T> {
        debug_assert!(
            row < self.rows && col < self.columns,
            "row/column out of range"
        );
        let b = &self.bounds;
        let split = |min: T, max: T, i: u8, n: u8| {
            if i >= n {
                max
            } else {
                min + (max - min) * T::from_count(i) / T::from_count(n)
            }
        };
        Aabb2D::new(
            split(b.min_x, b.max_x, col, self.columns),
            split(b.min_y, b.max_y, row, self.rows),
            split(b.min_x, b.max_x, col + 1, self.columns),
            split(b.min_y, b.max_y, row + 1, self.rows),
        )
    }

    fn band(v: T, min: T, max: T, inv: T, count: u8) -> usize {
        let last = usize::from(count) - 1;
        if !lt(min, v) {
            return 0;
        }
        if !lt(v, max) {
            return last;
        }
        T::to_offset((v - min) * inv).min(last)
    }
}
