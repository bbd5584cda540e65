// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! User-authored description of how the world is subdivided.

use alloc::vec;
use alloc::vec::Vec;

use crate::cell::Cell;
use crate::error::BuildError;

/// A node of the subdivision description consumed by
/// [`MultiGrid::build`](crate::MultiGrid::build).
///
/// Each node splits its region into `rows × columns` equal cells. Every cell is either
/// a leaf (the default) or is itself subdivided by a nested `Subdivision`.
///
/// The description is only read during the build; the index does not retain it.
///
/// ```
/// use understory_multigrid::Subdivision;
///
/// // A 2×2 root whose bottom-left cell is split again into 4×4.
/// let mut subdivision = Subdivision::new(2, 2);
/// subdivision.subdivide(0, 0, 4, 4);
/// assert!(subdivision.child(0, 0).is_some());
/// assert!(subdivision.child(1, 1).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subdivision {
    rows: u8,
    columns: u8,
    children: Vec<Option<Self>>,
}

/// Sizes of the flattened arrays a subdivision produces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutCounts {
    /// Cells, including the root cell that stands for the whole world.
    pub cells: usize,
    /// Grid partitions, one per subdivided node (the root included).
    pub partitions: usize,
    /// Leaf cells, one bucket each.
    pub leaves: usize,
}

impl Subdivision {
    /// A node of `rows × columns` leaf cells.
    ///
    /// Zero rows or columns are accepted here and rejected by the build.
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            children: vec![None; usize::from(rows) * usize::from(columns)],
        }
    }

    /// A node of `rows × columns` cells, each subdivided by a copy of `child`.
    pub fn uniform(rows: u8, columns: u8, child: &Self) -> Self {
        Self {
            rows,
            columns,
            children: vec![Some(child.clone()); usize::from(rows) * usize::from(columns)],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> u8 {
        self.columns
    }

    /// The nested subdivision of cell `(row, col)`, or `None` for a leaf.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is out of range.
    pub fn child(&self, row: u8, col: u8) -> Option<&Self> {
        self.children[self.offset(row, col)].as_ref()
    }

    /// Replace cell `(row, col)` with `child`, or turn it back into a leaf with `None`.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is out of range.
    pub fn set_child(&mut self, row: u8, col: u8, child: Option<Self>) {
        let i = self.offset(row, col);
        self.children[i] = child;
    }

    /// Builder form of [`Subdivision::set_child`].
    #[must_use]
    pub fn with_child(mut self, row: u8, col: u8, child: Self) -> Self {
        self.set_child(row, col, Some(child));
        self
    }

    /// Split cell `(row, col)` into `rows × columns` leaves and return the new node
    /// for further refinement.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is out of range.
    pub fn subdivide(&mut self, row: u8, col: u8, rows: u8, columns: u8) -> &mut Self {
        let i = self.offset(row, col);
        self.children[i].insert(Self::new(rows, columns))
    }

    /// Children in row-major order; `None` marks a leaf.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Option<&Self>> + '_ {
        self.children.iter().map(Option::as_ref)
    }

    /// Validate the whole tree and count the flattened array sizes.
    ///
    /// Walks the tree with an explicit stack, so depth is bounded by memory only.
    pub fn counts(&self) -> Result<LayoutCounts, BuildError> {
        // The root cell stands for the world and is not a child of any node.
        let mut counts = LayoutCounts {
            cells: 1,
            ..LayoutCounts::default()
        };
        let mut stack = vec![(self, 0_usize)];
        while let Some((node, depth)) = stack.pop() {
            if node.rows == 0 || node.columns == 0 {
                return Err(BuildError::EmptySubdivision {
                    depth,
                    rows: node.rows,
                    columns: node.columns,
                });
            }
            counts.partitions += 1;
            counts.cells = counts
                .cells
                .checked_add(node.children.len())
                .ok_or(BuildError::TooManyCells { cells: usize::MAX })?;
            for child in &node.children {
                match child {
                    Some(child) => stack.push((child, depth + 1)),
                    None => counts.leaves += 1,
                }
            }
        }
        let limit = Cell::MAX_INDEX as usize + 1;
        if counts.cells > limit || counts.partitions > limit || counts.leaves > limit {
            return Err(BuildError::TooManyCells {
                cells: counts.cells,
            });
        }
        Ok(counts)
    }

    fn offset(&self, row: u8, col: u8) -> usize {
        assert!(
            row < self.rows && col < self.columns,
            "subdivision cell ({row}, {col}) out of range for {}×{}",
            self.rows,
            self.columns
        );
        usize::from(row) * usize::from(self.columns) + usize::from(col)
    }
}
