// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by [`MultiGrid::build`](crate::MultiGrid::build).

use core::fmt;

/// Why a layout could not be built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// A subdivision node has zero rows or zero columns.
    EmptySubdivision {
        /// Depth of the offending node; the root is at depth 0.
        depth: usize,
        /// Rows requested by the node.
        rows: u8,
        /// Columns requested by the node.
        columns: u8,
    },
    /// The world region has non-positive width or height.
    DegenerateWorld,
    /// A subdivided cell became too small to represent (its computed box has no area).
    DegenerateRegion {
        /// Depth of the node whose region collapsed.
        depth: usize,
    },
    /// The flattened arrays would not be addressable by a [`Cell`](crate::Cell).
    TooManyCells {
        /// Number of cells requested (saturated at `usize::MAX`).
        cells: usize,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySubdivision {
                depth,
                rows,
                columns,
            } => write!(
                f,
                "subdivision at depth {depth} has {rows} rows and {columns} columns; \
                 both must be at least 1"
            ),
            Self::DegenerateWorld => {
                f.write_str("world region must have positive width and height")
            }
            Self::DegenerateRegion { depth } => {
                write!(f, "subdivided region at depth {depth} has no area")
            }
            Self::TooManyCells { cells } => write!(
                f,
                "layout needs {cells} cells, more than a cell index can address"
            ),
        }
    }
}

impl core::error::Error for BuildError {}
