// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattened partition tree and the builder that produces it.
//!
//! A [`Subdivision`] tree of arbitrary depth is compiled into two flat arrays:
//! `cells` and `partitions`. Cell 0 is the root matrix cell covering the world;
//! every matrix cell points at a [`GridPartition`], and the cells of a partition
//! are stored contiguously starting at its [`GridPartition::first_cell`]. Leaf
//! cells point at bucket slots numbered `0..leaf_count`, which the owning
//! [`MultiGrid`](crate::MultiGrid) allocates.
//!
//! Flattening is breadth-first over a queue with arrays sized from
//! [`Subdivision::counts`] up front, so nothing grows during the traversal.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::cell::{Cell, CellKind};
use crate::error::BuildError;
use crate::partition::GridPartition;
use crate::subdivision::{LayoutCounts, Subdivision};
use crate::types::{Aabb2D, Scalar};

/// Immutable, index-addressed partition tree.
#[derive(Clone)]
pub struct Layout<T> {
    world: Aabb2D<T>,
    cells: Vec<Cell>,
    partitions: Vec<GridPartition<T>>,
    leaf_count: usize,
}

/// Scratch buffers for [`Layout`] descents.
#[derive(Clone, Debug, Default)]
pub(crate) struct Descent {
    cells: Vec<usize>,
    worklist: Vec<u32>,
}

impl Descent {
    pub(crate) fn heap_bytes(&self) -> usize {
        self.cells.capacity() * size_of::<usize>() + self.worklist.capacity() * size_of::<u32>()
    }
}

impl<T: Scalar> Layout<T> {
    /// Compile `subdivision` over `world` into flat arrays.
    pub fn build(world: Aabb2D<T>, subdivision: &Subdivision) -> Result<Self, BuildError> {
        let counts = subdivision.counts()?;
        if !world.has_area() {
            return Err(BuildError::DegenerateWorld);
        }

        let mut cells = Vec::with_capacity(counts.cells);
        let mut partitions = Vec::with_capacity(counts.partitions);
        let mut leaves = 0_u32;
        // Partition indices are assigned at enqueue time. The queue is FIFO, so they
        // match the order in which partitions are pushed below.
        let mut queued = 1_u32;

        cells.push(Cell::matrix(0));
        let mut queue = VecDeque::new();
        queue.push_back((subdivision, world, 0_usize));

        while let Some((node, bounds, depth)) = queue.pop_front() {
            let partition =
                GridPartition::new(node.rows(), node.columns(), bounds, to_index(cells.len()));
            let mut children = node.children();
            for row in 0..node.rows() {
                for col in 0..node.columns() {
                    match children.next().flatten() {
                        None => {
                            cells.push(Cell::leaf(leaves));
                            leaves += 1;
                        }
                        Some(child) => {
                            let child_bounds = partition.cell_bounds(row, col);
                            if !child_bounds.has_area() {
                                return Err(BuildError::DegenerateRegion { depth: depth + 1 });
                            }
                            cells.push(Cell::matrix(queued));
                            queued += 1;
                            queue.push_back((child, child_bounds, depth + 1));
                        }
                    }
                }
            }
            partitions.push(partition);
        }

        debug_assert_eq!(cells.len(), counts.cells, "cell array not exactly filled");
        debug_assert_eq!(
            partitions.len(),
            counts.partitions,
            "partition array not exactly filled"
        );
        debug_assert_eq!(
            leaves as usize,
            counts.leaves,
            "leaf buckets not exactly assigned"
        );
        debug_assert_eq!(
            queued as usize,
            counts.partitions,
            "partition indices not exactly assigned"
        );

        log::debug!(
            "built multigrid layout: {} cells, {} partitions, {} leaves",
            counts.cells,
            counts.partitions,
            counts.leaves
        );

        Ok(Self {
            world,
            cells,
            partitions,
            leaf_count: counts.leaves,
        })
    }

    /// The root region.
    pub fn world(&self) -> Aabb2D<T> {
        self.world
    }

    /// All cells, breadth-first; cell 0 is the root.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All grid partitions; partition 0 covers the world.
    pub fn partitions(&self) -> &[GridPartition<T>] {
        &self.partitions
    }

    /// Number of leaf cells, and so of leaf buckets.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Array sizes of this layout.
    pub fn counts(&self) -> LayoutCounts {
        LayoutCounts {
            cells: self.cells.len(),
            partitions: self.partitions.len(),
            leaves: self.leaf_count,
        }
    }

    /// Leaf bucket of the leaf cell containing `(x, y)`, or `None` outside the world.
    pub fn leaf_at(&self, x: T, y: T) -> Option<u32> {
        if !self.world.contains_point(x, y) {
            return None;
        }
        let mut cell = self.cells[0];
        loop {
            match cell.kind() {
                CellKind::Leaf(bucket) => return Some(bucket),
                CellKind::Matrix(partition) => {
                    cell = self.cells[self.partitions[partition as usize].cell_at(x, y)];
                }
            }
        }
    }

    /// Append the leaf buckets of every leaf cell `rect` reaches.
    ///
    /// Each bucket is appended at most once: every cell has exactly one parent and a
    /// partition never yields the same cell twice.
    pub(crate) fn leaves_overlapping(
        &self,
        rect: &Aabb2D<T>,
        descent: &mut Descent,
        out: &mut Vec<u32>,
    ) {
        let Descent { cells, worklist } = descent;
        cells.clear();
        worklist.clear();
        self.partitions[0].cells_overlapping(rect, cells);
        let mut head = 0;
        loop {
            for &cell in cells.iter() {
                match self.cells[cell].kind() {
                    CellKind::Leaf(bucket) => out.push(bucket),
                    CellKind::Matrix(partition) => worklist.push(partition),
                }
            }
            let Some(&partition) = worklist.get(head) else {
                break;
            };
            head += 1;
            cells.clear();
            // The parent cell was selected for `rect`, so saturate rather than re-test
            // against the child bounds; rounding at shared edges must not drop cells.
            self.partitions[partition as usize].cells_saturating(rect, cells);
        }
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.cells.capacity() * size_of::<Cell>()
            + self.partitions.capacity() * size_of::<GridPartition<T>>()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Layout<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Layout")
            .field("world", &self.world)
            .field("cells", &self.cells.len())
            .field("partitions", &self.partitions.len())
            .field("leaf_count", &self.leaf_count)
            .finish()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Array sizes are checked against Cell::MAX_INDEX before flattening."
)]
fn to_index(n: usize) -> u32 {
    n as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn world() -> Aabb2D<f64> {
        Aabb2D::new(0.0, 0.0, 100.0, 100.0)
    }

    fn leaves_for(layout: &Layout<f64>, rect: Aabb2D<f64>) -> Vec<u32> {
        let mut descent = Descent::default();
        let mut out = vec![];
        layout.leaves_overlapping(&rect, &mut descent, &mut out);
        out
    }

    #[test]
    fn single_level_layout() {
        let layout = Layout::build(world(), &Subdivision::new(32, 32)).unwrap();
        assert_eq!(layout.cells().len(), 1 + 32 * 32);
        assert_eq!(layout.partitions().len(), 1);
        assert_eq!(layout.leaf_count(), 32 * 32);
        assert_eq!(layout.cells()[0], Cell::matrix(0));
        let root = layout.partitions()[0];
        assert_eq!(root.first_cell(), 1);
        assert_eq!(root.bounds(), world());
        for (i, cell) in layout.cells()[1..].iter().enumerate() {
            assert_eq!(*cell, Cell::leaf(i as u32));
        }
    }

    #[test]
    fn nested_layout_is_breadth_first() {
        let subdivision = Subdivision::uniform(2, 2, &Subdivision::new(1, 2));
        let layout = Layout::build(world(), &subdivision).unwrap();
        let cells = layout.cells();
        assert_eq!(
            cells,
            &[
                Cell::matrix(0),
                Cell::matrix(1),
                Cell::matrix(2),
                Cell::matrix(3),
                Cell::matrix(4),
                Cell::leaf(0),
                Cell::leaf(1),
                Cell::leaf(2),
                Cell::leaf(3),
                Cell::leaf(4),
                Cell::leaf(5),
                Cell::leaf(6),
                Cell::leaf(7),
            ]
        );
        let p = layout.partitions();
        assert_eq!(p[0].first_cell(), 1);
        assert_eq!(p[1].first_cell(), 5);
        assert_eq!(p[4].first_cell(), 11);
        assert_eq!(p[1].bounds(), Aabb2D::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(p[2].bounds(), Aabb2D::new(50.0, 0.0, 100.0, 50.0));
        assert_eq!(p[3].bounds(), Aabb2D::new(0.0, 50.0, 50.0, 100.0));
        assert_eq!(p[4].bounds(), Aabb2D::new(50.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn mixed_depth_layout() {
        let mut subdivision = Subdivision::new(2, 1);
        subdivision.subdivide(1, 0, 3, 3).subdivide(2, 2, 2, 2);
        let layout = Layout::build(world(), &subdivision).unwrap();
        let cells = layout.cells();
        assert_eq!(cells.len(), 16);
        assert_eq!(cells[1], Cell::leaf(0));
        assert_eq!(cells[2], Cell::matrix(1));
        assert_eq!(layout.partitions()[1].first_cell(), 3);
        assert_eq!(cells[3], Cell::leaf(1));
        assert_eq!(cells[10], Cell::leaf(8));
        assert_eq!(cells[11], Cell::matrix(2));
        assert_eq!(layout.partitions()[2].first_cell(), 12);
        assert_eq!(cells[15], Cell::leaf(12));
        assert_eq!(layout.leaf_count(), 13);
        assert_eq!(
            layout.partitions()[2].bounds(),
            layout.partitions()[1].cell_bounds(2, 2)
        );
    }

    #[test]
    fn every_matrix_cell_owns_its_parent_cell_region() {
        let mut subdivision = Subdivision::uniform(3, 2, &Subdivision::new(2, 5));
        subdivision.set_child(0, 0, Some(Subdivision::uniform(2, 2, &Subdivision::new(4, 4))));
        let layout = Layout::build(Aabb2D::new(-30.0, 10.0, 90.0, 70.0), &subdivision).unwrap();
        let mut seen_leaves = vec![false; layout.leaf_count()];
        for parent in layout.partitions() {
            for row in 0..parent.rows() {
                for col in 0..parent.columns() {
                    let cell = layout.cells()[parent.cell_index(row.into(), col.into())];
                    match cell.kind() {
                        CellKind::Leaf(b) => {
                            assert!(!seen_leaves[b as usize], "bucket assigned twice");
                            seen_leaves[b as usize] = true;
                        }
                        CellKind::Matrix(p) => assert_eq!(
                            layout.partitions()[p as usize].bounds(),
                            parent.cell_bounds(row, col)
                        ),
                    }
                }
            }
        }
        assert!(seen_leaves.iter().all(|s| *s));
    }

    #[test]
    fn build_errors() {
        assert_eq!(
            Layout::build(Aabb2D::new(0.0, 0.0, 0.0, 10.0), &Subdivision::new(2, 2)).unwrap_err(),
            BuildError::DegenerateWorld
        );
        assert!(matches!(
            Layout::build(world(), &Subdivision::new(2, 0)),
            Err(BuildError::EmptySubdivision { depth: 0, .. })
        ));
        // At 1e7 the f32 spacing is 1.0, so a quarter of a unit-wide world collapses.
        let subdivision = Subdivision::new(1, 4).with_child(0, 0, Subdivision::new(2, 2));
        assert_eq!(
            Layout::build(Aabb2D::new(1.0e7_f32, 0.0, 1.0e7 + 1.0, 1.0), &subdivision).unwrap_err(),
            BuildError::DegenerateRegion { depth: 1 }
        );
    }

    #[test]
    fn leaf_at_descends_to_the_containing_leaf() {
        let subdivision = Subdivision::uniform(2, 2, &Subdivision::new(1, 2));
        let layout = Layout::build(world(), &subdivision).unwrap();
        assert_eq!(layout.leaf_at(10.0, 10.0), Some(0));
        assert_eq!(layout.leaf_at(30.0, 10.0), Some(1));
        assert_eq!(layout.leaf_at(60.0, 10.0), Some(2));
        assert_eq!(layout.leaf_at(99.0, 99.0), Some(7));
        assert_eq!(layout.leaf_at(100.0, 100.0), Some(7));
        assert_eq!(layout.leaf_at(100.5, 50.0), None);
    }

    #[test]
    fn leaves_overlapping_spans_levels() {
        let subdivision = Subdivision::uniform(2, 2, &Subdivision::new(1, 2));
        let layout = Layout::build(world(), &subdivision).unwrap();
        let mut leaves = leaves_for(&layout, Aabb2D::new(20.0, 40.0, 60.0, 60.0));
        leaves.sort_unstable();
        // Crosses both root columns and rows; x in [20, 60] covers both halves of the
        // left partitions and only the first half of the right ones.
        assert_eq!(leaves, vec![0, 1, 2, 4, 5, 6]);
        let leaves = leaves_for(&layout, Aabb2D::new(30.0, 10.0, 40.0, 20.0));
        assert_eq!(leaves, vec![1]);

        assert_eq!(leaves_for(&layout, world()).len(), 8);
        assert!(leaves_for(&layout, Aabb2D::new(200.0, 0.0, 300.0, 10.0)).is_empty());
    }
}
