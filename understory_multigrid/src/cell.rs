// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed leaf/matrix cell value.

/// One entry of the flattened cell array.
///
/// A cell is either a *leaf*, whose index addresses a leaf bucket (the list of
/// objects overlapping it), or a *matrix*, whose index addresses the
/// [`GridPartition`](crate::GridPartition) that subdivides it one level deeper.
///
/// Both fields are packed into a single `u32`: the high bit is the leaf flag and the
/// remaining 31 bits hold the index, so an array can address at most
/// [`Cell::MAX_INDEX`]` + 1` entries.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cell(u32);

/// Unpacked view of a [`Cell`], for matching at each traversal step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// Index into the leaf bucket array.
    Leaf(u32),
    /// Index into the grid partition array.
    Matrix(u32),
}

impl Cell {
    const LEAF_BIT: u32 = 1 << 31;

    /// Largest index a cell can hold.
    pub const MAX_INDEX: u32 = Self::LEAF_BIT - 1;

    /// Pack a cell from its leaf flag and index.
    ///
    /// `index` must not exceed [`Cell::MAX_INDEX`].
    pub const fn new(is_leaf: bool, index: u32) -> Self {
        debug_assert!(index <= Self::MAX_INDEX, "cell index exceeds 31 bits");
        let flag = if is_leaf { Self::LEAF_BIT } else { 0 };
        Self(flag | (index & Self::MAX_INDEX))
    }

    /// A leaf cell pointing at leaf bucket `bucket`.
    pub const fn leaf(bucket: u32) -> Self {
        Self::new(true, bucket)
    }

    /// A matrix cell pointing at grid partition `partition`.
    pub const fn matrix(partition: u32) -> Self {
        Self::new(false, partition)
    }

    /// Whether this is a leaf cell.
    #[inline]
    pub const fn is_leaf(self) -> bool {
        self.0 & Self::LEAF_BIT != 0
    }

    /// The bucket index for leaves, the partition index for matrices.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 & Self::MAX_INDEX
    }

    /// Unpack into a matchable [`CellKind`].
    #[inline]
    pub const fn kind(self) -> CellKind {
        if self.is_leaf() {
            CellKind::Leaf(self.index())
        } else {
            CellKind::Matrix(self.index())
        }
    }
}

impl core::fmt::Debug for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind() {
            CellKind::Leaf(i) => write!(f, "Leaf({i})"),
            CellKind::Matrix(i) => write!(f, "Matrix({i})"),
        }
    }
}
