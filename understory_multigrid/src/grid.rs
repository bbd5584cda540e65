// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutable index: slot table, leaf buckets, mutation and queries.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::BuildError;
use crate::layout::{Descent, Layout};
use crate::object::{Key, Object};
use crate::subdivision::Subdivision;
use crate::types::{Aabb2D, Scalar};

#[derive(Clone, Debug)]
struct Slot<T, P> {
    generation: u32,
    aabb: Aabb2D<T>,
    payload: P,
}

/// Source of slot table owner ids, so keys from one index never resolve in another.
static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// Dense slot storage with a FIFO queue of freed indices.
#[derive(Debug)]
struct SlotTable<T, P> {
    owner: u32,
    entries: Vec<Option<Slot<T, P>>>,
    generations: Vec<u32>, // last generation per slot (persists across frees)
    free: VecDeque<usize>,
    live: usize,
}

impl<T: Copy, P: Copy> SlotTable<T, P> {
    fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
            generations: Vec::new(),
            free: VecDeque::new(),
            live: 0,
        }
    }

    fn alloc(&mut self, aabb: Aabb2D<T>, payload: P) -> Key {
        let idx = self.free.pop_front().unwrap_or_else(|| {
            self.entries.push(None);
            self.entries.len() - 1
        });
        let generation = match self.generations.get_mut(idx) {
            Some(g) => {
                *g = g.wrapping_add(1).max(1);
                *g
            }
            None => {
                self.generations.push(1);
                1
            }
        };
        self.entries[idx] = Some(Slot {
            generation,
            aabb,
            payload,
        });
        self.live += 1;
        Key::new(self.owner, slot_id(idx), generation)
    }

    fn release(&mut self, idx: usize) {
        self.entries[idx] = None;
        self.live -= 1;
        if idx + 1 == self.entries.len() {
            self.entries.pop();
        } else {
            self.free.push_back(idx);
        }
    }

    /// Slot index of `key` if it names a live slot of this table.
    fn resolve(&self, key: Option<Key>) -> Option<usize> {
        let key = key.filter(|k| k.owner() == self.owner)?;
        let slot = self.entries.get(key.slot())?.as_ref()?;
        (slot.generation == key.generation()).then_some(key.slot())
    }

    fn get(&self, idx: usize) -> Option<&Slot<T, P>> {
        self.entries.get(idx)?.as_ref()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.live = 0;
    }

    fn heap_bytes(&self) -> usize {
        self.entries.capacity() * size_of::<Option<Slot<T, P>>>()
            + self.generations.capacity() * size_of::<u32>()
            + self.free.capacity() * size_of::<usize>()
    }
}

/// Reusable query and mutation buffers owned by one index.
#[derive(Clone, Debug, Default)]
struct Scratch {
    descent: Descent,
    leaves: Vec<u32>,
    previous: Vec<u32>,
    // Per-slot stamp of the last region query that reported it; 0 means never.
    stamps: Vec<u32>,
    stamp: u32,
}

impl Scratch {
    fn next_stamp(&mut self, slots: usize) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.stamps.fill(0);
            self.stamp = 1;
        }
        if self.stamps.len() < slots {
            self.stamps.resize(slots, 0);
        }
        self.stamp
    }

    fn heap_bytes(&self) -> usize {
        self.descent.heap_bytes()
            + (self.leaves.capacity() + self.previous.capacity() + self.stamps.capacity())
                * size_of::<u32>()
    }
}

enum Edit {
    Add(u32),
    Remove(u32),
}

/// Walk two sorted, duplicate-free leaf lists and report the leaves only one of them has.
fn diff_sorted(old: &[u32], new: &[u32], mut apply: impl FnMut(Edit)) {
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        match old[i].cmp(&new[j]) {
            core::cmp::Ordering::Less => {
                apply(Edit::Remove(old[i]));
                i += 1;
            }
            core::cmp::Ordering::Greater => {
                apply(Edit::Add(new[j]));
                j += 1;
            }
            core::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    old[i..].iter().for_each(|&leaf| apply(Edit::Remove(leaf)));
    new[j..].iter().for_each(|&leaf| apply(Edit::Add(leaf)));
}

fn remove_from_bucket(bucket: &mut Vec<u32>, slot: u32) {
    let pos = bucket.iter().position(|&s| s == slot);
    debug_assert!(
        pos.is_some(),
        "slot {slot} missing from a leaf bucket it overlaps"
    );
    if let Some(pos) = pos {
        bucket.swap_remove(pos);
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Slot ids are 32-bit; more than u32::MAX live objects is unsupported."
)]
fn slot_id(idx: usize) -> u32 {
    debug_assert!(u32::try_from(idx).is_ok(), "slot table exceeds u32 ids");
    idx as u32
}

/// Memory and occupancy report of a [`MultiGrid`], for debugging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Footprint {
    /// Cells in the flattened tree.
    pub cells: usize,
    /// Grid partitions in the flattened tree.
    pub partitions: usize,
    /// Leaf buckets.
    pub buckets: usize,
    /// Slot references summed over all buckets.
    pub bucket_entries: usize,
    /// Allocated slots, live or free.
    pub slots: usize,
    /// Freed slots waiting for reuse.
    pub free_slots: usize,
    /// Approximate bytes owned, counting allocated capacity.
    pub bytes: usize,
}

/// Multi-level grid index over 2D AABBs.
///
/// The partition tree is fixed by [`MultiGrid::build`]; afterwards only leaf bucket
/// membership and the slot table change. See the [crate docs](crate) for an overview.
pub struct MultiGrid<T, P> {
    layout: Option<Layout<T>>,
    buckets: Vec<Vec<u32>>,
    slots: SlotTable<T, P>,
    scratch: Scratch,
}

/// Multigrid over `f32` coordinates.
pub type MultiGridF32<P> = MultiGrid<f32, P>;

/// Multigrid over `f64` coordinates.
pub type MultiGridF64<P> = MultiGrid<f64, P>;

impl<T: Scalar, P: Copy + Debug> Default for MultiGrid<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, P: Copy + Debug> MultiGrid<T, P> {
    /// Create an empty, unbuilt index. Call [`MultiGrid::build`] before inserting.
    pub fn new() -> Self {
        Self {
            layout: None,
            buckets: Vec::new(),
            slots: SlotTable::new(),
            scratch: Scratch::default(),
        }
    }

    /// Create an index and build its layout in one step.
    pub fn with_layout(
        world: Aabb2D<T>,
        subdivision: &Subdivision,
    ) -> Result<Self, BuildError> {
        let mut grid = Self::new();
        grid.build(world, subdivision)?;
        Ok(grid)
    }

    /// Build the partition tree for `world` from `subdivision`, replacing any previous one.
    ///
    /// All tracked objects are dropped either way; their handles become stale. On
    /// error the index is left unbuilt.
    pub fn build(
        &mut self,
        world: Aabb2D<T>,
        subdivision: &Subdivision,
    ) -> Result<(), BuildError> {
        self.clear();
        self.layout = None;
        self.buckets = Vec::new();
        let layout = Layout::build(world, subdivision).inspect_err(|err| {
            log::warn!("multigrid build rejected: {err}");
        })?;
        self.buckets.resize_with(layout.leaf_count(), Vec::new);
        self.layout = Some(layout);
        Ok(())
    }

    /// Whether a layout is in place.
    pub fn is_built(&self) -> bool {
        self.layout.is_some()
    }

    /// The flattened partition tree, if built.
    pub fn layout(&self) -> Option<&Layout<T>> {
        self.layout.as_ref()
    }

    /// The world region, if built.
    pub fn world(&self) -> Option<Aabb2D<T>> {
        self.layout.as_ref().map(Layout::world)
    }

    /// Number of tracked objects.
    pub fn len(&self) -> usize {
        self.slots.live
    }

    /// Whether no objects are tracked.
    pub fn is_empty(&self) -> bool {
        self.slots.live == 0
    }

    /// Whether `object` is currently tracked by this index.
    pub fn contains(&self, object: &Object<T, P>) -> bool {
        self.slots.resolve(object.key()).is_some()
    }

    /// The stored AABB of a live key.
    pub fn aabb(&self, key: Key) -> Option<Aabb2D<T>> {
        let idx = self.slots.resolve(Some(key))?;
        self.slots.get(idx).map(|s| s.aabb)
    }

    /// The payload of a live key.
    pub fn payload(&self, key: Key) -> Option<P> {
        let idx = self.slots.resolve(Some(key))?;
        self.slots.get(idx).map(|s| s.payload)
    }

    /// Untrack every object, keeping the layout.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.slots.clear();
    }

    /// Start tracking `object` at its current AABB.
    ///
    /// Does nothing if the object is already tracked, or if it was last given a key by
    /// another index (remove it there first). On an unbuilt index the object stays
    /// untracked.
    pub fn insert(&mut self, object: &mut Object<T, P>) {
        if self.contains(object) {
            return;
        }
        if object.key().is_some_and(|k| k.owner() != self.slots.owner) {
            log::warn!("insert of an object keyed by another multigrid ignored");
            return;
        }
        let Some(layout) = self.layout.as_ref() else {
            log::warn!("insert into an unbuilt multigrid ignored");
            return;
        };
        let aabb = object.aabb();
        let key = self.slots.alloc(aabb, object.payload());
        object.set_key(Some(key));

        let scratch = &mut self.scratch;
        scratch.leaves.clear();
        layout.leaves_overlapping(&aabb, &mut scratch.descent, &mut scratch.leaves);
        let slot = slot_id(key.slot());
        for &leaf in &scratch.leaves {
            self.buckets[leaf as usize].push(slot);
        }
        log::trace!("inserted slot {slot} into {} leaves", scratch.leaves.len());
    }

    /// Stop tracking `object`. Does nothing if it is not tracked.
    pub fn remove(&mut self, object: &mut Object<T, P>) {
        let Some(idx) = self.slots.resolve(object.key()) else {
            return;
        };
        if let (Some(layout), Some(stored)) = (self.layout.as_ref(), self.slots.get(idx)) {
            let scratch = &mut self.scratch;
            scratch.leaves.clear();
            layout.leaves_overlapping(&stored.aabb, &mut scratch.descent, &mut scratch.leaves);
            let slot = slot_id(idx);
            for &leaf in &scratch.leaves {
                remove_from_bucket(&mut self.buckets[leaf as usize], slot);
            }
            log::trace!("removed slot {slot} from {} leaves", scratch.leaves.len());
        }
        self.slots.release(idx);
        object.set_key(None);
    }

    /// Move a tracked `object` to `aabb`. Does nothing if it is not tracked.
    ///
    /// Only the leaf buckets that differ between the old and new AABB are touched.
    pub fn update(&mut self, object: &mut Object<T, P>, aabb: Aabb2D<T>) {
        let Some(idx) = self.slots.resolve(object.key()) else {
            return;
        };
        object.set_aabb(aabb);
        let Some(stored) = self.slots.entries[idx].as_mut() else {
            return;
        };
        let old = core::mem::replace(&mut stored.aabb, aabb);
        if old == aabb {
            return;
        }
        let Some(layout) = self.layout.as_ref() else {
            return;
        };

        let Scratch {
            descent,
            leaves,
            previous,
            ..
        } = &mut self.scratch;
        previous.clear();
        leaves.clear();
        layout.leaves_overlapping(&old, descent, previous);
        layout.leaves_overlapping(&aabb, descent, leaves);
        previous.sort_unstable();
        leaves.sort_unstable();

        let slot = slot_id(idx);
        let buckets = &mut self.buckets;
        let (mut added, mut removed) = (0_usize, 0_usize);
        diff_sorted(previous, leaves, |edit| match edit {
            Edit::Add(leaf) => {
                buckets[leaf as usize].push(slot);
                added += 1;
            }
            Edit::Remove(leaf) => {
                remove_from_bucket(&mut buckets[leaf as usize], slot);
                removed += 1;
            }
        });
        log::trace!("moved slot {slot}: {added} leaves added, {removed} removed");
    }

    /// Objects whose AABB contains the point `(x, y)`.
    ///
    /// Points outside the world region yield nothing.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (Key, P)> + '_ {
        let bucket: &[u32] = match self.layout.as_ref().and_then(|l| l.leaf_at(x, y)) {
            Some(leaf) => &self.buckets[leaf as usize],
            None => &[],
        };
        bucket.iter().filter_map(move |&s| {
            let slot = self.slots.get(s as usize)?;
            slot.aabb
                .contains_point(x, y)
                .then_some((Key::new(self.slots.owner, s, slot.generation), slot.payload))
        })
    }

    /// Objects whose AABB overlaps `rect`, each reported once.
    pub fn query_rect(&mut self, rect: Aabb2D<T>) -> Vec<(Key, P)> {
        let mut out = Vec::new();
        self.query_rect_into(rect, &mut out);
        out
    }

    /// Append the objects whose AABB overlaps `rect` to `out`, each once.
    ///
    /// Uses only buffers owned by the index, so repeated queries do not allocate once
    /// those have grown.
    pub fn query_rect_into(&mut self, rect: Aabb2D<T>, out: &mut Vec<(Key, P)>) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        let stamp = self.scratch.next_stamp(self.slots.entries.len());
        let Scratch {
            descent,
            leaves,
            stamps,
            ..
        } = &mut self.scratch;
        leaves.clear();
        layout.leaves_overlapping(&rect, descent, leaves);
        for &leaf in leaves.iter() {
            for &s in &self.buckets[leaf as usize] {
                let seen = &mut stamps[s as usize];
                if *seen == stamp {
                    continue;
                }
                *seen = stamp;
                if let Some(slot) = self.slots.get(s as usize)
                    && slot.aabb.overlaps(&rect)
                {
                    out.push((Key::new(self.slots.owner, s, slot.generation), slot.payload));
                }
            }
        }
    }

    /// Leaf buckets currently holding `key`, ascending.
    #[cfg(test)]
    pub(crate) fn leaves_of(&self, key: Key) -> Vec<u32> {
        let slot = slot_id(key.slot());
        (0..self.buckets.len())
            .filter(|&leaf| self.buckets[leaf].contains(&slot))
            .map(slot_id)
            .collect()
    }

    /// Sizes of every owned array and an approximate byte total.
    pub fn footprint(&self) -> Footprint {
        let counts = self.layout.as_ref().map(Layout::counts).unwrap_or_default();
        let bucket_bytes: usize = self
            .buckets
            .iter()
            .map(|b| b.capacity() * size_of::<u32>())
            .sum();
        Footprint {
            cells: counts.cells,
            partitions: counts.partitions,
            buckets: self.buckets.len(),
            bucket_entries: self.buckets.iter().map(Vec::len).sum(),
            slots: self.slots.entries.len(),
            free_slots: self.slots.free.len(),
            bytes: size_of::<Self>()
                + self.layout.as_ref().map_or(0, Layout::heap_bytes)
                + self.buckets.capacity() * size_of::<Vec<u32>>()
                + bucket_bytes
                + self.slots.heap_bytes()
                + self.scratch.heap_bytes(),
        }
    }
}

impl<T: Debug, P> Debug for MultiGrid<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultiGrid")
            .field("layout", &self.layout)
            .field("buckets", &self.buckets.len())
            .field("slots_total", &self.slots.entries.len())
            .field("alive", &self.slots.live)
            .field("free_list", &self.slots.free.len())
            .finish_non_exhaustive()
    }
}
