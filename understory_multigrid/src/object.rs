// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caller-owned object handles and the keys the index hands out.

use crate::types::Aabb2D;

/// Generational handle of a slot in a [`MultiGrid`](crate::MultiGrid).
///
/// - On insert, a free slot is taken and its generation incremented.
/// - On remove, the slot is freed; the key is now stale.
/// - Generations persist across [`MultiGrid::clear`](crate::MultiGrid::clear) and
///   rebuilds, so a stale key never aliases a newer object.
/// - Each key records the index that issued it; other indexes never resolve it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    owner: u32,
    slot: u32,
    generation: u32,
}

impl Key {
    pub(crate) const fn new(owner: u32, slot: u32, generation: u32) -> Self {
        Self {
            owner,
            slot,
            generation,
        }
    }

    pub(crate) const fn owner(self) -> u32 {
        self.owner
    }

    pub(crate) const fn slot(self) -> usize {
        self.slot as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

/// An object that can be tracked by a [`MultiGrid`](crate::MultiGrid).
///
/// The caller owns the object. The index copies its AABB and payload on insert and
/// records its slot in the object, which is how a second insert of the same object is
/// recognized and ignored. Queries return the payload, so `P` is usually an ID into
/// the caller's own storage.
///
/// [`Object::set_aabb`] changes only the caller's copy; use
/// [`MultiGrid::update`](crate::MultiGrid::update) to move a tracked object.
///
/// An object belongs to at most one index at a time. Once an index has given it a key,
/// other indexes treat it as untracked and ignore inserts of it until that index
/// removes it. It is not `Clone`, since two handles carrying the same slot would both
/// claim it.
#[derive(Debug, PartialEq)]
pub struct Object<T, P> {
    aabb: Aabb2D<T>,
    payload: P,
    key: Option<Key>,
}

impl<T: Copy, P: Copy> Object<T, P> {
    /// A new, untracked object.
    pub const fn new(aabb: Aabb2D<T>, payload: P) -> Self {
        Self {
            aabb,
            payload,
            key: None,
        }
    }

    /// The caller-side AABB.
    pub fn aabb(&self) -> Aabb2D<T> {
        self.aabb
    }

    /// Replace the caller-side AABB without touching any index.
    pub fn set_aabb(&mut self, aabb: Aabb2D<T>) {
        self.aabb = aabb;
    }

    /// The payload queries return for this object.
    pub fn payload(&self) -> P {
        self.payload
    }

    /// The key of the slot this object was last given, if any.
    ///
    /// The key may be stale; [`MultiGrid::contains`](crate::MultiGrid::contains) tells
    /// whether the object is currently tracked.
    pub fn key(&self) -> Option<Key> {
        self.key
    }

    pub(crate) fn set_key(&mut self, key: Option<Key>) {
        self.key = key;
    }
}
