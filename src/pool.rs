// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Chunked free-list pool with stable slots
//!
//! Slots live in chunks whose sizes double up to [`MAX_CHUNK_SIZE`]. A chunk
//! is filled with `T::default()` once when it is created and never
//! reallocated, so the address of a slot does not change while the pool is
//! alive. Deallocation only returns the slot to a free list; the value in it
//! is left untouched until the slot is handed out again or the pool is
//! cleared.

use std::ops::{Index, IndexMut};

pub const DEFAULT_FIRST_CHUNK_SIZE: usize = 32;
pub const MAX_CHUNK_SIZE: usize = 1 << 20;

/// Handle to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(u32);

impl Slot {
    pub fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "slot index {} out of range", index);
        Slot(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Chunk<T> {
    start: usize,
    items: Box<[T]>,
    // slot indices ready for reuse; the top is served first
    free: Vec<u32>,
    used: usize,
}

impl<T: Default> Chunk<T> {
    fn new(start: usize, size: usize) -> Self {
        assert!(
            start + size <= u32::MAX as usize + 1,
            "pool exceeds {} slots",
            u32::MAX
        );
        Self {
            start,
            items: (0..size).map(|_| T::default()).collect(),
            free: (start..start + size).rev().map(|i| i as u32).collect(),
            used: 0,
        }
    }

    fn reset(&mut self) {
        for item in self.items.iter_mut() {
            *item = T::default();
        }
        let start = self.start;
        self.free.clear();
        self.free
            .extend((start..start + self.items.len()).rev().map(|i| i as u32));
        self.used = 0;
    }
}

impl<T> Chunk<T> {
    fn capacity(&self) -> usize {
        self.items.len()
    }
}

/// Free-list allocator handing out [`Slot`]s
#[derive(Debug, Clone)]
pub struct Pool<T> {
    chunks: Vec<Chunk<T>>,
    // one flag per slot of every chunk, set while the slot is handed out
    live: Vec<bool>,
    current: usize,
    n_available: usize,
    n_allocated: usize,
    slot_bound: usize,
}

impl<T: Default> Pool<T> {
    pub fn new() -> Self {
        Self::with_first_chunk_size(DEFAULT_FIRST_CHUNK_SIZE)
    }

    pub fn with_first_chunk_size(first_chunk_size: usize) -> Self {
        assert!(
            first_chunk_size > 0 && first_chunk_size <= MAX_CHUNK_SIZE,
            "invalid first chunk size {}",
            first_chunk_size
        );
        Self {
            chunks: vec![Chunk::new(0, first_chunk_size)],
            live: vec![false; first_chunk_size],
            current: 0,
            n_available: 0,
            n_allocated: 0,
            slot_bound: 0,
        }
    }

    /// Hands out a slot in O(1) amortized time.
    pub fn allocate(&mut self) -> Slot {
        while self.chunks[self.current].used == self.chunks[self.current].capacity() {
            if self.current + 1 == self.chunks.len() {
                self.push_chunk();
            }
            self.current += 1;
        }

        let chunk = &mut self.chunks[self.current];
        let Some(index) = chunk.free.pop() else {
            unreachable!("chunk free list out of sync with its used count");
        };
        chunk.used += 1;
        self.live[index as usize] = true;

        self.n_available += 1;
        self.n_allocated = self.n_allocated.max(self.n_available);
        self.slot_bound = self.slot_bound.max(index as usize + 1);
        Slot(index)
    }

    /// Returns a slot to the free list of the current chunk.
    ///
    /// The slot must come from this pool and must not already be free.
    pub fn deallocate(&mut self, slot: Slot) {
        assert!(self.n_available > 0, "deallocate on a pool with nothing allocated");
        assert!(
            slot.index() < self.slot_bound,
            "slot {} was never allocated",
            slot.index()
        );
        assert!(self.live[slot.index()], "slot {} is already free", slot.index());
        self.live[slot.index()] = false;

        let chunk = &mut self.chunks[self.current];
        chunk.free.push(slot.0);
        chunk.used -= 1;
        self.n_available -= 1;

        if chunk.used == 0 && self.current > 0 {
            self.current -= 1;
        }
    }

    /// Drops every chunk but the first and resets the pool to its initial state.
    pub fn clear(&mut self) {
        self.chunks.truncate(1);
        self.chunks[0].reset();
        self.live.clear();
        self.live.resize(self.chunks[0].capacity(), false);
        self.current = 0;
        self.n_available = 0;
        self.n_allocated = 0;
        self.slot_bound = 0;
    }

    fn push_chunk(&mut self) {
        let last = &self.chunks[self.chunks.len() - 1];
        let size = (last.capacity() * 2).min(MAX_CHUNK_SIZE);
        let start = last.start + last.capacity();
        self.chunks.push(Chunk::new(start, size));
        self.live.resize(start + size, false);
    }
}

impl<T> Pool<T> {
    /// Number of slots currently handed out.
    pub fn n_available(&self) -> usize {
        self.n_available
    }

    /// Largest number of slots that were handed out at the same time.
    pub fn n_allocated(&self) -> usize {
        self.n_allocated
    }

    /// One past the highest slot index ever handed out.
    pub fn slot_bound(&self) -> usize {
        self.slot_bound
    }

    /// Total number of slots in all chunks.
    pub fn capacity(&self) -> usize {
        self.chunks.iter().map(|c| c.capacity()).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        let (chunk, offset) = self.locate(slot.index())?;
        self.chunks[chunk].items.get(offset)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        let (chunk, offset) = self.locate(slot.index())?;
        self.chunks[chunk].items.get_mut(offset)
    }

    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let chunk = self.chunks.partition_point(|c| c.start <= index).checked_sub(1)?;
        Some((chunk, index - self.chunks[chunk].start))
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Slot> for Pool<T> {
    type Output = T;

    fn index(&self, slot: Slot) -> &T {
        match self.get(slot) {
            Some(item) => item,
            None => panic!("slot {} out of range", slot.index()),
        }
    }
}

impl<T> IndexMut<Slot> for Pool<T> {
    fn index_mut(&mut self, slot: Slot) -> &mut T {
        match self.get_mut(slot) {
            Some(item) => item,
            None => panic!("slot {} out of range", slot.index()),
        }
    }
}
