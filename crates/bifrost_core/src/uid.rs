//! # Unique Identifiers
//!
//! UIDs are lightweight, typed handles into a table consisting of:
//! - A slot index into the table's attribute columns
//! - A generation counter for detecting stale handles after a slot is recycled
//!
//! Slot 0 of every table is a permanent sentinel. It is never issued, so the
//! all-zero UID is the invalid handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Minimum capacity a generator grows to once it runs out of free slots.
const MIN_GROWTH_CAPACITY: usize = 8;

/// Unique identifier for an entity in the table identified by `T`.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index into the table's columns
/// - Upper 32 bits: Generation counter for detecting stale references
///
/// `T` is a marker type (usually the table itself), so an image UID cannot be
/// passed to a camera table.
#[repr(transparent)]
pub struct Uid<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Uid<T> {
    /// The invalid UID, referring to the sentinel slot 0.
    pub const INVALID: Self = Self::new(0, 0);

    /// Creates a UID from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            raw: ((generation as u64) << 32) | (index as u64),
            _marker: PhantomData,
        }
    }

    /// Returns the invalid UID.
    #[inline]
    #[must_use]
    pub const fn invalid() -> Self {
        Self::INVALID
    }

    /// Returns the slot index portion of the UID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        (self.raw as u32) as usize
    }

    /// Returns the generation portion of the UID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.raw >> 32) as u32
    }

    /// Returns the packed 64 bit representation.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.raw
    }

    /// Checks if this UID refers to the sentinel slot.
    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.index() == 0
    }
}

impl<T> Clone for Uid<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Uid<T> {}

impl<T> PartialEq for Uid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Uid<T> {}

impl<T> Hash for Uid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> Default for Uid<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Uid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({}v{})", self.index(), self.generation())
    }
}

/// Issues and recycles UIDs for one table.
///
/// The generator owns the table's capacity: when the free list runs dry
/// `generate` grows capacity geometrically, and the owning table observes the
/// change through [`UidGenerator::capacity`] and resizes its columns to match.
/// Erased slots only rejoin the free list on [`UidGenerator::release_erased`].
pub struct UidGenerator<T> {
    /// Last generation handed out per slot. Slot 0 stays at generation 0.
    generations: Vec<u32>,
    /// Liveness per slot.
    alive: Vec<bool>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    /// Erased slots held back until [`UidGenerator::release_erased`].
    erased_indices: Vec<u32>,
    /// Number of currently live UIDs.
    live_count: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> UidGenerator<T> {
    /// Creates a generator with the given capacity.
    ///
    /// A capacity of zero creates an empty, unallocated generator. Any other
    /// capacity includes the sentinel slot 0, so `capacity - 1` UIDs can be
    /// issued before growth.
    ///
    /// # Panics
    ///
    /// Panics if capacity exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut generator = Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_indices: Vec::new(),
            erased_indices: Vec::new(),
            live_count: 0,
            _marker: PhantomData,
        };
        generator.reserve(capacity);
        generator
    }

    /// Returns the number of slots, including the sentinel.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Returns the number of live UIDs.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if no UIDs are live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Grows capacity to at least `capacity` slots. Never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if capacity exceeds `u32::MAX`.
    pub fn reserve(&mut self, capacity: usize) {
        assert!(
            capacity <= u32::MAX as usize,
            "Capacity cannot exceed u32::MAX"
        );

        let old_capacity = self.capacity();
        if capacity <= old_capacity {
            return;
        }

        self.generations.resize(capacity, 0);
        self.alive.resize(capacity, false);

        // Slot 0 is the sentinel and never enters the free list. Push in
        // reverse so the lowest index is popped first.
        let first_free = old_capacity.max(1);
        #[allow(clippy::cast_possible_truncation)]
        self.free_indices
            .extend((first_free..capacity).rev().map(|index| index as u32));
        // Keep the lowest indices at the end of the free list.
        if old_capacity > 0 {
            let new_slots = capacity - first_free;
            self.free_indices.rotate_right(new_slots);
        }
    }

    /// Returns an unused UID, growing capacity if no free slot remains.
    pub fn generate(&mut self) -> Uid<T> {
        if self.free_indices.is_empty() {
            let grown = (self.capacity() * 2).max(MIN_GROWTH_CAPACITY);
            self.reserve(grown);
        }

        let Some(index) = self.free_indices.pop() else {
            unreachable!("free list is refilled by reserve");
        };

        let slot = index as usize;
        // Increment generation to invalidate old references
        let generation = self.generations[slot].wrapping_add(1).max(1);
        self.generations[slot] = generation;
        self.alive[slot] = true;
        self.live_count += 1;

        Uid::new(index, generation)
    }

    /// Frees a UID. Its slot is not reissued until the next
    /// [`UidGenerator::release_erased`].
    ///
    /// # Returns
    ///
    /// `true` if the UID was live, `false` if it was already free, stale, the
    /// sentinel, or out of range.
    pub fn erase(&mut self, id: Uid<T>) -> bool {
        if !self.has(id) {
            return false;
        }

        let slot = id.index();
        self.alive[slot] = false;
        self.live_count -= 1;
        #[allow(clippy::cast_possible_truncation)]
        self.erased_indices.push(slot as u32);
        true
    }

    /// Makes the slots of every UID erased so far available to
    /// [`UidGenerator::generate`].
    pub fn release_erased(&mut self) {
        self.free_indices.append(&mut self.erased_indices);
    }

    /// Checks if a UID is live.
    #[inline]
    #[must_use]
    pub fn has(&self, id: Uid<T>) -> bool {
        let slot = id.index();
        slot != 0
            && slot < self.capacity()
            && self.alive[slot]
            && self.generations[slot] == id.generation()
    }

    /// Returns the UID most recently issued for a slot, live or not.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[must_use]
    pub fn uid_at(&self, index: usize) -> Uid<T> {
        #[allow(clippy::cast_possible_truncation)]
        Uid::new(index as u32, self.generations[index])
    }

    /// Iterates over all live UIDs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Uid<T>> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(index, _)| self.uid_at(index))
    }
}

impl<T> Default for UidGenerator<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> fmt::Debug for UidGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UidGenerator")
            .field("capacity", &self.capacity())
            .field("live", &self.live_count)
            .field("erased", &self.erased_indices.len())
            .finish()
    }
}
