//! # Change Sets
//!
//! Per-entity "what changed this frame" masks with a compacted list of the
//! touched slots, so renderers can iterate only what changed.
//!
//! ## Performance
//!
//! - Add/set a change: O(1)
//! - Iterate changed: O(changed_count)
//! - Reset: O(changed_count)

use std::fmt::Debug;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bit set of per-entity change kinds.
///
/// Implemented by every table's `bitflags` type. Only the three universal
/// kinds are required here; tables add their own domain bits.
pub trait ChangeFlags:
    Copy + Eq + Debug + BitOr<Output = Self> + BitAnd<Output = Self> + BitOrAssign
{
    /// The empty mask.
    fn none() -> Self;

    /// Entity was created this frame.
    fn created() -> Self;

    /// Entity was destroyed this frame.
    fn destroyed() -> Self;

    /// Checks if no change bit is set.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::none()
    }
}

/// Change masks for every slot of a table plus the slots touched this frame.
///
/// A slot is in the touched list iff its mask is non-empty. Insertion order is
/// the order of first change since the last reset.
#[derive(Debug, Clone)]
pub struct ChangeSet<F: ChangeFlags> {
    /// One mask per slot.
    masks: Vec<F>,
    /// Slots with a non-empty mask, in order of first change.
    touched: Vec<u32>,
}

impl<F: ChangeFlags> ChangeSet<F> {
    /// Creates a change set covering `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            masks: vec![F::none(); capacity],
            touched: Vec::new(),
        }
    }

    /// Returns the number of slots covered.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.masks.len()
    }

    /// Resizes to cover `capacity` slots.
    ///
    /// Existing masks are kept. Shrinking drops masks and touched entries of
    /// the removed slots.
    pub fn resize(&mut self, capacity: usize) {
        self.masks.resize(capacity, F::none());
        self.touched.retain(|&index| (index as usize) < capacity);
    }

    /// Returns the change mask of a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> F {
        self.masks[index]
    }

    /// Adds change bits to a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn add(&mut self, index: usize, flags: F) {
        let mask = &mut self.masks[index];
        let was_clean = mask.is_none();
        *mask |= flags;
        if was_clean && !mask.is_none() {
            #[allow(clippy::cast_possible_truncation)]
            self.touched.push(index as u32);
        }
    }

    /// Replaces the change bits of a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or `flags` is empty. A slot is in
    /// the touched list exactly when its mask is non-empty.
    #[inline]
    pub fn set(&mut self, index: usize, flags: F) {
        assert!(!flags.is_none(), "Cannot set an empty change mask");
        let mask = &mut self.masks[index];
        let was_clean = mask.is_none();
        *mask = flags;
        if was_clean {
            #[allow(clippy::cast_possible_truncation)]
            self.touched.push(index as u32);
        }
    }

    /// Returns the touched slots in order of first change.
    #[inline]
    #[must_use]
    pub fn touched(&self) -> &[u32] {
        &self.touched
    }

    /// Returns the number of touched slots.
    #[inline]
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.touched.len()
    }

    /// Clears every mask and the touched list.
    pub fn reset(&mut self) {
        for &index in &self.touched {
            self.masks[index as usize] = F::none();
        }
        self.touched.clear();
    }
}

impl<F: ChangeFlags> Default for ChangeSet<F> {
    fn default() -> Self {
        Self::new(0)
    }
}
