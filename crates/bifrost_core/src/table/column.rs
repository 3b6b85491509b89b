//! # Attribute Columns
//!
//! Dense, growable storage for a single table attribute.
//!
//! - Access is O(1) via slot index
//! - Iteration is cache-friendly (contiguous memory)
//! - Growth copies the live prefix and default-fills the new tail

use std::ops::{Index, IndexMut};

/// Dense storage for one attribute of every slot in a table.
///
/// # Type Parameters
///
/// * `T` - The attribute type
///
/// # Example
///
/// ```rust
/// use bifrost_core::Column;
///
/// let mut widths: Column<u32> = Column::new(4);
/// widths.set(1, 640);
/// widths.resize(8);
/// assert_eq!(widths[1], 640);
/// assert_eq!(widths[7], 0);
/// ```
#[derive(Debug, Clone)]
pub struct Column<T> {
    data: Vec<T>,
}

impl<T: Default> Column<T> {
    /// Creates a column with `len` default-initialized slots.
    #[must_use]
    pub fn new(len: usize) -> Self {
        let mut column = Self { data: Vec::new() };
        column.resize(len);
        column
    }

    /// Resizes to `len` slots.
    ///
    /// Slots `0..min(old, new)` keep their values, new slots hold the default.
    pub fn resize(&mut self, len: usize) {
        if len < self.data.len() {
            self.data.truncate(len);
        } else {
            self.data.reserve_exact(len - self.data.len());
            self.data.resize_with(len, T::default);
        }
    }

    /// Resets a slot to the default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = T::default();
        }
    }

    /// Takes the value out of a slot, leaving the default behind.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn take(&mut self, index: usize) -> T {
        std::mem::take(&mut self.data[index])
    }
}

impl<T> Column<T> {
    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the column has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets a value by slot index, or None if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Gets a mutable value by slot index, or None if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }

    /// Overwrites the value at a slot.
    ///
    /// # Returns
    ///
    /// `true` if the value was set, `false` if index was out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) -> bool {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = value;
            true
        } else {
            false
        }
    }

    /// Returns a slice of all slots.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable slice of all slots.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        self.data = Vec::new();
    }
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T> Index<usize> for Column<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Column<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}
