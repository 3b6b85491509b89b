//! # Entity Table
//!
//! Generic structure-of-arrays container behind every asset table.
//!
//! The table keeps three things in lockstep:
//! - The [`UidGenerator`] that issues slot indices and owns capacity
//! - The attribute columns, one entry per slot
//! - The [`ChangeSet`] renderers drain once per frame
//!
//! Slot 0 always holds a sentinel record and is never issued.

use std::fmt;

use crate::change_set::{ChangeFlags, ChangeSet};
use crate::uid::{Uid, UidGenerator};

/// Struct-of-arrays attribute storage for one table kind.
pub trait Columns: Default {
    /// Resizes every column to `capacity` slots, keeping existing values.
    fn resize(&mut self, capacity: usize);

    /// Writes the sentinel record into slot 0.
    fn init_sentinel(&mut self);
}

/// Generic UID-indexed table.
///
/// # Type Parameters
///
/// * `T` - Marker type identifying the table; UIDs are `Uid<T>`
/// * `S` - The table's attribute columns
/// * `F` - The table's change flags
pub struct EntityTable<T, S: Columns, F: ChangeFlags> {
    uids: UidGenerator<T>,
    columns: S,
    changes: ChangeSet<F>,
    /// Capacity the columns and change set were last sized to.
    data_capacity: usize,
    allocated: bool,
}

impl<T, S: Columns, F: ChangeFlags> EntityTable<T, S, F> {
    /// Creates an unallocated table with zero capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            uids: UidGenerator::default(),
            columns: S::default(),
            changes: ChangeSet::default(),
            data_capacity: 0,
            allocated: false,
        }
    }

    /// Allocates storage for `capacity` slots, including the sentinel.
    ///
    /// Does nothing if the table is already allocated. A capacity of zero is
    /// raised to one so the sentinel always exists.
    pub fn allocate(&mut self, capacity: usize) {
        if self.allocated {
            return;
        }

        let capacity = capacity.max(1);
        self.uids = UidGenerator::new(capacity);
        self.columns = S::default();
        self.columns.resize(capacity);
        self.columns.init_sentinel();
        self.changes = ChangeSet::new(capacity);
        self.data_capacity = capacity;
        self.allocated = true;

        tracing::debug!("Allocated {} with capacity {}", Self::name(), capacity);
    }

    /// Frees all storage. Capacity returns to zero.
    ///
    /// Does nothing if the table is not allocated.
    pub fn deallocate(&mut self) {
        if !self.allocated {
            return;
        }

        self.uids = UidGenerator::default();
        self.columns = S::default();
        self.changes = ChangeSet::default();
        self.data_capacity = 0;
        self.allocated = false;

        tracing::debug!("Deallocated {}", Self::name());
    }

    /// Checks if the table is allocated.
    #[inline]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Returns the number of slots, including the sentinel.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.uids.capacity()
    }

    /// Grows the table to at least `new_capacity` slots.
    ///
    /// Smaller requests have no effect. Reserving on an unallocated table
    /// allocates it.
    pub fn reserve(&mut self, new_capacity: usize) {
        if !self.allocated {
            self.allocate(new_capacity);
            return;
        }

        self.uids.reserve(new_capacity);
        self.reserve_data();
    }

    /// Resizes every column and the change set to the generator's capacity.
    fn reserve_data(&mut self) {
        let capacity = self.uids.capacity();
        if capacity <= self.data_capacity {
            return;
        }

        self.columns.resize(capacity);
        self.changes.resize(capacity);
        tracing::debug!(
            "Grew {} from {} to {} slots",
            Self::name(),
            self.data_capacity,
            capacity
        );
        self.data_capacity = capacity;
    }

    /// Checks if a UID refers to a live entity.
    #[inline]
    #[must_use]
    pub fn has(&self, id: Uid<T>) -> bool {
        self.uids.has(id)
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// Returns true if no entity is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Creates an entity.
    ///
    /// Grows storage first if the generator had to grow, then lets `fill`
    /// write the new slot and marks the entity created.
    ///
    /// # Arguments
    ///
    /// * `fill` - Writes the attributes of the new slot, given its index
    pub fn create_with(&mut self, fill: impl FnOnce(&mut S, usize)) -> Uid<T> {
        if !self.allocated {
            self.allocate(1);
        }

        let id = self.uids.generate();
        self.reserve_data();

        let index = id.index();
        fill(&mut self.columns, index);
        self.changes.set(index, F::created());
        id
    }

    /// Destroys an entity.
    ///
    /// # Arguments
    ///
    /// * `id` - The entity to destroy
    /// * `release` - Drops the resources owned by the slot, given its index
    ///
    /// # Returns
    ///
    /// `true` if the entity was live. Destroying a dead or stale UID does
    /// nothing and emits no change. The slot keeps its destroyed mark and is
    /// not reissued until the next reset.
    pub fn destroy_with(&mut self, id: Uid<T>, release: impl FnOnce(&mut S, usize)) -> bool {
        if !self.uids.erase(id) {
            return false;
        }

        let index = id.index();
        release(&mut self.columns, index);
        self.changes.set(index, F::destroyed());
        true
    }

    /// Adds change bits to an entity.
    ///
    /// # Panics
    ///
    /// Panics if the UID's slot is out of range.
    #[inline]
    pub fn mark_changed(&mut self, id: Uid<T>, flags: F) {
        self.changes.add(id.index(), flags);
    }

    /// Returns the change bits of an entity for this frame.
    ///
    /// # Panics
    ///
    /// Panics if the UID's slot is out of range.
    #[inline]
    #[must_use]
    pub fn changes(&self, id: Uid<T>) -> F {
        self.changes.get(id.index())
    }

    /// Checks if any of the bits in `mask` changed for an entity this frame.
    #[inline]
    #[must_use]
    pub fn has_changes(&self, id: Uid<T>, mask: F) -> bool {
        !(self.changes(id) & mask).is_none()
    }

    /// Iterates over the entities changed since the last reset, in order of
    /// first change.
    pub fn changed(&self) -> impl Iterator<Item = Uid<T>> + '_ {
        self.changes
            .touched()
            .iter()
            .map(|&index| self.uids.uid_at(index as usize))
    }

    /// Returns the number of entities changed since the last reset.
    #[inline]
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.changes.changed_count()
    }

    /// Clears all change notifications and makes the slots destroyed since
    /// the last reset available for reuse.
    pub fn reset_change_notifications(&mut self) {
        self.changes.reset();
        self.uids.release_erased();
    }

    /// Iterates over all live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Uid<T>> + '_ {
        self.uids.iter()
    }

    /// Returns the attribute columns.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &S {
        &self.columns
    }

    /// Returns the attribute columns mutably.
    ///
    /// Writes through this do not emit changes; pair them with
    /// [`EntityTable::mark_changed`].
    #[inline]
    pub fn columns_mut(&mut self) -> &mut S {
        &mut self.columns
    }

    fn name() -> &'static str {
        let full = std::any::type_name::<T>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

impl<T, S: Columns, F: ChangeFlags> Default for EntityTable<T, S, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Columns, F: ChangeFlags> fmt::Debug for EntityTable<T, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTable")
            .field("table", &Self::name())
            .field("capacity", &self.capacity())
            .field("live", &self.len())
            .field("changed", &self.changed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::tests::TestChanges;
    use crate::table::Column;

    struct Widgets;

    #[derive(Default)]
    struct WidgetColumns {
        names: Column<String>,
        weights: Column<f32>,
    }

    impl Columns for WidgetColumns {
        fn resize(&mut self, capacity: usize) {
            self.names.resize(capacity);
            self.weights.resize(capacity);
        }

        fn init_sentinel(&mut self) {
            self.names[0] = "Dummy widget".to_owned();
            self.weights[0] = -1.0;
        }
    }

    type WidgetTable = EntityTable<Widgets, WidgetColumns, TestChanges>;

    fn create(table: &mut WidgetTable, name: &str, weight: f32) -> Uid<Widgets> {
        table.create_with(|columns, index| {
            columns.names[index] = name.to_owned();
            columns.weights[index] = weight;
        })
    }

    fn destroy(table: &mut WidgetTable, id: Uid<Widgets>) -> bool {
        table.destroy_with(id, |columns, index| columns.names.reset(index))
    }

    #[test]
    fn test_allocate_writes_sentinel() {
        let mut table = WidgetTable::new();
        assert!(!table.is_allocated());
        assert_eq!(table.capacity(), 0);

        table.allocate(8);
        assert!(table.is_allocated());
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.columns().names[0], "Dummy widget");
        assert!(!table.has(Uid::invalid()));
    }

    #[test]
    fn test_allocate_twice_is_noop() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        let id = create(&mut table, "a", 1.0);

        table.allocate(64);
        assert_eq!(table.capacity(), 8);
        assert!(table.has(id));
    }

    #[test]
    fn test_deallocate() {
        let mut table = WidgetTable::new();
        table.deallocate();

        table.allocate(8);
        create(&mut table, "a", 1.0);
        table.deallocate();
        assert!(!table.is_allocated());
        assert_eq!(table.capacity(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_has_after_create_destroy_recycle() {
        let mut table = WidgetTable::new();
        table.allocate(4);

        let id = create(&mut table, "a", 1.0);
        assert!(table.has(id));

        assert!(destroy(&mut table, id));
        assert!(!table.has(id));
        assert!(!destroy(&mut table, id));
        table.reset_change_notifications();

        let recycled = create(&mut table, "b", 2.0);
        assert_eq!(recycled.index(), id.index());
        assert!(table.has(recycled));
        assert!(!table.has(id));
    }

    #[test]
    fn test_create_grows_storage() {
        let mut table = WidgetTable::new();
        table.allocate(2);

        let ids: Vec<_> = (0..20)
            .map(|i| create(&mut table, &format!("w{i}"), i as f32))
            .collect();

        assert!(table.capacity() > 20);
        assert_eq!(table.columns().names.len(), table.capacity());
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(table.columns().names[id.index()], format!("w{i}"));
            assert_eq!(table.columns().weights[id.index()], i as f32);
        }
        assert_eq!(table.columns().names[0], "Dummy widget");
    }

    #[test]
    fn test_create_on_unallocated_table() {
        let mut table = WidgetTable::new();
        let id = create(&mut table, "a", 1.0);
        assert!(table.is_allocated());
        assert!(table.has(id));
        assert_eq!(table.columns().names[0], "Dummy widget");
    }

    #[test]
    fn test_reserve_smaller_keeps_capacity() {
        let mut table = WidgetTable::new();
        table.allocate(16);
        table.reserve(4);
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn test_reserve_unallocated_allocates() {
        let mut table = WidgetTable::new();
        table.reserve(12);
        assert!(table.is_allocated());
        assert_eq!(table.capacity(), 12);
        assert_eq!(table.columns().weights.len(), 12);
    }

    #[test]
    fn test_reserve_preserves_live_entities() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        let ids: Vec<_> = (0..5)
            .map(|i| create(&mut table, &format!("w{i}"), i as f32))
            .collect();

        table.reserve(20);
        assert_eq!(table.capacity(), 20);
        for (i, id) in ids.iter().enumerate() {
            assert!(table.has(*id));
            assert_eq!(table.columns().names[id.index()], format!("w{i}"));
        }
    }

    #[test]
    fn test_destroy_changes_only_destroyed() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        let ids: Vec<_> = (0..6).map(|i| create(&mut table, "w", i as f32)).collect();
        table.reset_change_notifications();

        for id in &ids[..4] {
            destroy(&mut table, *id);
        }

        let changed: Vec<_> = table.changed().collect();
        assert_eq!(changed, ids[..4].to_vec());
        for id in changed {
            assert_eq!(table.changes(id), TestChanges::DESTROYED);
        }
    }

    #[test]
    fn test_destroy_then_create_keeps_destroyed_mark() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        let a = create(&mut table, "a", 1.0);
        table.reset_change_notifications();

        destroy(&mut table, a);
        let b = create(&mut table, "b", 2.0);

        assert_ne!(b.index(), a.index());
        assert_eq!(table.changed().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(table.changes(a), TestChanges::DESTROYED);
        assert_eq!(table.changes(b), TestChanges::CREATED);

        table.reset_change_notifications();
        let c = create(&mut table, "c", 3.0);
        assert_eq!(c.index(), a.index());
        assert!(!table.has(a));
        assert_eq!(table.changes(c), TestChanges::CREATED);
    }

    #[test]
    fn test_create_then_update_single_entry() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        let id = create(&mut table, "a", 1.0);
        table.columns_mut().weights[id.index()] = 4.0;
        table.mark_changed(id, TestChanges::UPDATED);

        assert_eq!(table.changed_count(), 1);
        assert_eq!(table.changes(id), TestChanges::CREATED | TestChanges::UPDATED);
        assert!(table.has_changes(id, TestChanges::UPDATED));
        assert!(!table.has_changes(id, TestChanges::DESTROYED));
    }

    #[test]
    fn test_changed_is_restartable() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        create(&mut table, "a", 1.0);
        create(&mut table, "b", 2.0);

        assert_eq!(table.changed().count(), 2);
        assert_eq!(table.changed().count(), 2);

        table.reset_change_notifications();
        assert_eq!(table.changed().count(), 0);
    }

    #[test]
    fn test_iter_live() {
        let mut table = WidgetTable::new();
        table.allocate(8);
        let a = create(&mut table, "a", 1.0);
        let b = create(&mut table, "b", 2.0);
        destroy(&mut table, a);

        assert_eq!(table.iter().collect::<Vec<_>>(), vec![b]);
        assert_eq!(table.len(), 1);
    }
}
