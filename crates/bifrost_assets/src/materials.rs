//! # Material Table
//!
//! Surface parameters of every material, with optional textures referenced
//! weakly by image UID.

use bifrost_core::{ChangeFlags, Column, Columns, EntityTable, Rgb, Uid};
use bitflags::bitflags;

use crate::images::ImageId;

/// UID of a material.
pub type MaterialId = Uid<Materials>;

bitflags! {
    /// Material changes since the last reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialChanges: u8 {
        /// Material was created.
        const CREATED = 1 << 0;
        /// Material was destroyed.
        const DESTROYED = 1 << 1;
        /// Any parameter changed.
        const UPDATED = 1 << 2;
    }
}

impl ChangeFlags for MaterialChanges {
    fn none() -> Self {
        Self::empty()
    }

    fn created() -> Self {
        Self::CREATED
    }

    fn destroyed() -> Self {
        Self::DESTROYED
    }
}

/// Surface parameters of a material.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaterialData {
    /// Base color.
    pub tint: Rgb,
    /// Tint in RGB, roughness in alpha. Multiplies `tint` and `roughness`.
    pub tint_roughness_texture: ImageId,
    /// Microfacet roughness in `[0, 1]`.
    pub roughness: f32,
    /// Metalness in `[0, 1]`.
    pub metallic: f32,
    /// Specular reflectance at normal incidence.
    pub specularity: f32,
    /// Opacity in `[0, 1]`.
    pub coverage: f32,
    /// Coverage in alpha. Multiplies `coverage`.
    pub coverage_texture: ImageId,
    /// Fraction of light transmitted through the surface.
    pub transmission: f32,
}

#[derive(Default)]
struct MaterialColumns {
    names: Column<String>,
    data: Column<MaterialData>,
}

impl Columns for MaterialColumns {
    fn resize(&mut self, capacity: usize) {
        self.names.resize(capacity);
        self.data.resize(capacity);
    }

    fn init_sentinel(&mut self) {
        self.names[0] = "Dummy material".to_owned();
        self.data[0] = MaterialData {
            tint: Rgb::red(),
            coverage: 1.0,
            ..MaterialData::default()
        };
    }
}

/// The material table.
#[derive(Default)]
pub struct Materials {
    table: EntityTable<Materials, MaterialColumns, MaterialChanges>,
}

impl Materials {
    /// Creates an unallocated material table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates room for `capacity` materials, including the sentinel.
    pub fn allocate(&mut self, capacity: usize) {
        self.table.allocate(capacity);
    }

    /// Frees every material and all table storage.
    pub fn deallocate(&mut self) {
        self.table.deallocate();
    }

    /// Checks if the table is allocated.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.table.is_allocated()
    }

    /// Returns the number of slots, including the sentinel.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Grows the table to at least `new_capacity` slots.
    pub fn reserve(&mut self, new_capacity: usize) {
        self.table.reserve(new_capacity);
    }

    /// Checks if a material is live.
    #[must_use]
    pub fn has(&self, id: MaterialId) -> bool {
        self.table.has(id)
    }

    /// Returns the number of live materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no material is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over all live materials.
    pub fn iter(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.table.iter()
    }

    /// Creates a material.
    pub fn create(&mut self, name: &str, data: MaterialData) -> MaterialId {
        self.table.create_with(|columns, index| {
            columns.names[index] = name.to_owned();
            columns.data[index] = data;
        })
    }

    /// Destroys a material.
    ///
    /// # Returns
    ///
    /// `true` if the material was live.
    pub fn destroy(&mut self, id: MaterialId) -> bool {
        self.table.destroy_with(id, |_, _| {})
    }

    /// Returns the material name.
    #[must_use]
    pub fn name(&self, id: MaterialId) -> &str {
        &self.table.columns().names[id.index()]
    }

    /// Renames a material.
    pub fn set_name(&mut self, id: MaterialId, name: &str) {
        self.table.columns_mut().names[id.index()] = name.to_owned();
    }

    /// Returns every parameter of a material.
    #[must_use]
    pub fn data(&self, id: MaterialId) -> &MaterialData {
        &self.table.columns().data[id.index()]
    }

    /// Returns the tint.
    #[must_use]
    pub fn tint(&self, id: MaterialId) -> Rgb {
        self.data(id).tint
    }

    /// Returns the tint/roughness texture.
    #[must_use]
    pub fn tint_roughness_texture(&self, id: MaterialId) -> ImageId {
        self.data(id).tint_roughness_texture
    }

    /// Returns the roughness.
    #[must_use]
    pub fn roughness(&self, id: MaterialId) -> f32 {
        self.data(id).roughness
    }

    /// Returns the metalness.
    #[must_use]
    pub fn metallic(&self, id: MaterialId) -> f32 {
        self.data(id).metallic
    }

    /// Returns the specularity.
    #[must_use]
    pub fn specularity(&self, id: MaterialId) -> f32 {
        self.data(id).specularity
    }

    /// Returns the coverage.
    #[must_use]
    pub fn coverage(&self, id: MaterialId) -> f32 {
        self.data(id).coverage
    }

    /// Returns the coverage texture.
    #[must_use]
    pub fn coverage_texture(&self, id: MaterialId) -> ImageId {
        self.data(id).coverage_texture
    }

    /// Returns the transmission.
    #[must_use]
    pub fn transmission(&self, id: MaterialId) -> f32 {
        self.data(id).transmission
    }

    fn update(&mut self, id: MaterialId, apply: impl FnOnce(&mut MaterialData)) {
        apply(&mut self.table.columns_mut().data[id.index()]);
        self.table.mark_changed(id, MaterialChanges::UPDATED);
    }

    /// Sets the tint.
    pub fn set_tint(&mut self, id: MaterialId, tint: Rgb) {
        self.update(id, |data| data.tint = tint);
    }

    /// Sets the tint/roughness texture.
    pub fn set_tint_roughness_texture(&mut self, id: MaterialId, texture: ImageId) {
        self.update(id, |data| data.tint_roughness_texture = texture);
    }

    /// Sets the roughness.
    pub fn set_roughness(&mut self, id: MaterialId, roughness: f32) {
        self.update(id, |data| data.roughness = roughness);
    }

    /// Sets the metalness.
    pub fn set_metallic(&mut self, id: MaterialId, metallic: f32) {
        self.update(id, |data| data.metallic = metallic);
    }

    /// Sets the specularity.
    pub fn set_specularity(&mut self, id: MaterialId, specularity: f32) {
        self.update(id, |data| data.specularity = specularity);
    }

    /// Sets the coverage.
    pub fn set_coverage(&mut self, id: MaterialId, coverage: f32) {
        self.update(id, |data| data.coverage = coverage);
    }

    /// Sets the coverage texture.
    pub fn set_coverage_texture(&mut self, id: MaterialId, texture: ImageId) {
        self.update(id, |data| data.coverage_texture = texture);
    }

    /// Sets the transmission.
    pub fn set_transmission(&mut self, id: MaterialId, transmission: f32) {
        self.update(id, |data| data.transmission = transmission);
    }

    /// Returns the changes of a material since the last reset.
    #[must_use]
    pub fn changes(&self, id: MaterialId) -> MaterialChanges {
        self.table.changes(id)
    }

    /// Checks if any change in `mask` happened to a material since the last
    /// reset.
    #[must_use]
    pub fn has_changes(&self, id: MaterialId, mask: MaterialChanges) -> bool {
        self.table.has_changes(id, mask)
    }

    /// Iterates over the materials changed since the last reset.
    pub fn changed_materials(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.table.changed()
    }

    /// Clears all change notifications.
    pub fn reset_change_notifications(&mut self) {
        self.table.reset_change_notifications();
    }
}

impl std::fmt::Debug for Materials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materials").field("table", &self.table).finish()
    }
}
