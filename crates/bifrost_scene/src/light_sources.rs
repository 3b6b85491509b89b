//! # Light Source Table
//!
//! Sphere lights emit `power` from a sphere of `radius` centered on their
//! scene node. Directional lights emit `radiance` along their node's forward
//! axis from infinitely far away.

use bifrost_core::{ChangeFlags, Column, Columns, EntityTable, Rgb, Uid};
use bitflags::bitflags;

use crate::SceneNodeId;

/// UID of a light source.
pub type LightSourceId = Uid<LightSources>;

/// Kind of a light source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightSourceType {
    /// Spherical area light. A point light when its radius is zero.
    #[default]
    Sphere,
    /// Light arriving from a single direction.
    Directional,
}

bitflags! {
    /// Light source changes since the last reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LightSourceChanges: u8 {
        /// Light was created.
        const CREATED = 1 << 0;
        /// Light was destroyed.
        const DESTROYED = 1 << 1;
        /// Power, radiance or radius changed.
        const UPDATED = 1 << 2;
    }
}

impl ChangeFlags for LightSourceChanges {
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

// Sphere power and directional radiance share one column.
#[derive(Default)]
struct LightColumns {
    node_ids: Column<SceneNodeId>,
    types: Column<LightSourceType>,
    emission: Column<Rgb>,
    radii: Column<f32>,
}

impl Columns for LightColumns {
    fn resize(&mut self, capacity: usize) {
        self.node_ids.resize(capacity);
        self.types.resize(capacity);
        self.emission.resize(capacity);
        self.radii.resize(capacity);
    }

    fn init_sentinel(&mut self) {
        self.node_ids[0] = SceneNodeId::invalid();
        self.types[0] = LightSourceType::Sphere;
        self.emission[0] = Rgb::black();
        self.radii[0] = 0.0;
    }
}

/// The light source table.
#[derive(Default)]
pub struct LightSources {
    table: EntityTable<LightSources, LightColumns, LightSourceChanges>,
}

impl LightSources {
    /// Creates an unallocated light source table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates room for `capacity` lights, including the sentinel.
    pub fn allocate(&mut self, capacity: usize) {
        self.table.allocate(capacity);
    }

    /// Frees every light and all table storage.
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

    /// Checks if a light is live.
    #[must_use]
    pub fn has(&self, id: LightSourceId) -> bool {
        self.table.has(id)
    }

    /// Returns the number of live lights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no light is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over all live lights.
    pub fn iter(&self) -> impl Iterator<Item = LightSourceId> + '_ {
        self.table.iter()
    }

    /// Creates a sphere light. Negative radii are clamped to zero.
    pub fn create_sphere_light(&mut self, node_id: SceneNodeId, power: Rgb, radius: f32) -> LightSourceId {
        self.insert(node_id, LightSourceType::Sphere, power, radius.max(0.0))
    }

    /// Creates a directional light.
    pub fn create_directional_light(&mut self, node_id: SceneNodeId, radiance: Rgb) -> LightSourceId {
        self.insert(node_id, LightSourceType::Directional, radiance, 0.0)
    }

    fn insert(&mut self, node_id: SceneNodeId, light_type: LightSourceType, emission: Rgb, radius: f32) -> LightSourceId {
        self.table.create_with(|columns, index| {
            columns.node_ids[index] = node_id;
            columns.types[index] = light_type;
            columns.emission[index] = emission;
            columns.radii[index] = radius;
        })
    }

    /// Destroys a light.
    ///
    /// # Returns
    ///
    /// `true` if the light was live.
    pub fn destroy(&mut self, id: LightSourceId) -> bool {
        self.table.destroy_with(id, |_, _| {})
    }

    /// Returns the scene node the light is attached to.
    #[must_use]
    pub fn node_id(&self, id: LightSourceId) -> SceneNodeId {
        self.table.columns().node_ids[id.index()]
    }

    /// Returns the kind of light.
    #[must_use]
    pub fn light_type(&self, id: LightSourceId) -> LightSourceType {
        self.table.columns().types[id.index()]
    }

    /// Checks if the light is infinitely small or infinitely far away, so
    /// it can only be sampled, never hit.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_delta_light(&self, id: LightSourceId) -> bool {
        match self.light_type(id) {
            LightSourceType::Sphere => self.sphere_light_radius(id) == 0.0,
            LightSourceType::Directional => true,
        }
    }

    /// Returns the power of a sphere light.
    #[must_use]
    pub fn sphere_light_power(&self, id: LightSourceId) -> Rgb {
        self.table.columns().emission[id.index()]
    }

    /// Sets the power of a sphere light.
    ///
    /// Marks [`LightSourceChanges::UPDATED`].
    pub fn set_sphere_light_power(&mut self, id: LightSourceId, power: Rgb) {
        self.table.columns_mut().emission[id.index()] = power;
        self.table.mark_changed(id, LightSourceChanges::UPDATED);
    }

    /// Returns the radius of a sphere light.
    #[must_use]
    pub fn sphere_light_radius(&self, id: LightSourceId) -> f32 {
        self.table.columns().radii[id.index()]
    }

    /// Sets the radius of a sphere light. Negative radii are clamped to
    /// zero.
    ///
    /// Marks [`LightSourceChanges::UPDATED`].
    pub fn set_sphere_light_radius(&mut self, id: LightSourceId, radius: f32) {
        self.table.columns_mut().radii[id.index()] = radius.max(0.0);
        self.table.mark_changed(id, LightSourceChanges::UPDATED);
    }

    /// Returns the radiance of a directional light.
    #[must_use]
    pub fn directional_light_radiance(&self, id: LightSourceId) -> Rgb {
        self.table.columns().emission[id.index()]
    }

    /// Sets the radiance of a directional light.
    ///
    /// Marks [`LightSourceChanges::UPDATED`].
    pub fn set_directional_light_radiance(&mut self, id: LightSourceId, radiance: Rgb) {
        self.table.columns_mut().emission[id.index()] = radiance;
        self.table.mark_changed(id, LightSourceChanges::UPDATED);
    }

    /// Returns the changes of a light since the last reset.
    #[must_use]
    pub fn changes(&self, id: LightSourceId) -> LightSourceChanges {
        self.table.changes(id)
    }

    /// Checks if any change in `mask` happened to a light since the last
    /// reset.
    #[must_use]
    pub fn has_changes(&self, id: LightSourceId, mask: LightSourceChanges) -> bool {
        self.table.has_changes(id, mask)
    }

    /// Iterates over the lights changed since the last reset.
    pub fn changed_lights(&self) -> impl Iterator<Item = LightSourceId> + '_ {
        self.table.changed()
    }

    /// Clears all change notifications.
    pub fn reset_change_notifications(&mut self) {
        self.table.reset_change_notifications();
    }
}

impl std::fmt::Debug for LightSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightSources").field("table", &self.table).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lights() -> LightSources {
        let mut lights = LightSources::new();
        lights.allocate(2);
        lights
    }

    #[test]
    fn test_sphere_light() {
        let mut lights = lights();
        let node = SceneNodeId::new(3, 1);
        let id = lights.create_sphere_light(node, Rgb::splat(10.0), 0.5);

        assert!(lights.has(id));
        assert_eq!(lights.node_id(id), node);
        assert_eq!(lights.light_type(id), LightSourceType::Sphere);
        assert_eq!(lights.sphere_light_power(id), Rgb::splat(10.0));
        assert_eq!(lights.sphere_light_radius(id), 0.5);
        assert!(!lights.is_delta_light(id));
        assert_eq!(lights.changes(id), LightSourceChanges::CREATED);
    }

    #[test]
    fn test_point_light_is_delta() {
        let mut lights = lights();
        let id = lights.create_sphere_light(SceneNodeId::new(1, 1), Rgb::white(), -1.0);

        assert_eq!(lights.sphere_light_radius(id), 0.0);
        assert!(lights.is_delta_light(id));
    }

    #[test]
    fn test_directional_light_is_delta() {
        let mut lights = lights();
        let id = lights.create_directional_light(SceneNodeId::new(1, 1), Rgb::new(1.0, 0.9, 0.8));

        assert_eq!(lights.light_type(id), LightSourceType::Directional);
        assert_eq!(lights.directional_light_radiance(id), Rgb::new(1.0, 0.9, 0.8));
        assert!(lights.is_delta_light(id));
    }

    #[test]
    fn test_setters_mark_updated() {
        let mut lights = lights();
        let id = lights.create_sphere_light(SceneNodeId::new(1, 1), Rgb::white(), 0.0);
        lights.reset_change_notifications();

        lights.set_sphere_light_radius(id, 2.0);
        lights.set_sphere_light_power(id, Rgb::splat(4.0));

        assert_eq!(lights.changed_lights().count(), 1);
        assert_eq!(lights.changes(id), LightSourceChanges::UPDATED);
        assert!(!lights.is_delta_light(id));
    }

    #[test]
    fn test_create_and_destroy_in_one_frame() {
        let mut lights = lights();
        let keep = lights.create_sphere_light(SceneNodeId::new(1, 1), Rgb::white(), 1.0);
        let gone = lights.create_directional_light(SceneNodeId::new(2, 1), Rgb::white());
        lights.destroy(gone);

        assert_eq!(lights.changed_lights().count(), 2);
        assert_eq!(lights.changes(keep), LightSourceChanges::CREATED);
        assert_eq!(lights.changes(gone), LightSourceChanges::DESTROYED);
        assert_eq!(lights.iter().collect::<Vec<_>>(), vec![keep]);
    }
}
