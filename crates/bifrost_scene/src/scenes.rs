//! # Scene Table
//!
//! A scene is a root node plus its background: either a constant color or an
//! environment map with the CDF used to importance sample it.

use bifrost_assets::ImageId;
use bifrost_core::{ChangeFlags, Column, Columns, EntityTable, Rgb, Uid};
use bitflags::bitflags;

use crate::SceneNodeId;

/// UID of a scene.
pub type SceneId = Uid<Scenes>;

bitflags! {
    /// Scene changes since the last reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SceneChanges: u8 {
        /// Scene was created.
        const CREATED = 1 << 0;
        /// Scene was destroyed.
        const DESTROYED = 1 << 1;
        /// Background color changed.
        const BACKGROUND_COLOR = 1 << 2;
        /// Environment map or its CDF changed.
        const ENVIRONMENT_MAP = 1 << 3;
    }
}

impl ChangeFlags for SceneChanges {
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

#[derive(Default)]
struct SceneColumns {
    names: Column<String>,
    root_nodes: Column<SceneNodeId>,
    background_colors: Column<Rgb>,
    environment_maps: Column<ImageId>,
    environment_cdfs: Column<ImageId>,
}

impl Columns for SceneColumns {
    fn resize(&mut self, capacity: usize) {
        self.names.resize(capacity);
        self.root_nodes.resize(capacity);
        self.background_colors.resize(capacity);
        self.environment_maps.resize(capacity);
        self.environment_cdfs.resize(capacity);
    }

    fn init_sentinel(&mut self) {
        self.names[0] = "Dummy Scene".to_owned();
        self.root_nodes[0] = SceneNodeId::invalid();
        self.background_colors[0] = Rgb::black();
        self.environment_maps[0] = ImageId::invalid();
        self.environment_cdfs[0] = ImageId::invalid();
    }
}

/// The scene table.
#[derive(Default)]
pub struct Scenes {
    table: EntityTable<Scenes, SceneColumns, SceneChanges>,
}

impl Scenes {
    /// Creates an unallocated scene table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates room for `capacity` scenes, including the sentinel.
    pub fn allocate(&mut self, capacity: usize) {
        self.table.allocate(capacity);
    }

    /// Frees every scene and all table storage.
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

    /// Checks if a scene is live.
    #[must_use]
    pub fn has(&self, id: SceneId) -> bool {
        self.table.has(id)
    }

    /// Returns the number of live scenes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no scene is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over all live scenes.
    pub fn iter(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.table.iter()
    }

    /// Creates a scene with a constant background color.
    pub fn create(&mut self, name: &str, root: SceneNodeId, background_color: Rgb) -> SceneId {
        self.insert(name, root, background_color, ImageId::invalid(), ImageId::invalid())
    }

    /// Creates a scene lit by an environment map.
    ///
    /// # Arguments
    ///
    /// * `environment_map` - Lat-long radiance map
    /// * `environment_cdf` - Sampling distribution of the map. May be
    ///   invalid, in which case the renderer samples the map uniformly
    pub fn create_with_environment(
        &mut self,
        name: &str,
        root: SceneNodeId,
        environment_map: ImageId,
        environment_cdf: ImageId,
    ) -> SceneId {
        self.insert(name, root, Rgb::black(), environment_map, environment_cdf)
    }

    fn insert(
        &mut self,
        name: &str,
        root: SceneNodeId,
        background_color: Rgb,
        environment_map: ImageId,
        environment_cdf: ImageId,
    ) -> SceneId {
        self.table.create_with(|columns, index| {
            columns.names[index] = name.to_owned();
            columns.root_nodes[index] = root;
            columns.background_colors[index] = background_color;
            columns.environment_maps[index] = environment_map;
            columns.environment_cdfs[index] = environment_cdf;
        })
    }

    /// Destroys a scene. Referenced images are left alone.
    ///
    /// # Returns
    ///
    /// `true` if the scene was live.
    pub fn destroy(&mut self, id: SceneId) -> bool {
        self.table.destroy_with(id, |_, _| {})
    }

    /// Returns the scene name.
    #[must_use]
    pub fn name(&self, id: SceneId) -> &str {
        &self.table.columns().names[id.index()]
    }

    /// Renames a scene.
    pub fn set_name(&mut self, id: SceneId, name: &str) {
        self.table.columns_mut().names[id.index()] = name.to_owned();
    }

    /// Returns the root node of the scene graph.
    #[must_use]
    pub fn root_node(&self, id: SceneId) -> SceneNodeId {
        self.table.columns().root_nodes[id.index()]
    }

    /// Returns the background color.
    #[must_use]
    pub fn background_color(&self, id: SceneId) -> Rgb {
        self.table.columns().background_colors[id.index()]
    }

    /// Sets the background color.
    ///
    /// Marks [`SceneChanges::BACKGROUND_COLOR`].
    pub fn set_background_color(&mut self, id: SceneId, color: Rgb) {
        self.table.columns_mut().background_colors[id.index()] = color;
        self.table.mark_changed(id, SceneChanges::BACKGROUND_COLOR);
    }

    /// Returns the environment map.
    #[must_use]
    pub fn environment_map(&self, id: SceneId) -> ImageId {
        self.table.columns().environment_maps[id.index()]
    }

    /// Returns the sampling CDF of the environment map.
    #[must_use]
    pub fn environment_cdf(&self, id: SceneId) -> ImageId {
        self.table.columns().environment_cdfs[id.index()]
    }

    /// Replaces the environment map and its CDF.
    ///
    /// Marks [`SceneChanges::ENVIRONMENT_MAP`].
    pub fn set_environment_map(&mut self, id: SceneId, environment_map: ImageId, environment_cdf: ImageId) {
        let columns = self.table.columns_mut();
        columns.environment_maps[id.index()] = environment_map;
        columns.environment_cdfs[id.index()] = environment_cdf;
        self.table.mark_changed(id, SceneChanges::ENVIRONMENT_MAP);
    }

    /// Returns the changes of a scene since the last reset.
    #[must_use]
    pub fn changes(&self, id: SceneId) -> SceneChanges {
        self.table.changes(id)
    }

    /// Checks if any change in `mask` happened to a scene since the last
    /// reset.
    #[must_use]
    pub fn has_changes(&self, id: SceneId, mask: SceneChanges) -> bool {
        self.table.has_changes(id, mask)
    }

    /// Iterates over the scenes changed since the last reset.
    pub fn changed_scenes(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.table.changed()
    }

    /// Clears all change notifications.
    pub fn reset_change_notifications(&mut self) {
        self.table.reset_change_notifications();
    }
}

impl std::fmt::Debug for Scenes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenes").field("table", &self.table).finish()
    }
}
