//! # Camera Table
//!
//! Matrix cameras looking into a scene. A camera's transform places it in the
//! world (the inverse view transform), its projection maps view space to clip
//! space, and its renderer id tells which backend draws it.

use bifrost_core::{ChangeFlags, Column, Columns, EntityTable, Uid};
use bitflags::bitflags;

use crate::math::{Matrix4, Rect, Transform};
use crate::scenes::SceneId;
use crate::RendererId;

/// UID of a camera.
pub type CameraId = Uid<Cameras>;

bitflags! {
    /// Camera changes since the last reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CameraChanges: u8 {
        /// Camera was created.
        const CREATED = 1 << 0;
        /// Camera was destroyed.
        const DESTROYED = 1 << 1;
        /// Camera moved to another renderer.
        const RENDERER = 1 << 2;
    }
}

impl ChangeFlags for CameraChanges {
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
struct CameraColumns {
    names: Column<String>,
    scene_ids: Column<SceneId>,
    transforms: Column<Transform>,
    projections: Column<Matrix4>,
    inverse_projections: Column<Matrix4>,
    z_indices: Column<i32>,
    viewports: Column<Rect>,
    renderer_ids: Column<RendererId>,
}

impl Columns for CameraColumns {
    fn resize(&mut self, capacity: usize) {
        self.names.resize(capacity);
        self.scene_ids.resize(capacity);
        self.transforms.resize(capacity);
        self.projections.resize(capacity);
        self.inverse_projections.resize(capacity);
        self.z_indices.resize(capacity);
        self.viewports.resize(capacity);
        self.renderer_ids.resize(capacity);
    }

    fn init_sentinel(&mut self) {
        self.names[0] = "Dummy camera".to_owned();
        self.scene_ids[0] = SceneId::invalid();
        self.transforms[0] = Transform::IDENTITY;
        self.projections[0] = Matrix4::IDENTITY;
        self.inverse_projections[0] = Matrix4::IDENTITY;
        self.z_indices[0] = 0;
        self.viewports[0] = Rect::FULL;
        self.renderer_ids[0] = RendererId::invalid();
    }
}

/// The camera table.
#[derive(Default)]
pub struct Cameras {
    table: EntityTable<Cameras, CameraColumns, CameraChanges>,
}

impl Cameras {
    /// Creates an unallocated camera table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates room for `capacity` cameras, including the sentinel.
    pub fn allocate(&mut self, capacity: usize) {
        self.table.allocate(capacity);
    }

    /// Frees every camera and all table storage.
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

    /// Checks if a camera is live.
    #[must_use]
    pub fn has(&self, id: CameraId) -> bool {
        self.table.has(id)
    }

    /// Returns the number of live cameras.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no camera is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over all live cameras.
    pub fn iter(&self) -> impl Iterator<Item = CameraId> + '_ {
        self.table.iter()
    }

    /// Creates a camera at the origin with a full viewport and z-index 0.
    ///
    /// # Arguments
    ///
    /// * `name` - Camera name
    /// * `scene_id` - The scene the camera looks into
    /// * `projection` - View to clip space
    /// * `inverse_projection` - Clip to view space
    /// * `renderer_id` - The renderer drawing the camera. May be invalid
    pub fn create(
        &mut self,
        name: &str,
        scene_id: SceneId,
        projection: Matrix4,
        inverse_projection: Matrix4,
        renderer_id: RendererId,
    ) -> CameraId {
        self.table.create_with(|columns, index| {
            columns.names[index] = name.to_owned();
            columns.scene_ids[index] = scene_id;
            columns.transforms[index] = Transform::IDENTITY;
            columns.projections[index] = projection;
            columns.inverse_projections[index] = inverse_projection;
            columns.z_indices[index] = 0;
            columns.viewports[index] = Rect::FULL;
            columns.renderer_ids[index] = renderer_id;
        })
    }

    /// Destroys a camera.
    ///
    /// # Returns
    ///
    /// `true` if the camera was live.
    pub fn destroy(&mut self, id: CameraId) -> bool {
        self.table.destroy_with(id, |_, _| {})
    }

    /// Returns the camera name.
    #[must_use]
    pub fn name(&self, id: CameraId) -> &str {
        &self.table.columns().names[id.index()]
    }

    /// Renames a camera.
    pub fn set_name(&mut self, id: CameraId, name: &str) {
        self.table.columns_mut().names[id.index()] = name.to_owned();
    }

    /// Returns the scene the camera looks into.
    #[must_use]
    pub fn scene_id(&self, id: CameraId) -> SceneId {
        self.table.columns().scene_ids[id.index()]
    }

    /// Returns the renderer drawing the camera.
    #[must_use]
    pub fn renderer_id(&self, id: CameraId) -> RendererId {
        self.table.columns().renderer_ids[id.index()]
    }

    /// Moves the camera to another renderer.
    ///
    /// Marks [`CameraChanges::RENDERER`].
    pub fn set_renderer_id(&mut self, id: CameraId, renderer_id: RendererId) {
        self.table.columns_mut().renderer_ids[id.index()] = renderer_id;
        self.table.mark_changed(id, CameraChanges::RENDERER);
    }

    /// Returns the camera's placement in the world.
    #[must_use]
    pub fn transform(&self, id: CameraId) -> Transform {
        self.table.columns().transforms[id.index()]
    }

    /// Places the camera in the world.
    pub fn set_transform(&mut self, id: CameraId, transform: Transform) {
        self.table.columns_mut().transforms[id.index()] = transform;
    }

    /// Returns the world to view transform.
    #[must_use]
    pub fn view_transform(&self, id: CameraId) -> Transform {
        self.transform(id).inverse()
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self, id: CameraId) -> Matrix4 {
        self.table.columns().projections[id.index()]
    }

    /// Returns the inverse projection matrix.
    #[must_use]
    pub fn inverse_projection_matrix(&self, id: CameraId) -> Matrix4 {
        self.table.columns().inverse_projections[id.index()]
    }

    /// Replaces the projection and its inverse.
    pub fn set_projection_matrices(&mut self, id: CameraId, projection: Matrix4, inverse_projection: Matrix4) {
        let columns = self.table.columns_mut();
        columns.projections[id.index()] = projection;
        columns.inverse_projections[id.index()] = inverse_projection;
    }

    /// Returns the world to clip space matrix.
    #[must_use]
    pub fn view_projection_matrix(&self, id: CameraId) -> Matrix4 {
        self.projection_matrix(id) * self.view_transform(id).to_matrix()
    }

    /// Returns the clip to world space matrix.
    #[must_use]
    pub fn inverse_view_projection_matrix(&self, id: CameraId) -> Matrix4 {
        self.transform(id).to_matrix() * self.inverse_projection_matrix(id)
    }

    /// Returns the z-index. Cameras with a higher z-index draw in front.
    #[must_use]
    pub fn z_index(&self, id: CameraId) -> i32 {
        self.table.columns().z_indices[id.index()]
    }

    /// Sets the z-index.
    pub fn set_z_index(&mut self, id: CameraId, z_index: i32) {
        self.table.columns_mut().z_indices[id.index()] = z_index;
    }

    /// Returns the normalized viewport.
    #[must_use]
    pub fn viewport(&self, id: CameraId) -> Rect {
        self.table.columns().viewports[id.index()]
    }

    /// Sets the normalized viewport.
    pub fn set_viewport(&mut self, id: CameraId, viewport: Rect) {
        self.table.columns_mut().viewports[id.index()] = viewport;
    }

    /// Returns the live cameras ordered by z-index, lowest first. Cameras
    /// with equal z-index keep their iteration order.
    #[must_use]
    pub fn z_sorted_ids(&self) -> Vec<CameraId> {
        let mut ids: Vec<CameraId> = self.iter().collect();
        ids.sort_by_key(|id| self.z_index(*id));
        ids
    }

    /// Returns the changes of a camera since the last reset.
    #[must_use]
    pub fn changes(&self, id: CameraId) -> CameraChanges {
        self.table.changes(id)
    }

    /// Checks if any change in `mask` happened to a camera since the last
    /// reset.
    #[must_use]
    pub fn has_changes(&self, id: CameraId, mask: CameraChanges) -> bool {
        self.table.has_changes(id, mask)
    }

    /// Iterates over the cameras changed since the last reset.
    pub fn changed_cameras(&self) -> impl Iterator<Item = CameraId> + '_ {
        self.table.changed()
    }

    /// Clears all change notifications.
    pub fn reset_change_notifications(&mut self) {
        self.table.reset_change_notifications();
    }
}

impl std::fmt::Debug for Cameras {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cameras").field("table", &self.table).finish()
    }
}

// =============================================================================
// PROJECTION
// =============================================================================

/// Computes a right handed perspective projection looking down -z, mapping
/// the view frustum to `[-1, 1]` clip space, together with its analytic
/// inverse.
///
/// # Arguments
///
/// * `near` - Distance to the near plane
/// * `far` - Distance to the far plane
/// * `field_of_view` - Vertical field of view in radians
/// * `aspect_ratio` - Width over height
///
/// # Returns
///
/// `(projection, inverse_projection)`
#[must_use]
pub fn compute_perspective_projection(near: f32, far: f32, field_of_view: f32, aspect_ratio: f32) -> (Matrix4, Matrix4) {
    let f = 1.0 / (field_of_view * 0.5).tan();
    let a = (far + near) / (near - far);
    let b = 2.0 * far * near / (near - far);

    let projection = Matrix4::from_rows([
        [f / aspect_ratio, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, a, b],
        [0.0, 0.0, -1.0, 0.0],
    ]);
    let inverse_projection = Matrix4::from_rows([
        [aspect_ratio / f, 0.0, 0.0, 0.0],
        [0.0, 1.0 / f, 0.0, 0.0],
        [0.0, 0.0, 0.0, -1.0],
        [0.0, 0.0, 1.0 / b, a / b],
    ]);
    (projection, inverse_projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quaternion, Vec3};

    fn cameras() -> Cameras {
        let mut cameras = Cameras::new();
        cameras.allocate(4);
        cameras
    }

    fn create(cameras: &mut Cameras, name: &str) -> CameraId {
        let (projection, inverse) = compute_perspective_projection(0.1, 100.0, 1.0, 16.0 / 9.0);
        cameras.create(name, SceneId::new(1, 1), projection, inverse, RendererId::invalid())
    }

    fn assert_identity(m: Matrix4) {
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((m.get(r, c) - expected).abs() < 1e-4, "{m:?}");
            }
        }
    }

    #[test]
    fn test_sentinel_camera() {
        let cameras = cameras();
        let sentinel = CameraId::invalid();
        assert!(!cameras.has(sentinel));
        assert!(cameras.scene_id(sentinel).is_invalid());
        assert!(cameras.renderer_id(sentinel).is_invalid());
        assert_eq!(cameras.viewport(sentinel), Rect::FULL);
        assert_eq!(cameras.projection_matrix(sentinel), Matrix4::IDENTITY);
    }

    #[test]
    fn test_create_defaults() {
        let mut cameras = cameras();
        let id = create(&mut cameras, "Main");

        assert!(cameras.has(id));
        assert_eq!(cameras.name(id), "Main");
        assert_eq!(cameras.scene_id(id), SceneId::new(1, 1));
        assert_eq!(cameras.transform(id), Transform::IDENTITY);
        assert_eq!(cameras.z_index(id), 0);
        assert_eq!(cameras.viewport(id), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(cameras.changes(id), CameraChanges::CREATED);
    }

    #[test]
    fn test_set_renderer_marks_change() {
        let mut cameras = cameras();
        let id = create(&mut cameras, "Main");
        cameras.reset_change_notifications();

        cameras.set_z_index(id, 3);
        cameras.set_viewport(id, Rect::new(0.5, 0.0, 0.5, 1.0));
        assert_eq!(cameras.changed_cameras().count(), 0);

        cameras.set_renderer_id(id, RendererId::new(2, 1));
        assert_eq!(cameras.renderer_id(id), RendererId::new(2, 1));
        assert_eq!(cameras.changed_cameras().collect::<Vec<_>>(), vec![id]);
        assert_eq!(cameras.changes(id), CameraChanges::RENDERER);
    }

    #[test]
    fn test_z_sorted_ids() {
        let mut cameras = cameras();
        let back = create(&mut cameras, "Back");
        let front = create(&mut cameras, "Front");
        let middle = create(&mut cameras, "Middle");
        let also_middle = create(&mut cameras, "AlsoMiddle");

        cameras.set_z_index(back, -2);
        cameras.set_z_index(front, 5);
        cameras.set_z_index(middle, 1);
        cameras.set_z_index(also_middle, 1);

        let sorted = cameras.z_sorted_ids();
        assert_eq!(sorted.len(), 4);
        assert_eq!(sorted[0], back);
        assert_eq!(sorted[3], front);
        assert_eq!(cameras.z_index(sorted[1]), 1);
        assert_eq!(cameras.z_index(sorted[2]), 1);
    }

    #[test]
    fn test_perspective_inverse() {
        let (projection, inverse) = compute_perspective_projection(0.5, 50.0, 0.8, 1.5);
        assert_identity(projection * inverse);
        assert_identity(inverse * projection);
    }

    #[test]
    fn test_perspective_maps_near_and_far() {
        let (projection, _) = compute_perspective_projection(1.0, 10.0, 1.0, 1.0);
        let depth = |z: f32| {
            let clip_z = projection.get(2, 2) * z + projection.get(2, 3);
            let clip_w = projection.get(3, 2) * z;
            clip_z / clip_w
        };
        assert!((depth(-1.0) + 1.0).abs() < 1e-5);
        assert!((depth(-10.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_projection_inverse() {
        let mut cameras = cameras();
        let id = create(&mut cameras, "Main");
        let rotation = Quaternion::from_angle_axis(0.3, Vec3::new(0.0, 1.0, 0.0));
        cameras.set_transform(id, Transform::new(Vec3::new(1.0, 2.0, 3.0), rotation, 1.0));

        assert_identity(cameras.inverse_view_projection_matrix(id) * cameras.view_projection_matrix(id));
    }

    #[test]
    fn test_destroy() {
        let mut cameras = cameras();
        let id = create(&mut cameras, "Main");
        cameras.reset_change_notifications();

        assert!(cameras.destroy(id));
        assert!(!cameras.has(id));
        assert!(cameras.z_sorted_ids().is_empty());
        assert_eq!(cameras.changes(id), CameraChanges::DESTROYED);
    }
}
