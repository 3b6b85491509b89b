//! # Scene Table Tests
//!
//! Cross table references and frame by frame change draining, the way a
//! renderer backend consumes the scene tables.

use bifrost_assets::{Images, PixelFormat};
use bifrost_core::Rgb;
use bifrost_scene::{
    compute_perspective_projection, CameraChanges, Cameras, LightSourceChanges, LightSources,
    RendererId, SceneChanges, SceneNodeId, Scenes,
};

#[test]
fn weak_references_survive_their_targets() {
    let mut images = Images::new();
    images.allocate(4);
    let mut scenes = Scenes::new();
    scenes.allocate(2);
    let mut cameras = Cameras::new();
    cameras.allocate(2);

    let map = images.create_2d("sky", PixelFormat::RgbFloat, 1.0, (8, 4), 1);
    let scene = scenes.create_with_environment("Outdoor", SceneNodeId::new(1, 1), map, Default::default());
    let (projection, inverse) = compute_perspective_projection(0.1, 1000.0, 1.2, 2.0);
    let camera = cameras.create("Main", scene, projection, inverse, RendererId::new(1, 1));

    images.destroy(map);
    assert_eq!(scenes.environment_map(scene), map);
    assert!(!images.has(scenes.environment_map(scene)));

    scenes.destroy(scene);
    assert!(cameras.has(camera));
    assert!(!scenes.has(cameras.scene_id(camera)));
}

#[test]
fn renderer_drains_one_frame_at_a_time() {
    let mut scenes = Scenes::new();
    scenes.allocate(2);
    let mut cameras = Cameras::new();
    cameras.allocate(2);
    let mut lights = LightSources::new();
    lights.allocate(2);

    // Frame 1: everything is new.
    let scene = scenes.create("Studio", SceneNodeId::new(1, 1), Rgb::black());
    let (projection, inverse) = compute_perspective_projection(0.1, 10.0, 1.0, 1.0);
    let camera = cameras.create("Main", scene, projection, inverse, RendererId::invalid());
    let key = lights.create_sphere_light(SceneNodeId::new(2, 1), Rgb::splat(100.0), 0.2);
    let fill = lights.create_sphere_light(SceneNodeId::new(3, 1), Rgb::splat(20.0), 0.0);

    assert_eq!(scenes.changed_scenes().count(), 1);
    assert_eq!(cameras.changed_cameras().count(), 1);
    assert_eq!(lights.changed_lights().count(), 2);
    scenes.reset_change_notifications();
    cameras.reset_change_notifications();
    lights.reset_change_notifications();

    // Frame 2: sparse edits only.
    scenes.set_background_color(scene, Rgb::new(0.1, 0.1, 0.2));
    cameras.set_renderer_id(camera, RendererId::new(1, 1));
    lights.set_sphere_light_power(fill, Rgb::splat(40.0));
    lights.destroy(key);

    assert_eq!(scenes.changes(scene), SceneChanges::BACKGROUND_COLOR);
    assert_eq!(cameras.changes(camera), CameraChanges::RENDERER);
    let changed: Vec<_> = lights.changed_lights().collect();
    assert_eq!(changed, vec![fill, key]);
    assert_eq!(lights.changes(fill), LightSourceChanges::UPDATED);
    assert_eq!(lights.changes(key), LightSourceChanges::DESTROYED);
    scenes.reset_change_notifications();
    cameras.reset_change_notifications();
    lights.reset_change_notifications();

    // Frame 3: nothing happened.
    assert_eq!(scenes.changed_scenes().count(), 0);
    assert_eq!(cameras.changed_cameras().count(), 0);
    assert_eq!(lights.changed_lights().count(), 0);
    assert_eq!(lights.len(), 1);
}
