//! # Bifrost Scene
//!
//! Scene level tables: [`Scenes`], [`Cameras`] and [`LightSources`].
//!
//! Scene nodes and renderers live outside this crate. They are referenced by
//! typed UIDs only ([`SceneNodeId`], [`RendererId`]), and like every cross
//! table reference here those UIDs are weak: destroying a scene does not
//! destroy its environment map, and a camera keeps pointing at a destroyed
//! scene until someone moves it.

pub mod cameras;
pub mod light_sources;
pub mod math;
pub mod scenes;

use bifrost_core::Uid;

pub use cameras::{compute_perspective_projection, CameraChanges, CameraId, Cameras};
pub use light_sources::{LightSourceChanges, LightSourceId, LightSourceType, LightSources};
pub use math::{Matrix4, Quaternion, Rect, Transform, Vec3};
pub use scenes::{SceneChanges, SceneId, Scenes};

/// Marker for UIDs of scene graph nodes.
#[derive(Debug)]
pub enum SceneNodes {}

/// UID of a scene graph node.
pub type SceneNodeId = Uid<SceneNodes>;

/// Marker for UIDs of renderer backends.
#[derive(Debug)]
pub enum Renderers {}

/// UID of a renderer backend.
pub type RendererId = Uid<Renderers>;
