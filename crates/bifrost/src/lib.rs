//! # Bifrost
//!
//! Engine-wide asset and scene state, stored as UID-indexed tables that
//! track what changed each frame so renderer backends can update their GPU
//! mirrors incrementally.
//!
//! ## Crates
//!
//! - [`core`]: UIDs, change sets, the generic entity table, colors, config
//! - [`assets`]: images, image utilities, materials
//! - [`scene`]: scenes, cameras, light sources
//!
//! ## Example
//!
//! ```rust
//! use bifrost::{Engine, EngineConfig, PixelFormat};
//!
//! let mut engine = Engine::new(&EngineConfig::default()).unwrap();
//! let albedo = engine.images.create_2d("albedo", PixelFormat::Rgba32, 2.2, (64, 64), 7);
//! bifrost::assets::image_utils::fill_mipmap_chain(&mut engine.images, albedo);
//!
//! // Renderer side
//! for id in engine.images.changed_images() {
//!     let _level0 = engine.images.pixel_bytes(id, 0);
//! }
//!
//! let stats = engine.end_frame();
//! assert_eq!(stats.images, 1);
//! ```

pub mod engine;
pub mod sync;

pub use bifrost_assets as assets;
pub use bifrost_core as core;
pub use bifrost_scene as scene;

pub use bifrost_assets::{ImageId, Images, MaterialData, MaterialId, Materials, PixelFormat};
pub use bifrost_core::{CoreError, CoreResult, EngineConfig, Rgb, Rgba, Uid};
pub use bifrost_scene::{CameraId, Cameras, LightSourceId, LightSources, SceneId, Scenes};
pub use engine::{Engine, FrameStats};
pub use sync::SharedEngine;
