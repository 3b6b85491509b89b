//! # Engine
//!
//! One instance of every table, plus the frame barrier.
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────┐
//! │ 1. MUTATE                                                │
//! │    └─ Application creates, edits and destroys entities   │
//! │                                                          │
//! │ 2. DRAIN                                                 │
//! │    └─ Renderers walk changed_*() and update GPU mirrors  │
//! │                                                          │
//! │ 3. END FRAME                                             │
//! │    └─ Every change set is reset                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

use bifrost_assets::{Images, Materials};
use bifrost_core::{CoreResult, EngineConfig};
use bifrost_scene::{Cameras, LightSources, Scenes};

/// Number of entities changed in each table during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// The frame that just ended.
    pub frame: u64,
    /// Changed images.
    pub images: usize,
    /// Changed materials.
    pub materials: usize,
    /// Changed scenes.
    pub scenes: usize,
    /// Changed cameras.
    pub cameras: usize,
    /// Changed light sources.
    pub light_sources: usize,
}

impl FrameStats {
    /// Total changed entities across all tables.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.images + self.materials + self.scenes + self.cameras + self.light_sources
    }
}

/// Owns every table.
///
/// Tables are public fields so callers can borrow several at once, e.g.
/// images mutably while reading materials.
#[derive(Debug)]
pub struct Engine {
    /// Image table.
    pub images: Images,
    /// Material table.
    pub materials: Materials,
    /// Scene table.
    pub scenes: Scenes,
    /// Camera table.
    pub cameras: Cameras,
    /// Light source table.
    pub light_sources: LightSources,
    frame: u64,
}

impl Engine {
    /// Creates an engine with every table allocated.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn new(config: &EngineConfig) -> CoreResult<Self> {
        config.validate()?;
        let capacities = &config.capacities;

        let mut images = Images::new();
        images.allocate(capacities.images);
        images.set_parallel_chunk_size(config.pixel_chunk_size);

        let mut materials = Materials::new();
        materials.allocate(capacities.materials);

        let mut scenes = Scenes::new();
        scenes.allocate(capacities.scenes);

        let mut cameras = Cameras::new();
        cameras.allocate(capacities.cameras);

        let mut light_sources = LightSources::new();
        light_sources.allocate(capacities.light_sources);

        tracing::debug!(
            "Engine ready: {} images, {} materials, {} scenes, {} cameras, {} lights",
            images.capacity(),
            materials.capacity(),
            scenes.capacity(),
            cameras.capacity(),
            light_sources.capacity()
        );

        Ok(Self {
            images,
            materials,
            scenes,
            cameras,
            light_sources,
            frame: 0,
        })
    }

    /// Returns the number of frames ended so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Counts the entities changed this frame without resetting anything.
    #[must_use]
    pub fn pending_changes(&self) -> FrameStats {
        FrameStats {
            frame: self.frame,
            images: self.images.changed_images().count(),
            materials: self.materials.changed_materials().count(),
            scenes: self.scenes.changed_scenes().count(),
            cameras: self.cameras.changed_cameras().count(),
            light_sources: self.light_sources.changed_lights().count(),
        }
    }

    /// Ends the frame: resets every change set and advances the frame
    /// counter. Call once all renderers have drained the changes.
    ///
    /// # Returns
    ///
    /// What changed during the frame that ended.
    pub fn end_frame(&mut self) -> FrameStats {
        let stats = self.pending_changes();

        self.images.reset_change_notifications();
        self.materials.reset_change_notifications();
        self.scenes.reset_change_notifications();
        self.cameras.reset_change_notifications();
        self.light_sources.reset_change_notifications();
        self.frame += 1;

        tracing::trace!("Frame {} ended with {} changes", stats.frame, stats.total());
        stats
    }

    /// Frees every table. The engine can not be used afterwards.
    pub fn teardown(&mut self) {
        self.images.deallocate();
        self.materials.deallocate();
        self.scenes.deallocate();
        self.cameras.deallocate();
        self.light_sources.deallocate();

        tracing::debug!("Engine torn down after {} frames", self.frame);
    }
}
