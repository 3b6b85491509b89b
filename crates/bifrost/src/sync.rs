//! # Shared Engine
//!
//! The tables are single owner: every mutation takes `&mut`. To share an
//! engine between the application thread and renderer threads, wrap it in a
//! [`SharedEngine`]. Renderers drain changes under read guards, the
//! application mutates under the write guard, and [`SharedEngine::end_frame`]
//! takes the write guard so no drain is in flight while change sets reset.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::{Engine, FrameStats};

/// Clonable, lock-guarded handle to an [`Engine`].
#[derive(Clone, Debug)]
pub struct SharedEngine {
    inner: Arc<RwLock<Engine>>,
}

impl SharedEngine {
    /// Takes ownership of an engine.
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Locks the engine for reading. Blocks while a writer holds it.
    pub fn read(&self) -> RwLockReadGuard<'_, Engine> {
        self.inner.read()
    }

    /// Locks the engine for writing. Blocks while any reader holds it.
    pub fn write(&self) -> RwLockWriteGuard<'_, Engine> {
        self.inner.write()
    }

    /// Ends the frame under the write guard.
    pub fn end_frame(&self) -> FrameStats {
        self.inner.write().end_frame()
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bifrost_assets::PixelFormat;
    use bifrost_core::EngineConfig;

    #[test]
    fn test_readers_see_writes_until_frame_end() {
        let shared = SharedEngine::new(Engine::new(&EngineConfig::default()).unwrap());
        let id = shared
            .write()
            .images
            .create_2d("albedo", PixelFormat::Rgba32, 2.2, (2, 2), 1);

        let renderer = shared.clone();
        let seen = std::thread::spawn(move || renderer.read().images.changed_images().collect::<Vec<_>>())
            .join()
            .unwrap();
        assert_eq!(seen, vec![id]);

        let stats = shared.end_frame();
        assert_eq!(stats.images, 1);
        assert_eq!(shared.read().images.changed_images().count(), 0);
        assert_eq!(shared.read().frame(), 1);
    }
}
