//! # Engine Configuration
//!
//! Initial table capacities and bulk pixel work sizing, loaded once at
//! startup from TOML.
//!
//! ```toml
//! pixel_chunk_size = 4096
//!
//! [capacities]
//! images = 256
//! materials = 128
//! ```
//!
//! Every field is optional and falls back to [`EngineConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Initial capacity of every table, sentinel slot included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCapacities {
    /// Image table capacity.
    pub images: usize,
    /// Material table capacity.
    pub materials: usize,
    /// Scene table capacity.
    pub scenes: usize,
    /// Camera table capacity.
    pub cameras: usize,
    /// Light source table capacity.
    pub light_sources: usize,
}

impl Default for TableCapacities {
    fn default() -> Self {
        Self {
            images: 64,
            materials: 64,
            scenes: 8,
            cameras: 8,
            light_sources: 32,
        }
    }
}

/// Engine-wide configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial table capacities.
    pub capacities: TableCapacities,
    /// Pixels per parallel work item in bulk image operations.
    pub pixel_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacities: TableCapacities::default(),
            pixel_chunk_size: 4096,
        }
    }
}

impl EngineConfig {
    /// Config for asset-heavy offline scenes.
    ///
    /// Larger tables up front so loading does not regrow them repeatedly.
    #[must_use]
    pub const fn offline() -> Self {
        Self {
            capacities: TableCapacities {
                images: 1024,
                materials: 1024,
                scenes: 16,
                cameras: 16,
                light_sources: 256,
            },
            pixel_chunk_size: 16_384,
        }
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] for malformed TOML and
    /// [`CoreError::InvalidConfig`] if validation fails.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the pixel chunk size is zero or
    /// a capacity exceeds the UID index range.
    pub fn validate(&self) -> CoreResult<()> {
        if self.pixel_chunk_size == 0 {
            return Err(CoreError::InvalidConfig(
                "pixel_chunk_size must be greater than zero".to_owned(),
            ));
        }

        let capacities = [
            ("images", self.capacities.images),
            ("materials", self.capacities.materials),
            ("scenes", self.capacities.scenes),
            ("cameras", self.capacities.cameras),
            ("light_sources", self.capacities.light_sources),
        ];
        for (table, capacity) in capacities {
            if capacity > u32::MAX as usize {
                return Err(CoreError::InvalidConfig(format!(
                    "capacity of {table} exceeds {}",
                    u32::MAX
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::offline().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [capacities]
            images = 512
            "#,
        )
        .unwrap();

        assert_eq!(config.capacities.images, 512);
        assert_eq!(config.capacities.cameras, TableCapacities::default().cameras);
        assert_eq!(config.pixel_chunk_size, 4096);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = EngineConfig::from_toml_str("pixel_chunk_size = 0").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = EngineConfig::from_toml_str("pixel_chunk_size = \"many\"").unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/bifrost.toml").unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("bifrost_config_{}.toml", std::process::id()));
        std::fs::write(&path, "pixel_chunk_size = 1024\n[capacities]\nscenes = 2\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.pixel_chunk_size, 1024);
        assert_eq!(config.capacities.scenes, 2);
    }
}
