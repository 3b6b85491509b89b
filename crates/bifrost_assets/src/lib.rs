//! # Bifrost Assets
//!
//! Image and material tables.
//!
//! - [`Images`]: pixel buffers in any [`PixelFormat`], with gamma-aware
//!   pixel access and all mip levels stored back to back
//! - [`image_utils`]: mip chain generation, format conversion, tint/roughness
//!   packing and summed area tables
//! - [`Materials`]: surface parameters referencing images by UID
//!
//! ## Example
//!
//! ```rust
//! use bifrost_assets::{image_utils, Images, PixelFormat};
//! use bifrost_core::Rgba;
//!
//! let mut images = Images::new();
//! images.allocate(8);
//!
//! let id = images.create_2d("checker", PixelFormat::Rgba32, 2.2, (4, 4), 3);
//! images.set_pixel_2d(id, Rgba::new(1.0, 1.0, 1.0, 1.0), (0, 0), 0);
//! image_utils::fill_mipmap_chain(&mut images, id);
//!
//! for changed in images.changed_images() {
//!     let _upload = images.pixel_bytes(changed, 0);
//! }
//! images.reset_change_notifications();
//! ```

pub mod error;
pub mod image_utils;
pub mod images;
pub mod materials;
pub mod pixel_data;
pub mod pixel_format;

pub use error::{AssetError, AssetResult};
pub use images::{ImageChanges, ImageId, ImageSize, Images};
pub use materials::{MaterialChanges, MaterialData, MaterialId, Materials};
pub use pixel_data::PixelData;
pub use pixel_format::PixelFormat;
