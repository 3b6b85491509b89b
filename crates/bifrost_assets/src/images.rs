//! # Image Table
//!
//! Every image in the engine lives here: metadata columns plus one
//! format-typed pixel buffer per image holding all mip levels back to back.
//!
//! ## Pixel access
//!
//! All getters and setters work in linear color. Reads gamma-decode the
//! stored value with `c^gamma`, writes encode with `c^(1/gamma)`, alpha is
//! never gamma corrected. Formats that do not store color (`Alpha8`,
//! `Roughness8`) always have gamma 1.
//!
//! Level `m` of an image starts at the sum of the pixel counts of levels
//! `0..m`, and each level halves every dimension, rounding down, never
//! below one.

use bifrost_core::{ChangeFlags, Column, Columns, EntityTable, Rgba, Uid};
use bitflags::bitflags;

use crate::pixel_data::PixelData;
use crate::pixel_format::PixelFormat;

/// Default number of pixels per parallel work item.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// UID of an image.
pub type ImageId = Uid<Images>;

bitflags! {
    /// Image changes since the last reset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageChanges: u8 {
        /// Image was created.
        const CREATED = 1 << 0;
        /// Image was destroyed.
        const DESTROYED = 1 << 1;
        /// Pixels or pixel format changed.
        const PIXELS_UPDATED = 1 << 2;
        /// Mipmapable flag changed.
        const MIPMAPABLE = 1 << 3;
    }
}

impl ChangeFlags for ImageChanges {
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

/// Dimensions of an image or of one of its mip levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels. 1 for 2D images.
    pub depth: u32,
}

impl ImageSize {
    /// Creates a 3D size.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Creates a 2D size.
    #[inline]
    #[must_use]
    pub const fn new_2d(width: u32, height: u32) -> Self {
        Self::new(width, height, 1)
    }

    /// Returns the size of mip level `level`.
    #[inline]
    #[must_use]
    pub fn mip(self, level: u32) -> Self {
        if level == 0 {
            return self;
        }
        let halve = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
        Self::new(halve(self.width), halve(self.height), halve(self.depth))
    }

    /// Returns `width * height * depth`.
    #[inline]
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }
}

#[derive(Default)]
struct ImageColumns {
    names: Column<String>,
    formats: Column<PixelFormat>,
    gammas: Column<f32>,
    sizes: Column<ImageSize>,
    mipmap_counts: Column<u32>,
    mipmapable: Column<bool>,
    pixels: Column<Option<PixelData>>,
}

impl Columns for ImageColumns {
    fn resize(&mut self, capacity: usize) {
        self.names.resize(capacity);
        self.formats.resize(capacity);
        self.gammas.resize(capacity);
        self.sizes.resize(capacity);
        self.mipmap_counts.resize(capacity);
        self.mipmapable.resize(capacity);
        self.pixels.resize(capacity);
    }

    fn init_sentinel(&mut self) {
        self.names[0] = "Dummy image".to_owned();
        self.formats[0] = PixelFormat::Unknown;
        self.gammas[0] = 1.0;
        self.sizes[0] = ImageSize::default();
        self.mipmap_counts[0] = 1;
        self.mipmapable[0] = false;
        self.pixels[0] = None;
    }
}

/// The image table.
pub struct Images {
    table: EntityTable<Images, ImageColumns, ImageChanges>,
    chunk_size: usize,
}

impl Images {
    /// Creates an unallocated image table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: EntityTable::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    // =========================================================================
    // CAPACITY
    // =========================================================================

    /// Allocates room for `capacity` images, including the sentinel.
    pub fn allocate(&mut self, capacity: usize) {
        self.table.allocate(capacity);
    }

    /// Frees every image and all table storage.
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

    /// Returns the number of pixels per parallel work item.
    #[must_use]
    pub const fn parallel_chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sets the number of pixels per parallel work item.
    pub fn set_parallel_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
    }

    /// Checks if an image is live.
    #[must_use]
    pub fn has(&self, id: ImageId) -> bool {
        self.table.has(id)
    }

    /// Returns the number of live images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no image is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over all live images.
    pub fn iter(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.table.iter()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Creates an image with zeroed pixels.
    ///
    /// # Arguments
    ///
    /// * `name` - Image name
    /// * `format` - Pixel format
    /// * `gamma` - Gamma of the stored pixels. Forced to 1 for formats that do
    ///   not store color
    /// * `size` - Size of mip level 0
    /// * `mipmap_count` - Requested mip levels. Clamped to the level at which
    ///   the image becomes a single pixel
    ///
    /// # Panics
    ///
    /// Panics if `mipmap_count` or any dimension is zero.
    pub fn create_3d(
        &mut self,
        name: &str,
        format: PixelFormat,
        gamma: f32,
        size: ImageSize,
        mipmap_count: u32,
    ) -> ImageId {
        let (level_count, total_pixel_count) = mip_chain_extent(size, mipmap_count);
        let pixels = PixelData::allocate(format, total_pixel_count);
        self.insert(name, format, gamma, size, level_count, pixels)
    }

    /// Creates a 2D image with zeroed pixels. See [`Images::create_3d`].
    pub fn create_2d(
        &mut self,
        name: &str,
        format: PixelFormat,
        gamma: f32,
        (width, height): (u32, u32),
        mipmap_count: u32,
    ) -> ImageId {
        self.create_3d(name, format, gamma, ImageSize::new_2d(width, height), mipmap_count)
    }

    /// Creates a single level 2D image that takes ownership of `pixels`.
    ///
    /// # Panics
    ///
    /// Panics if a dimension is zero or the buffer does not hold exactly
    /// `width * height` pixels.
    pub fn create_2d_with_pixels(
        &mut self,
        name: &str,
        gamma: f32,
        (width, height): (u32, u32),
        pixels: PixelData,
    ) -> ImageId {
        self.create_with_pixels(name, gamma, ImageSize::new_2d(width, height), 1, pixels)
    }

    /// Creates an image that takes ownership of `pixels`, which hold every
    /// mip level back to back. The format is the buffer's format.
    ///
    /// # Panics
    ///
    /// Panics if `mipmap_count` or any dimension is zero, or the buffer does
    /// not hold exactly the pixels of the (clamped) mip chain.
    pub fn create_with_pixels(
        &mut self,
        name: &str,
        gamma: f32,
        size: ImageSize,
        mipmap_count: u32,
        pixels: PixelData,
    ) -> ImageId {
        let (level_count, total_pixel_count) = mip_chain_extent(size, mipmap_count);
        assert_eq!(
            pixels.len(),
            total_pixel_count,
            "Pixel buffer does not match image size"
        );

        let format = pixels.format();
        self.insert(name, format, gamma, size, level_count, Some(pixels))
    }

    fn insert(
        &mut self,
        name: &str,
        format: PixelFormat,
        gamma: f32,
        size: ImageSize,
        mipmap_count: u32,
        pixels: Option<PixelData>,
    ) -> ImageId {
        let gamma = if format.is_color() { gamma } else { 1.0 };
        self.table.create_with(|columns, index| {
            columns.names[index] = name.to_owned();
            columns.formats[index] = format;
            columns.gammas[index] = gamma;
            columns.sizes[index] = size;
            columns.mipmap_counts[index] = mipmap_count;
            columns.mipmapable[index] = false;
            columns.pixels[index] = pixels;
        })
    }

    /// Destroys an image and frees its pixels.
    ///
    /// # Returns
    ///
    /// `true` if the image was live.
    pub fn destroy(&mut self, id: ImageId) -> bool {
        self.table.destroy_with(id, |columns, index| {
            if columns.formats[index] == PixelFormat::Unknown {
                tracing::warn!("Destroying image '{}' with unknown pixel format", columns.names[index]);
            }
            columns.pixels.reset(index);
        })
    }

    // =========================================================================
    // METADATA
    // =========================================================================

    /// Returns the image name.
    #[must_use]
    pub fn name(&self, id: ImageId) -> &str {
        &self.table.columns().names[id.index()]
    }

    /// Renames an image.
    pub fn set_name(&mut self, id: ImageId, name: &str) {
        self.table.columns_mut().names[id.index()] = name.to_owned();
    }

    /// Returns the pixel format.
    #[must_use]
    pub fn pixel_format(&self, id: ImageId) -> PixelFormat {
        self.table.columns().formats[id.index()]
    }

    /// Returns the gamma of the stored pixels.
    #[must_use]
    pub fn gamma(&self, id: ImageId) -> f32 {
        self.table.columns().gammas[id.index()]
    }

    /// Returns the size of mip level 0.
    #[must_use]
    pub fn size(&self, id: ImageId) -> ImageSize {
        self.table.columns().sizes[id.index()]
    }

    /// Returns the width of a mip level.
    #[must_use]
    pub fn width(&self, id: ImageId, mipmap_level: u32) -> u32 {
        self.size(id).mip(mipmap_level).width
    }

    /// Returns the height of a mip level.
    #[must_use]
    pub fn height(&self, id: ImageId, mipmap_level: u32) -> u32 {
        self.size(id).mip(mipmap_level).height
    }

    /// Returns the depth of a mip level.
    #[must_use]
    pub fn depth(&self, id: ImageId, mipmap_level: u32) -> u32 {
        self.size(id).mip(mipmap_level).depth
    }

    /// Returns the number of mip levels.
    #[must_use]
    pub fn mipmap_count(&self, id: ImageId) -> u32 {
        self.table.columns().mipmap_counts[id.index()]
    }

    /// Returns the number of pixels in a mip level.
    #[must_use]
    pub fn pixel_count(&self, id: ImageId, mipmap_level: u32) -> usize {
        self.size(id).mip(mipmap_level).pixel_count()
    }

    /// Returns the number of pixels in all mip levels.
    #[must_use]
    pub fn total_pixel_count(&self, id: ImageId) -> usize {
        self.level_offset(id, self.mipmap_count(id))
    }

    /// Checks if the renderer may generate mipmaps for the image.
    #[must_use]
    pub fn is_mipmapable(&self, id: ImageId) -> bool {
        self.table.columns().mipmapable[id.index()]
    }

    /// Allows or forbids renderer-side mipmap generation.
    ///
    /// Only images with a single mip level can be mipmapable; for others the
    /// flag stays false. Marks [`ImageChanges::MIPMAPABLE`] if the flag
    /// changed.
    pub fn set_mipmapable(&mut self, id: ImageId, value: bool) {
        let index = id.index();
        let value = value && self.mipmap_count(id) == 1;
        if self.table.columns().mipmapable[index] == value {
            return;
        }

        self.table.columns_mut().mipmapable[index] = value;
        self.table.mark_changed(id, ImageChanges::MIPMAPABLE);
    }

    // =========================================================================
    // PIXELS
    // =========================================================================

    /// Returns the pixel buffer, or `None` for images of unknown format.
    #[must_use]
    pub fn pixels(&self, id: ImageId) -> Option<&PixelData> {
        self.table.columns().pixels[id.index()].as_ref()
    }

    /// Returns the bytes of one mip level in the interchange layout, for
    /// upload. Empty for images of unknown format.
    #[must_use]
    pub fn pixel_bytes(&self, id: ImageId, mipmap_level: u32) -> &[u8] {
        let Some(pixels) = self.pixels(id) else {
            return &[];
        };

        let stride = pixels.format().size_of();
        let begin = self.level_offset(id, mipmap_level) * stride;
        let end = begin + self.pixel_count(id, mipmap_level) * stride;
        &pixels.as_bytes()[begin..end]
    }

    /// Index of the first pixel of `mipmap_level` in the pixel buffer.
    fn level_offset(&self, id: ImageId, mipmap_level: u32) -> usize {
        let size = self.size(id);
        (0..mipmap_level).map(|level| size.mip(level).pixel_count()).sum()
    }

    fn read_linear(&self, id: ImageId, index: usize) -> Rgba {
        match self.pixels(id) {
            Some(pixels) => pixels.get_linear(index, self.gamma(id)),
            None => Rgba::red(),
        }
    }

    fn write_linear(&mut self, id: ImageId, index: usize, color: Rgba) {
        let gamma = self.gamma(id);
        if let Some(pixels) = self.table.columns_mut().pixels[id.index()].as_mut() {
            pixels.set_linear(index, color, gamma);
        }
        self.table.mark_changed(id, ImageChanges::PIXELS_UPDATED);
    }

    /// Reads a pixel by flat index within a mip level, in linear color.
    ///
    /// Images of unknown format read as pure red.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the mip level.
    #[must_use]
    pub fn get_pixel(&self, id: ImageId, index: usize, mipmap_level: u32) -> Rgba {
        assert!(index < self.pixel_count(id, mipmap_level), "Pixel index out of bounds");
        self.read_linear(id, self.level_offset(id, mipmap_level) + index)
    }

    /// Reads a pixel by 2D coordinate within a mip level, in linear color.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the mip level.
    #[must_use]
    pub fn get_pixel_2d(&self, id: ImageId, (x, y): (u32, u32), mipmap_level: u32) -> Rgba {
        self.get_pixel_3d(id, (x, y, 0), mipmap_level)
    }

    /// Reads a pixel by 3D coordinate within a mip level, in linear color.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the mip level.
    #[must_use]
    pub fn get_pixel_3d(&self, id: ImageId, (x, y, z): (u32, u32, u32), mipmap_level: u32) -> Rgba {
        let index = self.coordinate_index(id, (x, y, z), mipmap_level);
        self.read_linear(id, self.level_offset(id, mipmap_level) + index)
    }

    /// Writes a pixel by flat index within a mip level, from linear color.
    ///
    /// Always marks [`ImageChanges::PIXELS_UPDATED`].
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the mip level.
    pub fn set_pixel(&mut self, id: ImageId, color: Rgba, index: usize, mipmap_level: u32) {
        assert!(index < self.pixel_count(id, mipmap_level), "Pixel index out of bounds");
        let index = self.level_offset(id, mipmap_level) + index;
        self.write_linear(id, index, color);
    }

    /// Writes a pixel by 2D coordinate within a mip level, from linear color.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the mip level.
    pub fn set_pixel_2d(&mut self, id: ImageId, color: Rgba, (x, y): (u32, u32), mipmap_level: u32) {
        self.set_pixel_3d(id, color, (x, y, 0), mipmap_level);
    }

    /// Writes a pixel by 3D coordinate within a mip level, from linear color.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the mip level.
    pub fn set_pixel_3d(
        &mut self,
        id: ImageId,
        color: Rgba,
        (x, y, z): (u32, u32, u32),
        mipmap_level: u32,
    ) {
        let index = self.coordinate_index(id, (x, y, z), mipmap_level);
        let index = self.level_offset(id, mipmap_level) + index;
        self.write_linear(id, index, color);
    }

    fn coordinate_index(&self, id: ImageId, (x, y, z): (u32, u32, u32), mipmap_level: u32) -> usize {
        let size = self.size(id).mip(mipmap_level);
        assert!(x < size.width, "Pixel x coordinate out of bounds");
        assert!(y < size.height, "Pixel y coordinate out of bounds");
        assert!(z < size.depth, "Pixel z coordinate out of bounds");
        x as usize + size.width as usize * (y as usize + size.height as usize * z as usize)
    }

    /// Decodes a whole mip level to linear color, in parallel.
    #[must_use]
    pub fn decode_level(&self, id: ImageId, mipmap_level: u32) -> Vec<Rgba> {
        let begin = self.level_offset(id, mipmap_level);
        let end = begin + self.pixel_count(id, mipmap_level);
        self.decode_range(id, begin, end)
    }

    /// Decodes every mip level to linear color, in parallel.
    #[must_use]
    pub fn decode_pixels(&self, id: ImageId) -> Vec<Rgba> {
        self.decode_range(id, 0, self.total_pixel_count(id))
    }

    fn decode_range(&self, id: ImageId, begin: usize, end: usize) -> Vec<Rgba> {
        match self.pixels(id) {
            Some(pixels) => pixels.decode_range(begin..end, self.gamma(id), self.chunk_size),
            None => vec![Rgba::red(); end - begin],
        }
    }

    /// Encodes linear colors into a whole mip level, in parallel.
    ///
    /// Marks [`ImageChanges::PIXELS_UPDATED`].
    ///
    /// # Panics
    ///
    /// Panics if `colors` does not hold exactly the level's pixel count.
    pub fn encode_level(&mut self, id: ImageId, mipmap_level: u32, colors: &[Rgba]) {
        assert_eq!(
            colors.len(),
            self.pixel_count(id, mipmap_level),
            "Color count does not match mip level"
        );
        let offset = self.level_offset(id, mipmap_level);
        self.encode_range(id, offset, colors);
    }

    /// Encodes linear colors into every mip level, in parallel.
    ///
    /// # Panics
    ///
    /// Panics if `colors` does not hold exactly the image's total pixel count.
    pub fn encode_pixels(&mut self, id: ImageId, colors: &[Rgba]) {
        assert_eq!(
            colors.len(),
            self.total_pixel_count(id),
            "Color count does not match image"
        );
        self.encode_range(id, 0, colors);
    }

    fn encode_range(&mut self, id: ImageId, offset: usize, colors: &[Rgba]) {
        let gamma = self.gamma(id);
        let chunk_size = self.chunk_size;
        if let Some(pixels) = self.table.columns_mut().pixels[id.index()].as_mut() {
            pixels.encode_range(offset, colors, gamma, chunk_size);
        }
        self.table.mark_changed(id, ImageChanges::PIXELS_UPDATED);
    }

    /// Converts an image's pixels to another format in place, keeping its UID.
    ///
    /// The new buffer is fully built before the old one is dropped. Colors
    /// move to alpha as the mean of the source channels when the source has
    /// no alpha and the target is `Alpha8`, and alpha moves to every color
    /// channel when the source is `Alpha8` and the target has no alpha.
    ///
    /// Marks [`ImageChanges::PIXELS_UPDATED`].
    pub fn change_format(&mut self, id: ImageId, new_format: PixelFormat, new_gamma: f32) {
        let index = id.index();
        let old_format = self.pixel_format(id);
        let old_gamma = self.gamma(id);
        let new_gamma = if new_format.is_color() { new_gamma } else { 1.0 };
        let total_pixel_count = self.total_pixel_count(id);

        let old_pixels = self.table.columns_mut().pixels.take(index);
        let new_pixels = match old_pixels {
            // Alpha is linear, so only the intensity side carries gamma.
            Some(PixelData::Intensity8(mut bytes)) if new_format == PixelFormat::Alpha8 => {
                remap_bytes(&mut bytes, old_gamma);
                Some(PixelData::Alpha8(bytes))
            }
            Some(PixelData::Alpha8(mut bytes)) if new_format == PixelFormat::Intensity8 => {
                remap_bytes(&mut bytes, 1.0 / new_gamma);
                Some(PixelData::Intensity8(bytes))
            }
            Some(old_pixels) => {
                let mut colors = old_pixels.decode_range(0..total_pixel_count, old_gamma, self.chunk_size);
                convert_channels(&mut colors, old_format, new_format);
                PixelData::allocate(new_format, total_pixel_count).map(|mut new_pixels| {
                    new_pixels.encode_range(0, &colors, new_gamma, self.chunk_size);
                    new_pixels
                })
            }
            None => PixelData::allocate(new_format, total_pixel_count),
        };

        let columns = self.table.columns_mut();
        columns.pixels[index] = new_pixels;
        columns.formats[index] = new_format;
        columns.gammas[index] = new_gamma;
        self.table.mark_changed(id, ImageChanges::PIXELS_UPDATED);

        tracing::debug!(
            "Changed format of image '{}' from {:?} to {:?} ({} pixels)",
            self.name(id),
            old_format,
            new_format,
            total_pixel_count
        );
    }

    // =========================================================================
    // CHANGES
    // =========================================================================

    /// Returns the changes of an image since the last reset.
    #[must_use]
    pub fn changes(&self, id: ImageId) -> ImageChanges {
        self.table.changes(id)
    }

    /// Checks if any change in `mask` happened to an image since the last
    /// reset.
    #[must_use]
    pub fn has_changes(&self, id: ImageId, mask: ImageChanges) -> bool {
        self.table.has_changes(id, mask)
    }

    /// Iterates over the images changed since the last reset.
    pub fn changed_images(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.table.changed()
    }

    /// Clears all change notifications.
    pub fn reset_change_notifications(&mut self) {
        self.table.reset_change_notifications();
    }
}

impl Default for Images {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Images {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Images")
            .field("table", &self.table)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Returns the number of mip levels actually stored for a requested count,
/// and the pixel count of all of them. The chain stops at the first level
/// holding a single pixel.
fn mip_chain_extent(size: ImageSize, mipmap_count: u32) -> (u32, usize) {
    assert!(mipmap_count > 0, "An image needs at least one mip level");
    assert!(
        size.width > 0 && size.height > 0 && size.depth > 0,
        "Image dimensions must be non-zero, got {size:?}"
    );

    let mut total_pixel_count = 0;
    let mut level_count = 0;
    while level_count != mipmap_count {
        let level_pixel_count = size.mip(level_count).pixel_count();
        total_pixel_count += level_pixel_count;
        level_count += 1;
        if level_pixel_count == 1 {
            break;
        }
    }
    (level_count, total_pixel_count)
}

/// Applies `v^gamma` to normalized byte values.
fn remap_bytes(bytes: &mut [u8], gamma: f32) {
    #[allow(clippy::float_cmp)]
    if gamma == 1.0 {
        return;
    }
    for byte in bytes {
        let v = bifrost_core::math::from_unorm8(*byte).powf(gamma);
        *byte = bifrost_core::math::unorm8(v);
    }
}

/// Moves color into alpha or alpha into color when a format change drops
/// the channel that carries the information.
fn convert_channels(colors: &mut [Rgba], old_format: PixelFormat, new_format: PixelFormat) {
    if !old_format.has_alpha() && new_format == PixelFormat::Alpha8 {
        let monochrome = old_format.channel_count() == 1;
        for color in colors {
            color.a = if monochrome {
                color.r
            } else {
                color.rgb().luminance_average()
            };
        }
    } else if old_format == PixelFormat::Alpha8 && !new_format.has_alpha() {
        for color in colors {
            color.r = color.a;
            color.g = color.a;
            color.b = color.a;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images() -> Images {
        let mut images = Images::new();
        images.allocate(8);
        images
    }

    #[test]
    fn test_sentinel() {
        let images = images();
        let dummy = ImageId::invalid();
        assert_eq!(images.name(dummy), "Dummy image");
        assert_eq!(images.pixel_format(dummy), PixelFormat::Unknown);
        assert!(images.pixels(dummy).is_none());
        assert!(!images.has(dummy));
    }

    #[test]
    fn test_create_2d() {
        let mut images = images();
        let id = images.create_2d("albedo", PixelFormat::Rgba32, 2.2, (8, 4), 1);

        assert!(images.has(id));
        assert_eq!(images.name(id), "albedo");
        assert_eq!(images.pixel_format(id), PixelFormat::Rgba32);
        assert_eq!(images.gamma(id), 2.2);
        assert_eq!(images.size(id), ImageSize::new_2d(8, 4));
        assert_eq!(images.mipmap_count(id), 1);
        assert_eq!(images.total_pixel_count(id), 32);
        assert_eq!(images.pixel_bytes(id, 0).len(), 128);
        assert_eq!(images.changes(id), ImageChanges::CREATED);
    }

    #[test]
    fn test_non_color_formats_force_gamma() {
        let mut images = images();
        let alpha = images.create_2d("mask", PixelFormat::Alpha8, 2.2, (2, 2), 1);
        let rough = images.create_2d("rough", PixelFormat::Roughness8, 2.2, (2, 2), 1);
        assert_eq!(images.gamma(alpha), 1.0);
        assert_eq!(images.gamma(rough), 1.0);
    }

    #[test]
    fn test_mip_count_clamped() {
        let mut images = images();
        let id = images.create_2d("chain", PixelFormat::RgbaFloat, 1.0, (8, 2), 10);

        // 8x2, 4x1, 2x1, 1x1
        assert_eq!(images.mipmap_count(id), 4);
        assert_eq!(images.total_pixel_count(id), 16 + 4 + 2 + 1);
        assert_eq!(images.width(id, 1), 4);
        assert_eq!(images.height(id, 1), 1);
        assert_eq!(images.height(id, 3), 1);
        assert_eq!(images.pixels(id).map(PixelData::len), Some(23));
    }

    #[test]
    fn test_mip_offsets_are_cumulative() {
        let mut images = images();
        let id = images.create_2d("chain", PixelFormat::IntensityFloat, 1.0, (4, 4), 3);
        images.set_pixel_2d(id, Rgba::splat(0.5), (0, 0), 2);

        assert_eq!(images.get_pixel(id, 0, 2).r, 0.5);
        let Some(PixelData::IntensityFloat(values)) = images.pixels(id) else {
            panic!("unexpected pixel storage");
        };
        assert_eq!(values[16 + 4], 0.5);
        assert_eq!(images.pixel_bytes(id, 2).len(), 4);
        assert_eq!(images.pixel_bytes(id, 1).len(), 16);
    }

    #[test]
    fn test_float_roundtrip_exact() {
        let mut images = images();
        let id = images.create_3d("volume", PixelFormat::RgbaFloat, 1.0, ImageSize::new(2, 2, 2), 1);
        let color = Rgba::new(0.1, 0.25, 3.5, 0.75);

        images.set_pixel_3d(id, color, (1, 0, 1), 0);
        assert_eq!(images.get_pixel_3d(id, (1, 0, 1), 0), color);
        assert_eq!(images.get_pixel(id, 5, 0), color);
    }

    #[test]
    fn test_byte_roundtrip_within_one_step() {
        let mut images = images();
        let id = images.create_2d("srgb", PixelFormat::Rgb24, 2.2, (1, 1), 1);
        let color = Rgba::new(0.2, 0.4, 0.8, 1.0);

        images.set_pixel(id, color, 0, 0);
        let stored = images.get_pixel(id, 0, 0).gamma_encode(2.2);
        let expected = color.gamma_encode(2.2);
        for (a, e) in stored.to_array().into_iter().zip(expected.to_array()) {
            assert!((a - e).abs() <= 1.0 / 255.0, "{stored:?} != {expected:?}");
        }
    }

    #[test]
    fn test_unknown_format_reads_red() {
        let mut images = images();
        let id = images.create_2d("broken", PixelFormat::Unknown, 1.0, (2, 2), 1);
        assert_eq!(images.get_pixel_2d(id, (1, 1), 0), Rgba::red());
        assert!(images.pixel_bytes(id, 0).is_empty());

        images.set_pixel(id, Rgba::splat(0.0), 0, 0);
        assert!(images.has_changes(id, ImageChanges::PIXELS_UPDATED));
    }

    #[test]
    #[should_panic]
    fn test_pixel_out_of_bounds() {
        let mut images = images();
        let id = images.create_2d("small", PixelFormat::Rgba32, 1.0, (2, 2), 1);
        let _ = images.get_pixel_2d(id, (2, 0), 0);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_width_rejected() {
        let mut images = images();
        let _ = images.create_2d("empty", PixelFormat::Rgba32, 1.0, (0, 4), 1);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_depth_with_pixels_rejected() {
        let mut images = images();
        let pixels = PixelData::Alpha8(vec![0; 4]);
        let _ = images.create_with_pixels("flat", 1.0, ImageSize::new(2, 2, 0), 1, pixels);
    }

    #[test]
    fn test_mip_zero_keeps_size() {
        assert_eq!(ImageSize::new(0, 4, 1).mip(0), ImageSize::new(0, 4, 1));
        assert_eq!(ImageSize::new(0, 4, 1).mip(1), ImageSize::new(1, 2, 1));
        assert_eq!(ImageSize::new_2d(5, 3).mip(2), ImageSize::new_2d(1, 1));
    }

    #[test]
    fn test_create_with_pixels() {
        let mut images = images();
        let pixels = PixelData::Rgba32(vec![[255, 0, 0, 255], [0, 255, 0, 128]]);
        let id = images.create_2d_with_pixels("strip", 1.0, (2, 1), pixels);

        assert_eq!(images.pixel_format(id), PixelFormat::Rgba32);
        assert_eq!(images.get_pixel(id, 0, 0), Rgba::red());
        assert_eq!(images.pixel_bytes(id, 0), &[255, 0, 0, 255, 0, 255, 0, 128]);
    }

    #[test]
    fn test_destroy() {
        let mut images = images();
        let id = images.create_2d("temp", PixelFormat::Rgba32, 1.0, (2, 2), 1);
        images.reset_change_notifications();

        assert!(images.destroy(id));
        assert!(!images.has(id));
        assert!(images.pixels(id).is_none());
        assert_eq!(images.changes(id), ImageChanges::DESTROYED);

        assert!(!images.destroy(id));
        assert_eq!(images.changed_images().count(), 1);
    }

    #[test]
    fn test_mipmapable() {
        let mut images = images();
        let single = images.create_2d("single", PixelFormat::Rgba32, 1.0, (4, 4), 1);
        let chain = images.create_2d("chain", PixelFormat::Rgba32, 1.0, (4, 4), 3);
        images.reset_change_notifications();

        images.set_mipmapable(single, true);
        images.set_mipmapable(chain, true);
        assert!(images.is_mipmapable(single));
        assert!(!images.is_mipmapable(chain));
        assert_eq!(images.changes(single), ImageChanges::MIPMAPABLE);
        assert!(images.changes(chain).is_empty());

        images.reset_change_notifications();
        images.set_mipmapable(single, true);
        assert_eq!(images.changed_images().count(), 0);
    }

    #[test]
    fn test_create_and_update_single_change_entry() {
        let mut images = images();
        let id = images.create_2d("a", PixelFormat::Rgba32, 1.0, (1, 1), 1);
        images.set_pixel(id, Rgba::red(), 0, 0);

        let changed: Vec<_> = images.changed_images().collect();
        assert_eq!(changed, vec![id]);
        assert_eq!(images.changes(id), ImageChanges::CREATED | ImageChanges::PIXELS_UPDATED);
    }

    #[test]
    fn test_reserve_keeps_images() {
        let mut images = images();
        let ids: Vec<_> = (0..5)
            .map(|i| images.create_2d(&format!("img{i}"), PixelFormat::Intensity8, 1.0, (i + 1, 1), 1))
            .collect();

        images.reserve(20);
        assert_eq!(images.capacity(), 20);
        for (i, id) in ids.iter().enumerate() {
            assert!(images.has(*id));
            assert_eq!(images.name(*id), format!("img{i}"));
            assert_eq!(images.width(*id, 0), i as u32 + 1);
        }
    }

    #[test]
    fn test_alpha_intensity_fast_path_exact() {
        let mut images = images();
        let pixels = PixelData::Alpha8((0..=255).collect());
        let id = images.create_2d_with_pixels("ramp", 1.0, (256, 1), pixels);

        images.change_format(id, PixelFormat::Intensity8, 1.0);
        assert_eq!(images.pixel_format(id), PixelFormat::Intensity8);
        images.change_format(id, PixelFormat::Alpha8, 1.0);

        assert_eq!(images.pixel_format(id), PixelFormat::Alpha8);
        let expected: Vec<u8> = (0..=255).collect();
        assert_eq!(images.pixel_bytes(id, 0), expected.as_slice());
    }

    #[test]
    fn test_intensity_to_alpha_linearizes() {
        let mut images = images();
        let id = images.create_2d_with_pixels("gray", 2.0, (1, 1), PixelData::Intensity8(vec![128]));

        images.change_format(id, PixelFormat::Alpha8, 1.0);
        // (128 / 255)^2 * 255 + 0.5
        assert_eq!(images.pixel_bytes(id, 0), &[64]);
        assert_eq!(images.gamma(id), 1.0);
    }

    #[test]
    fn test_change_format_color_to_alpha_averages() {
        let mut images = images();
        let pixels = PixelData::RgbFloat(vec![bifrost_core::Rgb::new(0.3, 0.6, 0.9)]);
        let id = images.create_2d_with_pixels("color", 1.0, (1, 1), pixels);

        images.change_format(id, PixelFormat::Alpha8, 1.0);
        assert_eq!(images.pixel_bytes(id, 0), &[153]);
    }

    #[test]
    fn test_change_format_alpha_to_color_broadcasts() {
        let mut images = images();
        let id = images.create_2d_with_pixels("mask", 1.0, (1, 1), PixelData::Alpha8(vec![51]));

        images.change_format(id, PixelFormat::RgbFloat, 1.0);
        let color = images.get_pixel(id, 0, 0);
        assert_eq!(color, Rgba::new(0.2, 0.2, 0.2, 1.0));
    }

    #[test]
    fn test_change_format_roughness_to_color_is_opaque() {
        let mut images = images();
        let id = images.create_2d_with_pixels("rough", 1.0, (1, 1), PixelData::Roughness8(vec![51]));

        images.change_format(id, PixelFormat::Rgba32, 1.0);
        assert_eq!(images.pixel_bytes(id, 0), &[51, 51, 51, 255]);
        assert_eq!(images.get_pixel(id, 0, 0).a, 1.0);
    }

    #[test]
    fn test_change_format_general_path() {
        let mut images = images();
        let id = images.create_2d("hdr", PixelFormat::RgbaFloat, 1.0, (2, 1), 1);
        images.set_pixel(id, Rgba::new(1.0, 0.5, 0.0, 1.0), 0, 0);
        images.reset_change_notifications();

        images.change_format(id, PixelFormat::Rgba32, 1.0);
        assert_eq!(images.pixel_format(id), PixelFormat::Rgba32);
        assert_eq!(images.pixel_bytes(id, 0), &[255, 128, 0, 255, 0, 0, 0, 0]);
        assert_eq!(images.changes(id), ImageChanges::PIXELS_UPDATED);
    }

    #[test]
    fn test_change_format_updates_gamma() {
        let mut images = images();
        let id = images.create_2d("tint", PixelFormat::RgbaFloat, 1.0, (1, 1), 1);
        images.set_pixel(id, Rgba::new(0.3, 0.3, 0.3, 0.2), 0, 0);

        images.change_format(id, PixelFormat::Rgba32, 2.0);
        assert_eq!(images.gamma(id), 2.0);
        // 0.3^(1/2) * 255 = 139.7
        assert_eq!(images.pixel_bytes(id, 0), &[140, 140, 140, 51]);
    }

    #[test]
    fn test_decode_encode_level() {
        let mut images = images();
        let id = images.create_2d("chain", PixelFormat::RgbaFloat, 1.0, (2, 2), 2);
        images.encode_level(id, 1, &[Rgba::splat(0.5)]);

        assert_eq!(images.decode_level(id, 1), vec![Rgba::splat(0.5)]);
        assert_eq!(images.decode_level(id, 0), vec![Rgba::default(); 4]);
        assert_eq!(images.decode_pixels(id).len(), 5);
    }
}
