//! # Pixel Buffers
//!
//! A pixel buffer is typed by its format: each [`PixelData`] variant owns a
//! `Vec` of that format's element type. Conversion to and from RGBA happens
//! per element through a small codec table, and the `dispatch!` macro below
//! is the one place that maps a variant to its codec.
//!
//! ## Color conventions
//!
//! - Byte channels map to `[0, 1]` as `v / 255` and back as
//!   `clamp(v * 255 + 0.5, 0, 255)`
//! - Monochrome formats replicate into RGB with alpha 1
//! - `Alpha8` reads as white with the stored alpha
//! - `Roughness8` replicates into all four channels
//! - Gamma applies to RGB only, never to alpha

use std::ops::Range;

use bifrost_core::math::{from_unorm8, unorm8};
use bifrost_core::{Rgb, Rgba};
use rayon::prelude::*;

use crate::error::{AssetError, AssetResult};
use crate::pixel_format::PixelFormat;

/// Pixel storage for one image, all mip levels back to back.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    /// [`PixelFormat::Alpha8`] pixels.
    Alpha8(Vec<u8>),
    /// [`PixelFormat::Intensity8`] pixels.
    Intensity8(Vec<u8>),
    /// [`PixelFormat::Rgb24`] pixels.
    Rgb24(Vec<[u8; 3]>),
    /// [`PixelFormat::Rgba32`] pixels.
    Rgba32(Vec<[u8; 4]>),
    /// [`PixelFormat::IntensityFloat`] pixels.
    IntensityFloat(Vec<f32>),
    /// [`PixelFormat::RgbFloat`] pixels.
    RgbFloat(Vec<Rgb>),
    /// [`PixelFormat::RgbaFloat`] pixels.
    RgbaFloat(Vec<Rgba>),
    /// [`PixelFormat::Roughness8`] pixels.
    Roughness8(Vec<u8>),
}

// =============================================================================
// PER-ELEMENT CODECS
// =============================================================================

/// Nonlinear conversion between one stored element and RGBA.
struct Codec<T> {
    decode: fn(&T) -> Rgba,
    encode: fn(Rgba) -> T,
}

const ALPHA8: Codec<u8> = Codec {
    decode: |&a| Rgba::new(1.0, 1.0, 1.0, from_unorm8(a)),
    encode: |c| unorm8(c.a),
};

const INTENSITY8: Codec<u8> = Codec {
    decode: |&v| Rgba::from_rgb(Rgb::splat(from_unorm8(v)), 1.0),
    encode: |c| unorm8(c.r),
};

const RGB24: Codec<[u8; 3]> = Codec {
    decode: |&[r, g, b]| Rgba::new(from_unorm8(r), from_unorm8(g), from_unorm8(b), 1.0),
    encode: |c| [unorm8(c.r), unorm8(c.g), unorm8(c.b)],
};

const RGBA32: Codec<[u8; 4]> = Codec {
    decode: |&[r, g, b, a]| Rgba::new(from_unorm8(r), from_unorm8(g), from_unorm8(b), from_unorm8(a)),
    encode: |c| [unorm8(c.r), unorm8(c.g), unorm8(c.b), unorm8(c.a)],
};

const INTENSITY_FLOAT: Codec<f32> = Codec {
    decode: |&v| Rgba::from_rgb(Rgb::splat(v), 1.0),
    encode: |c| c.r,
};

const RGB_FLOAT: Codec<Rgb> = Codec {
    decode: |&rgb| Rgba::from_rgb(rgb, 1.0),
    encode: Rgba::rgb,
};

const RGBA_FLOAT: Codec<Rgba> = Codec {
    decode: |&rgba| rgba,
    encode: |c| c,
};

const ROUGHNESS8: Codec<u8> = Codec {
    decode: |&v| Rgba::from_rgb(Rgb::splat(from_unorm8(v)), 1.0),
    encode: |c| unorm8(c.r),
};

/// Binds the element vector and codec of a [`PixelData`] variant.
macro_rules! dispatch {
    ($data:expr, $pixels:ident, $codec:ident => $body:expr) => {
        match $data {
            PixelData::Alpha8($pixels) => {
                let $codec = &ALPHA8;
                $body
            }
            PixelData::Intensity8($pixels) => {
                let $codec = &INTENSITY8;
                $body
            }
            PixelData::Rgb24($pixels) => {
                let $codec = &RGB24;
                $body
            }
            PixelData::Rgba32($pixels) => {
                let $codec = &RGBA32;
                $body
            }
            PixelData::IntensityFloat($pixels) => {
                let $codec = &INTENSITY_FLOAT;
                $body
            }
            PixelData::RgbFloat($pixels) => {
                let $codec = &RGB_FLOAT;
                $body
            }
            PixelData::RgbaFloat($pixels) => {
                let $codec = &RGBA_FLOAT;
                $body
            }
            PixelData::Roughness8($pixels) => {
                let $codec = &ROUGHNESS8;
                $body
            }
        }
    };
}

fn roundtrip<T>(codec: &Codec<T>, color: Rgba, gamma: f32) -> Rgba {
    let stored = (codec.encode)(color.gamma_encode(gamma));
    (codec.decode)(&stored).gammacorrect(gamma)
}

fn read_unaligned<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

// =============================================================================
// PIXEL DATA
// =============================================================================

impl PixelData {
    /// Allocates a zeroed buffer of `pixel_count` pixels.
    ///
    /// # Returns
    ///
    /// `None` for [`PixelFormat::Unknown`], which has no storage.
    #[must_use]
    pub fn allocate(format: PixelFormat, pixel_count: usize) -> Option<Self> {
        let data = match format {
            PixelFormat::Unknown => return None,
            PixelFormat::Alpha8 => Self::Alpha8(vec![0; pixel_count]),
            PixelFormat::Intensity8 => Self::Intensity8(vec![0; pixel_count]),
            PixelFormat::Rgb24 => Self::Rgb24(vec![[0; 3]; pixel_count]),
            PixelFormat::Rgba32 => Self::Rgba32(vec![[0; 4]; pixel_count]),
            PixelFormat::IntensityFloat => Self::IntensityFloat(vec![0.0; pixel_count]),
            PixelFormat::RgbFloat => Self::RgbFloat(vec![Rgb::default(); pixel_count]),
            PixelFormat::RgbaFloat => Self::RgbaFloat(vec![Rgba::default(); pixel_count]),
            PixelFormat::Roughness8 => Self::Roughness8(vec![0; pixel_count]),
        };
        Some(data)
    }

    /// Builds a buffer from raw bytes in the interchange layout.
    ///
    /// # Arguments
    ///
    /// * `format` - Format of the bytes
    /// * `pixel_count` - Number of pixels the bytes must hold
    /// * `bytes` - Tightly packed pixels, channels in R G B A order, floats in
    ///   native byte order
    ///
    /// # Errors
    ///
    /// [`AssetError::UnknownFormat`] for [`PixelFormat::Unknown`] and
    /// [`AssetError::SizeMismatch`] if the byte count is not
    /// `pixel_count * format.size_of()`.
    pub fn from_bytes(format: PixelFormat, pixel_count: usize, bytes: &[u8]) -> AssetResult<Self> {
        if format == PixelFormat::Unknown {
            return Err(AssetError::UnknownFormat);
        }

        let expected = pixel_count * format.size_of();
        if bytes.len() != expected {
            return Err(AssetError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let data = match format {
            PixelFormat::Unknown => return Err(AssetError::UnknownFormat),
            PixelFormat::Alpha8 => Self::Alpha8(bytes.to_vec()),
            PixelFormat::Intensity8 => Self::Intensity8(bytes.to_vec()),
            PixelFormat::Roughness8 => Self::Roughness8(bytes.to_vec()),
            PixelFormat::Rgb24 => Self::Rgb24(read_unaligned(bytes)),
            PixelFormat::Rgba32 => Self::Rgba32(read_unaligned(bytes)),
            PixelFormat::IntensityFloat => Self::IntensityFloat(read_unaligned(bytes)),
            PixelFormat::RgbFloat => Self::RgbFloat(read_unaligned(bytes)),
            PixelFormat::RgbaFloat => Self::RgbaFloat(read_unaligned(bytes)),
        };
        Ok(data)
    }

    /// Returns the format of the stored pixels.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        match self {
            Self::Alpha8(_) => PixelFormat::Alpha8,
            Self::Intensity8(_) => PixelFormat::Intensity8,
            Self::Rgb24(_) => PixelFormat::Rgb24,
            Self::Rgba32(_) => PixelFormat::Rgba32,
            Self::IntensityFloat(_) => PixelFormat::IntensityFloat,
            Self::RgbFloat(_) => PixelFormat::RgbFloat,
            Self::RgbaFloat(_) => PixelFormat::RgbaFloat,
            Self::Roughness8(_) => PixelFormat::Roughness8,
        }
    }

    /// Returns the number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, pixels, _codec => pixels.len())
    }

    /// Returns true if the buffer holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the pixels in the interchange byte layout.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        dispatch!(self, pixels, _codec => bytemuck::cast_slice(pixels.as_slice()))
    }

    /// Returns the pixels in the interchange byte layout, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        dispatch!(self, pixels, _codec => bytemuck::cast_slice_mut(pixels.as_mut_slice()))
    }

    /// Reads a pixel as stored, without gamma decoding.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[must_use]
    pub fn read(&self, index: usize) -> Rgba {
        dispatch!(self, pixels, codec => (codec.decode)(&pixels[index]))
    }

    /// Writes a pixel as given, without gamma encoding.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn write(&mut self, index: usize, color: Rgba) {
        dispatch!(self, pixels, codec => pixels[index] = (codec.encode)(color));
    }

    /// Reads a pixel and decodes it to linear color with `c^gamma`.
    #[inline]
    #[must_use]
    pub fn get_linear(&self, index: usize, gamma: f32) -> Rgba {
        self.read(index).gammacorrect(gamma)
    }

    /// Encodes a linear color with `c^(1/gamma)` and writes it.
    #[inline]
    pub fn set_linear(&mut self, index: usize, color: Rgba, gamma: f32) {
        self.write(index, color.gamma_encode(gamma));
    }

    /// Decodes a range of pixels to linear color in parallel.
    ///
    /// # Arguments
    ///
    /// * `range` - Pixel range to decode
    /// * `gamma` - Gamma of the stored pixels
    /// * `chunk_size` - Minimum pixels per parallel work item
    #[must_use]
    pub fn decode_range(&self, range: Range<usize>, gamma: f32, chunk_size: usize) -> Vec<Rgba> {
        let chunk_size = chunk_size.max(1);
        dispatch!(self, pixels, codec => pixels[range]
            .par_iter()
            .with_min_len(chunk_size)
            .map(|pixel| (codec.decode)(pixel).gammacorrect(gamma))
            .collect())
    }

    /// Encodes linear colors into consecutive pixels starting at `offset`, in
    /// parallel.
    ///
    /// # Panics
    ///
    /// Panics if `offset + colors.len()` exceeds the buffer.
    pub fn encode_range(&mut self, offset: usize, colors: &[Rgba], gamma: f32, chunk_size: usize) {
        let chunk_size = chunk_size.max(1);
        dispatch!(self, pixels, codec => pixels[offset..offset + colors.len()]
            .par_iter_mut()
            .zip(colors.par_iter())
            .with_min_len(chunk_size)
            .for_each(|(pixel, &color)| *pixel = (codec.encode)(color.gamma_encode(gamma))));
    }

    /// Returns the linear color a pixel of `format` and `gamma` holds after
    /// storing `color` in it.
    ///
    /// [`PixelFormat::Unknown`] has no storage and always yields pure red.
    #[must_use]
    pub fn quantize(format: PixelFormat, color: Rgba, gamma: f32) -> Rgba {
        match format {
            PixelFormat::Unknown => Rgba::red(),
            PixelFormat::Alpha8 => roundtrip(&ALPHA8, color, gamma),
            PixelFormat::Intensity8 => roundtrip(&INTENSITY8, color, gamma),
            PixelFormat::Rgb24 => roundtrip(&RGB24, color, gamma),
            PixelFormat::Rgba32 => roundtrip(&RGBA32, color, gamma),
            PixelFormat::IntensityFloat => roundtrip(&INTENSITY_FLOAT, color, gamma),
            PixelFormat::RgbFloat => roundtrip(&RGB_FLOAT, color, gamma),
            PixelFormat::RgbaFloat => roundtrip(&RGBA_FLOAT, color, gamma),
            PixelFormat::Roughness8 => roundtrip(&ROUGHNESS8, color, gamma),
        }
    }
}
