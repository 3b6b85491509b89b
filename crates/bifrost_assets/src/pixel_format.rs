//! # Pixel Formats
//!
//! The storage formats an image can hold. [`PixelFormat::size_of`] is the one
//! authoritative table of element strides; everything that walks a pixel
//! buffer byte-wise goes through it.

/// Storage format of an image's pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// No storage. Reads return pure red.
    #[default]
    Unknown,
    /// One byte of coverage. Not a color, so gamma is always 1.
    Alpha8,
    /// One byte of gray.
    Intensity8,
    /// Three bytes, R G B.
    Rgb24,
    /// Four bytes, R G B A.
    Rgba32,
    /// One 32 bit float of gray.
    IntensityFloat,
    /// Three 32 bit floats, R G B.
    RgbFloat,
    /// Four 32 bit floats, R G B A.
    RgbaFloat,
    /// One byte of roughness. Not a color, so gamma is always 1.
    Roughness8,
}

impl PixelFormat {
    /// Every format, `Unknown` included.
    pub const ALL: [Self; 9] = [
        Self::Unknown,
        Self::Alpha8,
        Self::Intensity8,
        Self::Rgb24,
        Self::Rgba32,
        Self::IntensityFloat,
        Self::RgbFloat,
        Self::RgbaFloat,
        Self::Roughness8,
    ];

    /// Bytes per pixel.
    #[inline]
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Alpha8 | Self::Intensity8 | Self::Roughness8 => 1,
            Self::Rgb24 => 3,
            Self::Rgba32 | Self::IntensityFloat => 4,
            Self::RgbFloat => 12,
            Self::RgbaFloat => 16,
        }
    }

    /// Number of stored channels.
    #[inline]
    #[must_use]
    pub const fn channel_count(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Alpha8 | Self::Intensity8 | Self::IntensityFloat | Self::Roughness8 => 1,
            Self::Rgb24 | Self::RgbFloat => 3,
            Self::Rgba32 | Self::RgbaFloat => 4,
        }
    }

    /// Checks if the format stores an alpha channel.
    #[inline]
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Alpha8 | Self::Rgba32 | Self::RgbaFloat)
    }

    /// Checks if the format stores color, and therefore honors gamma.
    #[inline]
    #[must_use]
    pub const fn is_color(self) -> bool {
        !matches!(self, Self::Unknown | Self::Alpha8 | Self::Roughness8)
    }

    /// Checks if every channel is a single byte.
    #[inline]
    #[must_use]
    pub const fn is_byte(self) -> bool {
        matches!(
            self,
            Self::Alpha8 | Self::Intensity8 | Self::Rgb24 | Self::Rgba32 | Self::Roughness8
        )
    }
}
