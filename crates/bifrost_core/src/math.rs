//! # Color Math
//!
//! Linear RGB and RGBA colors shared by every table, plus gamma helpers.
//!
//! Both types are `#[repr(C)]` plain old data so float pixel buffers can be
//! viewed as bytes for GPU upload.

use std::ops::{Add, Mul};

use bytemuck::{Pod, Zeroable};

/// RGB color with 32 bit float channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgb {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Rgb {
    /// Creates a new color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Creates a gray color with all channels set to `v`.
    #[inline]
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Black.
    #[inline]
    #[must_use]
    pub const fn black() -> Self {
        Self::splat(0.0)
    }

    /// White.
    #[inline]
    #[must_use]
    pub const fn white() -> Self {
        Self::splat(1.0)
    }

    /// Pure red.
    #[inline]
    #[must_use]
    pub const fn red() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Mean of the three channels.
    #[inline]
    #[must_use]
    pub fn luminance_average(self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Applies `c^gamma` to every channel. Gamma 1 is a no-op.
    #[inline]
    #[must_use]
    pub fn gammacorrect(self, gamma: f32) -> Self {
        #[allow(clippy::float_cmp)]
        if gamma == 1.0 {
            return self;
        }
        Self::new(self.r.powf(gamma), self.g.powf(gamma), self.b.powf(gamma))
    }
}

impl Add for Rgb {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul<f32> for Rgb {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

/// RGBA color with 32 bit float channels. Alpha is always linear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Rgba {
    /// Creates a new color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from RGB and alpha.
    #[inline]
    #[must_use]
    pub const fn from_rgb(rgb: Rgb, a: f32) -> Self {
        Self::new(rgb.r, rgb.g, rgb.b, a)
    }

    /// Creates a color with all four channels set to `v`.
    #[inline]
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Pure opaque red.
    #[inline]
    #[must_use]
    pub const fn red() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0)
    }

    /// Returns the RGB part.
    #[inline]
    #[must_use]
    pub const fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Returns the channels as an array in R, G, B, A order.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Decodes color channels from gamma space, `c^gamma`. Alpha is untouched.
    #[inline]
    #[must_use]
    pub fn gammacorrect(self, gamma: f32) -> Self {
        Self::from_rgb(self.rgb().gammacorrect(gamma), self.a)
    }

    /// Encodes color channels into gamma space, `c^(1/gamma)`. Alpha is
    /// untouched.
    #[inline]
    #[must_use]
    pub fn gamma_encode(self, gamma: f32) -> Self {
        #[allow(clippy::float_cmp)]
        if gamma == 1.0 {
            return self;
        }
        self.gammacorrect(1.0 / gamma)
    }

    /// Linear interpolation towards `other` by `t`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }
}

impl Add for Rgba {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}

impl Mul<f32> for Rgba {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

/// Converts a normalized value to an 8 bit channel, rounding to nearest.
#[inline]
#[must_use]
pub fn unorm8(v: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
    }
}

/// Converts an 8 bit channel to a normalized value.
#[inline]
#[must_use]
pub fn from_unorm8(v: u8) -> f32 {
    f32::from(v) / 255.0
}
