//! Spatial types used by cameras.
//!
//! Matrices are row major and act on column vectors.

use std::ops::{Add, Mul, Neg, Sub};

use bytemuck::{Pod, Zeroable};

/// 3D vector.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Unit quaternion rotation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new quaternion.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `radians` around a unit length `axis`.
    #[must_use]
    pub fn from_angle_axis(radians: f32, axis: Vec3) -> Self {
        let (sin, cos) = (radians * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// The inverse rotation of a unit quaternion.
    #[inline]
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let axis = Vec3::new(self.x, self.y, self.z);
        let t = axis.cross(v) * 2.0;
        v + t * self.w + axis.cross(t)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Uniform scale, then rotation, then translation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,
    /// Scale (uniform)
    pub scale: f32,
    /// Rotation
    pub rotation: Quaternion,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, 1.0);

    /// Creates a new transform.
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quaternion, scale: f32) -> Self {
        Self {
            translation,
            scale,
            rotation,
        }
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn apply(self, point: Vec3) -> Vec3 {
        self.rotation.rotate(point * self.scale) + self.translation
    }

    /// The transform that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        let scale = 1.0 / self.scale;
        let rotation = self.rotation.conjugate();
        let translation = rotation.rotate(-self.translation) * scale;
        Self::new(translation, rotation, scale)
    }

    /// Converts to an affine matrix.
    #[must_use]
    pub fn to_matrix(self) -> Matrix4 {
        let Quaternion { x, y, z, w } = self.rotation;
        let s = self.scale;
        let t = self.translation;
        Matrix4::from_rows([
            [
                s * (1.0 - 2.0 * (y * y + z * z)),
                s * 2.0 * (x * y - z * w),
                s * 2.0 * (x * z + y * w),
                t.x,
            ],
            [
                s * 2.0 * (x * y + z * w),
                s * (1.0 - 2.0 * (x * x + z * z)),
                s * 2.0 * (y * z - x * w),
                t.y,
            ],
            [
                s * 2.0 * (x * z - y * w),
                s * 2.0 * (y * z + x * w),
                s * (1.0 - 2.0 * (x * x + y * y)),
                t.z,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Row major 4x4 matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix4 {
    /// Rows
    pub rows: [[f32; 4]; 4],
}

impl Matrix4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self::from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    /// Creates a matrix from its rows.
    #[inline]
    #[must_use]
    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Returns a single entry.
    #[inline]
    #[must_use]
    pub const fn get(&self, row: usize, column: usize) -> f32 {
        self.rows[row][column]
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, entry) in row.iter_mut().enumerate() {
                *entry = (0..4).map(|k| self.rows[r][k] * rhs.rows[k][c]).sum();
            }
        }
        Self::from_rows(rows)
    }
}

/// Axis aligned rectangle in normalized viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// The whole viewport.
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}
