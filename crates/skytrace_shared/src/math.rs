//! Mathematical types shared between physics, rendering and replay.
//!
//! Components are `f64` because the physics engine stores its packed state in
//! double precision; the renderer narrows on its own side if it needs to.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Below this squared length a vector is treated as zero when normalizing.
const NORMALIZE_EPSILON_SQ: f64 = 1e-24;

/// 3D Vector - position, velocity, direction, force
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Reads three consecutive components starting at `offset`.
    ///
    /// Returns `None` if the slice is too short.
    #[must_use]
    pub fn from_slice_at(data: &[f64], offset: usize) -> Option<Self> {
        let s = data.get(offset..offset + 3)?;
        Some(Self::new(s[0], s[1], s[2]))
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    #[must_use]
    pub fn try_normalize(self) -> Option<Self> {
        let len_sq = self.length_squared();
        if len_sq < NORMALIZE_EPSILON_SQ {
            return None;
        }
        Some(self * (1.0 / len_sq.sqrt()))
    }

    /// Midpoint between two points
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Unit quaternion for rotations, stored `(x, y, z, w)`.
///
/// The physics engine packs quaternions scalar-first; use
/// [`Quaternion::from_wxyz`] / [`Quaternion::to_wxyz`] at that boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
    /// W component
    pub w: f64,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Builds from scalar-first storage `[w, x, y, z]`.
    #[must_use]
    pub const fn from_wxyz(q: [f64; 4]) -> Self {
        Self::new(q[1], q[2], q[3], q[0])
    }

    /// Scalar-first storage `[w, x, y, z]`.
    #[must_use]
    pub const fn to_wxyz(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Reads a scalar-first quaternion starting at `offset`.
    #[must_use]
    pub fn from_wxyz_slice_at(data: &[f64], offset: usize) -> Option<Self> {
        let s = data.get(offset..offset + 4)?;
        Some(Self::from_wxyz([s[0], s[1], s[2], s[3]]))
    }

    /// Vector part
    #[must_use]
    pub const fn vector(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Conjugate (inverse for unit quaternions)
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector by this (unit) quaternion.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2 q x (q x v)
        let q = self.vector();
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Normalizes; a degenerate quaternion becomes the identity.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w;
        if len_sq < NORMALIZE_EPSILON_SQ {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len_sq.sqrt();
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
    #[must_use]
    pub fn from_unit_vectors(from: Vec3, to: Vec3) -> Self {
        let r = from.dot(to) + 1.0;
        if r < f64::EPSILON {
            // Opposite vectors: rotate half a turn about any perpendicular axis.
            let q = if from.x.abs() > from.z.abs() {
                Self::new(-from.y, from.x, 0.0, 0.0)
            } else {
                Self::new(0.0, -from.z, from.y, 0.0)
            };
            return q.normalize();
        }
        let axis = from.cross(to);
        Self::new(axis.x, axis.y, axis.z, r).normalize()
    }
}

/// Hamilton product
impl std::ops::Mul for Quaternion {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Instance transform - position + rotation + per-axis scale.
///
/// Used for batched primitives (tendon spheres and cylinders, flex vertices).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct InstanceTransform {
    /// Position
    pub position: Vec3,
    /// Rotation
    pub rotation: Quaternion,
    /// Scale per axis
    pub scale: Vec3,
}

impl InstanceTransform {
    /// Creates a new instance transform
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Unrotated sphere of radius `r` centred at `position`.
    #[must_use]
    pub const fn sphere(position: Vec3, r: f64) -> Self {
        Self::new(position, Quaternion::IDENTITY, Vec3::new(r, r, r))
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, Vec3::new(1.0, 1.0, 1.0));
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-12, "{a:?} != {b:?}");
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(Vec3::ZERO.try_normalize(), None);
    }

    #[test]
    fn test_slice_reads_are_bounds_checked() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(Vec3::from_slice_at(&data, 1), Some(Vec3::new(2.0, 3.0, 4.0)));
        assert_eq!(Vec3::from_slice_at(&data, 2), None);
        assert_eq!(
            Quaternion::from_wxyz_slice_at(&data, 0),
            Some(Quaternion::new(2.0, 3.0, 4.0, 1.0))
        );
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let half = std::f64::consts::FRAC_PI_4;
        // 90 degrees about Z
        let q = Quaternion::new(0.0, 0.0, half.sin(), half.cos());
        assert_vec_close(q.rotate(Vec3::X), Vec3::Y);
        assert_vec_close(q.conjugate().rotate(Vec3::Y), Vec3::X);
    }

    #[test]
    fn test_from_unit_vectors() {
        let q = Quaternion::from_unit_vectors(Vec3::Y, Vec3::X);
        assert_vec_close(q.rotate(Vec3::Y), Vec3::X);

        let flip = Quaternion::from_unit_vectors(Vec3::Y, -Vec3::Y);
        assert_vec_close(flip.rotate(Vec3::Y), -Vec3::Y);
    }

    #[test]
    fn test_instance_transform_bytemuck() {
        let t = InstanceTransform::sphere(Vec3::new(1.0, 2.0, 3.0), 0.5);
        let bytes: &[u8] = bytemuck::bytes_of(&t);
        assert_eq!(bytes.len(), 80); // 10 * 8 bytes
    }
}
