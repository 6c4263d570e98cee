//! Unit quaternion rotation primitive
//!
//! Every rotation that flows through the animation core is a [`Quaternion`].
//! Values are plain `Copy` data; nothing here renormalizes implicitly, so
//! callers that chain many compositions should call
//! [`Quaternion::normalize`] to keep `|q| ≈ 1`.

use glam::{Mat4, Vec3, Vec4};
use std::ops::{Add, Mul, Neg};

/// Below this magnitude a quaternion is treated as zero-length
pub const ZERO_LENGTH_EPSILON: f32 = 1.0e-6;

/// Tolerance on `|q|²` for the unit-length fast path
pub const UNIT_LENGTH_TOLERANCE: f32 = 1.0e-4;

/// Below this `|sin θ|` the two slerp endpoints are parallel or antiparallel
pub const SLERP_EPSILON: f32 = 1.0e-5;

/// Quaternion `(x, y, z, w)` where `w` is the scalar part
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a new quaternion from raw components
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Build a rotation of `radians` around `axis`.
    ///
    /// `axis` must already be unit length; it is not normalized here, and a
    /// non-unit axis yields a non-unit quaternion.
    pub fn make(axis: Vec3, radians: f32) -> Self {
        let half = radians * 0.5;
        let s = half.sin();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    /// Four-component dot product
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Squared magnitude
    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    /// Magnitude
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Whether `|q| ≈ 1` within [`UNIT_LENGTH_TOLERANCE`]
    pub fn is_normalized(&self) -> bool {
        (self.length_squared() - 1.0).abs() < UNIT_LENGTH_TOLERANCE
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// Normalize the quaternion
    ///
    /// A zero-length quaternion has no direction and normalizes to identity.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > ZERO_LENGTH_EPSILON {
            *self * (1.0 / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Conjugate `(-x, -y, -z, w)`
    pub fn conjugate(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Multiplicative inverse, or `None` for a zero-length quaternion.
    ///
    /// Unit quaternions take the conjugate directly; anything else is scaled
    /// by `1 / |q|²`.
    pub fn try_inverse(&self) -> Option<Self> {
        let len_sq = self.length_squared();
        if len_sq < ZERO_LENGTH_EPSILON {
            return None;
        }
        if (len_sq - 1.0).abs() < UNIT_LENGTH_TOLERANCE {
            return Some(self.conjugate());
        }
        Some(self.conjugate() * (1.0 / len_sq))
    }

    /// Multiplicative inverse, falling back to identity for a zero-length
    /// quaternion (which never represents a rotation).
    pub fn inverse(&self) -> Self {
        match self.try_inverse() {
            Some(inverse) => inverse,
            None => {
                log::warn!("Inverse requested for zero-length quaternion {self:?}; using identity");
                Self::IDENTITY
            }
        }
    }

    /// Spherical linear interpolation
    ///
    /// Follows the great arc from `self` to `other` without flipping either
    /// operand, so when `dot < 0` the long way round is taken. When the two
    /// orientations are parallel or antiparallel (`|sin θ| <`
    /// [`SLERP_EPSILON`]) the interpolation degenerates and `self` is
    /// returned unchanged. `t` is not clamped.
    pub fn slerp(&self, other: &Self, t: f32) -> Self {
        let cos_theta = self.dot(other).clamp(-1.0, 1.0);
        let theta = cos_theta.acos();
        let sin_theta = theta.sin();

        if sin_theta.abs() < SLERP_EPSILON {
            return *self;
        }

        let weight_a = ((1.0 - t) * theta).sin() / sin_theta;
        let weight_b = (t * theta).sin() / sin_theta;
        *self * weight_a + *other * weight_b
    }

    /// Spherical linear interpolation along the shorter arc
    ///
    /// Negates `other` first when `dot < 0`. The result at `t = 1` is then
    /// `-other`, which encodes the same rotation.
    pub fn slerp_shortest(&self, other: &Self, t: f32) -> Self {
        if self.dot(other) < 0.0 {
            self.slerp(&-*other, t)
        } else {
            self.slerp(other, t)
        }
    }

    /// Normalized linear interpolation along the shorter arc
    pub fn nlerp(&self, other: &Self, t: f32) -> Self {
        let other = if self.dot(other) < 0.0 { -*other } else { *other };
        (*self * (1.0 - t) + other * t).normalize()
    }

    /// Rotate `v` by computing `q · v · q*`
    pub fn rotate_vector(&self, v: Vec3) -> Vec3 {
        let p = Self::new(v.x, v.y, v.z, 0.0);
        let r = *self * p * self.conjugate();
        Vec3::new(r.x, r.y, r.z)
    }

    /// Column-major rotation matrix for this quaternion
    ///
    /// Assumes `|q| ≈ 1`.
    pub fn require_rotation_matrix(&self) -> Mat4 {
        let x2 = self.x + self.x;
        let y2 = self.y + self.y;
        let z2 = self.z + self.z;

        let xx = self.x * x2;
        let xy = self.x * y2;
        let xz = self.x * z2;
        let yy = self.y * y2;
        let yz = self.y * z2;
        let zz = self.z * z2;
        let wx = self.w * x2;
        let wy = self.w * y2;
        let wz = self.w * z2;

        Mat4::from_cols(
            Vec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
            Vec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
            Vec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
            Vec4::W,
        )
    }

    /// Extract the rotation from the upper 3x3 of a pure rotation matrix
    pub fn from_rotation_matrix(m: &Mat4) -> Self {
        // mRC: row R, column C
        let (m00, m10, m20) = (m.x_axis.x, m.x_axis.y, m.x_axis.z);
        let (m01, m11, m21) = (m.y_axis.x, m.y_axis.y, m.y_axis.z);
        let (m02, m12, m22) = (m.z_axis.x, m.z_axis.y, m.z_axis.z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Decompose into a unit axis and an angle in radians
    ///
    /// Identity (or anything too close to it) reports `(Vec3::X, 0.0)`.
    pub fn to_axis_angle(&self) -> (Vec3, f32) {
        let q = self.normalize();
        let w = q.w.clamp(-1.0, 1.0);
        let angle = 2.0 * w.acos();
        let s = (1.0 - w * w).sqrt();
        if s < ZERO_LENGTH_EPSILON {
            (Vec3::X, 0.0)
        } else {
            (Vec3::new(q.x / s, q.y / s, q.z / s), angle)
        }
    }

    /// Component-wise approximate equality
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        (self.x - other.x).abs() <= max_abs_diff
            && (self.y - other.y).abs() <= max_abs_diff
            && (self.z - other.z).abs() <= max_abs_diff
            && (self.w - other.w).abs() <= max_abs_diff
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Quaternion {
    type Output = Self;

    /// Hamilton product; `a * b` applies `b` first, then `a`
    fn mul(self, rhs: Self) -> Self {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl Mul<f32> for Quaternion {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
            w: self.w * rhs,
        }
    }
}

impl Mul<Vec3> for Quaternion {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        self.rotate_vector(rhs)
    }
}

impl Add for Quaternion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
            w: self.w + rhs.w,
        }
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: -self.w,
        }
    }
}

impl From<glam::Quat> for Quaternion {
    fn from(q: glam::Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl From<Quaternion> for glam::Quat {
    fn from(q: Quaternion) -> Self {
        Self::from_xyzw(q.x, q.y, q.z, q.w)
    }
}
