//! Scale / rotation / translation triple and its interpolation

use crate::quaternion::Quaternion;
use glam::{Mat4, Vec3};

/// Trait for types that can be linearly interpolated
///
/// `t` is never clamped, so values outside `[0, 1]` extrapolate.
pub trait Lerp: Clone {
    /// Linear interpolation between self and other
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        *self + (*other - *self) * t
    }
}

impl Lerp for Quaternion {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Use slerp for quaternion interpolation
        self.slerp(other, t)
    }
}

/// Which arc rotation blending follows between two keyed orientations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum RotationPath {
    /// Plain slerp between the stored quaternions, whatever their sign
    #[default]
    Direct,
    /// Flip the target when `dot < 0` so the shorter arc is used
    Shortest,
}

/// Local transform of a bone
///
/// Composition into a matrix is always scale, then rotation, then
/// translation. With column vectors that is `T · R · S`; skinning depends on
/// this order.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Transform {
    pub scale: Vec3,
    pub rotation: Quaternion,
    pub translation: Vec3,
}

impl Transform {
    /// Unit scale, no rotation, no translation
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotation: Quaternion::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Create a transform from its three parts
    pub const fn new(scale: Vec3, rotation: Quaternion, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Pure translation
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            scale: Vec3::ONE,
            rotation: Quaternion::IDENTITY,
            translation,
        }
    }

    /// Pure rotation
    pub const fn from_rotation(rotation: Quaternion) -> Self {
        Self {
            scale: Vec3::ONE,
            rotation,
            translation: Vec3::ZERO,
        }
    }

    /// Compose into a column-major matrix: `S · R` first, translation injected
    /// into the last column afterwards.
    pub fn to_world_matrix(&self) -> Mat4 {
        let scale = Mat4::from_scale(self.scale);
        let mut m = self.rotation.require_rotation_matrix() * scale;
        m.w_axis.x = self.translation.x;
        m.w_axis.y = self.translation.y;
        m.w_axis.z = self.translation.z;
        m
    }

    /// Interpolate two transforms; scale and translation lerp, rotation slerps.
    ///
    /// `t` outside `[0, 1]` extrapolates and is not clamped here.
    pub fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Self::interpolate_with(a, b, t, RotationPath::Direct)
    }

    /// Interpolate two transforms choosing the rotation arc explicitly
    pub fn interpolate_with(a: &Self, b: &Self, t: f32, path: RotationPath) -> Self {
        let rotation = match path {
            RotationPath::Direct => a.rotation.slerp(&b.rotation, t),
            RotationPath::Shortest => a.rotation.slerp_shortest(&b.rotation, t),
        };
        Self {
            scale: Lerp::lerp(&a.scale, &b.scale, t),
            rotation,
            translation: Lerp::lerp(&a.translation, &b.translation, t),
        }
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.rotation.is_finite() && self.translation.is_finite()
    }

    /// Component-wise approximate equality
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.scale.abs_diff_eq(other.scale, max_abs_diff)
            && self.rotation.abs_diff_eq(&other.rotation, max_abs_diff)
            && self.translation.abs_diff_eq(other.translation, max_abs_diff)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Lerp for Transform {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::interpolate(self, other, t)
    }
}
