//! Static timeline data: bones, keyframes and motions
//!
//! These types are built once at import time and treated as immutable
//! afterwards. A [`Motion`] is normally shared between many animators through
//! an `Arc`.

use crate::pose::Pose;
use crate::skeleton::Skeleton;
use crate::transform::{Lerp, RotationPath, Transform};
use glam::Mat4;
use std::sync::Arc;

/// Parent index stored on root bones
pub const ROOT_PARENT: i32 = -1;

/// One joint of a skeleton
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bone {
    /// Bone name, unique within a skeleton
    pub name: Arc<str>,
    /// Index of the parent bone, [`ROOT_PARENT`] for roots
    pub parent_index: i32,
    /// Bind-pose transform relative to the parent
    pub transform_offset: Transform,
    /// Current transform relative to the parent
    pub transform_pose: Transform,
}

impl Bone {
    /// Create a bone whose current pose equals its bind pose
    pub fn new(name: impl Into<Arc<str>>, parent_index: i32, transform_offset: Transform) -> Self {
        Self {
            name: name.into(),
            parent_index,
            transform_offset,
            transform_pose: transform_offset,
        }
    }

    /// Create a root bone
    pub fn root(name: impl Into<Arc<str>>, transform_offset: Transform) -> Self {
        Self::new(name, ROOT_PARENT, transform_offset)
    }

    /// Whether this bone has no parent
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }

    /// Parent index as `usize`, `None` for roots
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }

    /// Copy of this bone carrying a different current pose
    pub fn with_pose(&self, transform_pose: Transform) -> Self {
        Self {
            transform_pose,
            ..self.clone()
        }
    }
}

/// A sampled skeletal pose at one timestamp
///
/// `key_pose` holds one bone per skeleton bone, in skeleton order. A keyframe
/// with an empty `key_pose` is the "no pose" sentinel returned when there is
/// nothing to sample.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct KeyFrame {
    /// Absolute timestamp along the motion, in seconds
    pub seconds: f32,
    /// One entry per skeleton bone
    pub key_pose: Vec<Bone>,
}

impl KeyFrame {
    /// Create a keyframe
    pub fn new(seconds: f32, key_pose: Vec<Bone>) -> Self {
        Self { seconds, key_pose }
    }

    /// Whether this is the empty "no pose" sentinel
    pub fn is_empty(&self) -> bool {
        self.key_pose.is_empty()
    }

    /// Number of bones carried by this keyframe
    pub fn bone_count(&self) -> usize {
        self.key_pose.len()
    }

    /// Iterate over the current local transform of every bone
    pub fn transforms(&self) -> impl Iterator<Item = &Transform> {
        self.key_pose.iter().map(|bone| &bone.transform_pose)
    }

    /// Interpolate every bone's pose pairwise by index
    ///
    /// Both keyframes must carry the same number of bones; this is a caller
    /// precondition (see [`Pose::has_compatible_with`]). Bone identity (name,
    /// parent, offset) is taken from `a`.
    pub fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Self::interpolate_with(a, b, t, RotationPath::Direct)
    }

    /// Interpolate every bone's pose choosing the rotation arc explicitly
    pub fn interpolate_with(a: &Self, b: &Self, t: f32, path: RotationPath) -> Self {
        debug_assert_eq!(
            a.key_pose.len(),
            b.key_pose.len(),
            "interpolated keyframes must carry the same bones"
        );
        let key_pose = a
            .key_pose
            .iter()
            .zip(&b.key_pose)
            .map(|(left, right)| {
                left.with_pose(Transform::interpolate_with(
                    &left.transform_pose,
                    &right.transform_pose,
                    t,
                    path,
                ))
            })
            .collect();
        Self {
            seconds: Lerp::lerp(&a.seconds, &b.seconds, t),
            key_pose,
        }
    }
}

/// One animation clip: an ordered sequence of keyframes
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Motion {
    /// Clip name, used for lookup in a motion holder
    pub name: String,
    /// Nominal samples per second the clip was authored at
    pub sampling_rate: f32,
    /// Nominal duration in seconds
    pub anim_seconds: f32,
    /// Keyframes sorted ascending by `seconds`
    pub key_frames: Vec<KeyFrame>,
    /// Optional precomputed global matrices, one list per keyframe
    pub global_transforms: Vec<Vec<Mat4>>,
}

impl Motion {
    /// Create a motion; the nominal duration is the last keyframe's timestamp
    pub fn new(name: impl Into<String>, sampling_rate: f32, key_frames: Vec<KeyFrame>) -> Self {
        let anim_seconds = key_frames.last().map_or(0.0, |kf| kf.seconds);
        Self {
            name: name.into(),
            sampling_rate,
            anim_seconds,
            key_frames,
            global_transforms: Vec::new(),
        }
    }

    /// Whether the motion carries no keyframes
    pub fn is_empty(&self) -> bool {
        self.key_frames.is_empty()
    }

    /// Number of keyframes
    pub fn key_frame_count(&self) -> usize {
        self.key_frames.len()
    }

    /// Bone count of the first keyframe (0 for an empty motion)
    pub fn bone_count(&self) -> usize {
        self.key_frames.first().map_or(0, KeyFrame::bone_count)
    }

    /// Timestamp of the last keyframe
    pub fn whole_seconds(&self) -> f32 {
        self.key_frames.last().map_or(0.0, |kf| kf.seconds)
    }

    /// Number of frames at the nominal sampling rate
    pub fn frame_count(&self) -> u32 {
        (self.anim_seconds * self.sampling_rate).round().max(0.0) as u32
    }

    /// Whether `global_transforms` has been filled for every keyframe
    pub fn has_global_transforms(&self) -> bool {
        !self.key_frames.is_empty() && self.global_transforms.len() == self.key_frames.len()
    }

    /// Precompute the global matrix of every bone for every keyframe
    ///
    /// Keyframes whose bone count does not match `skeleton` get an empty
    /// entry so the list stays aligned with `key_frames`.
    pub fn bake_global_transforms(&mut self, skeleton: &Arc<Skeleton>) {
        let mut pose = Pose::new(Arc::clone(skeleton));
        self.global_transforms = self
            .key_frames
            .iter()
            .map(|key_frame| {
                if !pose.has_compatible_with_key_frame(key_frame) {
                    log::warn!(
                        "Motion '{}' keyframe at {}s has {} bones, skeleton '{}' has {}",
                        self.name,
                        key_frame.seconds,
                        key_frame.bone_count(),
                        skeleton.name(),
                        skeleton.bone_count()
                    );
                    return Vec::new();
                }
                pose.assign_key_frame(key_frame);
                pose.update_transform_matrices();
                pose.global_matrices()
            })
            .collect();
    }
}
