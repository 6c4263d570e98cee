//! Immutable bind-pose hierarchy shared by every motion of one mesh
//!
//! Bones are stored as an arena with integer parent links. Construction
//! reorders them so that every parent precedes its children
//! (`parent[i] < i`), which lets pose resolution run as a single linear pass.
//! The inverse bind matrix of every bone is computed here once, not per
//! frame.

use crate::error::{Result, SkelError};
use crate::timeline::{Bone, KeyFrame, Motion};
use glam::Mat4;
use std::sync::Arc;

/// Determinant, relative to the product of the basis lengths, below which a
/// bind matrix is treated as singular
const SINGULAR_EPSILON: f32 = 1.0e-6;

/// Options for building a skeleton
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SkeletonOptions {
    /// Reorder bones so parents precede children.
    /// When false, input that is not already ordered is rejected.
    pub sort_bones: bool,
}

impl Default for SkeletonOptions {
    fn default() -> Self {
        Self { sort_bones: true }
    }
}

/// Skeleton with ancestor-before-descendant bone order and cached inverse
/// bind matrices
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    name: Arc<str>,
    bones: Vec<Bone>,
    bind_global: Vec<Mat4>,
    inverse_bind: Vec<Mat4>,
    /// `source_order[i]` is the import index of sorted bone `i`
    source_order: Vec<usize>,
    roots: Vec<usize>,
}

impl Skeleton {
    /// Build a skeleton with default options
    pub fn new(name: impl Into<Arc<str>>, bones: Vec<Bone>) -> Result<Self> {
        Self::with_options(name, bones, &SkeletonOptions::default())
    }

    /// Build a skeleton
    ///
    /// # Arguments
    /// * `name` - Skeleton name, used for cache lookup and diagnostics
    /// * `bones` - Bones in import order with parent indices into this list
    /// * `options` - Build options
    pub fn with_options(
        name: impl Into<Arc<str>>,
        bones: Vec<Bone>,
        options: &SkeletonOptions,
    ) -> Result<Self> {
        let name = name.into();
        if bones.is_empty() {
            return Err(SkelError::EmptySkeleton(name.to_string()));
        }

        let count = bones.len();
        for bone in &bones {
            let valid = bone.parent_index == crate::timeline::ROOT_PARENT
                || bone.parent().is_some_and(|parent| parent < count);
            if !valid {
                return Err(SkelError::InvalidParent {
                    bone: bone.name.to_string(),
                    parent: bone.parent_index,
                    count,
                });
            }
        }

        let already_ordered = bones
            .iter()
            .enumerate()
            .all(|(index, bone)| bone.parent().is_none_or(|parent| parent < index));

        let source_order = if already_ordered {
            (0..count).collect()
        } else if options.sort_bones {
            topological_order(&bones)?
        } else {
            let (index, bone) = bones
                .iter()
                .enumerate()
                .find(|(index, bone)| bone.parent().is_some_and(|parent| parent >= *index))
                .ok_or_else(|| SkelError::CycleDetected(name.to_string()))?;
            log::debug!("Bone {index} is ordered before its parent and sorting is disabled");
            return Err(SkelError::InvalidParent {
                bone: bone.name.to_string(),
                parent: bone.parent_index,
                count,
            });
        };

        let mut sorted_index = vec![0usize; count];
        for (new_index, &old_index) in source_order.iter().enumerate() {
            sorted_index[old_index] = new_index;
        }

        let sorted: Vec<Bone> = source_order
            .iter()
            .map(|&old_index| {
                let mut bone = bones[old_index].clone();
                if let Some(parent) = bone.parent() {
                    bone.parent_index = sorted_index[parent] as i32;
                }
                bone
            })
            .collect();

        let mut bind_global = Vec::with_capacity(count);
        let mut inverse_bind = Vec::with_capacity(count);
        let mut roots = Vec::new();
        for (index, bone) in sorted.iter().enumerate() {
            let local = bone.transform_offset.to_world_matrix();
            let global = match bone.parent() {
                Some(parent) => bind_global[parent] * local,
                None => {
                    roots.push(index);
                    local
                }
            };
            bind_global.push(global);
            inverse_bind.push(invert_bind(&name, bone, &global));
        }

        log::debug!(
            "Built skeleton '{}': {} bones, {} roots{}",
            name,
            count,
            roots.len(),
            if already_ordered { "" } else { " (reordered)" }
        );

        Ok(Self {
            name,
            bones: sorted,
            bind_global,
            inverse_bind,
            source_order,
            roots,
        })
    }

    /// Skeleton name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bones in ancestor-before-descendant order
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Number of bones
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Indices of root bones
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Bind-pose global matrix of a bone
    pub fn bind_global(&self, index: usize) -> Option<Mat4> {
        self.bind_global.get(index).copied()
    }

    /// Cached inverse bind matrices, one per bone
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind
    }

    /// Cached inverse bind matrix of a bone
    pub fn inverse_bind(&self, index: usize) -> Option<Mat4> {
        self.inverse_bind.get(index).copied()
    }

    /// Index of the bone called `name`
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name.as_ref() == name)
    }

    /// Import index of sorted bone `index`
    pub fn source_index(&self, index: usize) -> Option<usize> {
        self.source_order.get(index).copied()
    }

    /// Whether construction had to reorder the imported bones
    pub fn is_reordered(&self) -> bool {
        self.source_order
            .iter()
            .enumerate()
            .any(|(index, &source)| index != source)
    }

    /// Keyframe holding every bone in its bind pose
    pub fn bind_pose(&self) -> KeyFrame {
        KeyFrame::new(
            0.0,
            self.bones
                .iter()
                .map(|bone| bone.with_pose(bone.transform_offset))
                .collect(),
        )
    }

    /// Rearrange a keyframe authored in import order into skeleton order
    ///
    /// Parent indices are rewritten to the sorted layout. Fails when the
    /// keyframe does not carry exactly one bone per skeleton bone.
    pub fn conform_key_frame(
        &self,
        motion: &str,
        index: usize,
        key_frame: &KeyFrame,
    ) -> Result<KeyFrame> {
        if key_frame.bone_count() != self.bone_count() {
            return Err(SkelError::BoneCountMismatch {
                motion: motion.to_string(),
                key_frame: index,
                expected: self.bone_count(),
                actual: key_frame.bone_count(),
            });
        }
        if !self.is_reordered() {
            return Ok(key_frame.clone());
        }
        let key_pose = self
            .source_order
            .iter()
            .zip(&self.bones)
            .map(|(&source, sorted)| {
                let mut bone = key_frame.key_pose[source].clone();
                bone.parent_index = sorted.parent_index;
                bone
            })
            .collect();
        Ok(KeyFrame::new(key_frame.seconds, key_pose))
    }

    /// Rearrange every keyframe of a motion into skeleton order
    pub fn conform_motion(&self, mut motion: Motion) -> Result<Motion> {
        let key_frames = motion
            .key_frames
            .iter()
            .enumerate()
            .map(|(index, key_frame)| self.conform_key_frame(&motion.name, index, key_frame))
            .collect::<Result<Vec<_>>>()?;
        motion.key_frames = key_frames;
        Ok(motion)
    }
}

/// Order bones so that parents always come first, keeping import order
/// wherever the hierarchy allows it.
fn topological_order(bones: &[Bone]) -> Result<Vec<usize>> {
    let count = bones.len();
    let mut placed = vec![false; count];
    let mut order = Vec::with_capacity(count);
    let mut chain = Vec::new();

    for start in 0..count {
        chain.clear();
        let mut cursor = Some(start);
        while let Some(index) = cursor {
            if placed[index] {
                break;
            }
            if chain.contains(&index) {
                return Err(SkelError::CycleDetected(bones[index].name.to_string()));
            }
            chain.push(index);
            cursor = bones[index].parent();
        }
        for &index in chain.iter().rev() {
            placed[index] = true;
            order.push(index);
        }
    }

    Ok(order)
}

/// Determinant measured against the product of the basis column lengths
fn is_singular(matrix: &Mat4) -> bool {
    if !matrix.is_finite() {
        return true;
    }
    let volume = matrix.x_axis.truncate().length()
        * matrix.y_axis.truncate().length()
        * matrix.z_axis.truncate().length();
    volume <= f32::MIN_POSITIVE || (matrix.determinant() / volume).abs() < SINGULAR_EPSILON
}

fn invert_bind(skeleton: &str, bone: &Bone, global: &Mat4) -> Mat4 {
    if is_singular(global) {
        log::warn!(
            "Skeleton '{}' bone '{}' has a singular bind matrix; using identity inverse",
            skeleton,
            bone.name
        );
        return Mat4::IDENTITY;
    }
    global.inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use glam::Vec3;

    fn translated(x: f32, y: f32, z: f32) -> Transform {
        Transform::from_translation(Vec3::new(x, y, z))
    }

    #[test]
    fn test_empty_skeleton_rejected() {
        let err = Skeleton::new("empty", Vec::new()).unwrap_err();
        assert!(matches!(err, SkelError::EmptySkeleton(_)));
    }

    #[test]
    fn test_invalid_parent_rejected() {
        let bones = vec![
            Bone::root("root", Transform::IDENTITY),
            Bone::new("child", 5, Transform::IDENTITY),
        ];
        let err = Skeleton::new("bad", bones).unwrap_err();
        assert!(matches!(err, SkelError::InvalidParent { parent: 5, .. }));

        let bones = vec![Bone::new("weird", -2, Transform::IDENTITY)];
        assert!(Skeleton::new("bad", bones).is_err());
    }

    #[test]
    fn test_cycle_rejected() {
        let bones = vec![
            Bone::root("root", Transform::IDENTITY),
            Bone::new("a", 2, Transform::IDENTITY),
            Bone::new("b", 1, Transform::IDENTITY),
        ];
        let err = Skeleton::new("loop", bones).unwrap_err();
        assert!(matches!(err, SkelError::CycleDetected(_)));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let bones = vec![Bone::new("self", 0, Transform::IDENTITY)];
        assert!(matches!(
            Skeleton::new("self", bones).unwrap_err(),
            SkelError::CycleDetected(_)
        ));
    }

    #[test]
    fn test_ordered_input_is_kept() {
        let bones = vec![
            Bone::root("hips", Transform::IDENTITY),
            Bone::new("spine", 0, Transform::IDENTITY),
            Bone::new("head", 1, Transform::IDENTITY),
        ];
        let skeleton = Skeleton::new("biped", bones).unwrap();
        assert!(!skeleton.is_reordered());
        assert_eq!(skeleton.roots(), &[0]);
        assert_eq!(skeleton.find_bone("head"), Some(2));
        assert_eq!(skeleton.find_bone("tail"), None);
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        // head -> spine -> hips, stored child first
        let bones = vec![
            Bone::new("head", 1, Transform::IDENTITY),
            Bone::new("spine", 2, Transform::IDENTITY),
            Bone::root("hips", Transform::IDENTITY),
        ];
        let skeleton = Skeleton::new("biped", bones).unwrap();
        assert!(skeleton.is_reordered());

        let names: Vec<&str> = skeleton.bones().iter().map(|b| b.name.as_ref()).collect();
        assert_eq!(names, vec!["hips", "spine", "head"]);
        for (index, bone) in skeleton.bones().iter().enumerate() {
            assert!(bone.parent().is_none_or(|parent| parent < index));
        }
        assert_eq!(skeleton.source_index(0), Some(2));
    }

    #[test]
    fn test_unordered_input_rejected_without_sorting() {
        let bones = vec![
            Bone::new("child", 1, Transform::IDENTITY),
            Bone::root("root", Transform::IDENTITY),
        ];
        let options = SkeletonOptions { sort_bones: false };
        let err = Skeleton::with_options("strict", bones, &options).unwrap_err();
        assert!(matches!(err, SkelError::InvalidParent { .. }));
    }

    #[test]
    fn test_inverse_bind_matches_chain() {
        let bones = vec![
            Bone::root("root", translated(1.0, 0.0, 0.0)),
            Bone::new("child", 0, translated(0.0, 2.0, 0.0)),
        ];
        let skeleton = Skeleton::new("chain", bones).unwrap();

        let bind = skeleton.bind_global(1).unwrap();
        assert!(bind.w_axis.truncate().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1.0e-6));

        let product = bind * skeleton.inverse_bind(1).unwrap();
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1.0e-5));
    }

    #[test]
    fn test_small_scale_bind_is_inverted() {
        let tiny = Transform::new(
            Vec3::splat(0.001),
            Default::default(),
            Vec3::new(5.0, 0.0, 0.0),
        );
        let skeleton = Skeleton::new("tiny", vec![Bone::root("root", tiny)]).unwrap();

        let inverse = skeleton.inverse_bind(0).unwrap();
        assert_ne!(inverse, Mat4::IDENTITY);
        let product = skeleton.bind_global(0).unwrap() * inverse;
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1.0e-4), "{product:?}");
    }

    #[test]
    fn test_singular_bind_falls_back_to_identity() {
        let flat = Transform::new(Vec3::new(0.0, 1.0, 1.0), Default::default(), Vec3::ZERO);
        let skeleton = Skeleton::new("flat", vec![Bone::root("root", flat)]).unwrap();
        assert_eq!(skeleton.inverse_bind(0), Some(Mat4::IDENTITY));
    }

    #[test]
    fn test_conform_key_frame_follows_sorted_order() {
        let bones = vec![
            Bone::new("child", 1, Transform::IDENTITY),
            Bone::root("root", Transform::IDENTITY),
        ];
        let skeleton = Skeleton::new("pair", bones.clone()).unwrap();

        let key_frame = KeyFrame::new(
            0.5,
            vec![
                bones[0].with_pose(translated(0.0, 1.0, 0.0)),
                bones[1].with_pose(translated(3.0, 0.0, 0.0)),
            ],
        );
        let conformed = skeleton.conform_key_frame("test", 0, &key_frame).unwrap();
        assert_eq!(conformed.key_pose[0].name.as_ref(), "root");
        assert_eq!(conformed.key_pose[1].name.as_ref(), "child");
        assert_eq!(conformed.key_pose[1].parent_index, 0);
        assert!((conformed.key_pose[0].transform_pose.translation.x - 3.0).abs() < 1.0e-6);
    }

    #[test]
    fn test_conform_key_frame_rejects_wrong_count() {
        let skeleton = Skeleton::new("one", vec![Bone::root("root", Transform::IDENTITY)]).unwrap();
        let key_frame = KeyFrame::new(0.0, Vec::new());
        let err = skeleton.conform_key_frame("walk", 3, &key_frame).unwrap_err();
        assert!(matches!(
            err,
            SkelError::BoneCountMismatch {
                key_frame: 3,
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_bind_pose_key_frame() {
        let offset = translated(0.0, 0.0, 4.0);
        let skeleton = Skeleton::new("one", vec![Bone::root("root", offset)]).unwrap();
        let bind = skeleton.bind_pose();
        assert_eq!(bind.bone_count(), 1);
        assert_eq!(bind.key_pose[0].transform_pose, offset);
    }
}
