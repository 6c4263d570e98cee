//! Hierarchical matrix resolution for one skeleton instance
//!
//! A [`Pose`] owns one [`Node`] per skeleton bone. Assigning a keyframe only
//! replaces the bones; matrices are recomputed by
//! [`Pose::update_transform_matrices`], which runs a local pass followed by a
//! single ancestor-before-descendant global pass.

use crate::skeleton::Skeleton;
use crate::timeline::{Bone, KeyFrame};
use glam::Mat4;
use std::sync::Arc;

/// Per-bone evaluation state
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Bone carrying the current local transform
    pub bone: Bone,
    /// Local matrix relative to the parent
    pub local: Mat4,
    /// Model-space matrix
    pub global: Mat4,
    /// `global · inverse_bind`, ready for vertex skinning
    pub skinning: Mat4,
}

impl Node {
    fn new(bone: Bone) -> Self {
        Self {
            bone,
            local: Mat4::IDENTITY,
            global: Mat4::IDENTITY,
            skinning: Mat4::IDENTITY,
        }
    }
}

/// Evaluated pose of one skeleton instance
#[derive(Debug, Clone)]
pub struct Pose {
    skeleton: Arc<Skeleton>,
    skeletal: Vec<Node>,
}

impl Pose {
    /// Create a pose in the bind pose with matrices already computed
    pub fn new(skeleton: Arc<Skeleton>) -> Self {
        let skeletal = skeleton.bones().iter().cloned().map(Node::new).collect();
        let mut pose = Self { skeleton, skeletal };
        pose.reset_to_bind_pose();
        pose
    }

    /// Skeleton this pose evaluates
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    /// Number of nodes
    pub fn bone_count(&self) -> usize {
        self.skeletal.len()
    }

    /// Whether `bones` carries one entry per node
    ///
    /// Only the count is checked. Use [`Pose::matches_hierarchy`] when names
    /// and parents must agree as well.
    pub fn has_compatible_with(&self, bones: &[Bone]) -> bool {
        self.skeletal.len() == bones.len()
    }

    /// [`Pose::has_compatible_with`] applied to a keyframe
    pub fn has_compatible_with_key_frame(&self, key_frame: &KeyFrame) -> bool {
        self.has_compatible_with(&key_frame.key_pose)
    }

    /// Whether `bones` has the same names and parents as this pose, index by
    /// index
    pub fn matches_hierarchy(&self, bones: &[Bone]) -> bool {
        self.has_compatible_with(bones)
            && self.skeletal.iter().zip(bones).all(|(node, bone)| {
                node.bone.name == bone.name && node.bone.parent_index == bone.parent_index
            })
    }

    /// Replace every node's bone with `bones`, pairwise by index
    ///
    /// Matrices are left untouched until the next
    /// [`Pose::update_transform_matrices`]. Extra entries on either side are
    /// ignored; check [`Pose::has_compatible_with`] first.
    pub fn assign_skeletal(&mut self, bones: &[Bone]) {
        for (node, bone) in self.skeletal.iter_mut().zip(bones) {
            node.bone.clone_from(bone);
        }
    }

    /// Assign the bones of a keyframe
    pub fn assign_key_frame(&mut self, key_frame: &KeyFrame) {
        self.assign_skeletal(&key_frame.key_pose);
    }

    /// Put every node back into its bind pose and recompute matrices
    pub fn reset_to_bind_pose(&mut self) {
        for (node, bone) in self.skeletal.iter_mut().zip(self.skeleton.bones()) {
            node.bone.clone_from(bone);
            node.bone.transform_pose = bone.transform_offset;
        }
        self.update_transform_matrices();
    }

    /// Recompute local, global and skinning matrices
    pub fn update_transform_matrices(&mut self) {
        self.update_local_matrices();
        self.update_global_matrices();
    }

    /// Recompute every node's local matrix from its current transform
    pub fn update_local_matrices(&mut self) {
        for node in &mut self.skeletal {
            node.local = node.bone.transform_pose.to_world_matrix();
        }
    }

    /// Propagate local matrices down the hierarchy
    ///
    /// Parent links come from the [`Skeleton`], which keeps `parent < index`;
    /// the parent indices carried by assigned bones are not consulted.
    pub fn update_global_matrices(&mut self) {
        let bones = self.skeleton.bones();
        let inverse_bind = self.skeleton.inverse_bind_matrices();
        for index in 0..self.skeletal.len() {
            let parent = bones
                .get(index)
                .and_then(Bone::parent)
                .filter(|&parent| parent < index);
            let local = self.skeletal[index].local;
            let global = parent.map_or(local, |parent| self.skeletal[parent].global * local);
            let node = &mut self.skeletal[index];
            node.global = global;
            node.skinning = global * inverse_bind.get(index).copied().unwrap_or(Mat4::IDENTITY);
        }
    }

    /// Nodes in skeleton order
    pub fn get_current_pose(&self) -> &[Node] {
        &self.skeletal
    }

    /// Node of the bone called `name`
    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.skeleton
            .find_bone(name)
            .and_then(|index| self.skeletal.get(index))
    }

    /// Global matrices in skeleton order
    pub fn global_matrices(&self) -> Vec<Mat4> {
        self.skeletal.iter().map(|node| node.global).collect()
    }

    /// Skinning matrices in skeleton order
    pub fn skinning_palette(&self) -> Vec<Mat4> {
        self.skeletal.iter().map(|node| node.skinning).collect()
    }

    /// Copy skinning matrices into a caller-owned buffer
    ///
    /// Returns the number of matrices written, which is the smaller of the
    /// buffer length and the bone count.
    pub fn write_skinning_palette(&self, out: &mut [Mat4]) -> usize {
        let count = out.len().min(self.skeletal.len());
        for (slot, node) in out.iter_mut().zip(&self.skeletal) {
            *slot = node.skinning;
        }
        count
    }
}
