//! How a model consumes pose output

use crate::pose::Pose;
use glam::Mat4;

/// Whether a model is rendered rigidly or deformed by a skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ModelUsage {
    /// No skeleton; vertices use the model matrix only
    #[default]
    Static,
    /// Vertices are deformed by a per-bone skinning palette
    Skinned,
}

impl ModelUsage {
    /// Usage implied by a bone count
    pub fn from_bone_count(count: usize) -> Self {
        if count == 0 { Self::Static } else { Self::Skinned }
    }

    pub fn is_skinned(self) -> bool {
        self == Self::Skinned
    }

    /// Matrices to upload for this model
    ///
    /// Static models get a single identity matrix. Skinned models get the
    /// pose's skinning palette, or nothing when no pose is available yet.
    pub fn bone_palette(self, pose: Option<&Pose>) -> Vec<Mat4> {
        match (self, pose) {
            (Self::Static, _) => vec![Mat4::IDENTITY],
            (Self::Skinned, Some(pose)) => pose.skinning_palette(),
            (Self::Skinned, None) => {
                log::debug!("Skinned model sampled without a pose");
                Vec::new()
            }
        }
    }
}
