//! Seam between asset importers and the animation core
//!
//! File-format parsing lives outside this crate. Importers hand over plain
//! bones and motions through [`ImportSource`].

use crate::error::{Result, SkelError};
use crate::timeline::{Bone, Motion};

/// Producer of a skeleton and its motions
///
/// Each method is called at most once per load.
pub trait ImportSource: Send {
    /// Name reported in logs and used for the loaded skeleton
    fn name(&self) -> &str;

    /// Bones in import order
    fn load_skeleton(&mut self) -> Result<Vec<Bone>>;

    /// Motions whose keyframes follow the import bone order
    fn load_motions(&mut self) -> Result<Vec<Motion>>;
}

/// Import source over data that is already in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    bones: Option<Vec<Bone>>,
    motions: Option<Vec<Motion>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bones: Vec<Bone>, motions: Vec<Motion>) -> Self {
        Self {
            name: name.into(),
            bones: Some(bones),
            motions: Some(motions),
        }
    }
}

impl ImportSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_skeleton(&mut self) -> Result<Vec<Bone>> {
        self.bones
            .take()
            .ok_or_else(|| SkelError::Import(format!("skeleton of '{}' already taken", self.name)))
    }

    fn load_motions(&mut self) -> Result<Vec<Motion>> {
        self.motions
            .take()
            .ok_or_else(|| SkelError::Import(format!("motions of '{}' already taken", self.name)))
    }
}
