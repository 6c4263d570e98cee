//! Catalog of motions recorded against one skeleton

use crate::error::{Result, SkelError};
use crate::import::ImportSource;
use crate::skeleton::Skeleton;
use crate::timeline::Motion;
use crate::validation::validate_motion;
use std::sync::Arc;

/// Ordered collection of shared motions
///
/// Motions are immutable once pushed; they are handed out as `Arc<Motion>`
/// so animators can keep sampling a motion that has since been removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionHolder {
    motions: Vec<Arc<Motion>>,
}

impl MotionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a motion and return its index
    pub fn push(&mut self, motion: Motion) -> usize {
        self.push_shared(Arc::new(motion))
    }

    /// Append an already shared motion and return its index
    pub fn push_shared(&mut self, motion: Arc<Motion>) -> usize {
        self.motions.push(motion);
        self.motions.len() - 1
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Motion at `index`
    pub fn get(&self, index: usize) -> Option<&Arc<Motion>> {
        self.motions.get(index)
    }

    /// First motion called `name`
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Motion>> {
        self.find(name).and_then(|index| self.motions.get(index))
    }

    /// Index of the first motion called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.motions.iter().position(|motion| motion.name == name)
    }

    /// Index of the first motion called `name`, or [`MotionHolder::len`]
    /// when there is none
    pub fn index_of(&self, name: &str) -> usize {
        self.find(name).unwrap_or(self.motions.len())
    }

    /// Like [`MotionHolder::get_by_name`] but failing with
    /// [`SkelError::UnknownMotion`]
    pub fn require(&self, name: &str) -> Result<Arc<Motion>> {
        self.get_by_name(name)
            .cloned()
            .ok_or_else(|| SkelError::UnknownMotion(name.to_string()))
    }

    /// Remove the motion at `index`, shifting later motions down
    pub fn remove(&mut self, index: usize) -> Option<Arc<Motion>> {
        (index < self.motions.len()).then(|| self.motions.remove(index))
    }

    /// Remove the first motion called `name`
    pub fn remove_by_name(&mut self, name: &str) -> Option<Arc<Motion>> {
        self.find(name).and_then(|index| self.remove(index))
    }

    /// Motion names in holder order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.motions.iter().map(|motion| motion.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Motion>> {
        self.motions.iter()
    }

    /// Precompute global matrices for every motion
    ///
    /// Motions still shared elsewhere are copied before baking.
    pub fn bake_global_transforms(&mut self, skeleton: &Arc<Skeleton>) {
        for motion in &mut self.motions {
            Arc::make_mut(motion).bake_global_transforms(skeleton);
        }
    }

    /// Pull every motion out of `source`, conform it to `skeleton` and add
    /// it
    ///
    /// The whole batch is validated before anything is added, so a failing
    /// source leaves the holder unchanged. Returns the number of motions
    /// added.
    pub fn ingest(&mut self, skeleton: &Skeleton, source: &mut dyn ImportSource) -> Result<usize> {
        let motions = source
            .load_motions()?
            .into_iter()
            .map(|motion| {
                let motion = skeleton.conform_motion(motion)?;
                validate_motion(skeleton, &motion)?;
                Ok(motion)
            })
            .collect::<Result<Vec<_>>>()?;

        let count = motions.len();
        for motion in motions {
            if self.find(&motion.name).is_some() {
                log::warn!(
                    "Motion '{}' from '{}' shadows an existing motion of the same name",
                    motion.name,
                    source.name()
                );
            }
            self.push(motion);
        }

        log::debug!(
            "Ingested {} motions from '{}' for skeleton '{}'",
            count,
            source.name(),
            skeleton.name()
        );
        Ok(count)
    }
}

impl<'a> IntoIterator for &'a MotionHolder {
    type Item = &'a Arc<Motion>;
    type IntoIter = std::slice::Iter<'a, Arc<Motion>>;

    fn into_iter(self) -> Self::IntoIter {
        self.motions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::MemorySource;
    use crate::timeline::{Bone, KeyFrame};
    use crate::transform::Transform;

    fn motion(name: &str) -> Motion {
        Motion::new(
            name,
            30.0,
            vec![KeyFrame::new(0.0, vec![Bone::root("root", Transform::IDENTITY)])],
        )
    }

    #[test]
    fn test_push_and_lookup() {
        let mut holder = MotionHolder::new();
        assert_eq!(holder.push(motion("idle")), 0);
        assert_eq!(holder.push(motion("walk")), 1);

        assert_eq!(holder.len(), 2);
        assert_eq!(holder.get(1).map(|m| m.name.as_str()), Some("walk"));
        assert!(holder.get(2).is_none());
        assert_eq!(holder.index_of("walk"), 1);
        assert_eq!(holder.index_of("run"), holder.len());
        assert!(holder.get_by_name("run").is_none());
        assert!(matches!(holder.require("run"), Err(SkelError::UnknownMotion(_))));
        assert_eq!(holder.names().collect::<Vec<_>>(), vec!["idle", "walk"]);
    }

    #[test]
    fn test_remove() {
        let mut holder = MotionHolder::new();
        holder.push(motion("idle"));
        holder.push(motion("walk"));
        holder.push(motion("run"));

        let shared = holder.require("walk").unwrap();
        assert!(holder.remove_by_name("walk").is_some());
        assert_eq!(holder.index_of("run"), 1);
        // Removed motions stay alive for whoever still holds them
        assert_eq!(shared.name, "walk");

        assert!(holder.remove(5).is_none());
        assert!(holder.remove(0).is_some());
        assert_eq!(holder.len(), 1);
        assert!(holder.remove_by_name("walk").is_none());
    }

    #[test]
    fn test_ingest_is_all_or_nothing() {
        let skeleton = Skeleton::new("one", vec![Bone::root("root", Transform::IDENTITY)]).unwrap();
        let mut holder = MotionHolder::new();

        let broken = Motion::new("broken", 30.0, vec![KeyFrame::new(0.0, Vec::new())]);
        let mut source = MemorySource::new("pack", Vec::new(), vec![motion("idle"), broken]);
        assert!(holder.ingest(&skeleton, &mut source).is_err());
        assert!(holder.is_empty());

        let motions = vec![motion("idle"), motion("walk")];
        let mut source = MemorySource::new("pack", Vec::new(), motions);
        assert_eq!(holder.ingest(&skeleton, &mut source).unwrap(), 2);
        assert_eq!(holder.len(), 2);
    }
}
