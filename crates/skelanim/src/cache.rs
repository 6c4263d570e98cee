//! Reference-counted store of loaded skeletons and motion sets
//!
//! The cache hands out small copyable handles. Each insert or retain adds a
//! reference, each release drops one, and the value is evicted when the
//! count reaches zero. Values are shared as `Arc`, so evicting never
//! invalidates data a caller already cloned out.

use crate::error::{Result, SkelError};
use crate::holder::MotionHolder;
use crate::loader::LoadedAsset;
use crate::skeleton::Skeleton;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to a cached [`Skeleton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkeletonHandle(u32);

impl SkeletonHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Handle to a cached [`MotionHolder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionSetHandle(u32);

impl MotionSetHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct Entry<T> {
    name: String,
    value: Arc<T>,
    refs: usize,
}

/// Name-indexed, reference-counted slots for one kind of value
#[derive(Debug)]
struct Slots<T> {
    entries: HashMap<u32, Entry<T>>,
    names: HashMap<String, u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            names: HashMap::new(),
        }
    }
}

impl<T> Slots<T> {
    /// Insert `value` under `name`, or add a reference to the existing entry
    /// of that name
    ///
    /// On a name clash the incoming value is dropped.
    fn insert(&mut self, id: u32, name: &str, value: T) -> (u32, bool)
    where
        T: PartialEq,
    {
        if let Some(&existing) = self.names.get(name) {
            if let Some(entry) = self.entries.get_mut(&existing) {
                if *entry.value != value {
                    log::warn!(
                        "'{}' is already cached as handle {} with different contents; \
                         keeping the cached value",
                        name,
                        existing
                    );
                }
                entry.refs += 1;
                return (existing, false);
            }
        }
        self.names.insert(name.to_string(), id);
        self.entries.insert(
            id,
            Entry {
                name: name.to_string(),
                value: Arc::new(value),
                refs: 1,
            },
        );
        (id, true)
    }

    fn get(&self, id: u32) -> Option<Arc<T>> {
        self.entries.get(&id).map(|entry| Arc::clone(&entry.value))
    }

    fn find(&self, name: &str) -> Option<u32> {
        self.names.get(name).copied()
    }

    fn retain(&mut self, id: u32) -> Result<()> {
        let entry = self.entries.get_mut(&id).ok_or(SkelError::UnknownHandle(id))?;
        entry.refs += 1;
        Ok(())
    }

    /// Drop one reference; true when the entry was evicted
    fn release(&mut self, id: u32) -> Result<bool> {
        let entry = self.entries.get_mut(&id).ok_or(SkelError::UnknownHandle(id))?;
        entry.refs -= 1;
        if entry.refs > 0 {
            return Ok(false);
        }
        if let Some(entry) = self.entries.remove(&id) {
            self.names.remove(&entry.name);
        }
        Ok(true)
    }

    fn ref_count(&self, id: u32) -> usize {
        self.entries.get(&id).map_or(0, |entry| entry.refs)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Store of skeletons and motion sets shared across model instances
#[derive(Debug, Default)]
pub struct AnimationCache {
    next_id: u32,
    skeletons: Slots<Skeleton>,
    motion_sets: Slots<MotionHolder>,
}

impl AnimationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Cache a skeleton under its own name
    ///
    /// A skeleton of the same name already in the cache wins; it gains a
    /// reference and its handle is returned.
    pub fn insert_skeleton(&mut self, skeleton: Skeleton) -> SkeletonHandle {
        let id = self.allocate_id();
        let name = skeleton.name().to_string();
        let (id, inserted) = self.skeletons.insert(id, &name, skeleton);
        log::debug!(
            "{} skeleton '{}' as handle {}",
            if inserted { "Cached" } else { "Reused" },
            name,
            id
        );
        SkeletonHandle(id)
    }

    /// Cache a motion set under `name`, with the same reuse rule as
    /// [`AnimationCache::insert_skeleton`]
    pub fn insert_motions(&mut self, name: &str, motions: MotionHolder) -> MotionSetHandle {
        let id = self.allocate_id();
        let (id, inserted) = self.motion_sets.insert(id, name, motions);
        log::debug!(
            "{} motion set '{}' as handle {}",
            if inserted { "Cached" } else { "Reused" },
            name,
            id
        );
        MotionSetHandle(id)
    }

    /// Cache both halves of a loaded asset under the skeleton's name
    pub fn insert_asset(&mut self, asset: LoadedAsset) -> (SkeletonHandle, MotionSetHandle) {
        let name = asset.skeleton.name().to_string();
        let skeleton = Arc::unwrap_or_clone(asset.skeleton);
        let skeleton = self.insert_skeleton(skeleton);
        let motions = self.insert_motions(&name, asset.motions);
        (skeleton, motions)
    }

    pub fn skeleton(&self, handle: SkeletonHandle) -> Option<Arc<Skeleton>> {
        self.skeletons.get(handle.0)
    }

    pub fn motions(&self, handle: MotionSetHandle) -> Option<Arc<MotionHolder>> {
        self.motion_sets.get(handle.0)
    }

    /// Handle of the skeleton called `name`
    pub fn find_skeleton(&self, name: &str) -> Option<SkeletonHandle> {
        self.skeletons.find(name).map(SkeletonHandle)
    }

    /// Handle of the motion set called `name`
    pub fn find_motions(&self, name: &str) -> Option<MotionSetHandle> {
        self.motion_sets.find(name).map(MotionSetHandle)
    }

    pub fn retain_skeleton(&mut self, handle: SkeletonHandle) -> Result<()> {
        self.skeletons.retain(handle.0)
    }

    /// Drop one reference; returns true when the skeleton was evicted
    pub fn release_skeleton(&mut self, handle: SkeletonHandle) -> Result<bool> {
        let evicted = self.skeletons.release(handle.0)?;
        if evicted {
            log::debug!("Evicted skeleton handle {}", handle.0);
        }
        Ok(evicted)
    }

    pub fn retain_motions(&mut self, handle: MotionSetHandle) -> Result<()> {
        self.motion_sets.retain(handle.0)
    }

    /// Drop one reference; returns true when the motion set was evicted
    pub fn release_motions(&mut self, handle: MotionSetHandle) -> Result<bool> {
        let evicted = self.motion_sets.release(handle.0)?;
        if evicted {
            log::debug!("Evicted motion set handle {}", handle.0);
        }
        Ok(evicted)
    }

    pub fn skeleton_ref_count(&self, handle: SkeletonHandle) -> usize {
        self.skeletons.ref_count(handle.0)
    }

    pub fn motions_ref_count(&self, handle: MotionSetHandle) -> usize {
        self.motion_sets.ref_count(handle.0)
    }

    pub fn skeleton_count(&self) -> usize {
        self.skeletons.len()
    }

    pub fn motion_set_count(&self) -> usize {
        self.motion_sets.len()
    }
}
