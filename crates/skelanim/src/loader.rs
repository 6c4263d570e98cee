//! Building skeletons and motion sets, optionally off the calling thread
//!
//! [`load_asset`] runs an [`ImportSource`] to completion and returns fully
//! built values. [`MotionLoader`] does the same on a worker thread and hands
//! the finished [`LoadedAsset`] over a channel, so the consumer only ever
//! sees complete, immutable data.

use crate::error::{Result, SkelError};
use crate::holder::MotionHolder;
use crate::import::ImportSource;
use crate::skeleton::{Skeleton, SkeletonOptions};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

/// Options for [`load_asset`] and [`MotionLoader`]
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct LoadOptions {
    pub skeleton: SkeletonOptions,
    /// Fill every motion's `global_transforms` after ingestion
    pub bake_global_transforms: bool,
}

/// A skeleton together with every motion recorded against it
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub skeleton: Arc<Skeleton>,
    pub motions: MotionHolder,
}

/// Load a skeleton and its motions from `source`
pub fn load_asset(source: &mut dyn ImportSource, options: &LoadOptions) -> Result<LoadedAsset> {
    let bones = source.load_skeleton()?;
    let skeleton = Arc::new(Skeleton::with_options(
        source.name(),
        bones,
        &options.skeleton,
    )?);

    let mut motions = MotionHolder::new();
    motions.ingest(&skeleton, source)?;
    if options.bake_global_transforms {
        motions.bake_global_transforms(&skeleton);
    }

    log::debug!(
        "Loaded '{}': {} bones, {} motions",
        skeleton.name(),
        skeleton.bone_count(),
        motions.len()
    );
    Ok(LoadedAsset { skeleton, motions })
}

/// Handle to an asset being loaded on a worker thread
#[derive(Debug)]
pub struct MotionLoader {
    name: String,
    rx: mpsc::Receiver<Result<LoadedAsset>>,
    worker: Option<thread::JoinHandle<()>>,
    taken: bool,
}

impl MotionLoader {
    /// Start loading `source` with default options
    pub fn spawn<S>(source: S) -> Result<Self>
    where
        S: ImportSource + 'static,
    {
        Self::spawn_with_options(source, LoadOptions::default())
    }

    /// Start loading `source` on a named worker thread
    pub fn spawn_with_options<S>(mut source: S, options: LoadOptions) -> Result<Self>
    where
        S: ImportSource + 'static,
    {
        let name = source.name().to_string();
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(format!("skelanim-load-{name}"))
            .spawn(move || {
                let result = load_asset(&mut source, &options);
                log::trace!("Publishing load result for '{}'", source.name());
                // The receiver may be gone if the consumer lost interest
                let _ = tx.send(result);
            })
            .map_err(|err| {
                SkelError::Import(format!("failed to spawn loader for '{name}': {err}"))
            })?;

        Ok(Self {
            name,
            rx,
            worker: Some(worker),
            taken: false,
        })
    }

    /// Name of the source being loaded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take the result if the worker has finished
    ///
    /// Returns `None` while loading is still in progress and after the
    /// result has been taken once.
    pub fn try_take(&mut self) -> Option<Result<LoadedAsset>> {
        if self.taken {
            return None;
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(SkelError::LoaderDisconnected),
        };
        self.taken = true;
        self.join_worker();
        Some(result)
    }

    /// Block until the worker publishes its result
    pub fn wait(mut self) -> Result<LoadedAsset> {
        if self.taken {
            return Err(SkelError::LoaderDisconnected);
        }
        let result = self
            .rx
            .recv()
            .unwrap_or(Err(SkelError::LoaderDisconnected));
        self.taken = true;
        self.join_worker();
        result
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Loader thread for '{}' panicked", self.name);
            }
        }
    }
}
