//! CPU skeletal animation core.
//!
//! This crate resolves time-sampled keyframe tracks into per-bone matrices
//! ready for vertex skinning. It covers:
//!
//! - rotation and transform math ([`Quaternion`], [`Transform`])
//! - timeline data ([`Bone`], [`KeyFrame`], [`Motion`]) and the
//!   [`MotionHolder`] catalog
//! - playback ([`Animator`]) with clamp or wrap-around looping
//! - hierarchy resolution ([`Pose`]) over a topologically sorted
//!   [`Skeleton`] with cached inverse bind matrices
//! - load-time validation, a handle-based [`AnimationCache`] and a
//!   background [`MotionLoader`]
//!
//! File-format importers and GPU upload live outside this crate. Importers
//! plug in through [`ImportSource`]; renderers consume
//! [`Pose::skinning_palette`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec3;
//! use skelanim::{Animator, Bone, KeyFrame, Motion, Pose, Skeleton, Transform};
//!
//! let skeleton = Arc::new(Skeleton::new(
//!     "arm",
//!     vec![
//!         Bone::root("shoulder", Transform::IDENTITY),
//!         Bone::new("elbow", 0, Transform::from_translation(Vec3::Y)),
//!     ],
//! )?);
//!
//! let raised = |seconds: f32, x: f32| {
//!     KeyFrame::new(
//!         seconds,
//!         vec![
//!             skeleton.bones()[0].with_pose(Transform::from_translation(Vec3::new(x, 0.0, 0.0))),
//!             skeleton.bones()[1].clone(),
//!         ],
//!     )
//! };
//! let motion = Motion::new("raise", 30.0, vec![raised(0.0, 0.0), raised(1.0, 2.0)]);
//!
//! let mut animator = Animator::new();
//! animator.update(0.5);
//!
//! let mut pose = Pose::new(Arc::clone(&skeleton));
//! assert!(animator.apply_to_pose(&motion, &mut pose));
//!
//! let elbow = pose.get_current_pose()[1].global.w_axis.truncate();
//! assert!(elbow.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1.0e-4));
//! # Ok::<(), skelanim::SkelError>(())
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod animator;
pub mod cache;
pub mod error;
pub mod holder;
pub mod import;
pub mod loader;
pub mod pose;
pub mod quaternion;
pub mod raycast;
pub mod skeleton;
pub mod timeline;
pub mod transform;
pub mod usage;
pub mod validation;

pub use animator::{Animator, AnimatorConfig};
pub use cache::{AnimationCache, MotionSetHandle, SkeletonHandle};
pub use error::{Result, SkelError};
pub use holder::MotionHolder;
pub use import::{ImportSource, MemorySource};
pub use loader::{LoadOptions, LoadedAsset, MotionLoader, load_asset};
pub use pose::{Node, Pose};
pub use quaternion::Quaternion;
pub use skeleton::{Skeleton, SkeletonOptions};
pub use timeline::{Bone, KeyFrame, Motion, ROOT_PARENT};
pub use transform::{Lerp, RotationPath, Transform};
pub use usage::ModelUsage;
pub use validation::{ValidationEvent, ValidationSeverity, inspect_motion, validate_motion};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
