//! Error handling for skeleton and motion loading

use thiserror::Error;

/// Errors raised while building skeletons, ingesting motions or publishing
/// loaded assets.
///
/// Per-frame pose evaluation never returns these; it relies on explicit
/// compatibility checks and documented fallback values instead.
#[derive(Debug, Error)]
pub enum SkelError {
    /// A skeleton was built without any bones
    #[error("Skeleton '{0}' has no bones")]
    EmptySkeleton(String),

    /// A bone references a parent outside the bone array
    #[error("Bone '{bone}' references invalid parent index {parent} (bone count: {count})")]
    InvalidParent {
        /// Name of the offending bone
        bone: String,
        /// Parent index as stored on the bone
        parent: i32,
        /// Number of bones in the skeleton
        count: usize,
    },

    /// The parent links contain a cycle
    #[error("Bone hierarchy contains a cycle through '{0}'")]
    CycleDetected(String),

    /// A keyframe does not carry one entry per skeleton bone
    #[error("Motion '{motion}' keyframe {key_frame} has {actual} bones, expected {expected}")]
    BoneCountMismatch {
        /// Motion name
        motion: String,
        /// Index of the keyframe inside the motion
        key_frame: usize,
        /// Bone count of the skeleton
        expected: usize,
        /// Bone count found in the keyframe
        actual: usize,
    },

    /// Keyframe timestamps are not strictly increasing
    #[error("Motion '{motion}' keyframe {key_frame} at {seconds}s does not follow {previous}s")]
    NonIncreasingTimestamp {
        /// Motion name
        motion: String,
        /// Index of the keyframe inside the motion
        key_frame: usize,
        /// Timestamp of the keyframe
        seconds: f32,
        /// Timestamp of the preceding keyframe
        previous: f32,
    },

    /// A timestamp or transform component is NaN or infinite
    #[error("Non-finite value in {0}")]
    NonFiniteValue(String),

    /// The sampling rate of a motion is not strictly positive
    #[error("Motion '{motion}' has invalid sampling rate {rate}")]
    InvalidSamplingRate {
        /// Motion name
        motion: String,
        /// Offending rate
        rate: f32,
    },

    /// Lookup of a motion by name failed
    #[error("Unknown motion: {0}")]
    UnknownMotion(String),

    /// A cache handle does not refer to a live entry
    #[error("Unknown handle: {0}")]
    UnknownHandle(u32),

    /// The import collaborator failed to produce data
    #[error("Import error: {0}")]
    Import(String),

    /// The background loader went away before publishing its result
    #[error("Loader thread disconnected before publishing")]
    LoaderDisconnected,
}

/// Result type using `SkelError`
pub type Result<T> = std::result::Result<T, SkelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SkelError::InvalidParent {
            bone: "forearm".to_string(),
            parent: 7,
            count: 3,
        };
        assert_eq!(
            format!("{}", error),
            "Bone 'forearm' references invalid parent index 7 (bone count: 3)"
        );

        let error = SkelError::UnknownMotion("walk".to_string());
        assert_eq!(format!("{}", error), "Unknown motion: walk");
    }
}
