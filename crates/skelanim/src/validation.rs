//! Load-time checks for motions against their skeleton
//!
//! Pose evaluation assumes well-formed data and does not re-check it per
//! frame. [`validate_motion`] rejects a motion on the first hard error;
//! [`inspect_motion`] reports every finding, including soft warnings.

use crate::error::{Result, SkelError};
use crate::skeleton::Skeleton;
use crate::timeline::{KeyFrame, Motion};
use std::fmt;

/// Deviation from unit length accepted for keyed rotations
const ROTATION_TOLERANCE: f32 = 1.0e-3;

/// How serious a validation finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Info => write!(f, "info"),
            ValidationSeverity::Warning => write!(f, "warning"),
            ValidationSeverity::Error => write!(f, "error"),
        }
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEvent {
    pub severity: ValidationSeverity,
    /// Motion the finding belongs to
    pub motion: String,
    /// Keyframe index, when the finding is about a single keyframe
    pub key_frame: Option<usize>,
    pub message: String,
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key_frame {
            Some(index) => write!(
                f,
                "[{}] {} keyframe {}: {}",
                self.severity, self.motion, index, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.motion, self.message),
        }
    }
}

/// Validates a motion for use with `skeleton`
///
/// Checks the sampling rate, then every keyframe for bone count, strictly
/// increasing timestamps and finite values.
pub fn validate_motion(skeleton: &Skeleton, motion: &Motion) -> Result<()> {
    validate_sampling_rate(motion)?;

    let mut previous = None;
    for (index, key_frame) in motion.key_frames.iter().enumerate() {
        validate_key_frame(skeleton, motion, index, key_frame, previous)?;
        previous = Some(key_frame.seconds);
    }

    Ok(())
}

/// Collects every finding for `motion`, hard errors and soft warnings alike
pub fn inspect_motion(skeleton: &Skeleton, motion: &Motion) -> Vec<ValidationEvent> {
    let mut events = Vec::new();
    let mut push = |severity, key_frame, message: String| {
        events.push(ValidationEvent {
            severity,
            motion: motion.name.clone(),
            key_frame,
            message,
        });
    };

    if let Err(err) = validate_sampling_rate(motion) {
        push(ValidationSeverity::Error, None, err.to_string());
    }

    if motion.key_frames.is_empty() {
        push(
            ValidationSeverity::Info,
            None,
            "motion has no keyframes and samples as an empty pose".to_string(),
        );
        return events;
    }

    if (motion.anim_seconds - motion.whole_seconds()).abs() > f32::EPSILON {
        push(
            ValidationSeverity::Info,
            None,
            format!(
                "nominal duration {}s differs from last keyframe at {}s",
                motion.anim_seconds,
                motion.whole_seconds()
            ),
        );
    }

    let mut previous = None;
    for (index, key_frame) in motion.key_frames.iter().enumerate() {
        if let Err(err) = validate_key_frame(skeleton, motion, index, key_frame, previous) {
            push(ValidationSeverity::Error, Some(index), err.to_string());
        }
        previous = Some(key_frame.seconds);

        if key_frame.bone_count() != skeleton.bone_count() {
            continue;
        }
        for (bone, expected) in key_frame.key_pose.iter().zip(skeleton.bones()) {
            if bone.name != expected.name {
                push(
                    ValidationSeverity::Warning,
                    Some(index),
                    format!("bone '{}' found where '{}' was expected", bone.name, expected.name),
                );
            } else if bone.parent_index != expected.parent_index {
                push(
                    ValidationSeverity::Warning,
                    Some(index),
                    format!(
                        "bone '{}' has parent {}, skeleton has {}",
                        bone.name, bone.parent_index, expected.parent_index
                    ),
                );
            }
            let rotation = &bone.transform_pose.rotation;
            if rotation.is_finite() && (rotation.length() - 1.0).abs() > ROTATION_TOLERANCE {
                push(
                    ValidationSeverity::Warning,
                    Some(index),
                    format!(
                        "bone '{}' rotation has length {:.4}",
                        bone.name,
                        rotation.length()
                    ),
                );
            }
        }
    }

    events
}

/// Validates the motion's sampling rate
fn validate_sampling_rate(motion: &Motion) -> Result<()> {
    if !(motion.sampling_rate.is_finite() && motion.sampling_rate > 0.0) {
        return Err(SkelError::InvalidSamplingRate {
            motion: motion.name.clone(),
            rate: motion.sampling_rate,
        });
    }
    Ok(())
}

/// Validates one keyframe against the skeleton and its predecessor
fn validate_key_frame(
    skeleton: &Skeleton,
    motion: &Motion,
    index: usize,
    key_frame: &KeyFrame,
    previous: Option<f32>,
) -> Result<()> {
    if !key_frame.seconds.is_finite() {
        return Err(SkelError::NonFiniteValue(format!(
            "motion '{}' keyframe {} timestamp",
            motion.name, index
        )));
    }

    if let Some(previous) = previous {
        if key_frame.seconds <= previous {
            return Err(SkelError::NonIncreasingTimestamp {
                motion: motion.name.clone(),
                key_frame: index,
                seconds: key_frame.seconds,
                previous,
            });
        }
    }

    if key_frame.bone_count() != skeleton.bone_count() {
        return Err(SkelError::BoneCountMismatch {
            motion: motion.name.clone(),
            key_frame: index,
            expected: skeleton.bone_count(),
            actual: key_frame.bone_count(),
        });
    }

    if let Some(bone) = key_frame
        .key_pose
        .iter()
        .find(|bone| !bone.transform_pose.is_finite())
    {
        return Err(SkelError::NonFiniteValue(format!(
            "motion '{}' keyframe {} bone '{}'",
            motion.name, index, bone.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quaternion::Quaternion;
    use crate::timeline::Bone;
    use crate::transform::Transform;
    use glam::Vec3;

    fn skeleton() -> Skeleton {
        Skeleton::new(
            "pair",
            vec![
                Bone::root("root", Transform::IDENTITY),
                Bone::new("child", 0, Transform::IDENTITY),
            ],
        )
        .unwrap()
    }

    fn frame(skeleton: &Skeleton, seconds: f32) -> KeyFrame {
        KeyFrame::new(seconds, skeleton.bones().to_vec())
    }

    #[test]
    fn test_valid_motion() {
        let skeleton = skeleton();
        let motion = Motion::new(
            "walk",
            30.0,
            vec![frame(&skeleton, 0.0), frame(&skeleton, 1.0)],
        );
        assert!(validate_motion(&skeleton, &motion).is_ok());
        assert!(inspect_motion(&skeleton, &motion).is_empty());
    }

    #[test]
    fn test_non_increasing_timestamps() {
        let skeleton = skeleton();
        let motion = Motion::new(
            "walk",
            30.0,
            vec![frame(&skeleton, 0.5), frame(&skeleton, 0.5)],
        );
        let err = validate_motion(&skeleton, &motion).unwrap_err();
        assert!(matches!(
            err,
            SkelError::NonIncreasingTimestamp { key_frame: 1, .. }
        ));
    }

    #[test]
    fn test_bone_count_mismatch() {
        let skeleton = skeleton();
        let short = KeyFrame::new(1.0, vec![skeleton.bones()[0].clone()]);
        let motion = Motion::new("walk", 30.0, vec![frame(&skeleton, 0.0), short]);
        let err = validate_motion(&skeleton, &motion).unwrap_err();
        assert!(matches!(
            err,
            SkelError::BoneCountMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_values() {
        let skeleton = skeleton();
        let mut bad = frame(&skeleton, 1.0);
        bad.key_pose[1].transform_pose.translation = Vec3::new(f32::NAN, 0.0, 0.0);
        let motion = Motion::new("walk", 30.0, vec![frame(&skeleton, 0.0), bad]);
        assert!(matches!(
            validate_motion(&skeleton, &motion),
            Err(SkelError::NonFiniteValue(_))
        ));

        let motion = Motion::new("walk", 30.0, vec![frame(&skeleton, f32::INFINITY)]);
        assert!(matches!(
            validate_motion(&skeleton, &motion),
            Err(SkelError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn test_invalid_sampling_rate() {
        let skeleton = skeleton();
        let motion = Motion::new("walk", 0.0, vec![frame(&skeleton, 0.0)]);
        assert!(matches!(
            validate_motion(&skeleton, &motion),
            Err(SkelError::InvalidSamplingRate { .. })
        ));
    }

    #[test]
    fn test_inspect_reports_warnings() {
        let skeleton = skeleton();
        let mut odd = frame(&skeleton, 1.0);
        odd.key_pose[0].transform_pose.rotation = Quaternion::new(0.0, 0.0, 0.0, 2.0);
        odd.key_pose[1].name = "elbow".into();
        let motion = Motion::new("wave", 30.0, vec![frame(&skeleton, 0.0), odd]);

        assert!(validate_motion(&skeleton, &motion).is_ok());
        let events = inspect_motion(&skeleton, &motion);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.severity == ValidationSeverity::Warning));
        assert!(events.iter().all(|e| e.key_frame == Some(1)));
    }

    #[test]
    fn test_inspect_empty_motion() {
        let skeleton = skeleton();
        let motion = Motion::new("idle", 30.0, Vec::new());
        let events = inspect_motion(&skeleton, &motion);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, ValidationSeverity::Info);
    }

    #[test]
    fn test_event_display() {
        let event = ValidationEvent {
            severity: ValidationSeverity::Error,
            motion: "run".to_string(),
            key_frame: Some(4),
            message: "broken".to_string(),
        };
        assert_eq!(event.to_string(), "[error] run keyframe 4: broken");
    }
}
