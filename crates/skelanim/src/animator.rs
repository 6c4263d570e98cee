//! Time cursor mapping elapsed time onto a keyframe sequence
//!
//! An [`Animator`] owns nothing but its clock. The keyframes it samples are
//! passed in on every call, so one shared [`Motion`] can drive any number of
//! animators.

use crate::pose::Pose;
use crate::timeline::{KeyFrame, Motion};
use crate::transform::RotationPath;

/// Lowest accepted frame rate
pub const MIN_FPS: f32 = 1.0;

/// Added to the keyframe span before dividing so equal timestamps never
/// divide by zero
pub const INTERPOLATION_EPSILON: f32 = 1.0e-6;

/// Animator settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnimatorConfig {
    /// Frame rate used by frame/time conversions, floored at [`MIN_FPS`]
    pub fps: f32,
    /// Loop past the last keyframe instead of holding it
    pub enable_wrap_around: bool,
    /// Rotation arc used between keyframes
    pub rotation_path: RotationPath,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            enable_wrap_around: false,
            rotation_path: RotationPath::Direct,
        }
    }
}

/// Per-instance playback clock
#[derive(Debug, Clone)]
pub struct Animator {
    elapsed_time: f32,
    fps: f32,
    enable_wrap_around: bool,
    rotation_path: RotationPath,
}

impl Animator {
    /// Create an animator with default settings
    pub fn new() -> Self {
        Self::with_config(AnimatorConfig::default())
    }

    /// Create an animator from explicit settings
    pub fn with_config(config: AnimatorConfig) -> Self {
        Self {
            elapsed_time: 0.0,
            fps: config.fps.max(MIN_FPS),
            enable_wrap_around: config.enable_wrap_around,
            rotation_path: config.rotation_path,
        }
    }

    /// Current settings
    pub fn config(&self) -> AnimatorConfig {
        AnimatorConfig {
            fps: self.fps,
            enable_wrap_around: self.enable_wrap_around,
            rotation_path: self.rotation_path,
        }
    }

    /// Advance the clock by `dt` seconds
    ///
    /// The clock is never reset here; looping is resolved when sampling.
    /// Non-finite steps are dropped.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() {
            log::warn!("Ignoring non-finite animator step {dt}");
            return;
        }
        self.elapsed_time += dt;
    }

    /// Elapsed time in seconds
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Set the clock directly
    pub fn set_internal_elapsed_time(&mut self, seconds: f32) {
        if !seconds.is_finite() {
            log::warn!("Ignoring non-finite elapsed time {seconds}");
            return;
        }
        self.elapsed_time = seconds;
    }

    /// Rewind to zero
    pub fn reset(&mut self) {
        self.elapsed_time = 0.0;
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Set the frame rate; values below [`MIN_FPS`] (or NaN) become [`MIN_FPS`]
    pub fn set_fps(&mut self, fps: f32) {
        self.fps = fps.max(MIN_FPS);
    }

    pub fn enable_wrap_around(&mut self, enable: bool) {
        self.enable_wrap_around = enable;
    }

    pub fn is_wrap_around_enabled(&self) -> bool {
        self.enable_wrap_around
    }

    pub fn set_rotation_path(&mut self, path: RotationPath) {
        self.rotation_path = path;
    }

    /// Jump to a frame index at the current frame rate
    pub fn assign_frame(&mut self, frame: f32) {
        self.set_internal_elapsed_time(frame / self.fps);
    }

    /// Elapsed time expressed in frames
    pub fn calc_current_frame(&self) -> f32 {
        self.elapsed_time * self.fps
    }

    /// Whether a clamped animator has reached the end of `motion`
    ///
    /// Always false with wrap-around enabled.
    pub fn is_finished(&self, motion: &Motion) -> bool {
        !self.enable_wrap_around && self.elapsed_time >= motion.whole_seconds()
    }

    /// Interpolated keyframe at the current time
    ///
    /// * no keyframes: the empty sentinel
    /// * one keyframe: that keyframe
    /// * past the end: the last keyframe when clamping, otherwise the time is
    ///   folded back into `[0, whole_seconds)`
    ///
    /// When no pair brackets the folded time (it lies before the first
    /// keyframe), the last keyframe is blended towards the first one placed
    /// one average step after the end.
    pub fn calc_current_pose(&self, key_frames: &[KeyFrame]) -> KeyFrame {
        let (first, last) = match key_frames {
            [] => return KeyFrame::default(),
            [only] => return only.clone(),
            [first, .., last] => (first, last),
        };

        let whole_seconds = last.seconds;
        let average_step = (last.seconds - first.seconds) / (key_frames.len() - 1) as f32;

        let mut time = self.elapsed_time;
        if self.enable_wrap_around {
            if whole_seconds <= 0.0 {
                log::warn!(
                    "Wrapping a motion of duration {whole_seconds}s; holding first keyframe"
                );
                return first.clone();
            }
            if time >= whole_seconds || time < 0.0 {
                time = time.rem_euclid(whole_seconds);
                // rem_euclid rounds tiny negative remainders up to the divisor
                if time >= whole_seconds {
                    time = 0.0;
                }
            }
        } else if time >= whole_seconds {
            return last.clone();
        } else if time < first.seconds {
            return first.clone();
        }

        if let Some(pair) = key_frames
            .windows(2)
            .find(|pair| pair[0].seconds <= time && time < pair[1].seconds)
        {
            return self.blend(&pair[0], &pair[1], time);
        }

        let wrapped_first = KeyFrame {
            seconds: whole_seconds + average_step,
            key_pose: first.key_pose.clone(),
        };
        let mut key_frame = self.blend(last, &wrapped_first, time + whole_seconds);
        key_frame.seconds = time;
        key_frame
    }

    /// [`Animator::calc_current_pose`] over a motion's keyframes
    pub fn calc_current_motion_pose(&self, motion: &Motion) -> KeyFrame {
        self.calc_current_pose(&motion.key_frames)
    }

    /// Sample `motion` and load the result into `pose`
    ///
    /// Returns false, leaving `pose` untouched, when the sample is empty or
    /// carries a different bone count.
    pub fn apply_to_pose(&self, motion: &Motion, pose: &mut Pose) -> bool {
        let key_frame = self.calc_current_motion_pose(motion);
        if key_frame.is_empty() || !pose.has_compatible_with_key_frame(&key_frame) {
            return false;
        }
        pose.assign_key_frame(&key_frame);
        pose.update_transform_matrices();
        true
    }

    fn blend(&self, left: &KeyFrame, right: &KeyFrame, time: f32) -> KeyFrame {
        let percent =
            (time - left.seconds) / (right.seconds - left.seconds + INTERPOLATION_EPSILON);
        KeyFrame::interpolate_with(left, right, percent, self.rotation_path)
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}
