//! Integration tests for keyframe sampling

use glam::Vec3;
use pretty_assertions::assert_eq;
use skelanim::{Animator, AnimatorConfig, Bone, KeyFrame, Motion, RotationPath, Transform};
use test_case::test_case;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pose_at(seconds: f32, x: f32) -> KeyFrame {
    KeyFrame::new(
        seconds,
        vec![
            Bone::root("hips", Transform::IDENTITY)
                .with_pose(Transform::from_translation(Vec3::new(x, 0.0, 0.0))),
            Bone::new("spine", 0, Transform::from_translation(Vec3::Y)),
        ],
    )
}

/// Keyframes `[{0, A}, {1, B}]`
fn two_keys() -> Vec<KeyFrame> {
    vec![pose_at(0.0, 0.0), pose_at(1.0, 4.0)]
}

fn animator_at(elapsed: f32, wrap: bool) -> Animator {
    let mut animator = Animator::with_config(AnimatorConfig {
        enable_wrap_around: wrap,
        ..AnimatorConfig::default()
    });
    animator.update(elapsed);
    animator
}

fn assert_key_frames_close(actual: &KeyFrame, expected: &KeyFrame) {
    assert_eq!(actual.bone_count(), expected.bone_count());
    assert!((actual.seconds - expected.seconds).abs() < 1.0e-4);
    for (a, e) in actual.transforms().zip(expected.transforms()) {
        assert!(a.abs_diff_eq(e, 1.0e-4), "{a:?} != {e:?}");
    }
}

#[test]
fn test_clamp_midpoint_interpolates() {
    init_logging();
    let keys = two_keys();
    let sampled = animator_at(0.5, false).calc_current_pose(&keys);
    assert_key_frames_close(&sampled, &KeyFrame::interpolate(&keys[0], &keys[1], 0.5));
}

#[test]
fn test_clamp_past_end_returns_last_exactly() {
    init_logging();
    let keys = two_keys();
    let sampled = animator_at(1.5, false).calc_current_pose(&keys);
    assert_eq!(sampled, keys[1]);
}

#[test]
fn test_wrap_past_end_folds() {
    init_logging();
    let keys = two_keys();
    let sampled = animator_at(1.5, true).calc_current_pose(&keys);
    assert!((sampled.seconds - 0.5).abs() < 1.0e-4);
    assert_key_frames_close(&sampled, &KeyFrame::interpolate(&keys[0], &keys[1], 0.5));
}

#[test]
fn test_empty_key_frames_give_empty_pose() {
    init_logging();
    for wrap in [false, true] {
        let sampled = animator_at(3.0, wrap).calc_current_pose(&[]);
        assert!(sampled.is_empty());
        assert_eq!(sampled, KeyFrame::default());
    }
}

#[test_case(0.0, 0.0 ; "at first key")]
#[test_case(0.25, 1.0 ; "quarter")]
#[test_case(0.75, 3.0 ; "three quarters")]
#[test_case(1.0, 4.0 ; "at last key")]
#[test_case(7.0, 4.0 ; "long after end")]
fn test_clamped_sampling(elapsed: f32, expected_x: f32) {
    let sampled = animator_at(elapsed, false).calc_current_pose(&two_keys());
    let x = sampled.key_pose[0].transform_pose.translation.x;
    assert!((x - expected_x).abs() < 1.0e-3, "x = {x}");
}

#[test_case(1.0, 0.0 ; "exactly one loop")]
#[test_case(2.25, 1.0 ; "two loops and a quarter")]
#[test_case(-0.25, 3.0 ; "negative time")]
fn test_wrapped_sampling(elapsed: f32, expected_x: f32) {
    let sampled = animator_at(elapsed, true).calc_current_pose(&two_keys());
    let x = sampled.key_pose[0].transform_pose.translation.x;
    assert!((x - expected_x).abs() < 1.0e-3, "x = {x}");
}

#[test]
fn test_wrap_just_below_zero_stays_in_range() {
    init_logging();
    let keys = vec![pose_at(0.0, 0.0), pose_at(1.0, 10.0), pose_at(2.0, 30.0)];
    let sampled = animator_at(-1.0e-8, true).calc_current_pose(&keys);

    assert!(sampled.seconds >= 0.0 && sampled.seconds < 2.0, "seconds = {}", sampled.seconds);
    let x = sampled.key_pose[0].transform_pose.translation.x;
    assert!(x.abs() < 1.0e-3, "x = {x}");
}

#[test]
fn test_single_key_frame_is_returned_verbatim() {
    let key = pose_at(0.4, 2.0);
    for elapsed in [0.0, 0.4, 10.0] {
        let sampled = animator_at(elapsed, true).calc_current_pose(std::slice::from_ref(&key));
        assert_eq!(sampled, key);
    }
}

#[test]
fn test_child_bone_keeps_identity_through_sampling() {
    let sampled = animator_at(0.3, false).calc_current_pose(&two_keys());
    assert_eq!(sampled.key_pose[1].name.as_ref(), "spine");
    assert_eq!(sampled.key_pose[1].parent_index, 0);
}

#[test]
fn test_motion_pose_matches_key_frame_sampling() {
    let motion = Motion::new("slide", 30.0, two_keys());
    let animator = animator_at(0.6, false);
    assert_eq!(
        animator.calc_current_motion_pose(&motion),
        animator.calc_current_pose(&motion.key_frames)
    );
}

#[test]
fn test_shortest_rotation_path_config() {
    use skelanim::Quaternion;
    use std::f32::consts::FRAC_PI_2;

    let bone = Bone::root("root", Transform::IDENTITY);
    let keys = vec![
        KeyFrame::new(0.0, vec![bone.with_pose(Transform::IDENTITY)]),
        KeyFrame::new(
            1.0,
            vec![bone.with_pose(Transform::from_rotation(-Quaternion::make(Vec3::Z, FRAC_PI_2)))],
        ),
    ];

    let mut animator = Animator::with_config(AnimatorConfig {
        rotation_path: RotationPath::Shortest,
        ..AnimatorConfig::default()
    });
    animator.update(0.5);
    let sampled = animator.calc_current_pose(&keys);
    let rotated = sampled.key_pose[0].transform_pose.rotation.rotate_vector(Vec3::X);
    let expected = Quaternion::make(Vec3::Z, FRAC_PI_2 * 0.5).rotate_vector(Vec3::X);
    assert!(rotated.abs_diff_eq(expected, 1.0e-3), "{rotated:?}");
}
