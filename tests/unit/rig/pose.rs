use super::*;
use crate::codec::frame::decode_frame;
use crate::fixtures;
use glam::{Quat, Vec3};

#[test]
fn rest_pose_accumulates_parent_translations() {
    let rig = fixtures::rig();
    let rest = evaluate_rest_pose(&rig);
    // root at origin, neck at +1y, jaw at neck + (0, 0.5, 0.2).
    assert_eq!(rest.joint_world(0).translation, Vec3::ZERO);
    assert!((rest.joint_world(1).translation - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    assert!((rest.joint_world(2).translation - Vec3::new(0.0, 1.5, 0.2)).length() < 1e-6);
}

#[test]
fn frame_override_moves_descendants() {
    let rig = fixtures::rig();
    // Rotate the neck a quarter turn about z; the jaw must follow.
    let half = std::f32::consts::FRAC_PI_4 / 2.0;
    let buf = fixtures::frame_buf(
        0,
        &[],
        &[0.0, 0.0],
        &[(1, [0.0, 1.0, 0.0], [0.0, 0.0, half.sin()])],
    );
    let frame = decode_frame(&buf, &rig).unwrap();
    let pose = evaluate_pose(&rig, &frame);

    let rest = evaluate_rest_pose(&rig);
    let jaw_rest = rest.joint_world(2).translation;
    let jaw_posed = pose.joint_world(2).translation;
    assert!((jaw_posed - jaw_rest).length() > 1e-3);

    // The neck's world transform equals its override (parent is identity).
    let neck = pose.joint_world(1);
    let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
    assert!(neck.rotation.dot(expected).abs() > 0.9999);
}

#[test]
fn non_movable_joints_ignore_overrides() {
    let rig = fixtures::rig();
    let rest = evaluate_rest_pose(&rig);
    let frame = FacePoseFrame {
        textures: vec![],
        blend_weights: vec![0.0, 0.0],
        // Joint 0 is not movable; evaluate_pose must keep its rest value.
        joints: vec![JointPose {
            joint: 0,
            local: RigidTransform::new(Vec3::splat(9.0), Quat::IDENTITY),
        }],
    };
    let pose = evaluate_pose(&rig, &frame);
    assert_eq!(pose.joint_world(0), rest.joint_world(0));
}

fn two_frames() -> (CharacterRig, FacePoseFrame, FacePoseFrame) {
    let rig = fixtures::rig();
    let a = decode_frame(
        &fixtures::frame_buf(
            0,
            &[0.2, 0.0],
            &[0.0, 1.0],
            &[(1, [0.0, 1.0, 0.0], [0.0; 3]), (2, [0.0, 0.5, 0.2], [0.0; 3])],
        ),
        &rig,
    )
    .unwrap();
    let b = decode_frame(
        &fixtures::frame_buf(
            0,
            &[0.6, 0.4],
            &[1.0, 0.0],
            &[(1, [0.0, 2.0, 0.0], [0.0; 3]), (2, [0.0, 0.5, 1.0], [0.0; 3])],
        ),
        &rig,
    )
    .unwrap();
    (rig, a, b)
}

#[test]
fn interpolation_is_exact_at_boundaries() {
    let (rig, a, b) = two_frames();
    let order: Vec<_> = rig.skeleton.movable_joints().collect();

    let at_a = interpolate(&a, &b, &a, 0.0, &order, &rig).unwrap();
    assert_eq!(at_a.blend_weights, a.blend_weights);
    assert_eq!(at_a.joint_local(1), a.joint_local(1));
    assert_eq!(at_a.joint_local(2), a.joint_local(2));
    assert_eq!(at_a.textures[0].weights, a.textures[0].weights);

    let at_b = interpolate(&a, &b, &a, 1.0, &order, &rig).unwrap();
    assert_eq!(at_b.blend_weights, b.blend_weights);
    assert_eq!(at_b.joint_local(1), b.joint_local(1));
    assert_eq!(at_b.joint_local(2), b.joint_local(2));
}

#[test]
fn midpoint_blends_weights_and_translations() {
    let (rig, a, b) = two_frames();
    let order: Vec<_> = rig.skeleton.movable_joints().collect();
    let mid = interpolate(&a, &b, &a, 0.5, &order, &rig).unwrap();

    assert!((mid.blend_weights[0] - 0.5).abs() < 1e-6);
    assert!((mid.blend_weights[1] - 0.5).abs() < 1e-6);
    assert!((mid.textures[0].weights[0] - 0.4).abs() < 1e-6);

    let neck = mid.joint_local(1).unwrap();
    assert!((neck.translation.y - 1.5).abs() < 1e-6);
    let jaw = mid.joint_local(2).unwrap();
    assert!((jaw.translation.z - 0.6).abs() < 1e-6);
}

#[test]
fn joints_outside_eval_order_keep_reference_value() {
    let (rig, a, b) = two_frames();
    // Only blend the neck; the jaw must keep the reference (a) value.
    let order = vec![1u16];
    let mid = interpolate(&a, &b, &a, 0.5, &order, &rig).unwrap();
    assert_eq!(mid.joint_local(2), a.joint_local(2));
    let neck = mid.joint_local(1).unwrap();
    assert!((neck.translation.y - 1.5).abs() < 1e-6);
}

#[test]
fn mismatched_weight_lengths_fail() {
    let (rig, a, _) = two_frames();
    let short = FacePoseFrame {
        textures: a.textures.clone(),
        blend_weights: vec![0.0],
        joints: vec![],
    };
    let order: Vec<_> = rig.skeleton.movable_joints().collect();
    assert!(interpolate(&a, &short, &a, 0.5, &order, &rig).is_err());
}
