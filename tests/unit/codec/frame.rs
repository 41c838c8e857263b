use super::*;
use crate::fixtures;

#[test]
fn fixture_frame_roundtrips_weights_and_transforms() {
    let rig = fixtures::rig();
    let quat_xyz = [0.1f32, 0.0, 0.2];
    let buf = fixtures::frame_buf(
        0,
        &[0.3, -0.2],
        &[0.8, 0.1],
        &[(1, [0.0, 1.0, 0.0], quat_xyz), (2, [0.0, 0.5, 0.3], [0.0; 3])],
    );
    let frame = decode_frame(&buf, &rig).unwrap();

    assert_eq!(frame.textures.len(), 1);
    assert_eq!(frame.textures[0].model, 0);
    for (got, want) in frame.textures[0].weights.iter().zip([0.3f32, -0.2]) {
        assert!((got - want).abs() < 1e-5);
    }
    for (got, want) in frame.blend_weights.iter().zip([0.8f32, 0.1]) {
        assert!((got - want).abs() < 1e-5);
    }

    let jaw = frame.joint_local(1).unwrap();
    assert!((jaw.translation.y - 1.0).abs() < 1e-5);
    // w is recovered from the unit-norm constraint.
    let expected_w = (1.0f32 - 0.1 * 0.1 - 0.2 * 0.2).sqrt();
    assert!((jaw.rotation.w - expected_w).abs() < 1e-5);
    assert!((jaw.rotation.x - 0.1).abs() < 1e-5);
    assert!((jaw.rotation.z - 0.2).abs() < 1e-5);
    assert!((jaw.rotation.length() - 1.0).abs() < 1e-5);
}

#[test]
fn quaternion_radicand_is_clamped_before_sqrt() {
    let rig = fixtures::rig();
    // Components with norm > 1 would yield a negative radicand.
    let buf = fixtures::frame_buf(0, &[], &[0.0, 0.0], &[(1, [0.0; 3], [0.8, 0.8, 0.8])]);
    let frame = decode_frame(&buf, &rig).unwrap();
    let local = frame.joint_local(1).unwrap();
    assert_eq!(local.rotation.w, 0.0);
    assert!(local.rotation.is_finite());
}

#[test]
fn wrong_blendshape_count_is_rejected() {
    let rig = fixtures::rig();
    let buf = fixtures::frame_buf(0, &[], &[1.0, 2.0, 3.0], &[]);
    let err = decode_frame(&buf, &rig).unwrap_err();
    assert!(err.to_string().contains("blendshape weights"));
}

#[test]
fn non_movable_joint_override_is_rejected() {
    let rig = fixtures::rig();
    let buf = fixtures::frame_buf(0, &[], &[0.0, 0.0], &[(0, [0.0; 3], [0.0; 3])]);
    let err = decode_frame(&buf, &rig).unwrap_err();
    assert!(err.to_string().contains("non-movable"));
}

#[test]
fn out_of_range_texture_model_is_rejected() {
    let rig = fixtures::rig();
    let buf = fixtures::frame_buf(5, &[], &[0.0, 0.0], &[]);
    assert!(decode_frame(&buf, &rig).is_err());
}

#[test]
fn decode_is_stateless() {
    let rig = fixtures::rig();
    let buf = fixtures::frame_buf(0, &[0.5], &[0.2, 0.4], &[(2, [0.1, 0.2, 0.3], [0.0; 3])]);
    let a = decode_frame(&buf, &rig).unwrap();
    let b = decode_frame(&buf, &rig).unwrap();
    assert_eq!(a.blend_weights, b.blend_weights);
    assert_eq!(a.joint_local(2), b.joint_local(2));
}
