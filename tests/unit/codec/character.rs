use super::*;
use crate::codec::reader::CODEC_VERSION;
use crate::fixtures;

#[test]
fn fixture_character_decodes() {
    let rig = decode_character(&fixtures::character_buf()).unwrap();

    assert_eq!(rig.blendshape_count, 2);
    assert_eq!(rig.joint_count(), 3);
    assert_eq!(rig.skeleton.eval_order, vec![0, 1, 2]);
    assert!(!rig.skeleton.joints[0].movable);
    assert!(rig.skeleton.joints[1].movable);
    assert_eq!(rig.skeleton.joints[2].parent, Some(1));

    assert_eq!(rig.meshes.len(), 1);
    let mesh = &rig.meshes[0];
    assert_eq!(mesh.name, "face");
    assert_eq!(mesh.opacity_mask, vec![255, 255, 128]);
    assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    assert_eq!(mesh.uvs.len(), 3);
    assert_eq!(mesh.skin.influences_per_vertex, 2);
    assert_eq!(mesh.blendshapes.vertex_count, 3);
    assert_eq!(mesh.blendshapes.deltas.len(), 2);
    assert_eq!(mesh.texture_models.len(), 1);
    assert_eq!(mesh.texture_models[0].components.len(), 2);

    assert!((rig.camera.focal_length - 35.0).abs() < 1e-6);
    assert!((rig.camera.extrinsic.translation.z - 3.0).abs() < 1e-6);
}

#[test]
fn newer_major_version_is_rejected() {
    let mut buf = fixtures::character_buf();
    buf[0] = CODEC_VERSION.0 + 1;
    let err = decode_character(&buf).unwrap_err();
    assert!(err.to_string().contains("unsupported major version"));
}

#[test]
fn older_minor_version_is_accepted() {
    let mut buf = fixtures::character_buf();
    buf[1] = 0;
    buf[2] = 0;
    assert!(decode_character(&buf).is_ok());
}

#[test]
fn unknown_element_tag_is_rejected() {
    let buf = fixtures::character_buf();
    // The first element tag follows version (3), camera (4+4+12+16),
    // blendshape count (2), skeleton (2 + 3*(2+1+12+16) + 3*2),
    // mesh count (1), mesh name (2+4), element count (1).
    let tag_at = 3 + 36 + 2 + (2 + 3 * 31 + 6) + 1 + 6 + 1;
    let mut buf = buf;
    assert_eq!(buf[tag_at], 0x01);
    buf[tag_at] = 0x7F;
    let err = decode_character(&buf).unwrap_err();
    assert!(err.to_string().contains("unsupported mesh element tag"));
}

#[test]
fn truncated_buffer_is_a_typed_error() {
    let buf = fixtures::character_buf();
    let err = decode_character(&buf[..buf.len() / 2]).unwrap_err();
    assert!(matches!(err, crate::AnimaError::Codec(_)));
}

#[test]
fn empty_buffer_fails_at_version() {
    assert!(decode_character(&[]).is_err());
}
