//! Test-only encoders for the binary character/frame format. The engine
//! ships no encoder; fixtures are assembled here byte by byte, mirroring
//! the decoder's layout.

use bytes::BufMut;

use crate::codec::reader::CODEC_VERSION;
use crate::rig::model::{CharacterRig, NO_PARENT};

/// Install a compact test log subscriber; later calls are no-ops.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .compact()
        .try_init();
}

pub(crate) fn put_version(buf: &mut Vec<u8>) {
    buf.put_u8(CODEC_VERSION.0);
    buf.put_u8(CODEC_VERSION.1);
    buf.put_u8(CODEC_VERSION.2);
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    buf.put_u16_le(s.len() as u16);
    buf.put_slice(s.as_bytes());
}

fn put_vec3(buf: &mut Vec<u8>, v: [f32; 3]) {
    for c in v {
        buf.put_f32_le(c);
    }
}

fn put_identity_quat(buf: &mut Vec<u8>) {
    for c in [0.0, 0.0, 0.0, 1.0f32] {
        buf.put_f32_le(c);
    }
}

/// Standard three-joint, one-mesh character fixture:
/// root (fixed) → neck (movable) → jaw (movable), 2 blendshapes,
/// 3 vertices, one linear texture model with 2 components.
pub(crate) fn character_buf() -> Vec<u8> {
    let mut buf = Vec::new();
    put_version(&mut buf);

    // Camera.
    buf.put_f32_le(35.0);
    buf.put_f32_le(2.8);
    put_vec3(&mut buf, [0.0, 0.0, 3.0]);
    put_identity_quat(&mut buf);

    buf.put_u16_le(2); // blendshape count

    // Skeleton.
    buf.put_u16_le(3);
    // root
    buf.put_u16_le(NO_PARENT);
    buf.put_u8(0);
    put_vec3(&mut buf, [0.0, 0.0, 0.0]);
    put_identity_quat(&mut buf);
    // neck
    buf.put_u16_le(0);
    buf.put_u8(1);
    put_vec3(&mut buf, [0.0, 1.0, 0.0]);
    put_identity_quat(&mut buf);
    // jaw
    buf.put_u16_le(1);
    buf.put_u8(1);
    put_vec3(&mut buf, [0.0, 0.5, 0.2]);
    put_identity_quat(&mut buf);
    for ji in [0u16, 1, 2] {
        buf.put_u16_le(ji);
    }

    // One mesh.
    buf.put_u8(1);
    put_string(&mut buf, "face");
    buf.put_u8(6); // element count

    // Opacity mask.
    buf.put_u8(0x01);
    buf.put_u32_le(3);
    buf.put_slice(&[255, 255, 128]);

    // Triangles.
    buf.put_u8(0x02);
    buf.put_u32_le(1);
    for idx in [0u32, 1, 2] {
        buf.put_u32_le(idx);
    }

    // UVs.
    buf.put_u8(0x03);
    buf.put_u32_le(3);
    for uv in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        buf.put_f32_le(uv[0]);
        buf.put_f32_le(uv[1]);
    }

    // Skin: 3 vertices, 2 influences each.
    buf.put_u8(0x04);
    buf.put_u32_le(3);
    buf.put_u8(2);
    for (joint, weight) in [(1u16, 0.5f32), (2, 0.5), (1, 1.0), (0, 0.0), (2, 1.0), (0, 0.0)] {
        buf.put_u16_le(joint);
        buf.put_f32_le(weight);
    }

    // Blendshapes: neutral + 2 deltas over 3 vertices.
    buf.put_u8(0x05);
    buf.put_u32_le(3);
    buf.put_u16_le(3);
    for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        put_vec3(&mut buf, v);
    }
    for v in [[0.0f32, 0.0, 1.0]; 3] {
        put_vec3(&mut buf, v);
    }
    for v in [[0.1f32, 0.0, 0.0]; 3] {
        put_vec3(&mut buf, v);
    }

    // Texture model: linear, 4 coefficients, 2 components.
    buf.put_u8(0x06);
    buf.put_u8(0);
    buf.put_u32_le(4);
    for c in [0.1f32, 0.2, 0.3, 0.4] {
        buf.put_f32_le(c);
    }
    buf.put_u16_le(2);
    for c in [1.0f32, 0.0, 0.0, 0.0] {
        buf.put_f32_le(c);
    }
    for c in [0.0f32, 1.0, 0.0, 0.0] {
        buf.put_f32_le(c);
    }

    buf
}

/// Decoded form of [`character_buf`].
pub(crate) fn rig() -> CharacterRig {
    crate::codec::character::decode_character(&character_buf()).expect("fixture rig decodes")
}

/// Frame payload against the standard fixture rig. `joints` holds
/// `(joint_index, translation, quaternion xyz)`; w is recovered by the
/// decoder.
pub(crate) fn frame_buf(
    texture_model: u8,
    texture_weights: &[f32],
    blend_weights: &[f32],
    joints: &[(u16, [f32; 3], [f32; 3])],
) -> Vec<u8> {
    let mut buf = Vec::new();
    put_version(&mut buf);

    buf.put_u8(1); // mesh count
    buf.put_u8(texture_model);
    buf.put_u16_le(texture_weights.len() as u16);
    for &w in texture_weights {
        buf.put_f32_le(w);
    }

    buf.put_u16_le(blend_weights.len() as u16);
    for &w in blend_weights {
        buf.put_f32_le(w);
    }

    buf.put_u16_le(joints.len() as u16);
    for &(joint, translation, quat_xyz) in joints {
        buf.put_u16_le(joint);
        put_vec3(&mut buf, translation);
        put_vec3(&mut buf, quat_xyz);
    }

    buf
}
