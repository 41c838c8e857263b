use glam::{Quat, Vec2};

use crate::codec::reader::Reader;
use crate::foundation::error::{AnimaError, AnimaResult};
use crate::foundation::math::RigidTransform;
use crate::rig::model::{
    BlendshapeBasis, Camera, CharacterRig, Joint, MAX_SKIN_INFLUENCES, Mesh, NO_PARENT, Skeleton,
    SkinBinding, SkinInfluence, TextureModel,
};

// Mesh element tags. Unknown tags are a decode error rather than being
// skipped: element payloads are not self-delimiting.
const ELEM_OPACITY_MASK: u8 = 0x01;
const ELEM_TRIANGLES: u8 = 0x02;
const ELEM_UVS: u8 = 0x03;
const ELEM_SKIN: u8 = 0x04;
const ELEM_BLENDSHAPES: u8 = 0x05;
const ELEM_TEXTURE_MODEL: u8 = 0x06;

const TEXTURE_FORMAT_LINEAR: u8 = 0;
const TEXTURE_FORMAT_NONLINEAR: u8 = 1;

/// Decode a character payload into an immutable [`CharacterRig`].
///
/// Fails with a typed [`AnimaError::Codec`] on version mismatch, truncated
/// input, or an unsupported element/format code. Never yields a partial rig.
#[tracing::instrument(skip(buf), fields(len = buf.len()))]
pub fn decode_character(buf: &[u8]) -> AnimaResult<CharacterRig> {
    let mut r = Reader::new(buf);
    let version = r.read_version()?;
    tracing::debug!(?version, "decoding character payload");

    let camera = decode_camera(&mut r)?;
    let blendshape_count = usize::from(r.read_u16("blendshape count")?);
    let skeleton = decode_skeleton(&mut r)?;
    skeleton.validate()?;

    let mesh_count = usize::from(r.read_u8("mesh count")?);
    if mesh_count == 0 {
        return Err(AnimaError::codec("character payload has no meshes"));
    }
    let mut meshes = Vec::with_capacity(mesh_count);
    for _ in 0..mesh_count {
        meshes.push(decode_mesh(&mut r, blendshape_count, &skeleton)?);
    }

    Ok(CharacterRig {
        camera,
        blendshape_count,
        skeleton,
        meshes,
    })
}

fn decode_camera(r: &mut Reader<'_>) -> AnimaResult<Camera> {
    let focal_length = r.read_f32("camera focal length")?;
    let aperture = r.read_f32("camera aperture")?;
    let extrinsic = decode_rigid(r, "camera extrinsic")?;
    Ok(Camera {
        focal_length,
        aperture,
        extrinsic,
    })
}

fn decode_rigid(r: &mut Reader<'_>, what: &str) -> AnimaResult<RigidTransform> {
    let translation = r.read_vec3(what)?;
    let x = r.read_f32(what)?;
    let y = r.read_f32(what)?;
    let z = r.read_f32(what)?;
    let w = r.read_f32(what)?;
    Ok(RigidTransform::new(translation, Quat::from_xyzw(x, y, z, w)))
}

fn decode_skeleton(r: &mut Reader<'_>) -> AnimaResult<Skeleton> {
    let joint_count = usize::from(r.read_u16("joint count")?);
    let mut joints = Vec::with_capacity(joint_count);
    for i in 0..joint_count {
        let raw_parent = r.read_u16("joint parent")?;
        let parent = if raw_parent == NO_PARENT {
            None
        } else {
            if usize::from(raw_parent) >= joint_count {
                return Err(AnimaError::codec(format!(
                    "joint {i} references out-of-range parent {raw_parent}"
                )));
            }
            Some(raw_parent)
        };
        let movable = r.read_u8("joint movable flag")? != 0;
        let rest_local = decode_rigid(r, "joint rest transform")?;
        joints.push(Joint {
            parent,
            rest_local,
            movable,
        });
    }

    let mut eval_order = Vec::with_capacity(joint_count);
    for _ in 0..joint_count {
        eval_order.push(r.read_u16("joint eval order")?);
    }

    Ok(Skeleton { joints, eval_order })
}

fn decode_mesh(
    r: &mut Reader<'_>,
    blendshape_count: usize,
    skeleton: &Skeleton,
) -> AnimaResult<Mesh> {
    let name = r.read_string("mesh name")?;
    let element_count = r.read_u8("mesh element count")?;

    let mut opacity_mask = None;
    let mut triangles = None;
    let mut uvs = None;
    let mut skin = None;
    let mut blendshapes = None;
    let mut texture_models = Vec::new();

    for _ in 0..element_count {
        let tag = r.read_u8("mesh element tag")?;
        match tag {
            ELEM_OPACITY_MASK => {
                let len = r.read_u32("opacity mask length")? as usize;
                opacity_mask = Some(r.read_bytes(len, "opacity mask")?);
            }
            ELEM_TRIANGLES => {
                let count = r.read_u32("triangle count")? as usize;
                let mut tris = Vec::with_capacity(count);
                for _ in 0..count {
                    tris.push([
                        r.read_u32("triangle index")?,
                        r.read_u32("triangle index")?,
                        r.read_u32("triangle index")?,
                    ]);
                }
                triangles = Some(tris);
            }
            ELEM_UVS => {
                let count = r.read_u32("uv count")? as usize;
                let mut coords = Vec::with_capacity(count);
                for _ in 0..count {
                    coords.push(Vec2::new(r.read_f32("uv")?, r.read_f32("uv")?));
                }
                uvs = Some(coords);
            }
            ELEM_SKIN => skin = Some(decode_skin(r, skeleton)?),
            ELEM_BLENDSHAPES => blendshapes = Some(decode_blendshapes(r, blendshape_count)?),
            ELEM_TEXTURE_MODEL => texture_models.push(decode_texture_model(r)?),
            other => {
                return Err(AnimaError::codec(format!(
                    "unsupported mesh element tag 0x{other:02x} in mesh '{name}'"
                )));
            }
        }
    }

    let skin = skin.ok_or_else(|| AnimaError::codec(format!("mesh '{name}' is missing skin")))?;
    let blendshapes = blendshapes
        .ok_or_else(|| AnimaError::codec(format!("mesh '{name}' is missing blendshapes")))?;
    let triangles = triangles
        .ok_or_else(|| AnimaError::codec(format!("mesh '{name}' is missing triangles")))?;
    if texture_models.is_empty() {
        return Err(AnimaError::codec(format!(
            "mesh '{name}' has no texture models"
        )));
    }

    let vertex_count = blendshapes.vertex_count;
    if skin.influences.len() != vertex_count * skin.influences_per_vertex {
        return Err(AnimaError::codec(format!(
            "mesh '{name}' skin covers {} vertices but blendshapes cover {vertex_count}",
            skin.influences.len() / skin.influences_per_vertex.max(1)
        )));
    }

    Ok(Mesh {
        name,
        opacity_mask: opacity_mask.unwrap_or_else(|| vec![u8::MAX; vertex_count]),
        triangles,
        uvs: uvs.unwrap_or_default(),
        skin,
        blendshapes,
        texture_models,
    })
}

fn decode_skin(r: &mut Reader<'_>, skeleton: &Skeleton) -> AnimaResult<SkinBinding> {
    let vertex_count = r.read_u32("skin vertex count")? as usize;
    let influences_per_vertex = usize::from(r.read_u8("skin influence count")?);
    if influences_per_vertex == 0 || influences_per_vertex > MAX_SKIN_INFLUENCES {
        return Err(AnimaError::codec(format!(
            "unsupported skin influence count {influences_per_vertex} (format allows 1..={MAX_SKIN_INFLUENCES})"
        )));
    }
    let mut influences = Vec::with_capacity(vertex_count * influences_per_vertex);
    for _ in 0..vertex_count * influences_per_vertex {
        let joint = r.read_u16("skin joint index")?;
        if usize::from(joint) >= skeleton.joints.len() {
            return Err(AnimaError::codec(format!(
                "skin references out-of-range joint {joint}"
            )));
        }
        let weight = r.read_f32("skin weight")?;
        influences.push(SkinInfluence { joint, weight });
    }
    Ok(SkinBinding {
        influences_per_vertex,
        influences,
    })
}

fn decode_blendshapes(r: &mut Reader<'_>, blendshape_count: usize) -> AnimaResult<BlendshapeBasis> {
    let vertex_count = r.read_u32("blendshape vertex count")? as usize;
    let shape_count = usize::from(r.read_u16("blendshape shape count")?);
    // Shape 0 is the neutral; the weighted deltas must line up with the
    // global weight vector.
    if shape_count != blendshape_count + 1 {
        return Err(AnimaError::codec(format!(
            "blendshape basis has {shape_count} shapes, expected {} (neutral + {blendshape_count} deltas)",
            blendshape_count + 1
        )));
    }
    let mut neutral = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        neutral.push(r.read_vec3("neutral shape vertex")?);
    }
    let mut deltas = Vec::with_capacity(blendshape_count);
    for _ in 0..blendshape_count {
        let mut shape = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            shape.push(r.read_vec3("blendshape delta vertex")?);
        }
        deltas.push(shape);
    }
    Ok(BlendshapeBasis {
        vertex_count,
        neutral,
        deltas,
    })
}

fn decode_texture_model(r: &mut Reader<'_>) -> AnimaResult<TextureModel> {
    let format = r.read_u8("texture model format")?;
    let nonlinear_scale = match format {
        TEXTURE_FORMAT_LINEAR => None,
        TEXTURE_FORMAT_NONLINEAR => Some(r.read_f32("texture model scale")?),
        other => {
            return Err(AnimaError::codec(format!(
                "unsupported texture model format code {other}"
            )));
        }
    };
    let coeff_len = r.read_u32("texture model length")? as usize;
    let mean = r.read_f32_vec(coeff_len, "texture model mean")?;
    let component_count = usize::from(r.read_u16("texture component count")?);
    let mut components = Vec::with_capacity(component_count);
    for _ in 0..component_count {
        components.push(r.read_f32_vec(coeff_len, "texture component")?);
    }
    Ok(TextureModel {
        mean,
        components,
        nonlinear_scale,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/codec/character.rs"]
mod tests;
