use glam::Quat;

use crate::codec::reader::Reader;
use crate::foundation::error::{AnimaError, AnimaResult};
use crate::foundation::math::RigidTransform;
use crate::rig::model::{CharacterRig, JointIndex};

#[derive(Clone, Debug)]
/// Per-mesh appearance selection for one frame.
pub struct TextureSelection {
    /// Index into the mesh's texture models.
    pub model: usize,
    /// Component weights for the selected model.
    pub weights: Vec<f32>,
}

#[derive(Clone, Debug)]
/// Local transform override for one movable joint.
pub struct JointPose {
    /// Overridden joint.
    pub joint: JointIndex,
    /// Local transform replacing the rest transform for this frame.
    pub local: RigidTransform,
}

#[derive(Clone, Debug)]
/// Decoded face state for one frame: appearance, blend weights and joint
/// overrides. Immutable once created.
pub struct FacePoseFrame {
    /// One selection per rig mesh, in mesh order.
    pub textures: Vec<TextureSelection>,
    /// Global blendshape weights; index `j` drives delta shape `j`.
    pub blend_weights: Vec<f32>,
    /// Movable-joint local transforms carried by this frame.
    pub joints: Vec<JointPose>,
}

impl FacePoseFrame {
    /// Look up the override for `joint`, if this frame carries one.
    pub fn joint_local(&self, joint: JointIndex) -> Option<RigidTransform> {
        self.joints
            .iter()
            .find(|jp| jp.joint == joint)
            .map(|jp| jp.local)
    }
}

/// Decode a per-frame payload against `rig`. Stateless: the same buffer
/// and rig always produce the same frame.
///
/// Joint rotations are stored as three components; `w` is recovered from
/// the unit-norm constraint, clamping the radicand at zero before the
/// square root so accumulated quantization error cannot produce a NaN.
pub fn decode_frame(buf: &[u8], rig: &CharacterRig) -> AnimaResult<FacePoseFrame> {
    let mut r = Reader::new(buf);
    r.read_version()?;

    let mesh_count = usize::from(r.read_u8("frame mesh count")?);
    if mesh_count != rig.meshes.len() {
        return Err(AnimaError::codec(format!(
            "frame covers {mesh_count} meshes but rig has {}",
            rig.meshes.len()
        )));
    }
    let mut textures = Vec::with_capacity(mesh_count);
    for (mesh_index, mesh) in rig.meshes.iter().enumerate() {
        let model = usize::from(r.read_u8("texture model index")?);
        if model >= mesh.texture_models.len() {
            return Err(AnimaError::codec(format!(
                "mesh {mesh_index} selects texture model {model} of {}",
                mesh.texture_models.len()
            )));
        }
        let weight_count = usize::from(r.read_u16("texture weight count")?);
        if weight_count > mesh.texture_models[model].components.len() {
            return Err(AnimaError::codec(format!(
                "mesh {mesh_index} carries {weight_count} texture weights for a {}-component model",
                mesh.texture_models[model].components.len()
            )));
        }
        let weights = r.read_f32_vec(weight_count, "texture weights")?;
        textures.push(TextureSelection { model, weights });
    }

    let blend_count = usize::from(r.read_u16("blendshape weight count")?);
    if blend_count != rig.blendshape_count {
        return Err(AnimaError::codec(format!(
            "frame carries {blend_count} blendshape weights, rig expects {}",
            rig.blendshape_count
        )));
    }
    let blend_weights = r.read_f32_vec(blend_count, "blendshape weights")?;

    let joint_count = usize::from(r.read_u16("movable joint count")?);
    let mut joints = Vec::with_capacity(joint_count);
    for _ in 0..joint_count {
        let joint = r.read_u16("movable joint index")?;
        let jdef = rig
            .skeleton
            .joints
            .get(usize::from(joint))
            .ok_or_else(|| AnimaError::codec(format!("frame references unknown joint {joint}")))?;
        if !jdef.movable {
            return Err(AnimaError::codec(format!(
                "frame overrides non-movable joint {joint}"
            )));
        }
        let translation = r.read_vec3("joint translation")?;
        let x = r.read_f32("joint rotation")?;
        let y = r.read_f32("joint rotation")?;
        let z = r.read_f32("joint rotation")?;
        let w = (1.0 - x * x - y * y - z * z).max(0.0).sqrt();
        joints.push(JointPose {
            joint,
            local: RigidTransform::new(translation, Quat::from_xyzw(x, y, z, w)),
        });
    }

    Ok(FacePoseFrame {
        textures,
        blend_weights,
        joints,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/codec/frame.rs"]
mod tests;
