use glam::{Mat4, Vec3, Vec4};

use crate::foundation::error::{AnimaError, AnimaResult};
use crate::rig::model::{CharacterRig, Mesh};
use crate::rig::pose::Pose;

/// Deform one mesh by blendshapes and linear blend skinning.
///
/// Each vertex is first displaced in neutral space by the weighted
/// blendshape deltas, then transformed by the weight-normalized sum of its
/// joint skin matrices, where `skin_i = pose_world_i ∘ rest_world_i⁻¹`.
/// The homogeneous result is divided by W before use.
pub fn skin_mesh(
    rig: &CharacterRig,
    mesh_index: usize,
    pose: &Pose,
    rest: &Pose,
    blend_weights: &[f32],
) -> AnimaResult<Vec<Vec3>> {
    let mesh = rig
        .meshes
        .get(mesh_index)
        .ok_or_else(|| AnimaError::evaluation(format!("no mesh at index {mesh_index}")))?;
    if blend_weights.len() != rig.blendshape_count {
        return Err(AnimaError::evaluation(format!(
            "expected {} blendshape weights, got {}",
            rig.blendshape_count,
            blend_weights.len()
        )));
    }

    let skin_matrices: Vec<Mat4> = (0..rig.joint_count())
        .map(|ji| (pose.world[ji].apply(rest.world[ji].inverse())).to_mat4())
        .collect();

    let deformed = apply_blendshapes(mesh, blend_weights);

    let per_vertex = mesh.skin.influences_per_vertex;
    let mut out = Vec::with_capacity(mesh.blendshapes.vertex_count);
    for (vi, base) in deformed.iter().enumerate() {
        let influences = &mesh.skin.influences[vi * per_vertex..(vi + 1) * per_vertex];
        let total: f32 = influences.iter().map(|i| i.weight).sum();
        if total <= f32::EPSILON {
            // Unbound vertex: leave it in neutral space.
            out.push(*base);
            continue;
        }
        let mut acc = Vec4::ZERO;
        for influence in influences {
            let m = skin_matrices[usize::from(influence.joint)];
            acc += m * base.extend(1.0) * (influence.weight / total);
        }
        out.push(if acc.w.abs() > f32::EPSILON {
            acc.truncate() / acc.w
        } else {
            acc.truncate()
        });
    }
    Ok(out)
}

fn apply_blendshapes(mesh: &Mesh, weights: &[f32]) -> Vec<Vec3> {
    let mut out = mesh.blendshapes.neutral.clone();
    for (w, shape) in weights.iter().zip(&mesh.blendshapes.deltas) {
        if *w == 0.0 {
            continue;
        }
        for (dst, delta) in out.iter_mut().zip(shape) {
            *dst += *delta * *w;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/rig/skin.rs"]
mod tests;
