use crate::codec::frame::{FacePoseFrame, JointPose, TextureSelection};
use crate::foundation::error::{AnimaError, AnimaResult};
use crate::foundation::math::{RigidTransform, lerp_f32};
use crate::rig::model::{CharacterRig, JointIndex};

#[derive(Clone, Debug)]
/// World-space transform per joint, indexed by [`JointIndex`].
pub struct Pose {
    /// World transform for every joint of the rig.
    pub world: Vec<RigidTransform>,
}

impl Pose {
    /// World transform of `joint`.
    pub fn joint_world(&self, joint: JointIndex) -> RigidTransform {
        self.world[usize::from(joint)]
    }
}

/// Compose world transforms for the rest pose.
///
/// Follows the skeleton's topological order: each joint's world transform
/// is `parent_world ∘ local`; roots use their local transform directly.
pub fn evaluate_rest_pose(rig: &CharacterRig) -> Pose {
    compose(rig, |_| None)
}

/// Compose world transforms with movable joints seeded from `frame`.
///
/// This is how a decoded frame overrides the rest pose: the override
/// replaces the joint's local transform before descendants compose on top.
pub fn evaluate_pose(rig: &CharacterRig, frame: &FacePoseFrame) -> Pose {
    compose(rig, |joint| frame.joint_local(joint))
}

fn compose(
    rig: &CharacterRig,
    override_for: impl Fn(JointIndex) -> Option<RigidTransform>,
) -> Pose {
    let mut world = vec![RigidTransform::IDENTITY; rig.joint_count()];
    for &ji in &rig.skeleton.eval_order {
        let joint = &rig.skeleton.joints[usize::from(ji)];
        let local = override_for(ji)
            .filter(|_| joint.movable)
            .unwrap_or(joint.rest_local);
        world[usize::from(ji)] = match joint.parent {
            Some(parent) => world[usize::from(parent)].apply(local),
            None => local,
        };
    }
    Pose { world }
}

/// Blend two decoded frames at mix factor `t ∈ [0, 1]`.
///
/// Blendshape and texture weights blend linearly. Joint transforms blend
/// per edge in local space (parent-relative), which avoids popping when
/// ancestors differ between `a` and `b`; quaternions use component-wise
/// lerp with renormalization, a documented approximation of slerp valid
/// for the small deltas between adjacent animation frames. Joints not
/// listed in `eval_order` retain `reference`'s value unchanged. Exact at
/// the boundaries: `t = 0` reproduces `a`, `t = 1` reproduces `b`.
pub fn interpolate(
    a: &FacePoseFrame,
    b: &FacePoseFrame,
    reference: &FacePoseFrame,
    t: f32,
    eval_order: &[JointIndex],
    rig: &CharacterRig,
) -> AnimaResult<FacePoseFrame> {
    if a.blend_weights.len() != b.blend_weights.len() {
        return Err(AnimaError::evaluation(format!(
            "cannot blend frames with {} and {} blendshape weights",
            a.blend_weights.len(),
            b.blend_weights.len()
        )));
    }
    let t = t.clamp(0.0, 1.0);

    let blend_weights = a
        .blend_weights
        .iter()
        .zip(&b.blend_weights)
        .map(|(&wa, &wb)| lerp_f32(wa, wb, t))
        .collect();

    let textures = a
        .textures
        .iter()
        .zip(&b.textures)
        .map(|(ta, tb)| blend_textures(ta, tb, t))
        .collect();

    let mut joints = Vec::new();
    for &ji in &rig.skeleton.eval_order {
        if !rig.skeleton.joints[usize::from(ji)].movable {
            continue;
        }
        if eval_order.contains(&ji) {
            let rest = rig.skeleton.joints[usize::from(ji)].rest_local;
            let local_a = a.joint_local(ji).unwrap_or(rest);
            let local_b = b.joint_local(ji).unwrap_or(rest);
            joints.push(JointPose {
                joint: ji,
                local: local_a.lerp(local_b, t),
            });
        } else if let Some(local) = reference.joint_local(ji) {
            joints.push(JointPose { joint: ji, local });
        }
    }

    Ok(FacePoseFrame {
        textures,
        blend_weights,
        joints,
    })
}

fn blend_textures(a: &TextureSelection, b: &TextureSelection, t: f32) -> TextureSelection {
    if a.model != b.model || a.weights.len() != b.weights.len() {
        // Appearance models cannot be mixed across bases; snap to the
        // nearer endpoint instead.
        return if t < 0.5 { a.clone() } else { b.clone() };
    }
    TextureSelection {
        model: a.model,
        weights: a
            .weights
            .iter()
            .zip(&b.weights)
            .map(|(&wa, &wb)| lerp_f32(wa, wb, t))
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/pose.rs"]
mod tests;
