use glam::Vec2;

use crate::foundation::error::{AnimaError, AnimaResult};
use crate::foundation::math::RigidTransform;

/// Index into [`Skeleton::joints`].
pub type JointIndex = u16;

/// Sentinel parent index for root joints inside the wire format.
pub(crate) const NO_PARENT: u16 = u16::MAX;

/// Maximum joint influences per skinned vertex the format allows.
pub const MAX_SKIN_INFLUENCES: usize = 8;

#[derive(Clone, Copy, Debug)]
/// Camera parameters shipped with the character payload.
pub struct Camera {
    /// Focal length in millimetres.
    pub focal_length: f32,
    /// Aperture (f-stop).
    pub aperture: f32,
    /// Extrinsic placement of the camera in world space.
    pub extrinsic: RigidTransform,
}

#[derive(Clone, Debug)]
/// One joint of the skeleton.
pub struct Joint {
    /// Parent joint, `None` for roots.
    pub parent: Option<JointIndex>,
    /// Local rest transform relative to the parent.
    pub rest_local: RigidTransform,
    /// Whether per-frame payloads may override this joint.
    pub movable: bool,
}

#[derive(Clone, Debug)]
/// Ordered joint hierarchy with a topological evaluation order.
pub struct Skeleton {
    /// All joints; indices are stable across the session.
    pub joints: Vec<Joint>,
    /// Topological order: every joint appears before its descendants.
    pub eval_order: Vec<JointIndex>,
}

impl Skeleton {
    /// Check the evaluation-order invariant: parents precede children and
    /// every joint appears exactly once.
    pub fn validate(&self) -> AnimaResult<()> {
        if self.eval_order.len() != self.joints.len() {
            return Err(AnimaError::validation(
                "skeleton eval order must cover every joint exactly once",
            ));
        }
        let mut seen = vec![false; self.joints.len()];
        for &ji in &self.eval_order {
            let joint = self
                .joints
                .get(usize::from(ji))
                .ok_or_else(|| AnimaError::validation("eval order references unknown joint"))?;
            if seen[usize::from(ji)] {
                return Err(AnimaError::validation("eval order repeats a joint"));
            }
            if let Some(parent) = joint.parent
                && !seen[usize::from(parent)]
            {
                return Err(AnimaError::validation(
                    "eval order yields a joint before its parent",
                ));
            }
            seen[usize::from(ji)] = true;
        }
        Ok(())
    }

    /// Movable joint indices in evaluation order.
    pub fn movable_joints(&self) -> impl Iterator<Item = JointIndex> + '_ {
        self.eval_order
            .iter()
            .copied()
            .filter(|&ji| self.joints[usize::from(ji)].movable)
    }
}

#[derive(Clone, Copy, Debug)]
/// One joint influence on a skinned vertex.
pub struct SkinInfluence {
    /// Influencing joint.
    pub joint: JointIndex,
    /// Raw (un-normalized) weight.
    pub weight: f32,
}

#[derive(Clone, Debug)]
/// Per-vertex skin bindings, `influences_per_vertex` entries per vertex.
pub struct SkinBinding {
    /// Fixed influence count per vertex, ≤ [`MAX_SKIN_INFLUENCES`].
    pub influences_per_vertex: usize,
    /// Flattened influences, vertex-major.
    pub influences: Vec<SkinInfluence>,
}

#[derive(Clone, Debug)]
/// Blendshape basis for one mesh.
///
/// Shape 0 is the neutral pose in absolute coordinates; shapes `1..` are
/// per-vertex deltas added by weighted sum. Weight index `j` drives shape
/// `j + 1`; the neutral is never weighted directly.
pub struct BlendshapeBasis {
    /// Vertex count shared by every shape.
    pub vertex_count: usize,
    /// Neutral vertex positions, length `vertex_count`.
    pub neutral: Vec<glam::Vec3>,
    /// Delta shapes, each of length `vertex_count`.
    pub deltas: Vec<Vec<glam::Vec3>>,
}

#[derive(Clone, Debug)]
/// PCA-style appearance model: mean texture plus weighted components.
pub struct TextureModel {
    /// Mean coefficients.
    pub mean: Vec<f32>,
    /// Components, each the same length as `mean`.
    pub components: Vec<Vec<f32>>,
    /// Optional non-linear output scale applied after the weighted sum.
    pub nonlinear_scale: Option<f32>,
}

impl TextureModel {
    /// Evaluate `mean + Σ wᵢ·componentᵢ`, applying the non-linear scale
    /// when present. Weight counts beyond the component count are an error.
    pub fn evaluate(&self, weights: &[f32]) -> AnimaResult<Vec<f32>> {
        if weights.len() > self.components.len() {
            return Err(AnimaError::evaluation(format!(
                "texture model has {} components but {} weights were supplied",
                self.components.len(),
                weights.len()
            )));
        }
        let mut out = self.mean.clone();
        for (w, component) in weights.iter().zip(&self.components) {
            for (dst, &c) in out.iter_mut().zip(component) {
                *dst += w * c;
            }
        }
        if let Some(scale) = self.nonlinear_scale {
            for v in &mut out {
                *v = (v.abs().powf(scale) * v.signum()).clamp(-1.0, 1.0);
            }
        }
        Ok(out)
    }
}

#[derive(Clone, Debug)]
/// One renderable mesh of the character.
pub struct Mesh {
    /// Mesh name from the payload.
    pub name: String,
    /// Per-vertex opacity mask, 0 = fully transparent.
    pub opacity_mask: Vec<u8>,
    /// Triangle list, three vertex indices per triangle.
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex UV coordinates.
    pub uvs: Vec<Vec2>,
    /// Skin bindings for linear blend skinning.
    pub skin: SkinBinding,
    /// Blendshape basis (shape 0 neutral).
    pub blendshapes: BlendshapeBasis,
    /// Appearance models selectable per frame.
    pub texture_models: Vec<TextureModel>,
}

#[derive(Clone, Debug)]
/// Immutable character definition, loaded once per session and shared by
/// reference afterwards.
pub struct CharacterRig {
    /// Camera parameters.
    pub camera: Camera,
    /// Global blendshape weight-vector length (neutral excluded).
    pub blendshape_count: usize,
    /// Joint hierarchy.
    pub skeleton: Skeleton,
    /// Renderable meshes.
    pub meshes: Vec<Mesh>,
}

impl CharacterRig {
    /// Number of joints in the skeleton.
    pub fn joint_count(&self) -> usize {
        self.skeleton.joints.len()
    }
}
