use glam::{Quat, Vec3};

/// Translation + unit-quaternion rotation, the rigid transform carried by
/// every joint in the rig.
///
/// Composition keeps quaternions normalized after every product so
/// floating-point drift stays bounded across deep skeleton chains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    /// Translation component.
    pub translation: Vec3,
    /// Rotation component, kept at unit length.
    pub rotation: Quat,
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Construct from parts, normalizing the rotation.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation: rotation.normalize(),
        }
    }

    /// Compose `self ∘ rhs`: apply `rhs` first, then `self`.
    ///
    /// `t = q_lhs · t_rhs + t_lhs`, `q = q_lhs · q_rhs` (Hamilton product),
    /// renormalized.
    pub fn apply(self, rhs: Self) -> Self {
        Self {
            translation: self.rotation * rhs.translation + self.translation,
            rotation: (self.rotation * rhs.rotation).normalize(),
        }
    }

    /// Inverse transform: conjugated rotation, negated rotated translation.
    pub fn inverse(self) -> Self {
        let inv_rot = self.rotation.conjugate();
        Self {
            translation: -(inv_rot * self.translation),
            rotation: inv_rot,
        }
    }

    /// Transform a point.
    pub fn transform_point(self, p: Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    /// Component-wise linear blend with renormalized rotation.
    ///
    /// Linear (not spherical) quaternion interpolation: a deliberate
    /// low-cost approximation that holds up for the small angular deltas
    /// between adjacent animation frames. Antipodal pairs are flipped onto
    /// the same hemisphere first so the blend takes the short path.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        // Exact endpoints: the boundary values must reproduce the inputs
        // bit-for-bit, without a renormalization pass.
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        let b = if self.rotation.dot(other.rotation) < 0.0 {
            -other.rotation
        } else {
            other.rotation
        };
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: (self.rotation + (b - self.rotation) * t).normalize(),
        }
    }

    /// Homogeneous matrix form, used by the skinning path.
    pub fn to_mat4(self) -> glam::Mat4 {
        glam::Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scalar linear blend, exact at the boundaries.
pub(crate) fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct Rng64 {
    state: u64,
}

#[cfg(test)]
impl Rng64 {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub(crate) fn next_f32_01(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) * (1.0 / ((1u64 << 24) as f32))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
