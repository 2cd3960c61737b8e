//! Quaternion helpers for moving between world space and the local shading
//! frame, where the shading normal is the +Z axis.

use crate::{Quat, Vec3};

/// Rotation taking the unit vector `input` onto (0, 0, 1).
///
/// `input` must be normalized. Vectors that (nearly) point down -Z have no
/// well-defined shortest-arc axis, so they get a half turn about X instead.
pub fn rotation_to_z_axis(input: Vec3) -> Quat {
    if input.z < -0.99999 {
        return Quat::from_xyzw(1.0, 0.0, 0.0, 0.0);
    }

    Quat::from_xyzw(input.y, -input.x, 0.0, 1.0 + input.z).normalize()
}

/// Quaternion performing the opposite rotation of `q` (its conjugate).
#[inline]
pub fn invert_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, -q.y, -q.z, q.w)
}

/// Rotate `v` by the unit quaternion `q`.
#[inline]
pub fn rotate_point(q: Quat, v: Vec3) -> Vec3 {
    let axis = Vec3::new(q.x, q.y, q.z);
    2.0 * axis.dot(v) * axis + (q.w * q.w - axis.dot(axis)) * v + 2.0 * q.w * axis.cross(v)
}
