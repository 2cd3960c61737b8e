// Transform utilities for Mat4
//
// Extends glam::Mat4 with the normal transform needed to place mesh
// instances. glam::Mat4 already provides transform_point3(),
// transform_vector3() and inverse().

use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a surface normal with the inverse-transpose so it stays
    /// perpendicular under non-uniform scale. The result is normalized.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * normal).normalize_or_zero()
    }
}
