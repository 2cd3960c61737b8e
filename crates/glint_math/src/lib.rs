// Re-export glam for convenience
pub use glam::*;

// glint math types
mod aabb;
mod lanes;
mod optics;
mod ray;
mod rotation;
mod transform;

pub use aabb::Aabb;
pub use lanes::Vec3x4;
pub use optics::{reflect, refract};
pub use ray::{Hit, Ray, BVH_FAR, EPSILON};
pub use rotation::{invert_rotation, rotate_point, rotation_to_z_axis};
pub use transform::Mat4Ext;
