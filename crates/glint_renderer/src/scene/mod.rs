//! Scene collaborator consumed by the integrator, plus a triangle-mesh
//! implementation of it.

mod bvh;
mod mesh;
mod triangle_scene;

pub use bvh::Bvh;
pub use mesh::Mesh;
pub use triangle_scene::{SceneBuilder, SceneError, TriangleScene};

use glint_math::{Hit, Ray, Vec3};

use crate::material::MaterialProperties;

/// Geometry and material queries the integrator relies on.
///
/// Implementations must be shareable across the render threads.
pub trait Scene: Send + Sync {
    /// Find the closest intersection closer than both `ray.t_max` and
    /// `ray.hit.t`, and record it in `ray.hit`. A miss leaves the hit at
    /// `BVH_FAR`.
    fn intersect(&self, ray: &mut Ray);

    /// True if anything blocks the ray before `ray.t_max`.
    fn is_occluded(&self, ray: &Ray) -> bool;

    fn material(&self, hit: &Hit) -> MaterialProperties;

    /// Normal of the hit triangle itself.
    fn geometry_normal(&self, hit: &Hit) -> Vec3;

    /// Normal used for shading, may be interpolated.
    fn shading_normal(&self, hit: &Hit) -> Vec3;
}
