//! Triangle-mesh scene with instancing and a BVH.

use glint_math::{Aabb, Hit, Mat4, Mat4Ext, Ray, Vec3};
use log::debug;
use thiserror::Error;

use super::{Bvh, Mesh, Scene};
use crate::material::MaterialProperties;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("vertex index {index} out of range for {len} positions")]
    IndexOutOfRange { index: u32, len: usize },

    #[error("mesh has {normals} normals for {positions} positions")]
    NormalCountMismatch { normals: usize, positions: usize },
}

/// World-space triangle, prepared for Möller-Trumbore.
#[derive(Debug, Clone, Copy)]
struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    face_normal: Vec3,
    vertex_normals: Option<[Vec3; 3]>,
}

impl Triangle {
    fn new(v: [Vec3; 3], vertex_normals: Option<[Vec3; 3]>) -> Self {
        let edge1 = v[1] - v[0];
        let edge2 = v[2] - v[0];
        Self {
            v0: v[0],
            edge1,
            edge2,
            face_normal: edge1.cross(edge2).normalize_or_zero(),
            vertex_normals,
        }
    }

    fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::from_points(self.v0, self.v0 + self.edge1);
        bounds.grow(self.v0 + self.edge2);
        // Pad thin dimensions to avoid degenerate boxes
        Aabb::from_points(bounds.min - Vec3::splat(1e-4), bounds.max + Vec3::splat(1e-4))
    }

    /// Möller-Trumbore ray-triangle intersection. Returns (t, u, v).
    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, f32, f32)> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        (t > 0.0 && t < t_max).then_some((t, u, v))
    }

    fn shading_normal(&self, u: f32, v: f32) -> Vec3 {
        match self.vertex_normals {
            Some([n0, n1, n2]) => {
                let w = 1.0 - u - v;
                (w * n0 + u * n1 + v * n2).normalize_or(self.face_normal)
            }
            None => self.face_normal,
        }
    }
}

/// Collects mesh instances and builds a [`TriangleScene`].
#[derive(Debug, Default)]
pub struct SceneBuilder {
    triangles: Vec<Triangle>,
    instance_offsets: Vec<u32>,
    materials: Vec<MaterialProperties>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `mesh` in the world with `transform`. Returns the instance id.
    pub fn add_mesh(&mut self, mesh: &Mesh, transform: Mat4) -> Result<u32, SceneError> {
        if mesh.indices.is_empty() {
            return Err(SceneError::EmptyMesh);
        }
        if let Some(normals) = &mesh.normals {
            if normals.len() != mesh.positions.len() {
                return Err(SceneError::NormalCountMismatch {
                    normals: normals.len(),
                    positions: mesh.positions.len(),
                });
            }
        }
        let len = mesh.positions.len();
        if let Some(&index) = mesh.indices.iter().flatten().find(|&&i| i as usize >= len) {
            return Err(SceneError::IndexOutOfRange { index, len });
        }

        let positions: Vec<Vec3> = mesh
            .positions
            .iter()
            .map(|&p| transform.transform_point3(p))
            .collect();
        let normals: Option<Vec<Vec3>> = mesh
            .normals
            .as_ref()
            .map(|ns| ns.iter().map(|&n| transform.transform_normal3(n)).collect());

        let instance = self.materials.len() as u32;
        self.instance_offsets.push(self.triangles.len() as u32);
        self.materials.push(mesh.material);

        for tri in &mesh.indices {
            let v = tri.map(|i| positions[i as usize]);
            let n = normals.as_ref().map(|ns| tri.map(|i| ns[i as usize]));
            self.triangles.push(Triangle::new(v, n));
        }

        Ok(instance)
    }

    pub fn build(self) -> TriangleScene {
        let bounds: Vec<Aabb> = self.triangles.iter().map(Triangle::bounds).collect();
        let bvh = Bvh::build(&bounds);

        debug!(
            "Scene built: {} instances, {} triangles, {} BVH nodes",
            self.materials.len(),
            self.triangles.len(),
            bvh.node_count()
        );

        TriangleScene {
            triangles: self.triangles,
            instance_offsets: self.instance_offsets,
            materials: self.materials,
            bvh,
        }
    }
}

/// Instanced triangle meshes behind a BVH.
#[derive(Debug)]
pub struct TriangleScene {
    triangles: Vec<Triangle>,
    /// Index of each instance's first triangle
    instance_offsets: Vec<u32>,
    materials: Vec<MaterialProperties>,
    bvh: Bvh,
}

impl TriangleScene {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn instance_count(&self) -> usize {
        self.materials.len()
    }

    /// Global index of the triangle that the hit refers to.
    fn triangle_index(&self, hit: &Hit) -> Option<usize> {
        let offset = *self.instance_offsets.get(hit.inst as usize)?;
        let index = (offset + hit.prim) as usize;
        (index < self.triangles.len()).then_some(index)
    }

    fn triangle(&self, hit: &Hit) -> Option<&Triangle> {
        self.triangle_index(hit).map(|i| &self.triangles[i])
    }

    /// Map a global triangle index back to (instance, primitive).
    fn locate(&self, index: u32) -> (u32, u32) {
        let inst = self.instance_offsets.partition_point(|&offset| offset <= index) - 1;
        (inst as u32, index - self.instance_offsets[inst])
    }
}

impl Scene for TriangleScene {
    fn intersect(&self, ray: &mut Ray) {
        let t_max = ray.t_max.min(ray.hit.t);
        let probe = *ray;
        let closest = self.bvh.closest_hit(&probe, t_max, |prim, bound| {
            self.triangles[prim as usize]
                .intersect(&probe, bound)
                .map(|(t, _, _)| t)
        });

        if let Some((index, _)) = closest {
            // Recompute barycentrics for the winner only
            if let Some((t, u, v)) = self.triangles[index as usize].intersect(&probe, t_max) {
                let (inst, prim) = self.locate(index);
                ray.hit = Hit { t, u, v, prim, inst };
            }
        }
    }

    fn is_occluded(&self, ray: &Ray) -> bool {
        self.bvh.any_hit(ray, ray.t_max, |prim| {
            self.triangles[prim as usize].intersect(ray, ray.t_max).is_some()
        })
    }

    fn material(&self, hit: &Hit) -> MaterialProperties {
        self.materials
            .get(hit.inst as usize)
            .copied()
            .unwrap_or_default()
    }

    fn geometry_normal(&self, hit: &Hit) -> Vec3 {
        self.triangle(hit).map_or(Vec3::Y, |t| t.face_normal)
    }

    fn shading_normal(&self, hit: &Hit) -> Vec3 {
        self.triangle(hit)
            .map_or(Vec3::Y, |t| t.shading_normal(hit.u, hit.v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> Mesh {
        Mesh::quad(5.0, MaterialProperties::diffuse(Vec3::ONE))
    }

    #[test]
    fn test_rejects_invalid_meshes() {
        let mut builder = SceneBuilder::new();
        let empty = Mesh::new(vec![Vec3::ZERO], vec![], MaterialProperties::default());
        assert_eq!(builder.add_mesh(&empty, Mat4::IDENTITY), Err(SceneError::EmptyMesh));

        let bad_index = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 3]],
            MaterialProperties::default(),
        );
        assert_eq!(
            builder.add_mesh(&bad_index, Mat4::IDENTITY),
            Err(SceneError::IndexOutOfRange { index: 3, len: 3 })
        );

        let bad_normals = floor().with_normals(vec![Vec3::Y; 2]);
        assert_eq!(
            builder.add_mesh(&bad_normals, Mat4::IDENTITY),
            Err(SceneError::NormalCountMismatch { normals: 2, positions: 4 })
        );
    }

    #[test]
    fn test_ray_hits_floor() {
        let mut builder = SceneBuilder::new();
        builder.add_mesh(&floor(), Mat4::IDENTITY).unwrap();
        let scene = builder.build();

        let mut ray = Ray::new(Vec3::new(1.0, 3.0, -2.0), -Vec3::Y);
        scene.intersect(&mut ray);
        assert!(!ray.hit.is_miss());
        assert!((ray.hit.t - 3.0).abs() < 1e-5);
        assert!((ray.intersection_point() - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
        assert!((scene.geometry_normal(&ray.hit) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_instances_keep_their_materials() {
        let mut builder = SceneBuilder::new();
        builder.add_mesh(&floor(), Mat4::IDENTITY).unwrap();
        let red = Mesh::quad(1.0, MaterialProperties::diffuse(Vec3::X));
        let inst = builder
            .add_mesh(&red, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        assert_eq!(inst, 1);
        let scene = builder.build();
        assert_eq!(scene.instance_count(), 2);
        assert_eq!(scene.triangle_count(), 4);

        let mut ray = Ray::new(Vec3::new(0.2, 5.0, 0.3), -Vec3::Y);
        scene.intersect(&mut ray);
        assert_eq!(ray.hit.inst, 1);
        assert!((ray.hit.t - 4.0).abs() < 1e-5);
        assert_eq!(scene.material(&ray.hit).base_color, Vec3::X);

        // Outside the small quad the floor is hit
        let mut ray = Ray::new(Vec3::new(3.0, 5.0, 3.0), -Vec3::Y);
        scene.intersect(&mut ray);
        assert_eq!(ray.hit.inst, 0);
        assert!(ray.hit.prim < 2);
    }

    #[test]
    fn test_occlusion_respects_t_max() {
        let mut builder = SceneBuilder::new();
        builder.add_mesh(&floor(), Mat4::IDENTITY).unwrap();
        let scene = builder.build();

        let down = Ray::with_max(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 1.5);
        assert!(!scene.is_occluded(&down));
        let down = Ray::with_max(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 2.5);
        assert!(scene.is_occluded(&down));
        let up = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        assert!(!scene.is_occluded(&up));
    }

    #[test]
    fn test_smooth_sphere_normals() {
        let mut builder = SceneBuilder::new();
        let sphere = Mesh::uv_sphere(1.0, 32, 16, MaterialProperties::default());
        builder
            .add_mesh(&sphere, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))
            .unwrap();
        let scene = builder.build();

        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        scene.intersect(&mut ray);
        assert!(!ray.hit.is_miss());
        assert!((ray.hit.t - 4.0).abs() < 0.02);
        let n = scene.shading_normal(&ray.hit);
        assert!((n - Vec3::Z).length() < 0.05, "{n:?}");
    }

    #[test]
    fn test_miss_leaves_far_hit() {
        let scene = SceneBuilder::new().build();
        let mut ray = Ray::new(Vec3::ZERO, Vec3::X);
        scene.intersect(&mut ray);
        assert!(ray.hit.is_miss());
    }
}
