//! Indexed triangle meshes and a few procedural generators.

use std::f32::consts::{PI, TAU};

use glint_math::Vec3;

use crate::material::MaterialProperties;

/// Triangle mesh in object space with one material.
///
/// Triangles are counter-clockwise when seen from the side their face normal
/// points to.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Per-vertex shading normals
    pub normals: Option<Vec<Vec3>>,
    pub indices: Vec<[u32; 3]>,
    pub material: MaterialProperties,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<[u32; 3]>, material: MaterialProperties) -> Self {
        Self {
            positions,
            normals: None,
            indices,
            material,
        }
    }

    /// Builder method to attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Square of side `2 * half_size` in the XZ plane, facing +Y.
    pub fn quad(half_size: f32, material: MaterialProperties) -> Self {
        let s = half_size;
        let positions = vec![
            Vec3::new(-s, 0.0, -s),
            Vec3::new(s, 0.0, -s),
            Vec3::new(s, 0.0, s),
            Vec3::new(-s, 0.0, s),
        ];
        Self::new(positions, vec![[0, 2, 1], [0, 3, 2]], material)
    }

    /// Latitude-longitude sphere centred at the origin with smooth normals.
    ///
    /// `segments` and `rings` are clamped to at least 3 and 2.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32, material: MaterialProperties) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut positions = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        let mut normals = Vec::with_capacity(positions.capacity());

        for ring in 0..=rings {
            let theta = PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let phi = TAU * segment as f32 / segments as f32;
                let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                positions.push(n * radius);
                normals.push(n);
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity((2 * rings * segments) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                let c = b + 1;
                let d = a + 1;

                // The pole rows collapse one triangle of each quad
                if ring != 0 {
                    indices.push([a, d, b]);
                }
                if ring != rings - 1 {
                    indices.push([d, c, b]);
                }
            }
        }

        Self::new(positions, indices, material).with_normals(normals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &Mesh, tri: [u32; 3]) -> Vec3 {
        let [a, b, c] = tri.map(|i| mesh.positions[i as usize]);
        (b - a).cross(c - a)
    }

    #[test]
    fn test_quad_faces_up() {
        let quad = Mesh::quad(2.0, MaterialProperties::default());
        assert_eq!(quad.triangle_count(), 2);
        for &tri in &quad.indices {
            let n = face_normal(&quad, tri).normalize();
            assert!((n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_faces_outward() {
        let sphere = Mesh::uv_sphere(1.5, 16, 8, MaterialProperties::default());
        assert_eq!(sphere.triangle_count(), 2 * 16 * 8 - 2 * 16);

        for &tri in &sphere.indices {
            let n = face_normal(&sphere, tri);
            assert!(n.length() > 0.0, "degenerate triangle {tri:?}");
            let centre = tri
                .iter()
                .map(|&i| sphere.positions[i as usize])
                .sum::<Vec3>()
                / 3.0;
            assert!(n.dot(centre) > 0.0);
        }

        let normals = sphere.normals.as_ref().unwrap();
        assert_eq!(normals.len(), sphere.positions.len());
        for (p, n) in sphere.positions.iter().zip(normals) {
            assert!((p.length() - 1.5).abs() < 1e-4);
            assert!((*p / 1.5 - *n).length() < 1e-4);
        }
    }
}
