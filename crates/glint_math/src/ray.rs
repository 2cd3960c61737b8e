use crate::Vec3;

/// Offset applied along a normal or direction when spawning secondary rays.
///
/// Shared by shadow, reflection and refraction rays so that every ray leaving
/// a surface clears it by the same distance.
pub const EPSILON: f32 = 0.01;

/// Distance reported by an intersection query that found nothing.
pub const BVH_FAR: f32 = 1e30;

/// Intersection record filled in by the scene's intersection oracle.
///
/// `u` and `v` are the barycentric weights of the second and third vertex of
/// the hit triangle; `prim` indexes the triangle inside its instance and
/// `inst` the instance itself.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
    pub prim: u32,
    pub inst: u32,
}

impl Default for Hit {
    fn default() -> Self {
        Self {
            t: BVH_FAR,
            u: 0.0,
            v: 0.0,
            prim: 0,
            inst: 0,
        }
    }
}

impl Hit {
    /// True when no surface was found.
    #[inline]
    pub fn is_miss(&self) -> bool {
        self.t >= BVH_FAR
    }
}

/// A ray in 3D space with a distance bound and a mutable hit record.
///
/// The direction is normalized on construction, so `t` values are distances.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Intersections further than this are ignored.
    pub t_max: f32,
    pub hit: Hit,
}

impl Ray {
    /// Create an unbounded ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_max(origin, direction, BVH_FAR)
    }

    /// Create a ray that only reports intersections closer than `t_max`.
    pub fn with_max(origin: Vec3, direction: Vec3, t_max: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            t_max,
            hit: Hit::default(),
        }
    }

    /// Spawn a ray leaving `point`, pushed off the surface by [`EPSILON`]
    /// along `offset_dir`.
    pub fn offset(point: Vec3, offset_dir: Vec3, direction: Vec3) -> Self {
        Self::new(point + offset_dir * EPSILON, direction)
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Point of the recorded intersection.
    #[inline]
    pub fn intersection_point(&self) -> Vec3 {
        self.at(self.hit.t)
    }
}
