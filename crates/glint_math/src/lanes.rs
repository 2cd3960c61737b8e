//! Four 3D vectors stored as a struct of arrays.
//!
//! Each component lives in its own `Vec4`, so one arithmetic call processes
//! all four vectors at once (SSE on x86 through glam).

use bytemuck::{Pod, Zeroable};

use crate::{Vec3, Vec4};

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3x4 {
    pub x: Vec4,
    pub y: Vec4,
    pub z: Vec4,
}

impl Vec3x4 {
    pub const ZERO: Vec3x4 = Vec3x4 {
        x: Vec4::ZERO,
        y: Vec4::ZERO,
        z: Vec4::ZERO,
    };

    /// Broadcast one vector into all four lanes.
    #[inline]
    pub fn splat(v: Vec3) -> Self {
        Self {
            x: Vec4::splat(v.x),
            y: Vec4::splat(v.y),
            z: Vec4::splat(v.z),
        }
    }

    pub fn from_array(vs: [Vec3; 4]) -> Self {
        Self {
            x: Vec4::new(vs[0].x, vs[1].x, vs[2].x, vs[3].x),
            y: Vec4::new(vs[0].y, vs[1].y, vs[2].y, vs[3].y),
            z: Vec4::new(vs[0].z, vs[1].z, vs[2].z, vs[3].z),
        }
    }

    /// Extract lane `i` (0..4).
    #[inline]
    pub fn lane(&self, i: usize) -> Vec3 {
        Vec3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Overwrite lane `i` (0..4).
    pub fn set_lane(&mut self, i: usize, v: Vec3) {
        self.x[i] = v.x;
        self.y[i] = v.y;
        self.z[i] = v.z;
    }

    #[inline]
    pub fn sub(&self, rhs: &Vec3x4) -> Vec3x4 {
        Vec3x4 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }

    /// Scale every lane by its own factor.
    #[inline]
    pub fn scale(&self, s: Vec4) -> Vec3x4 {
        Vec3x4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Per-lane dot products.
    #[inline]
    pub fn dot(&self, rhs: &Vec3x4) -> Vec4 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length_squared(&self) -> Vec4 {
        self.dot(self)
    }
}
