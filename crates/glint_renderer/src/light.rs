//! Analytic lights and the registry queried by the direct-lighting estimator.
//!
//! Point lights live in a fixed four-lane bank so their directions, distances
//! and falloff are computed for all lights at once.

use glint_math::{Vec3, Vec3x4, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::Color;

/// Capacity of the point-light bank.
pub const POINT_LIGHTS: usize = 4;

/// Spot lights illuminate points whose direction cosine exceeds this.
pub const SPOT_COS_CUTOFF: f32 = 0.9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LightError {
    #[error("point light bank is full ({0} lights)")]
    BankFull(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self { position, color }
    }
}

/// Light arriving from infinitely far away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (normalized)
    pub direction: Vec3,
    pub color: Color,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Color) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
        }
    }
}

/// Point light restricted to a hard-edged cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    /// Cone axis, pointing away from the light (normalized)
    pub direction: Vec3,
    pub color: Color,
}

impl SpotLight {
    pub fn new(position: Vec3, direction: Vec3, color: Color) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            color,
        }
    }

    /// Radiance reaching `point`, ignoring occlusion.
    pub fn radiance_at(&self, point: Vec3) -> Color {
        let to_point = point - self.position;
        let distance_squared = to_point.length_squared();
        if distance_squared == 0.0 {
            return Color::ZERO;
        }

        let cos_angle = (to_point / distance_squared.sqrt()).dot(self.direction);
        if cos_angle > SPOT_COS_CUTOFF {
            self.color / distance_squared
        } else {
            Color::ZERO
        }
    }
}

/// Which light a point light's BRDF evaluation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointLightBrdfPolicy {
    /// Every lane is weighted by the BRDF toward its own light
    #[default]
    PerLane,
    /// The summed radiance of all visible lanes is weighted by the BRDF
    /// toward one randomly chosen lane
    SharedLane,
}

/// Per-lane results of [`PointLightBank::evaluate`].
#[derive(Debug, Clone, Copy)]
pub struct PointLightBatch {
    /// Unit directions from the shading point to each light
    pub directions: Vec3x4,
    pub distances: Vec4,
    /// Cosine between the normal and each direction
    pub cosines: Vec4,
    /// Inverse-square radiance, zero for dropped lanes
    pub radiance: Vec3x4,
    /// Active lanes in front of the surface
    pub lit: [bool; POINT_LIGHTS],
}

impl PointLightBatch {
    /// Indices of lanes that still need a shadow ray.
    pub fn lit_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..POINT_LIGHTS).filter(|&i| self.lit[i])
    }
}

/// Up to four point lights stored as lanes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointLightBank {
    positions: Vec3x4,
    colors: Vec3x4,
    len: usize,
}

impl PointLightBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, light: PointLight) -> Result<(), LightError> {
        if self.len == POINT_LIGHTS {
            return Err(LightError::BankFull(POINT_LIGHTS));
        }
        self.positions.set_lane(self.len, light.position);
        self.colors.set_lane(self.len, light.color);
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Option<PointLight> {
        (i < self.len).then(|| PointLight::new(self.positions.lane(i), self.colors.lane(i)))
    }

    /// Directions, distances, cosines and falloff of all lanes at once.
    pub fn evaluate(&self, point: Vec3, normal: Vec3) -> PointLightBatch {
        let to_light = self.positions.sub(&Vec3x4::splat(point));
        let distance_squared = to_light.length_squared();
        let distances = Vec4::from_array(distance_squared.to_array().map(f32::sqrt));

        // A light sitting on the shading point has no direction
        let inv_distances = Vec4::select(
            distance_squared.cmpgt(Vec4::ZERO),
            distances.recip(),
            Vec4::ZERO,
        );
        let directions = to_light.scale(inv_distances);
        let cosines = directions.dot(&Vec3x4::splat(normal));

        let lit: [bool; POINT_LIGHTS] =
            std::array::from_fn(|i| i < self.len && cosines[i] > 0.0);
        let mask = Vec4::from_array(lit.map(|on| if on { 1.0 } else { 0.0 }));

        PointLightBatch {
            directions,
            distances,
            cosines,
            radiance: self.colors.scale(inv_distances * inv_distances * mask),
            lit,
        }
    }
}

/// All lights of a scene, grouped by class.
#[derive(Debug, Clone, Default)]
pub struct LightRegistry {
    pub points: PointLightBank,
    pub directional: Vec<DirectionalLight>,
    pub spots: Vec<SpotLight>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, light: PointLight) -> Result<(), LightError> {
        self.points.push(light)
    }

    pub fn add_directional(&mut self, light: DirectionalLight) {
        self.directional.push(light);
    }

    pub fn add_spot(&mut self, light: SpotLight) {
        self.spots.push(light);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.directional.is_empty() && self.spots.is_empty()
    }
}
