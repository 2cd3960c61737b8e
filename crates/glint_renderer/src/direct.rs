//! Stochastic direct-lighting estimator.
//!
//! Each shading point samples one light class with fixed probabilities and
//! divides its contribution by that probability. Within a class one light is
//! picked uniformly and scaled by the class size, so the expected value is
//! the sum over every light in the scene.

use glint_math::{Ray, Vec3, BVH_FAR, EPSILON};
use rand::RngCore;

use crate::brdf::BrdfConfig;
use crate::gen_f32;
use crate::light::{
    DirectionalLight, LightRegistry, PointLightBrdfPolicy, SpotLight, POINT_LIGHTS,
};
use crate::material::{Color, MaterialProperties};
use crate::scene::Scene;

pub const POINT_LIGHT_PROBABILITY: f32 = 0.3;
pub const DIRECTIONAL_LIGHT_PROBABILITY: f32 = 0.5;
pub const SPOT_LIGHT_PROBABILITY: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightClass {
    Point,
    Directional,
    Spot,
}

impl LightClass {
    pub const ALL: [LightClass; 3] = [LightClass::Point, LightClass::Directional, LightClass::Spot];

    pub fn probability(self) -> f32 {
        match self {
            LightClass::Point => POINT_LIGHT_PROBABILITY,
            LightClass::Directional => DIRECTIONAL_LIGHT_PROBABILITY,
            LightClass::Spot => SPOT_LIGHT_PROBABILITY,
        }
    }

    /// Map a uniform number in [0, 1) to a class.
    pub fn select(u: f32) -> Self {
        if u < POINT_LIGHT_PROBABILITY {
            LightClass::Point
        } else if u < POINT_LIGHT_PROBABILITY + DIRECTIONAL_LIGHT_PROBABILITY {
            LightClass::Directional
        } else {
            LightClass::Spot
        }
    }

    /// Number of lights of this class in `lights`.
    pub fn count_in(self, lights: &LightRegistry) -> usize {
        match self {
            LightClass::Point => lights.points.len(),
            LightClass::Directional => lights.directional.len(),
            LightClass::Spot => lights.spots.len(),
        }
    }

    /// Classes that are still selected with their fixed probability but hold
    /// no light. Their samples contribute black.
    pub fn empty_in(lights: &LightRegistry) -> Vec<LightClass> {
        Self::ALL
            .into_iter()
            .filter(|class| class.count_in(lights) == 0)
            .collect()
    }
}

/// Surface point being lit.
#[derive(Debug, Clone, Copy)]
pub struct ShadingPoint<'m> {
    pub position: Vec3,
    pub normal: Vec3,
    /// Direction toward the viewer
    pub view: Vec3,
    pub material: &'m MaterialProperties,
}

pub struct DirectLighting<'a, S: Scene + ?Sized> {
    scene: &'a S,
    lights: &'a LightRegistry,
    brdf: &'a BrdfConfig,
    policy: PointLightBrdfPolicy,
}

impl<'a, S: Scene + ?Sized> DirectLighting<'a, S> {
    pub fn new(
        scene: &'a S,
        lights: &'a LightRegistry,
        brdf: &'a BrdfConfig,
        policy: PointLightBrdfPolicy,
    ) -> Self {
        Self {
            scene,
            lights,
            brdf,
            policy,
        }
    }

    /// One-sample estimate over all light classes.
    pub fn sample(&self, sp: &ShadingPoint, rng: &mut dyn RngCore) -> Color {
        let class = LightClass::select(gen_f32(rng));
        self.class_contribution(class, sp, rng) / class.probability()
    }

    /// Contribution of the first directional light only, without any
    /// probability weighting.
    pub fn deterministic(&self, sp: &ShadingPoint) -> Color {
        self.lights
            .directional
            .first()
            .map_or(Color::ZERO, |light| self.directional(light, sp))
    }

    /// Unweighted contribution of one class. Classes holding several lights
    /// sample one of them and scale by the count.
    pub fn class_contribution(
        &self,
        class: LightClass,
        sp: &ShadingPoint,
        rng: &mut dyn RngCore,
    ) -> Color {
        match class {
            LightClass::Point => self.point_lights(sp, rng),
            LightClass::Directional => pick(&self.lights.directional, rng)
                .map_or(Color::ZERO, |(light, count)| self.directional(light, sp) * count),
            LightClass::Spot => pick(&self.lights.spots, rng)
                .map_or(Color::ZERO, |(light, count)| self.spot(light, sp) * count),
        }
    }

    /// All point lights at once. The BRDF weighting follows the configured
    /// [`PointLightBrdfPolicy`].
    pub fn point_lights(&self, sp: &ShadingPoint, rng: &mut dyn RngCore) -> Color {
        if self.lights.points.is_empty() {
            return Color::ZERO;
        }

        let batch = self.lights.points.evaluate(sp.position, sp.normal);
        let visible: [bool; POINT_LIGHTS] = std::array::from_fn(|i| {
            batch.lit[i]
                && self.unoccluded(sp.position, batch.directions.lane(i), batch.distances[i])
        });

        match self.policy {
            PointLightBrdfPolicy::PerLane => (0..POINT_LIGHTS)
                .filter(|&i| visible[i])
                .map(|i| {
                    self.brdf.eval_combined_brdf(
                        sp.normal,
                        batch.directions.lane(i),
                        sp.view,
                        sp.material,
                    ) * batch.radiance.lane(i)
                })
                .sum(),
            PointLightBrdfPolicy::SharedLane => {
                // Only unoccluded lanes are candidates for the shared BRDF
                let lanes: Vec<usize> = (0..POINT_LIGHTS).filter(|&i| visible[i]).collect();
                let Some((&lane, _)) = pick(&lanes, rng) else {
                    return Color::ZERO;
                };
                let radiance: Color = lanes.iter().map(|&i| batch.radiance.lane(i)).sum();
                self.brdf.eval_combined_brdf(
                    sp.normal,
                    batch.directions.lane(lane),
                    sp.view,
                    sp.material,
                ) * radiance
            }
        }
    }

    pub fn directional(&self, light: &DirectionalLight, sp: &ShadingPoint) -> Color {
        let l = -light.direction;
        if sp.normal.dot(l) <= 0.0 || !self.unoccluded(sp.position, l, BVH_FAR) {
            return Color::ZERO;
        }
        self.brdf.eval_combined_brdf(sp.normal, l, sp.view, sp.material) * light.color
    }

    pub fn spot(&self, light: &SpotLight, sp: &ShadingPoint) -> Color {
        let radiance = light.radiance_at(sp.position);
        if radiance == Color::ZERO {
            return Color::ZERO;
        }

        let to_light = light.position - sp.position;
        let distance = to_light.length();
        let l = to_light / distance;
        if sp.normal.dot(l) <= 0.0 || !self.unoccluded(sp.position, l, distance) {
            return Color::ZERO;
        }
        self.brdf.eval_combined_brdf(sp.normal, l, sp.view, sp.material) * radiance
    }

    /// Shadow ray from just above `origin` to a light `distance` away.
    fn unoccluded(&self, origin: Vec3, direction: Vec3, distance: f32) -> bool {
        let t_max = if distance >= BVH_FAR {
            BVH_FAR
        } else {
            (distance - 2.0 * EPSILON).max(0.0)
        };
        let ray = Ray::with_max(origin + direction * EPSILON, direction, t_max);
        !self.scene.is_occluded(&ray)
    }
}

/// Uniformly pick one item. Returns it with the item count as a float.
fn pick<'l, T>(items: &'l [T], rng: &mut dyn RngCore) -> Option<(&'l T, f32)> {
    match items.len() {
        0 => None,
        1 => Some((&items[0], 1.0)),
        n => {
            let index = ((gen_f32(rng) * n as f32) as usize).min(n - 1);
            Some((&items[index], n as f32))
        }
    }
}
