//! Diffuse lobes.
//!
//! Each term is the factor multiplying `diffuse_reflectance / PI`, so it is
//! also the sample weight of a cosine-distributed direction.

use std::f32::consts::FRAC_1_PI;

use super::config::{BrdfConfig, DiffuseModel};
use super::BrdfData;
use crate::material::Color;

#[inline]
pub fn lambertian(_data: &BrdfData) -> f32 {
    1.0
}

/// Qualitative Oren-Nayar, with the roughness mapped to sigma^2 = alpha^2.
pub fn oren_nayar(data: &BrdfData) -> f32 {
    let sigma2 = data.alpha_squared;
    let a = 1.0 - 0.5 * sigma2 / (sigma2 + 0.33);
    let b = 0.45 * sigma2 / (sigma2 + 0.09);

    let s = data.v.dot(data.l) - data.n_dot_v * data.n_dot_l;
    let t = if s > 0.0 {
        data.n_dot_l.max(data.n_dot_v)
    } else {
        1.0
    };
    a + b * s / t
}

/// Burley's retro-reflective diffuse.
pub fn disney_diffuse(data: &BrdfData) -> f32 {
    let fd90_minus_one = 2.0 * data.roughness * data.l_dot_h * data.l_dot_h - 0.5;
    let fdl = 1.0 + fd90_minus_one * (1.0 - data.n_dot_l).powi(5);
    let fdv = 1.0 + fd90_minus_one * (1.0 - data.n_dot_v).powi(5);
    fdl * fdv
}

/// Burley diffuse renormalized so it never reflects more than it receives.
pub fn frostbite_disney_diffuse(data: &BrdfData) -> f32 {
    let energy_bias = 0.5 * data.roughness;
    let energy_factor = 1.0 + (1.0 / 1.51 - 1.0) * data.roughness;

    let fd90_minus_one =
        energy_bias + 2.0 * data.l_dot_h * data.l_dot_h * data.roughness - 1.0;
    let fdl = 1.0 + fd90_minus_one * (1.0 - data.n_dot_l).powi(5);
    let fdv = 1.0 + fd90_minus_one * (1.0 - data.n_dot_v).powi(5);
    fdl * fdv * energy_factor
}

impl BrdfConfig {
    /// Configured diffuse term, zero when the diffuse lobe is disabled.
    pub fn diffuse_term(&self, data: &BrdfData) -> f32 {
        match self.diffuse {
            DiffuseModel::Lambertian => lambertian(data),
            DiffuseModel::OrenNayar => oren_nayar(data),
            DiffuseModel::Disney => disney_diffuse(data),
            DiffuseModel::Frostbite => frostbite_disney_diffuse(data),
            DiffuseModel::None => 0.0,
        }
    }

    /// Diffuse BRDF times NdotL.
    #[inline]
    pub fn eval_diffuse(&self, data: &BrdfData) -> Color {
        data.diffuse_reflectance * (self.diffuse_term(data) * FRAC_1_PI * data.n_dot_l)
    }
}
