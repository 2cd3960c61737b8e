//! Fresnel terms and color-space helpers.

use glint_math::Vec3;

use super::config::{BrdfConfig, FresnelModel};
use crate::material::Color;

/// Specular reflectance of common dielectrics at normal incidence (4%).
pub const MIN_DIELECTRICS_F0: f32 = 0.04;

/// Luminance of a linear color (Rec. 709).
#[inline]
pub fn luminance(rgb: Color) -> f32 {
    rgb.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

fn srgb_channel_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert an sRGB-encoded color to linear.
pub fn srgb_to_linear(srgb: Color) -> Color {
    Color::new(
        srgb_channel_to_linear(srgb.x),
        srgb_channel_to_linear(srgb.y),
        srgb_channel_to_linear(srgb.z),
    )
}

/// Diffuse albedo: metals have none.
#[inline]
pub fn base_color_to_diffuse_reflectance(base_color: Color, metalness: f32) -> Color {
    base_color * (1.0 - metalness)
}

/// F90 attenuation for very dark F0, which cannot be physically reached.
#[inline]
pub fn shadowed_f90(f0: Color) -> f32 {
    (luminance(f0) / MIN_DIELECTRICS_F0).min(1.0)
}

/// Schlick's approximation. Exactly `f0` at `n_dot_s == 1` and exactly `f90`
/// at `n_dot_s == 0`.
#[inline]
pub fn eval_fresnel_schlick(f0: Color, f90: f32, n_dot_s: f32) -> Color {
    let w = (1.0 - n_dot_s).powi(5);
    f0 * (1.0 - w) + Color::splat(f90) * w
}

/// Spherical Gaussian fit of Schlick's curve.
#[inline]
pub fn eval_fresnel_spherical_gaussian(f0: Color, f90: f32, n_dot_s: f32) -> Color {
    let w = ((-5.55473 * n_dot_s - 6.983146) * n_dot_s).exp2();
    f0 * (1.0 - w) + Color::splat(f90) * w
}

impl BrdfConfig {
    /// Specular reflectance at normal incidence.
    ///
    /// Dielectrics use 4%, or 0.16 * reflectance^2 when the reflectance
    /// parameter is enabled. Metals take their base color.
    pub fn base_color_to_specular_f0(
        &self,
        base_color: Color,
        metalness: f32,
        reflectance: f32,
    ) -> Color {
        let min_f0 = if self.use_reflectance_parameter {
            0.16 * reflectance * reflectance
        } else {
            MIN_DIELECTRICS_F0
        };
        Color::splat(min_f0).lerp(base_color, metalness)
    }

    #[inline]
    pub fn eval_fresnel(&self, f0: Color, f90: f32, n_dot_s: f32) -> Color {
        match self.fresnel {
            FresnelModel::Schlick => eval_fresnel_schlick(f0, f90, n_dot_s),
            FresnelModel::SphericalGaussian => eval_fresnel_spherical_gaussian(f0, f90, n_dot_s),
        }
    }
}
