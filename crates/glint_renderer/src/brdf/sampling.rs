//! Importance sampling of the diffuse and specular lobes.
//!
//! All directions here live in the local shading frame where the normal is
//! +Z.

use std::f32::consts::{PI, TAU};

use glint_math::{reflect, Vec2, Vec3};

use super::config::{BrdfConfig, G2Formulation, MicrofacetDistribution, SpecularSampling};
use super::fresnel::shadowed_f90;
use super::microfacet::{ggx_d, smith_g1_ggx};
use crate::material::Color;

/// Cosine-weighted hemisphere sample. Returns the direction and its pdf.
pub fn sample_hemisphere(u: Vec2) -> (Vec3, f32) {
    let a = u.x.sqrt();
    let b = TAU * u.y;

    let direction = Vec3::new(a * b.cos(), a * b.sin(), (1.0 - u.x).max(0.0).sqrt());
    (direction, direction.z / PI)
}

/// Stretch the view vector into the hemisphere configuration where the
/// distribution has unit roughness.
#[inline]
fn stretch_view(v_local: Vec3, alpha_2d: Vec2) -> Vec3 {
    Vec3::new(alpha_2d.x * v_local.x, alpha_2d.y * v_local.y, v_local.z).normalize()
}

/// Unstretch a hemisphere normal back to the ellipsoid configuration.
#[inline]
fn unstretch_normal(nh: Vec3, alpha_2d: Vec2) -> Vec3 {
    Vec3::new(alpha_2d.x * nh.x, alpha_2d.y * nh.y, nh.z.max(0.0)).normalize()
}

/// GGX visible-normal sample (Heitz 2018).
pub fn sample_ggx_vndf(v_local: Vec3, alpha_2d: Vec2, u: Vec2) -> Vec3 {
    let vh = stretch_view(v_local, alpha_2d);

    // Orthonormal basis around Vh, special-cased when Vh is the pole
    let lensq = vh.x * vh.x + vh.y * vh.y;
    let t1_axis = if lensq > 0.0 {
        Vec3::new(-vh.y, vh.x, 0.0) / lensq.sqrt()
    } else {
        Vec3::X
    };
    let t2_axis = vh.cross(t1_axis);

    // Uniform point on the projected disk, squeezed into the visible half
    let r = u.x.sqrt();
    let phi = TAU * u.y;
    let t1 = r * phi.cos();
    let t2 = r * phi.sin();
    let s = 0.5 * (1.0 + vh.z);
    let lower = (1.0 - t1 * t1).max(0.0).sqrt();
    let t2 = lower + s * (t2 - lower);

    let nh = t1 * t1_axis
        + t2 * t2_axis
        + (1.0 - t1 * t1 - t2 * t2).max(0.0).sqrt() * vh;

    unstretch_normal(nh, alpha_2d)
}

/// GGX visible-normal sample through a spherical cap (Dupuy and Benyoub).
pub fn sample_ggx_vndf_spherical_caps(v_local: Vec3, alpha_2d: Vec2, u: Vec2) -> Vec3 {
    let vh = stretch_view(v_local, alpha_2d);

    let phi = TAU * u.x;
    let z = (1.0 - u.y) * (1.0 + vh.z) - vh.z;
    let sin_theta = (1.0 - z * z).clamp(0.0, 1.0).sqrt();
    let nh = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), z) + vh;

    unstretch_normal(nh, alpha_2d)
}

/// Walter's sample of the Beckmann distribution of normals.
pub fn sample_beckmann_walter(alpha_2d: Vec2, u: Vec2) -> Vec3 {
    let alpha = 0.5 * (alpha_2d.x + alpha_2d.y);

    let tan_theta_squared = -(alpha * alpha) * (1.0 - u.x).ln();
    let phi = TAU * u.y;
    let cos_theta = 1.0 / (1.0 + tan_theta_squared).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta).normalize()
}

/// Walter's sample of the GGX distribution of normals.
pub fn sample_ggx_walter(alpha_2d: Vec2, u: Vec2) -> Vec3 {
    let alpha = 0.5 * (alpha_2d.x + alpha_2d.y);
    let alpha_squared = alpha * alpha;

    let cos_theta_squared = (1.0 - u.x) / ((alpha_squared - 1.0) * u.x + 1.0);
    let cos_theta = cos_theta_squared.sqrt();
    let sin_theta = (1.0 - cos_theta_squared).max(0.0).sqrt();
    let phi = TAU * u.y;

    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta).normalize()
}

/// Pdf of a reflected direction produced by GGX VNDF sampling.
pub fn sample_ggx_vndf_reflection_pdf(
    alpha_squared: f32,
    n_dot_h: f32,
    n_dot_v: f32,
) -> f32 {
    let n_dot_h = n_dot_h.max(1e-5);
    let n_dot_v = n_dot_v.max(1e-5);
    ggx_d(alpha_squared.max(1e-5), n_dot_h) * smith_g1_ggx(alpha_squared, n_dot_v * n_dot_v)
        / (4.0 * n_dot_v)
}

/// Alpha widened for Walter sampling so the maximal sample weight stays
/// around 4.
#[inline]
pub fn walters_trick(alpha: f32, n_dot_v: f32) -> f32 {
    (1.2 - 0.2 * n_dot_v.abs().sqrt()) * alpha
}

impl BrdfConfig {
    /// Pdf of a reflected direction produced by Walter sampling.
    pub fn sample_walter_reflection_pdf(
        &self,
        alpha_squared: f32,
        n_dot_h: f32,
        l_dot_h: f32,
    ) -> f32 {
        let n_dot_h = n_dot_h.max(1e-5);
        let l_dot_h = l_dot_h.max(1e-5);
        self.microfacet_d(alpha_squared, n_dot_h) * n_dot_h / (4.0 * l_dot_h)
    }

    /// Pdf of the configured specular sampling routine.
    pub fn specular_pdf(
        &self,
        alpha_squared: f32,
        n_dot_h: f32,
        n_dot_v: f32,
        l_dot_h: f32,
    ) -> f32 {
        match self.effective_specular_sampling() {
            SpecularSampling::Walter => {
                self.sample_walter_reflection_pdf(alpha_squared, n_dot_h, l_dot_h)
            }
            SpecularSampling::Vndf | SpecularSampling::VndfSphericalCaps => {
                sample_ggx_vndf_reflection_pdf(alpha_squared, n_dot_h, n_dot_v)
            }
        }
    }

    /// Sample a microfacet normal. Zero roughness always returns +Z.
    pub fn sample_specular_half_vector(&self, v_local: Vec3, alpha: f32, u: Vec2) -> Vec3 {
        if alpha == 0.0 {
            return Vec3::Z;
        }

        let alpha_2d = Vec2::splat(alpha);
        match (self.distribution, self.effective_specular_sampling()) {
            (MicrofacetDistribution::Beckmann, _) => sample_beckmann_walter(alpha_2d, u),
            (MicrofacetDistribution::Ggx, SpecularSampling::Walter) => {
                sample_ggx_walter(alpha_2d, u)
            }
            (MicrofacetDistribution::Ggx, SpecularSampling::VndfSphericalCaps) => {
                sample_ggx_vndf_spherical_caps(v_local, alpha_2d, u)
            }
            (MicrofacetDistribution::Ggx, SpecularSampling::Vndf) => {
                sample_ggx_vndf(v_local, alpha_2d, u)
            }
        }
    }

    pub fn specular_sample_weight_ggx_vndf(
        &self,
        alpha: f32,
        alpha_squared: f32,
        n_dot_l: f32,
        n_dot_v: f32,
    ) -> f32 {
        match self.g2 {
            G2Formulation::Separable => smith_g1_ggx(alpha_squared, n_dot_l * n_dot_l),
            _ => self.smith_g2_over_g1_height_correlated(alpha, alpha_squared, n_dot_l, n_dot_v),
        }
    }

    pub fn specular_sample_weight_beckmann_walter(
        &self,
        alpha: f32,
        alpha_squared: f32,
        n_dot_l: f32,
        n_dot_v: f32,
        h_dot_l: f32,
        n_dot_h: f32,
    ) -> f32 {
        h_dot_l * self.smith_g2(alpha, alpha_squared, n_dot_l, n_dot_v) / (n_dot_v * n_dot_h)
    }

    pub fn specular_sample_weight_ggx_walter(
        &self,
        alpha: f32,
        alpha_squared: f32,
        n_dot_l: f32,
        n_dot_v: f32,
        h_dot_l: f32,
        n_dot_h: f32,
    ) -> f32 {
        let g2 = self.smith_g2(alpha, alpha_squared, n_dot_l, n_dot_v);
        if self.g2_divided_by_denominator() {
            n_dot_l * h_dot_l * g2 * 4.0 / n_dot_h
        } else {
            h_dot_l * g2 / (n_dot_v * n_dot_h)
        }
    }

    /// Specular BRDF times NdotL divided by the pdf of the configured
    /// sampler, without Fresnel.
    pub fn specular_sample_weight(
        &self,
        alpha: f32,
        alpha_squared: f32,
        n_dot_l: f32,
        n_dot_v: f32,
        h_dot_l: f32,
        n_dot_h: f32,
    ) -> f32 {
        match (self.distribution, self.effective_specular_sampling()) {
            (MicrofacetDistribution::Beckmann, _) => self.specular_sample_weight_beckmann_walter(
                alpha,
                alpha_squared,
                n_dot_l,
                n_dot_v,
                h_dot_l,
                n_dot_h,
            ),
            (MicrofacetDistribution::Ggx, SpecularSampling::Walter) => self
                .specular_sample_weight_ggx_walter(
                    alpha,
                    alpha_squared,
                    n_dot_l,
                    n_dot_v,
                    h_dot_l,
                    n_dot_h,
                ),
            (MicrofacetDistribution::Ggx, _) => {
                self.specular_sample_weight_ggx_vndf(alpha, alpha_squared, n_dot_l, n_dot_v)
            }
        }
    }

    /// Sample the specular lobe. Returns the local light direction and the
    /// sample weight, which is zero for directions under the surface.
    pub fn sample_specular_microfacet(
        &self,
        v_local: Vec3,
        alpha: f32,
        alpha_squared: f32,
        specular_f0: Color,
        u: Vec2,
    ) -> (Vec3, Color) {
        let h_local = self.sample_specular_half_vector(v_local, alpha, u);
        let l_local = reflect(-v_local, h_local);

        if l_local.z <= 0.0 {
            return (l_local, Color::ZERO);
        }

        // HdotL equals HdotV for a mirrored direction
        let h_dot_l = h_local.dot(l_local).clamp(1e-5, 1.0);
        let n_dot_l = l_local.z.clamp(1e-5, 1.0);
        let n_dot_v = v_local.z.clamp(1e-5, 1.0);
        let n_dot_h = h_local.z.clamp(1e-5, 1.0);

        let f = self.eval_fresnel(specular_f0, shadowed_f90(specular_f0), h_dot_l);
        let weight = f * self.specular_sample_weight(
            alpha,
            alpha_squared,
            n_dot_l,
            n_dot_v,
            h_dot_l,
            n_dot_h,
        );
        (l_local, weight)
    }
}
