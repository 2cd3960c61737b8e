//! Microfacet BRDF library.
//!
//! A combined diffuse plus specular BRDF with selectable normal distribution,
//! masking-shadowing, Fresnel and diffuse models. [`BrdfConfig`] carries the
//! selection. Its methods prepare per-direction data, evaluate the BRDF for
//! light sampling, and importance sample one lobe for indirect bounces.
//!
//! Every evaluated value already includes the NdotL cosine.

mod config;
mod diffuse;
mod fresnel;
mod microfacet;
mod sampling;

pub use config::{
    BrdfConfig, DiffuseModel, FresnelModel, G2Formulation, MicrofacetDistribution,
    SpecularSampling,
};
pub use diffuse::{disney_diffuse, frostbite_disney_diffuse, lambertian, oren_nayar};
pub use fresnel::{
    base_color_to_diffuse_reflectance, eval_fresnel_schlick, eval_fresnel_spherical_gaussian,
    luminance, shadowed_f90, srgb_to_linear, MIN_DIELECTRICS_F0,
};
pub use microfacet::{
    beckmann_d, ggx_d, smith_g1_beckmann_walter, smith_g1_ggx, smith_g1_ggx_a, smith_g_a,
    smith_g_lambda_beckmann_walter, smith_g_lambda_ggx, smith_g2_height_correlated_ggx_hammon,
    smith_g2_height_correlated_ggx_lagarde, smith_g2_separable_ggx_lagarde,
};
pub use sampling::{
    sample_beckmann_walter, sample_ggx_vndf, sample_ggx_vndf_reflection_pdf,
    sample_ggx_vndf_spherical_caps, sample_ggx_walter, sample_hemisphere, walters_trick,
};

use glint_math::{invert_rotation, rotate_point, rotation_to_z_axis, Vec2, Vec3};

use crate::material::{Color, MaterialProperties};

/// Which lobe an indirect bounce follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrdfLobe {
    Diffuse,
    Specular,
}

/// Everything the BRDF needs for one (N, L, V) configuration.
#[derive(Debug, Clone, Copy)]
pub struct BrdfData {
    pub specular_f0: Color,
    pub diffuse_reflectance: Color,

    pub roughness: f32,
    /// roughness^2
    pub alpha: f32,
    /// alpha^2
    pub alpha_squared: f32,

    /// Fresnel evaluated at LdotH
    pub f: Color,

    pub v: Vec3,
    pub n: Vec3,
    pub h: Vec3,
    pub l: Vec3,

    // Dot products clamped to [1e-5, 1]
    pub n_dot_l: f32,
    pub n_dot_v: f32,
    pub l_dot_h: f32,
    pub n_dot_h: f32,
    pub v_dot_h: f32,

    // Raw NdotV / NdotL were <= 0
    pub v_backfacing: bool,
    pub l_backfacing: bool,
}

/// Result of importance sampling one lobe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndirectSample {
    /// World-space direction of the next ray
    pub direction: Vec3,
    /// BRDF times NdotL over the pdf of the chosen direction, excluding the
    /// lobe selection probability
    pub weight: Color,
}

#[inline]
fn clamp_dot(x: f32) -> f32 {
    x.clamp(1e-5, 1.0)
}

impl BrdfConfig {
    /// Compute the shading inputs for normal `n`, light direction `l` and
    /// view direction `v` (all pointing away from the surface).
    pub fn prepare_brdf_data(
        &self,
        n: Vec3,
        l: Vec3,
        v: Vec3,
        material: &MaterialProperties,
    ) -> BrdfData {
        // L == -V has no half vector
        let h = (l + v).normalize_or_zero();

        let raw_n_dot_l = n.dot(l);
        let raw_n_dot_v = n.dot(v);

        let base_color = srgb_to_linear(material.base_color);
        let specular_f0 =
            self.base_color_to_specular_f0(base_color, material.metalness, material.reflectance);
        let diffuse_reflectance = base_color_to_diffuse_reflectance(base_color, material.metalness);

        let roughness = material.roughness;
        let alpha = roughness * roughness;
        let l_dot_h = clamp_dot(l.dot(h));

        BrdfData {
            specular_f0,
            diffuse_reflectance,
            roughness,
            alpha,
            alpha_squared: alpha * alpha,
            f: self.eval_fresnel(specular_f0, shadowed_f90(specular_f0), l_dot_h),
            v,
            n,
            h,
            l,
            n_dot_l: clamp_dot(raw_n_dot_l),
            n_dot_v: clamp_dot(raw_n_dot_v),
            l_dot_h,
            n_dot_h: clamp_dot(n.dot(h)),
            v_dot_h: clamp_dot(v.dot(h)),
            v_backfacing: raw_n_dot_v <= 0.0,
            l_backfacing: raw_n_dot_l <= 0.0,
        }
    }

    /// Diffuse plus specular BRDF times NdotL, zero if either direction is
    /// under the surface.
    pub fn eval_combined_brdf(
        &self,
        n: Vec3,
        l: Vec3,
        v: Vec3,
        material: &MaterialProperties,
    ) -> Color {
        let data = self.prepare_brdf_data(n, l, v, material);
        if data.v_backfacing || data.l_backfacing {
            return Color::ZERO;
        }

        let specular = self.eval_microfacet(&data);
        let diffuse = self.eval_diffuse(&data);

        if self.combine_with_fresnel() {
            (Color::ONE - data.f) * diffuse + specular
        } else {
            diffuse + specular
        }
    }

    /// Importance sample `lobe` and return the next direction with its
    /// weight. `None` when the sample carries no energy.
    pub fn eval_indirect_combined_brdf(
        &self,
        u: Vec2,
        shading_normal: Vec3,
        _geometry_normal: Vec3,
        v: Vec3,
        material: &MaterialProperties,
        lobe: BrdfLobe,
    ) -> Option<IndirectSample> {
        // Work in the local frame where the shading normal is +Z
        let q_to_local = rotation_to_z_axis(shading_normal);
        let v_local = rotate_point(q_to_local, v);
        let n_local = Vec3::Z;

        let (l_local, weight) = match lobe {
            BrdfLobe::Diffuse => {
                let (l_local, _pdf) = sample_hemisphere(u);
                let data = self.prepare_brdf_data(n_local, l_local, v_local, material);

                let mut weight = data.diffuse_reflectance * self.diffuse_term(&data);

                if self.combine_with_fresnel() {
                    // The light direction is not known to the specular lobe
                    // here, so approximate its Fresnel with a half vector
                    // sampled from the same random numbers
                    let h_specular = self.sample_specular_half_vector(v_local, data.alpha, u);
                    let v_dot_h = clamp_dot(v_local.dot(h_specular));
                    let f = self.eval_fresnel(
                        data.specular_f0,
                        shadowed_f90(data.specular_f0),
                        v_dot_h,
                    );
                    weight *= Color::ONE - f;
                }

                (l_local, weight)
            }
            BrdfLobe::Specular => {
                // L is not known yet, +Z only serves to fill in material terms
                let data = self.prepare_brdf_data(n_local, Vec3::Z, v_local, material);
                self.sample_specular_microfacet(
                    v_local,
                    data.alpha,
                    data.alpha_squared,
                    data.specular_f0,
                    u,
                )
            }
        };

        if luminance(weight) == 0.0 || !weight.is_finite() {
            return None;
        }

        let direction = rotate_point(invert_rotation(q_to_local), l_local).normalize();
        Some(IndirectSample { direction, weight })
    }

    /// Probability of following the specular lobe, clamped to [0.05, 0.7].
    pub fn brdf_probability(
        &self,
        material: &MaterialProperties,
        v: Vec3,
        shading_normal: Vec3,
    ) -> f32 {
        let base_color = srgb_to_linear(material.base_color);
        let specular_f0 = luminance(self.base_color_to_specular_f0(
            base_color,
            material.metalness,
            material.reflectance,
        ));
        let diffuse_reflectance =
            luminance(base_color_to_diffuse_reflectance(base_color, material.metalness));

        // The light direction is unknown, so evaluate Fresnel at the view angle
        let f0 = Color::splat(specular_f0);
        let fresnel = luminance(self.eval_fresnel(
            f0,
            shadowed_f90(f0),
            v.dot(shading_normal).max(0.0),
        ))
        .clamp(0.0, 1.0);

        // Approximate relative contribution of the lobes
        let specular = 0.5 * fresnel;
        let diffuse = diffuse_reflectance * (1.0 - specular) * 1.5;

        let p = specular / (specular + diffuse).max(1e-4);
        p.clamp(0.05, 0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_clamps_dot_products() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::default();
        let data = config.prepare_brdf_data(Vec3::Z, -Vec3::Z, Vec3::Z, &material);

        for d in [data.n_dot_l, data.n_dot_v, data.l_dot_h, data.n_dot_h, data.v_dot_h] {
            assert!((1e-5..=1.0).contains(&d));
        }
        assert!(data.l_backfacing);
        assert!(!data.v_backfacing);
    }

    #[test]
    fn test_opposite_light_and_view_stay_finite() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::plastic(Color::new(0.8, 0.2, 0.1), 0.4);
        let v = Vec3::new(0.3, 0.4, 0.866).normalize();
        let data = config.prepare_brdf_data(Vec3::Z, -v, v, &material);

        assert!(data.h.is_finite());
        assert!(data.f.is_finite());
        assert!(data.n_dot_h.is_finite() && data.l_dot_h.is_finite());
        assert!(config.eval_combined_brdf(Vec3::Z, -v, v, &material).is_finite());
    }

    #[test]
    fn test_alpha_mapping() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::plastic(Color::ONE, 0.5);
        let data = config.prepare_brdf_data(Vec3::Z, Vec3::Z, Vec3::Z, &material);
        assert!((data.alpha - 0.25).abs() < 1e-6);
        assert!((data.alpha_squared - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_backfacing_evaluates_to_zero() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::default();
        let below = Vec3::new(0.0, 0.6, -0.8);
        assert_eq!(config.eval_combined_brdf(Vec3::Z, below, Vec3::Z, &material), Color::ZERO);
        assert_eq!(config.eval_combined_brdf(Vec3::Z, Vec3::Z, below, &material), Color::ZERO);
    }

    #[test]
    fn test_combined_brdf_is_non_negative() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::plastic(Color::new(0.9, 0.5, 0.1), 0.3);
        for i in 0..32 {
            let t = i as f32 / 32.0 * std::f32::consts::FRAC_PI_2;
            let l = Vec3::new(t.sin(), 0.0, t.cos());
            let v = Vec3::new(-0.5, 0.1, 0.86).normalize();
            let eval = config.eval_combined_brdf(Vec3::Z, l, v, &material);
            assert!(eval.min_element() >= 0.0, "{eval:?}");
        }
    }

    #[test]
    fn test_frostbite_adds_lobes_without_fresnel() {
        let config = BrdfConfig {
            diffuse: DiffuseModel::Frostbite,
            ..Default::default()
        };
        let material = MaterialProperties::plastic(Color::ONE, 0.5);
        let l = Vec3::new(0.3, 0.0, 0.95).normalize();
        let data = config.prepare_brdf_data(Vec3::Z, l, Vec3::Z, &material);
        let expected = config.eval_diffuse(&data) + config.eval_microfacet(&data);
        let eval = config.eval_combined_brdf(Vec3::Z, l, Vec3::Z, &material);
        assert!((eval - expected).length() < 1e-6);
    }

    #[test]
    fn test_lobe_probability_is_clamped() {
        let config = BrdfConfig::default();
        let materials = [
            MaterialProperties::diffuse(Color::ONE),
            MaterialProperties::diffuse(Color::ZERO),
            MaterialProperties::metal(Color::ONE, 0.2),
            MaterialProperties::plastic(Color::splat(0.3), 0.6),
        ];
        for material in &materials {
            for i in 0..=10 {
                let t = i as f32 / 10.0 * std::f32::consts::FRAC_PI_2;
                let v = Vec3::new(t.sin(), 0.0, t.cos());
                let p = config.brdf_probability(material, v, Vec3::Z);
                assert!((0.05..=0.7).contains(&p), "p = {p}");
            }
        }
    }

    #[test]
    fn test_metal_prefers_specular() {
        let config = BrdfConfig::default();
        let metal = MaterialProperties::metal(Color::ONE, 0.3);
        assert_eq!(config.brdf_probability(&metal, Vec3::Z, Vec3::Z), 0.7);
        let chalk = MaterialProperties::diffuse(Color::ONE);
        assert_eq!(config.brdf_probability(&chalk, Vec3::Z, Vec3::Z), 0.05);
    }

    #[test]
    fn test_indirect_sample_is_in_upper_hemisphere() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::plastic(Color::splat(0.7), 0.4);
        let n = Vec3::new(0.2, 0.9, -0.1).normalize();
        let v = Vec3::new(0.5, 0.8, 0.3).normalize();

        for (i, lobe) in [BrdfLobe::Diffuse, BrdfLobe::Specular].into_iter().enumerate() {
            for j in 0..64 {
                let u = Vec2::new((j as f32 + 0.5) / 64.0, ((j * 37 + i) % 64) as f32 / 64.0);
                if let Some(sample) =
                    config.eval_indirect_combined_brdf(u, n, n, v, &material, lobe)
                {
                    assert!((sample.direction.length() - 1.0).abs() < 1e-4);
                    assert!(sample.direction.dot(n) > -1e-4);
                    assert!(sample.weight.min_element() >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_black_diffuse_sample_is_rejected() {
        let config = BrdfConfig::default();
        let material = MaterialProperties::metal(Color::ONE, 0.5);
        let sample = config.eval_indirect_combined_brdf(
            Vec2::new(0.3, 0.3),
            Vec3::Y,
            Vec3::Y,
            Vec3::Y,
            &material,
            BrdfLobe::Diffuse,
        );
        assert!(sample.is_none());
    }

    #[test]
    fn test_mirror_sample_reflects_view() {
        let config = BrdfConfig::default();
        let mirror = MaterialProperties::metal(Color::ONE, 0.0);
        let v = Vec3::new(0.6, 0.8, 0.0);
        let sample = config
            .eval_indirect_combined_brdf(
                Vec2::new(0.1, 0.9),
                Vec3::Y,
                Vec3::Y,
                v,
                &mirror,
                BrdfLobe::Specular,
            )
            .unwrap();
        assert!((sample.direction - Vec3::new(-0.6, 0.8, 0.0)).length() < 1e-4);
        assert!((sample.weight - Color::ONE).length() < 1e-3);
    }
}
