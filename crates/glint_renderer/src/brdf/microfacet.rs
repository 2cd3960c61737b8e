//! Normal distribution functions and Smith masking-shadowing terms.
//!
//! Free functions implement one formula each. The `BrdfConfig` methods at the
//! bottom pick between them according to the configured distribution and G2
//! formulation.

use std::f32::consts::PI;

use super::config::{BrdfConfig, G2Formulation, MicrofacetDistribution};
use super::BrdfData;
use crate::material::Color;

// =============================================================================
// Distributions
// =============================================================================

/// GGX (Trowbridge-Reitz) NDF.
#[inline]
pub fn ggx_d(alpha_squared: f32, n_dot_h: f32) -> f32 {
    let b = (alpha_squared - 1.0) * n_dot_h * n_dot_h + 1.0;
    alpha_squared / (PI * b * b)
}

#[inline]
pub fn beckmann_d(alpha_squared: f32, n_dot_h: f32) -> f32 {
    let cos2 = n_dot_h * n_dot_h;
    let cos4 = cos2 * cos2;
    ((cos2 - 1.0) / (alpha_squared * cos2)).exp() / (PI * alpha_squared * cos4)
}

// =============================================================================
// Smith terms
// =============================================================================

/// Argument `a` of the Smith Lambda functions: cot(theta) / alpha.
#[inline]
pub fn smith_g_a(alpha: f32, n_dot_s: f32) -> f32 {
    n_dot_s / (alpha.max(1e-5) * (1.0 - (n_dot_s * n_dot_s).min(0.99999)).sqrt())
}

#[inline]
pub fn smith_g_lambda_ggx(a: f32) -> f32 {
    (-1.0 + (1.0 + 1.0 / (a * a)).sqrt()) * 0.5
}

/// Walter's rational fit of the Beckmann Lambda.
#[inline]
pub fn smith_g_lambda_beckmann_walter(a: f32) -> f32 {
    if a < 1.6 {
        (1.0 - (1.259 - 0.396 * a) * a) / ((3.535 + 2.181 * a) * a)
    } else {
        0.0
    }
}

/// Closed-form GGX G1 in terms of `a`.
#[inline]
pub fn smith_g1_ggx_a(a: f32) -> f32 {
    let a2 = a * a;
    2.0 / (((a2 + 1.0) / a2).sqrt() + 1.0)
}

/// GGX G1 without the trigonometric detour through `a`.
#[inline]
pub fn smith_g1_ggx(alpha_squared: f32, n_dot_s_squared: f32) -> f32 {
    let t = (alpha_squared * (1.0 - n_dot_s_squared) + n_dot_s_squared) / n_dot_s_squared;
    2.0 / (t.sqrt() + 1.0)
}

/// Walter's rational fit of the Beckmann G1.
#[inline]
pub fn smith_g1_beckmann_walter(a: f32) -> f32 {
    if a < 1.6 {
        ((3.535 + 2.181 * a) * a) / (1.0 + (2.276 + 2.577 * a) * a)
    } else {
        1.0
    }
}

/// Lagarde's separable GGX G2, divided by 4 NdotL NdotV.
pub fn smith_g2_separable_ggx_lagarde(alpha_squared: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
    let a = n_dot_v
        + (alpha_squared + n_dot_v * (n_dot_v - alpha_squared * n_dot_v)).sqrt();
    let b = n_dot_l
        + (alpha_squared + n_dot_l * (n_dot_l - alpha_squared * n_dot_l)).sqrt();
    1.0 / (a * b)
}

/// Lagarde's height-correlated GGX G2, divided by 4 NdotL NdotV.
pub fn smith_g2_height_correlated_ggx_lagarde(
    alpha_squared: f32,
    n_dot_l: f32,
    n_dot_v: f32,
) -> f32 {
    let a = n_dot_v * (alpha_squared + n_dot_l * (n_dot_l - alpha_squared * n_dot_l)).sqrt();
    let b = n_dot_l * (alpha_squared + n_dot_v * (n_dot_v - alpha_squared * n_dot_v)).sqrt();
    0.5 / (a + b)
}

/// Hammon's approximation of the height-correlated GGX G2, divided by
/// 4 NdotL NdotV.
pub fn smith_g2_height_correlated_ggx_hammon(alpha: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
    let lo = 2.0 * n_dot_l * n_dot_v;
    let hi = n_dot_l + n_dot_v;
    0.5 / (lo + alpha * (hi - lo))
}

impl BrdfConfig {
    /// Configured NDF. `alpha_squared` is floored so a perfect mirror does
    /// not divide by zero.
    #[inline]
    pub fn microfacet_d(&self, alpha_squared: f32, n_dot_h: f32) -> f32 {
        let alpha_squared = alpha_squared.max(1e-5);
        match self.distribution {
            MicrofacetDistribution::Ggx => ggx_d(alpha_squared, n_dot_h),
            MicrofacetDistribution::Beckmann => beckmann_d(alpha_squared, n_dot_h),
        }
    }

    #[inline]
    pub fn smith_g_lambda(&self, a: f32) -> f32 {
        match self.distribution {
            MicrofacetDistribution::Ggx => smith_g_lambda_ggx(a),
            MicrofacetDistribution::Beckmann => smith_g_lambda_beckmann_walter(a),
        }
    }

    /// G1 through the Lambda function of the configured distribution.
    #[inline]
    pub fn smith_g1_general(&self, a: f32) -> f32 {
        1.0 / (1.0 + self.smith_g_lambda(a))
    }

    /// Closed-form G1 of the configured distribution.
    pub fn smith_g1(&self, alpha: f32, alpha_squared: f32, n_dot_s: f32) -> f32 {
        match self.distribution {
            MicrofacetDistribution::Ggx => smith_g1_ggx(alpha_squared, n_dot_s * n_dot_s),
            MicrofacetDistribution::Beckmann => {
                smith_g1_beckmann_walter(smith_g_a(alpha, n_dot_s))
            }
        }
    }

    /// Height-correlated G2 via Lambda. Not divided by the denominator.
    pub fn smith_g2_height_correlated(&self, alpha: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
        let a_l = smith_g_a(alpha, n_dot_l);
        let a_v = smith_g_a(alpha, n_dot_v);
        1.0 / (1.0 + self.smith_g_lambda(a_l) + self.smith_g_lambda(a_v))
    }

    /// Separable G2 via Lambda. Not divided by the denominator.
    pub fn smith_g2_separable(&self, alpha: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
        let a_l = smith_g_a(alpha, n_dot_l);
        let a_v = smith_g_a(alpha, n_dot_v);
        self.smith_g1_general(a_l) * self.smith_g1_general(a_v)
    }

    /// Ratio G2 / G1(V) for the height-correlated GGX G2, which is the
    /// weight of a VNDF sample.
    pub fn smith_g2_over_g1_height_correlated(
        &self,
        alpha: f32,
        alpha_squared: f32,
        n_dot_l: f32,
        n_dot_v: f32,
    ) -> f32 {
        let g1_v = self.smith_g1(alpha, alpha_squared, n_dot_v);
        let g1_l = self.smith_g1(alpha, alpha_squared, n_dot_l);
        g1_l / (g1_v + g1_l - g1_v * g1_l)
    }

    /// Configured G2. Divided by 4 NdotL NdotV when
    /// [`g2_divided_by_denominator`](Self::g2_divided_by_denominator) holds.
    pub fn smith_g2(&self, alpha: f32, alpha_squared: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
        if self.g2_divided_by_denominator() {
            match self.g2 {
                G2Formulation::HeightCorrelated => {
                    smith_g2_height_correlated_ggx_lagarde(alpha_squared, n_dot_l, n_dot_v)
                }
                G2Formulation::Separable => {
                    smith_g2_separable_ggx_lagarde(alpha_squared, n_dot_l, n_dot_v)
                }
                G2Formulation::Hammon => {
                    smith_g2_height_correlated_ggx_hammon(alpha, n_dot_l, n_dot_v)
                }
            }
        } else {
            match self.g2 {
                G2Formulation::Separable => self.smith_g2_separable(alpha, n_dot_l, n_dot_v),
                _ => self.smith_g2_height_correlated(alpha, n_dot_l, n_dot_v),
            }
        }
    }

    /// Specular microfacet BRDF times NdotL.
    pub fn eval_microfacet(&self, data: &BrdfData) -> Color {
        let d = self.microfacet_d(data.alpha_squared, data.n_dot_h);
        let g2 = self.smith_g2(data.alpha, data.alpha_squared, data.n_dot_l, data.n_dot_v);

        if self.g2_divided_by_denominator() {
            data.f * (g2 * d * data.n_dot_l)
        } else {
            data.f * (g2 * d / (4.0 * data.n_dot_l * data.n_dot_v)) * data.n_dot_l
        }
    }
}
