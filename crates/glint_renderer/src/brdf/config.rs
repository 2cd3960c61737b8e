//! Model selection for the BRDF.
//!
//! Every choice that would otherwise be a compile-time switch is a field of
//! [`BrdfConfig`], so a scene can flip distributions or diffuse models from
//! its JSON render settings.

use serde::{Deserialize, Serialize};

/// Normal distribution function of the specular lobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicrofacetDistribution {
    #[default]
    Ggx,
    Beckmann,
}

/// Diffuse lobe model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffuseModel {
    #[default]
    Lambertian,
    OrenNayar,
    Disney,
    /// Energy-normalized Disney diffuse. Added to the specular term without
    /// Fresnel weighting.
    Frostbite,
    /// No diffuse lobe at all
    None,
}

/// How half-vectors of the specular lobe are importance sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecularSampling {
    /// Heitz's visible-normal sampling through a projected ellipse
    #[default]
    Vndf,
    /// Visible-normal sampling through a spherical cap
    VndfSphericalCaps,
    /// Walter's distribution-of-normals sampling
    Walter,
}

/// Masking-shadowing formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum G2Formulation {
    #[default]
    HeightCorrelated,
    Separable,
    /// Hammon's height-correlated approximation, optimized GGX only
    Hammon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FresnelModel {
    #[default]
    Schlick,
    SphericalGaussian,
}

/// Complete set of BRDF model switches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrdfConfig {
    pub distribution: MicrofacetDistribution,
    pub diffuse: DiffuseModel,
    pub specular_sampling: SpecularSampling,
    pub g2: G2Formulation,
    /// Use the GGX G2 forms that already include 1 / (4 NdotL NdotV)
    pub optimized_g2: bool,
    pub fresnel: FresnelModel,
    /// Derive the dielectric F0 from `MaterialProperties::reflectance`
    /// instead of the fixed 4% constant
    pub use_reflectance_parameter: bool,
}

impl Default for BrdfConfig {
    fn default() -> Self {
        Self {
            distribution: MicrofacetDistribution::Ggx,
            diffuse: DiffuseModel::Lambertian,
            specular_sampling: SpecularSampling::Vndf,
            g2: G2Formulation::HeightCorrelated,
            optimized_g2: true,
            fresnel: FresnelModel::Schlick,
            use_reflectance_parameter: false,
        }
    }
}

impl BrdfConfig {
    /// True when G2 values already carry the 1 / (4 NdotL NdotV) factor.
    #[inline]
    pub fn g2_divided_by_denominator(&self) -> bool {
        self.optimized_g2 && self.distribution == MicrofacetDistribution::Ggx
    }

    /// Whether the diffuse term is scaled by (1 - F) when combined.
    #[inline]
    pub fn combine_with_fresnel(&self) -> bool {
        self.diffuse != DiffuseModel::Frostbite
    }

    /// Beckmann has no visible-normal sampler and always uses Walter's.
    #[inline]
    pub fn effective_specular_sampling(&self) -> SpecularSampling {
        match self.distribution {
            MicrofacetDistribution::Beckmann => SpecularSampling::Walter,
            MicrofacetDistribution::Ggx => self.specular_sampling,
        }
    }
}
