//! Surface material description consumed by the BRDF and the integrator.

use glint_math::Vec3;

/// Color type alias (linear RGB, usually 0-1 but emitters may exceed 1)
pub type Color = Vec3;

/// Physically based surface parameters of a hit point.
///
/// `base_color` is stored in sRGB and converted to linear when the BRDF
/// inputs are prepared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProperties {
    /// Albedo for dielectrics, specular color for metals
    pub base_color: Color,

    /// 0 = dielectric, 1 = metal
    pub metalness: f32,

    /// Emitted radiance added at every hit
    pub emissive: Color,

    /// Perceptual roughness, squared to get the microfacet alpha
    pub roughness: f32,

    /// 1 = fully refractive glass, which bypasses the BRDF
    pub transmissiveness: f32,

    /// Dielectric reflectance, used when the reflectance parameter is enabled
    pub reflectance: f32,

    pub opacity: f32,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            base_color: Color::splat(0.8),
            metalness: 0.0,
            emissive: Color::ZERO,
            roughness: 0.5,
            transmissiveness: 0.0,
            reflectance: 0.5,
            opacity: 1.0,
        }
    }
}

impl MaterialProperties {
    /// Create a material with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully rough dielectric.
    pub fn diffuse(color: Color) -> Self {
        Self {
            base_color: color,
            roughness: 1.0,
            ..Default::default()
        }
    }

    pub fn metal(color: Color, roughness: f32) -> Self {
        Self {
            base_color: color,
            metalness: 1.0,
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Glossy plastic-like dielectric.
    pub fn plastic(color: Color, roughness: f32) -> Self {
        Self {
            base_color: color,
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Clear glass, handled by the integrator's reflect/refract split.
    pub fn glass() -> Self {
        Self {
            base_color: Color::ONE,
            roughness: 0.0,
            transmissiveness: 1.0,
            ..Default::default()
        }
    }

    /// Black surface that only emits.
    pub fn emitter(radiance: Color) -> Self {
        Self {
            base_color: Color::ZERO,
            emissive: radiance,
            roughness: 1.0,
            ..Default::default()
        }
    }

    /// Builder method to set emitted radiance.
    pub fn with_emissive(mut self, radiance: Color) -> Self {
        self.emissive = radiance;
        self
    }

    /// Builder method to set dielectric reflectance.
    pub fn with_reflectance(mut self, reflectance: f32) -> Self {
        self.reflectance = reflectance.clamp(0.0, 1.0);
        self
    }

    /// Glass surfaces skip the BRDF entirely.
    #[inline]
    pub fn is_dielectric(&self) -> bool {
        self.transmissiveness >= 1.0
    }

    /// Smooth metal: always follows the specular lobe.
    #[inline]
    pub fn is_perfect_mirror(&self) -> bool {
        self.metalness >= 1.0 && self.roughness <= 0.0
    }
}
