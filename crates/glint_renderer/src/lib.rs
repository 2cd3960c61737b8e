//! Glint - stochastic CPU path tracer core
//!
//! Physically based BRDF library (GGX/Beckmann microfacet specular with
//! several diffuse models), a one-sample-per-class direct lighting estimator
//! and a recursive path integrator. The scene and camera are collaborators
//! behind the [`Scene`] and [`Camera`] traits; [`TriangleScene`] and
//! [`PinholeCamera`] are reference implementations of them.

pub mod brdf;
mod camera;
mod config;
mod direct;
mod integrator;
mod light;
mod material;
mod post;
mod renderer;
pub mod scene;

pub use brdf::{
    BrdfConfig, BrdfData, BrdfLobe, DiffuseModel, FresnelModel, G2Formulation, IndirectSample,
    MicrofacetDistribution, SpecularSampling,
};
pub use camera::{panini_direction, Camera, EnvironmentMap, PinholeCamera, Skybox};
pub use config::{ConfigError, RenderConfig, RenderMode};
pub use direct::{DirectLighting, LightClass, ShadingPoint};
pub use integrator::{dielectric_split, DielectricSplit, Integrator, AIR_IOR, GLASS_IOR};
pub use light::{
    DirectionalLight, LightError, LightRegistry, PointLight, PointLightBank, PointLightBatch,
    PointLightBrdfPolicy, SpotLight, POINT_LIGHTS, SPOT_COS_CUTOFF,
};
pub use material::{Color, MaterialProperties};
pub use post::PostProcess;
pub use renderer::{
    accumulate, color_to_rgba, dark_light_classes, linear_to_gamma, FrameBuffer, Renderer,
};
pub use scene::{Mesh, Scene, SceneBuilder, SceneError, TriangleScene};

/// Re-export Vec3 and common math types from glint_math
pub use glint_math::{Hit, Ray, Vec2, Vec3, BVH_FAR, EPSILON};

use rand::RngCore;

/// Uniform float in [0, 1) from the top 24 bits of one draw.
#[inline]
pub fn gen_f32<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    (rng.next_u32() >> 8) as f32 / 16_777_216.0
}
