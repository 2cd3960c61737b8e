//! Render settings, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::brdf::BrdfConfig;
use crate::light::PointLightBrdfPolicy;
use crate::post::PostProcess;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What a primary hit writes to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Full path tracing
    #[default]
    Brdf,
    BaseColor,
    GeometryNormal,
    ShadingNormal,
    Metalness,
    Roughness,
    Emissive,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Indirect bounces after the primary hit
    pub bounces: u32,
    pub render_mode: RenderMode,
    /// Pick one light class per shading point instead of always using the
    /// first directional light
    pub stochastic_lights: bool,
    /// Add direct lighting at all
    pub lighting: bool,
    /// Escaping rays see the camera's skybox instead of black
    pub skybox: bool,
    pub gamma_corrected: bool,
    /// Average two jittered primary rays per pixel
    pub antialiasing: bool,
    /// Average frames while the primary hit distance stays put
    pub accumulate: bool,
    pub point_light_policy: PointLightBrdfPolicy,
    pub brdf: BrdfConfig,
    /// Display post processing, off when absent
    pub post_process: Option<PostProcess>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bounces: 2,
            render_mode: RenderMode::Brdf,
            stochastic_lights: true,
            lighting: true,
            skybox: true,
            gamma_corrected: true,
            antialiasing: true,
            accumulate: true,
            point_light_policy: PointLightBrdfPolicy::PerLane,
            brdf: BrdfConfig::default(),
            post_process: None,
        }
    }
}

impl RenderConfig {
    /// Recursion budget of `trace`: the primary hit plus every bounce.
    #[inline]
    pub fn bounce_budget(&self) -> u32 {
        self.bounces + 1
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
