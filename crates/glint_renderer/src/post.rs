//! Display-side post processing applied to the averaged frame: chromatic
//! aberration, colour grading and a vignette.
//!
//! Nothing here feeds back into accumulation; the running averages in the
//! [`FrameBuffer`] stay linear and untouched.

use serde::{Deserialize, Serialize};

use crate::material::Color;
use crate::renderer::FrameBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcess {
    /// Pixel offset of the red (right) and blue (left) samples, 0 disables
    pub chromatic_aberration: i32,
    pub vignette_intensity: f32,
    /// Exponent of the vignette falloff. Smaller values keep more of the
    /// image bright.
    pub vignette_radius: f32,
    /// Per-channel gain
    pub color_grading: [f32; 3],
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            chromatic_aberration: 0,
            vignette_intensity: 20.0,
            vignette_radius: 0.3,
            color_grading: [1.0, 1.0, 1.0],
        }
    }
}

impl PostProcess {
    /// Vignette factor of pixel (x, y). Zero on the left and top border,
    /// largest in the middle of the frame.
    pub fn vignette(&self, x: u32, y: u32, width: u32, height: u32) -> f32 {
        let u = x as f32 / width.max(1) as f32;
        let v = y as f32 / height.max(1) as f32;
        let falloff = u * (1.0 - u) * v * (1.0 - v) * self.vignette_intensity;
        falloff.max(0.0).powf(self.vignette_radius)
    }

    /// Post-processed colour of pixel (x, y).
    pub fn apply(&self, frame: &FrameBuffer, x: u32, y: u32) -> Color {
        let average = frame.average(x, y);
        let mut color = average;

        if self.chromatic_aberration != 0 {
            let last = i64::from(frame.width) - 1;
            let shifted = |dx: i64| (i64::from(x) + dx).clamp(0, last) as u32;
            let offset = i64::from(self.chromatic_aberration);
            let red = frame.average(shifted(offset), y).x;
            let blue = frame.average(shifted(-offset), y).z;
            color.x = 0.75 * average.x + 0.25 * red;
            color.z = 0.75 * average.z + 0.25 * blue;
        }

        color * Color::from(self.color_grading) * self.vignette(x, y, frame.width, frame.height)
    }
}
