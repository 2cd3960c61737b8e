//! Frame driver: traces every pixel in parallel and keeps a running average.
//!
//! Rows are handed to rayon's work-stealing pool. Each row owns a disjoint
//! slice of the accumulation, sample-count and distance buffers and its own
//! seeded RNG, so frames are reproducible regardless of scheduling.

use std::time::Instant;

use glint_math::EPSILON;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::direct::LightClass;
use crate::gen_f32;
use crate::integrator::Integrator;
use crate::light::LightRegistry;
use crate::material::Color;
use crate::post::PostProcess;
use crate::scene::Scene;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a display-ready color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * clamp_01(color.x)) as u8;
    let g = (255.0 * clamp_01(color.y)) as u8;
    let b = (255.0 * clamp_01(color.z)) as u8;
    [r, g, b, 255]
}

/// Fold one sample into a pixel's running sum.
///
/// The sum restarts whenever the primary hit distance moved, since the pixel
/// then shows a different surface.
pub fn accumulate(
    sum: &mut Color,
    count: &mut u32,
    last_distance: &mut f32,
    sample: Color,
    distance: f32,
    enabled: bool,
) {
    if enabled && (*last_distance - distance).abs() < EPSILON {
        *sum += sample;
        *count += 1;
    } else {
        *sum = sample;
        *count = 1;
    }
    *last_distance = distance;
}

/// Per-pixel accumulation state of the image being rendered.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    accumulator: Vec<Color>,
    samples: Vec<u32>,
    /// Primary hit distance of the previous frame, -1 before the first one
    distances: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            accumulator: vec![Color::ZERO; len],
            samples: vec![0; len],
            distances: vec![-1.0; len],
        }
    }

    /// Drop all history, e.g. after the camera moved.
    pub fn reset(&mut self) {
        self.accumulator.fill(Color::ZERO);
        self.samples.fill(0);
        self.distances.fill(-1.0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Averaged color at (x, y), black before the first sample.
    pub fn average(&self, x: u32, y: u32) -> Color {
        let i = self.index(x, y);
        match self.samples[i] {
            0 => Color::ZERO,
            n => self.accumulator[i] / n as f32,
        }
    }

    pub fn samples_at(&self, x: u32, y: u32) -> u32 {
        self.samples[self.index(x, y)]
    }

    /// Fold one externally traced sample into pixel (x, y).
    pub fn add_sample(&mut self, x: u32, y: u32, sample: Color, distance: f32, enabled: bool) {
        let i = self.index(x, y);
        accumulate(
            &mut self.accumulator[i],
            &mut self.samples[i],
            &mut self.distances[i],
            sample,
            distance,
            enabled,
        );
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.to_rgba8_with(None)
    }

    /// RGBA bytes, optionally post processed.
    pub fn to_rgba8_with(&self, post: Option<&PostProcess>) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = match post {
                    Some(post) => post.apply(self, x, y),
                    None => self.average(x, y),
                };
                bytes.extend_from_slice(&color_to_rgba(color));
            }
        }
        bytes
    }

    pub fn to_image(&self) -> Option<image::RgbaImage> {
        self.to_image_with(None)
    }

    pub fn to_image_with(&self, post: Option<&PostProcess>) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8_with(post))
    }
}

/// Seed for one row of one frame.
fn row_seed(seed: u64, frame_index: u64, y: u64) -> u64 {
    seed ^ frame_index.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ y.wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

/// Light classes whose samples will always come back black under `config`.
pub fn dark_light_classes(config: &RenderConfig, lights: &LightRegistry) -> Vec<LightClass> {
    if !config.lighting {
        return Vec::new();
    }
    if config.stochastic_lights {
        LightClass::empty_in(lights)
    } else if lights.directional.is_empty() {
        vec![LightClass::Directional]
    } else {
        Vec::new()
    }
}

pub struct Renderer<'a, S: Scene, C: Camera> {
    integrator: Integrator<'a, S, C>,
    seed: u64,
}

impl<'a, S: Scene, C: Camera> Renderer<'a, S, C> {
    pub fn new(integrator: Integrator<'a, S, C>, seed: u64) -> Self {
        let config = integrator.config();
        for class in dark_light_classes(config, integrator.lights()) {
            if config.stochastic_lights {
                warn!(
                    "No {:?} lights in the scene, {:.0}% of direct light samples will be black",
                    class,
                    100.0 * class.probability()
                );
            } else {
                warn!("No directional light for deterministic lighting, direct light is black");
            }
        }
        Self { integrator, seed }
    }

    pub fn integrator(&self) -> &Integrator<'a, S, C> {
        &self.integrator
    }

    /// Trace one sample for every pixel and fold it into `frame`.
    pub fn render_frame(&self, frame: &mut FrameBuffer, frame_index: u64) {
        let start = Instant::now();
        let accumulate_enabled = self.integrator.config().accumulate;

        let FrameBuffer {
            width,
            accumulator,
            samples,
            distances,
            ..
        } = frame;
        let width = *width as usize;
        if width == 0 {
            return;
        }

        accumulator
            .par_chunks_mut(width)
            .zip(samples.par_chunks_mut(width))
            .zip(distances.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, ((sums, counts), last_distances))| {
                let mut rng = StdRng::seed_from_u64(row_seed(self.seed, frame_index, y as u64));
                for x in 0..width {
                    let (color, distance) = self.sample_pixel(x as f32, y as f32, &mut rng);
                    accumulate(
                        &mut sums[x],
                        &mut counts[x],
                        &mut last_distances[x],
                        color,
                        distance,
                        accumulate_enabled,
                    );
                }
            });

        info!(
            "Frame {} ({}x{}) rendered in {:.2?}",
            frame_index,
            frame.width,
            frame.height,
            start.elapsed()
        );
    }

    /// Color of one pixel sample and the distance of its primary hit.
    fn sample_pixel(&self, x: f32, y: f32, rng: &mut StdRng) -> (Color, f32) {
        let config = self.integrator.config();
        let camera = self.integrator.camera();

        let mut primary = camera.primary_ray(x, y);
        let mut color = self.integrator.trace(&mut primary, 0, rng);

        if config.antialiasing {
            let (jx, jy) = (gen_f32(rng) - 0.5, gen_f32(rng) - 0.5);
            let mut jittered = camera.primary_ray(x + jx, y + jy);
            color = 0.5 * (color + self.integrator.trace(&mut jittered, 0, rng));
        }

        if config.gamma_corrected {
            color = Color::new(
                linear_to_gamma(color.x),
                linear_to_gamma(color.y),
                linear_to_gamma(color.z),
            );
        }

        (color, primary.hit.t)
    }
}
