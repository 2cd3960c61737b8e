//! Camera collaborator: primary rays and the background seen by escaping
//! rays.

use std::f32::consts::{PI, TAU};
use std::path::Path;

use glint_math::{Ray, Vec3};
use log::debug;

use crate::material::Color;

/// Generates primary rays and answers skybox lookups.
pub trait Camera: Send + Sync {
    /// Ray through the image-plane position (x, y) in pixels. Integer
    /// coordinates land on pixel centres.
    fn primary_ray(&self, x: f32, y: f32) -> Ray;

    /// Radiance arriving along a ray that left the scene.
    fn sample_skybox(&self, ray: &Ray) -> Color;
}

/// Equirectangular radiance map in linear RGB.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    width: u32,
    height: u32,
    texels: Vec<Color>,
}

impl EnvironmentMap {
    /// Returns `None` unless `texels` holds exactly `width * height` values.
    pub fn new(width: u32, height: u32, texels: Vec<Color>) -> Option<Self> {
        let valid = width > 0 && height > 0 && texels.len() == (width * height) as usize;
        valid.then_some(Self {
            width,
            height,
            texels,
        })
    }

    /// Decode an image file (HDR or LDR) into a map.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let image = image::open(path.as_ref())?.into_rgb32f();
        let (width, height) = image.dimensions();
        let texels = image
            .pixels()
            .map(|p| Color::new(p[0], p[1], p[2]))
            .collect();
        debug!("Loaded environment map {:?} ({}x{})", path.as_ref(), width, height);
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    fn texel(&self, x: i64, y: i64) -> Color {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.texels[y * self.width as usize + x]
    }

    /// Bilinear lookup along a unit direction.
    pub fn sample(&self, direction: Vec3) -> Color {
        let u = 0.5 + direction.z.atan2(direction.x) / TAU;
        let v = direction.y.clamp(-1.0, 1.0).acos() / PI;

        // Texel centres sit at half-integer coordinates
        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), tx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), tx);
        top.lerp(bottom, ty)
    }
}

/// Background returned for rays that miss everything.
#[derive(Debug, Clone)]
pub enum Skybox {
    Solid(Color),
    /// Vertical blend from the horizon to the zenith
    Gradient { horizon: Color, zenith: Color },
    Equirect(EnvironmentMap),
}

impl Default for Skybox {
    fn default() -> Self {
        Skybox::Gradient {
            horizon: Color::ONE,
            zenith: Color::new(0.5, 0.7, 1.0),
        }
    }
}

impl Skybox {
    pub fn sample(&self, direction: Vec3) -> Color {
        match self {
            Skybox::Solid(color) => *color,
            Skybox::Gradient { horizon, zenith } => {
                let a = 0.5 * (direction.y + 1.0);
                *horizon * (1.0 - a) + *zenith * a
            }
            Skybox::Equirect(map) => map.sample(direction),
        }
    }
}

/// Panini projection of an image-plane point (h, v) on the plane one unit
/// in front of the camera, as a unit direction in camera space (+Z ahead,
/// +Y up).
///
/// `half_width` is the horizontal half extent of that plane. The plane is
/// rescaled so its left and right edges keep their rectilinear angle.
/// Vertical lines stay straight for any `distortion`; 0 gives the
/// rectilinear direction.
pub fn panini_direction(h: f32, v: f32, half_width: f32, distortion: f32) -> Vec3 {
    let d = distortion.max(0.0);

    let phi_edge = half_width.atan();
    let edge = (d + 1.0) / (d + phi_edge.cos()) * phi_edge.sin();
    let scale = edge / half_width;
    let (h, v) = (h * scale, v * scale);

    let k = h * h / ((d + 1.0) * (d + 1.0));
    let discriminant = (k * k * d * d - (k + 1.0) * (k * d * d - 1.0)).max(0.0);
    let cos_phi = (-k * d + discriminant.sqrt()) / (k + 1.0);

    let s = (d + 1.0) / (d + cos_phi);
    let tan_theta = v / s;
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt().copysign(h);

    Vec3::new(sin_phi, tan_theta, cos_phi).normalize()
}

/// Pinhole camera looking from `look_from` toward `look_at`.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,

    /// Panini strength, 0 for a rectilinear image
    distortion: f32,

    pub skybox: Skybox,

    // Cached computed values (set by initialize())
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    right: Vec3,
    up: Vec3,
    ahead: Vec3,
    half_width: f32,
}

impl PinholeCamera {
    /// Create a camera with default settings. Call `initialize()` after
    /// configuring.
    pub fn new() -> Self {
        Self {
            image_width: 640,
            image_height: 360,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            vfov: 60.0,
            distortion: 0.0,
            skybox: Skybox::default(),
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            ahead: -Vec3::Z,
            half_width: 1.0,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self
    }

    /// Set camera position and orientation.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Set the Panini distortion. Negative values clamp to 0.
    pub fn with_distortion(mut self, distortion: f32) -> Self {
        self.distortion = distortion.max(0.0);
        self
    }

    pub fn with_skybox(mut self, skybox: Skybox) -> Self {
        self.skybox = skybox;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        // Viewport on the plane one unit in front of the camera
        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Camera basis vectors
        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left = self.look_from - w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        self.right = u;
        self.up = v;
        self.ahead = -w;
        self.half_width = viewport_width / 2.0;
    }
}

impl Default for PinholeCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for PinholeCamera {
    fn primary_ray(&self, x: f32, y: f32) -> Ray {
        let pixel_sample = self.pixel00_loc + x * self.pixel_delta_u + y * self.pixel_delta_v;
        let offset = pixel_sample - self.look_from;
        if self.distortion == 0.0 {
            return Ray::new(self.look_from, offset);
        }

        let local = panini_direction(
            offset.dot(self.right),
            offset.dot(self.up),
            self.half_width,
            self.distortion,
        );
        let direction = local.x * self.right + local.y * self.up + local.z * self.ahead;
        Ray::new(self.look_from, direction)
    }

    fn sample_skybox(&self, ray: &Ray) -> Color {
        self.skybox.sample(ray.direction)
    }
}
