//! Recursive path integrator.

use glint_math::{reflect, refract, Ray, Vec2, Vec3};
use rand::RngCore;

use crate::brdf::BrdfLobe;
use crate::camera::Camera;
use crate::config::{RenderConfig, RenderMode};
use crate::direct::{DirectLighting, ShadingPoint};
use crate::gen_f32;
use crate::light::LightRegistry;
use crate::material::{Color, MaterialProperties};
use crate::scene::Scene;

pub const AIR_IOR: f32 = 1.0;
pub const GLASS_IOR: f32 = 1.46;

/// Reflection and refraction at an air/glass boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DielectricSplit {
    pub reflection: Vec3,
    /// `None` on total internal reflection
    pub refraction: Option<Vec3>,
    /// Schlick weight of the reflected part
    pub fresnel: f32,
    /// Surface normal on the incident side
    pub normal: Vec3,
}

/// Split `direction` hitting a glass surface with outward `normal`.
pub fn dielectric_split(direction: Vec3, normal: Vec3) -> DielectricSplit {
    // Leaving the glass: flip to the incident side and invert the ratio
    let (normal, eta) = if direction.dot(normal) > 0.0 {
        (-normal, GLASS_IOR / AIR_IOR)
    } else {
        (normal, AIR_IOR / GLASS_IOR)
    };

    let reflection = reflect(direction, normal);
    let refraction = refract(direction, normal, eta);

    let fresnel = match refraction {
        None => 1.0,
        Some(_) => {
            let r0 = ((AIR_IOR - GLASS_IOR) / (AIR_IOR + GLASS_IOR)).powi(2);
            let cos_theta = (-direction.dot(normal)).clamp(0.0, 1.0);
            r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
        }
    };

    DielectricSplit {
        reflection,
        refraction,
        fresnel,
        normal,
    }
}

/// Raw material channel shown by the debug render modes.
fn debug_view(
    mode: RenderMode,
    material: &MaterialProperties,
    geometry_normal: Vec3,
    shading_normal: Vec3,
) -> Option<Color> {
    match mode {
        RenderMode::Brdf => None,
        RenderMode::BaseColor => Some(material.base_color),
        RenderMode::Metalness => Some(Color::splat(material.metalness)),
        RenderMode::Roughness => Some(Color::splat(material.roughness)),
        RenderMode::Emissive => Some(material.emissive),
        RenderMode::GeometryNormal => Some((geometry_normal + 1.0) * 0.5),
        RenderMode::ShadingNormal => Some((shading_normal + 1.0) * 0.5),
    }
}

/// Everything a trace needs, passed in explicitly. Cheap to build per frame.
pub struct Integrator<'a, S: Scene, C: Camera> {
    config: &'a RenderConfig,
    scene: &'a S,
    camera: &'a C,
    lights: &'a LightRegistry,
}

impl<'a, S: Scene, C: Camera> Integrator<'a, S, C> {
    pub fn new(
        config: &'a RenderConfig,
        scene: &'a S,
        camera: &'a C,
        lights: &'a LightRegistry,
    ) -> Self {
        Self {
            config,
            scene,
            camera,
            lights,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    pub fn camera(&self) -> &C {
        self.camera
    }

    pub fn lights(&self) -> &LightRegistry {
        self.lights
    }

    #[inline]
    pub fn bounce_budget(&self) -> u32 {
        self.config.bounce_budget()
    }

    /// Radiance arriving along `ray`. The ray's hit record is filled in, so
    /// callers can read the primary hit distance afterwards.
    ///
    /// Returns black once `depth` reaches the bounce budget, without touching
    /// the scene.
    pub fn trace(&self, ray: &mut Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        let budget = self.bounce_budget();
        if depth >= budget {
            return Color::ZERO;
        }

        self.scene.intersect(ray);
        if ray.hit.is_miss() {
            return if self.config.skybox {
                self.camera.sample_skybox(ray)
            } else {
                Color::ZERO
            };
        }

        let point = ray.intersection_point();
        let v = -ray.direction;
        let geometry_normal = self.scene.geometry_normal(&ray.hit);
        let shading_normal = self.scene.shading_normal(&ray.hit);
        let material = self.scene.material(&ray.hit);

        if let Some(channel) =
            debug_view(self.config.render_mode, &material, geometry_normal, shading_normal)
        {
            return channel;
        }

        let mut result = material.emissive;
        let last_bounce = depth + 1 >= budget;

        if material.is_dielectric() && !last_bounce {
            return result + self.trace_dielectric(ray.direction, point, shading_normal, depth, rng);
        }

        if self.config.lighting {
            result += self.direct_lighting(point, shading_normal, v, &material, rng);
        }

        if last_bounce {
            return result;
        }

        let brdf = &self.config.brdf;
        let mut throughput = Color::ONE;
        let lobe = if material.is_perfect_mirror() {
            BrdfLobe::Specular
        } else {
            let p = brdf.brdf_probability(&material, v, shading_normal);
            if gen_f32(rng) < p {
                throughput /= p;
                BrdfLobe::Specular
            } else {
                throughput /= 1.0 - p;
                BrdfLobe::Diffuse
            }
        };

        let u = Vec2::new(gen_f32(rng), gen_f32(rng));
        let Some(sample) = brdf.eval_indirect_combined_brdf(
            u,
            shading_normal,
            geometry_normal,
            v,
            &material,
            lobe,
        ) else {
            return result;
        };
        throughput *= sample.weight;

        let mut next = Ray::offset(point, sample.direction, sample.direction);
        result + throughput * self.trace(&mut next, depth + 1, rng)
    }

    fn direct_lighting(
        &self,
        point: Vec3,
        normal: Vec3,
        view: Vec3,
        material: &MaterialProperties,
        rng: &mut dyn RngCore,
    ) -> Color {
        let estimator = DirectLighting::new(
            self.scene,
            self.lights,
            &self.config.brdf,
            self.config.point_light_policy,
        );
        let sp = ShadingPoint {
            position: point,
            normal,
            view,
            material,
        };
        if self.config.stochastic_lights {
            estimator.sample(&sp, rng)
        } else {
            estimator.deterministic(&sp)
        }
    }

    /// Fresnel blend of the reflected and refracted paths.
    fn trace_dielectric(
        &self,
        direction: Vec3,
        point: Vec3,
        normal: Vec3,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        let split = dielectric_split(direction, normal);

        let mut reflection_ray = Ray::offset(point, split.normal, split.reflection);
        let reflected = self.trace(&mut reflection_ray, depth + 1, rng);

        let refracted = match split.refraction {
            Some(dir) => {
                let mut refraction_ray = Ray::offset(point, -split.normal, dir);
                self.trace(&mut refraction_ray, depth + 1, rng)
            }
            None => Color::ZERO,
        };

        reflected * split.fresnel + refracted * (1.0 - split.fresnel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{PinholeCamera, Skybox};
    use crate::light::DirectionalLight;
    use crate::scene::{Mesh, SceneBuilder, TriangleScene};
    use glint_math::Mat4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn floor(material: MaterialProperties) -> TriangleScene {
        let mut builder = SceneBuilder::new();
        builder
            .add_mesh(&Mesh::quad(5.0, material), Mat4::IDENTITY)
            .unwrap();
        builder.build()
    }

    fn sky(color: Color) -> PinholeCamera {
        let mut camera = PinholeCamera::new().with_skybox(Skybox::Solid(color));
        camera.initialize();
        camera
    }

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.3, 2.0, -0.2), -Vec3::Y)
    }

    #[test]
    fn test_normal_incidence_split() {
        let split = dielectric_split(-Vec3::Y, Vec3::Y);
        let r0 = (0.46f32 / 2.46).powi(2);
        assert!((split.fresnel - r0).abs() < 1e-6);
        assert!((split.reflection - Vec3::Y).length() < 1e-6);
        assert!((split.refraction.unwrap() + Vec3::Y).length() < 1e-6);
        assert_eq!(split.normal, Vec3::Y);
    }

    #[test]
    fn test_total_internal_reflection() {
        // 60 degrees from the normal, leaving the glass
        let (s, c) = 60f32.to_radians().sin_cos();
        let split = dielectric_split(Vec3::new(s, c, 0.0), Vec3::Y);
        assert_eq!(split.fresnel, 1.0);
        assert!(split.refraction.is_none());
        assert_eq!(split.normal, -Vec3::Y);
        assert!(split.reflection.y < 0.0);

        // 30 degrees is below the critical angle
        let (s, c) = 30f32.to_radians().sin_cos();
        let split = dielectric_split(Vec3::new(s, c, 0.0), Vec3::Y);
        assert!(split.fresnel < 1.0);
        let refracted = split.refraction.unwrap();
        assert!(refracted.y > 0.0);
        assert!((refracted.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_exhausted_budget_is_black() {
        let scene = floor(MaterialProperties::emitter(Color::ONE));
        let camera = sky(Color::ONE);
        let lights = LightRegistry::new();
        let config = RenderConfig::default();
        let integrator = Integrator::new(&config, &scene, &camera, &lights);
        let mut rng = StdRng::seed_from_u64(0);

        let mut ray = down_ray();
        let budget = integrator.bounce_budget();
        assert_eq!(integrator.trace(&mut ray, budget, &mut rng), Color::ZERO);
        assert!(ray.hit.is_miss());
    }

    #[test]
    fn test_miss_returns_skybox_or_black() {
        let scene = floor(MaterialProperties::default());
        let camera = sky(Color::new(0.2, 0.4, 0.6));
        let lights = LightRegistry::new();
        let mut config = RenderConfig::default();
        let mut rng = StdRng::seed_from_u64(0);

        let mut up = Ray::new(Vec3::Y, Vec3::Y);
        let color = Integrator::new(&config, &scene, &camera, &lights).trace(&mut up, 0, &mut rng);
        assert_eq!(color, Color::new(0.2, 0.4, 0.6));

        config.skybox = false;
        let mut up = Ray::new(Vec3::Y, Vec3::Y);
        let color = Integrator::new(&config, &scene, &camera, &lights).trace(&mut up, 0, &mut rng);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_emission_only_without_lighting() {
        let scene = floor(MaterialProperties::emitter(Color::new(2.0, 1.0, 0.5)));
        let camera = sky(Color::ONE);
        let lights = LightRegistry::new();
        let config = RenderConfig {
            bounces: 0,
            lighting: false,
            ..Default::default()
        };
        let integrator = Integrator::new(&config, &scene, &camera, &lights);
        let mut rng = StdRng::seed_from_u64(0);

        let mut ray = down_ray();
        let color = integrator.trace(&mut ray, 0, &mut rng);
        assert_eq!(color, Color::new(2.0, 1.0, 0.5));
        assert!((ray.hit.t - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_debug_modes_return_channels() {
        let material = MaterialProperties::metal(Color::new(0.9, 0.5, 0.1), 0.25);
        let scene = floor(material);
        let camera = sky(Color::ONE);
        let lights = LightRegistry::new();
        let mut rng = StdRng::seed_from_u64(0);

        let expectations = [
            (RenderMode::BaseColor, Color::new(0.9, 0.5, 0.1)),
            (RenderMode::Metalness, Color::ONE),
            (RenderMode::Roughness, Color::splat(0.25)),
            (RenderMode::Emissive, Color::ZERO),
            (RenderMode::GeometryNormal, Color::new(0.5, 1.0, 0.5)),
            (RenderMode::ShadingNormal, Color::new(0.5, 1.0, 0.5)),
        ];
        for (mode, expected) in expectations {
            let config = RenderConfig {
                render_mode: mode,
                ..Default::default()
            };
            let integrator = Integrator::new(&config, &scene, &camera, &lights);
            let color = integrator.trace(&mut down_ray(), 0, &mut rng);
            assert!((color - expected).length() < 1e-5, "{mode:?}: {color:?}");
        }
    }

    #[test]
    fn test_mirror_reflects_sky() {
        let scene = floor(MaterialProperties::metal(Color::ONE, 0.0));
        let camera = sky(Color::new(0.25, 0.5, 0.75));
        let lights = LightRegistry::new();
        let config = RenderConfig {
            bounces: 1,
            lighting: false,
            ..Default::default()
        };
        let integrator = Integrator::new(&config, &scene, &camera, &lights);
        let mut rng = StdRng::seed_from_u64(9);

        let mut ray = Ray::new(Vec3::new(-1.0, 1.0, 0.35), Vec3::new(1.0, -1.0, 0.0));
        let color = integrator.trace(&mut ray, 0, &mut rng);
        assert!((color - Color::new(0.25, 0.5, 0.75)).length() < 1e-3, "{color:?}");
    }

    #[test]
    fn test_glass_at_last_bounce_takes_direct_light() {
        let scene = floor(MaterialProperties::glass());
        let camera = sky(Color::ZERO);
        let mut lights = LightRegistry::new();
        lights.add_directional(DirectionalLight::new(-Vec3::Y, Color::ONE));
        let mut rng = StdRng::seed_from_u64(2);

        // One bounce left: reflect/refract into a black sky
        let config = RenderConfig {
            bounces: 1,
            stochastic_lights: false,
            ..Default::default()
        };
        let color = Integrator::new(&config, &scene, &camera, &lights).trace(
            &mut down_ray(),
            0,
            &mut rng,
        );
        assert_eq!(color, Color::ZERO);

        // No bounces left: shaded like any other surface
        let config = RenderConfig {
            bounces: 0,
            stochastic_lights: false,
            ..Default::default()
        };
        let color = Integrator::new(&config, &scene, &camera, &lights).trace(
            &mut down_ray(),
            0,
            &mut rng,
        );
        assert!(color.x > 0.0);
    }
}
