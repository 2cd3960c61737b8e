//! End-to-end behaviour of the integrator and the direct lighting estimator.

use std::f32::consts::{FRAC_1_PI, PI};
use std::sync::atomic::{AtomicUsize, Ordering};

use glint_math::{Hit, Mat4, Ray, Vec3};
use glint_renderer::{
    dielectric_split, Camera, Color, DirectLighting, DirectionalLight, FrameBuffer, Integrator,
    LightClass, LightRegistry, MaterialProperties, Mesh, PinholeCamera, PointLight,
    PointLightBrdfPolicy, RenderConfig, Renderer, Scene, SceneBuilder, ShadingPoint, Skybox,
    SpotLight, TriangleScene,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wraps a scene and counts intersection queries.
struct CountingScene {
    inner: TriangleScene,
    intersections: AtomicUsize,
}

impl CountingScene {
    fn new(inner: TriangleScene) -> Self {
        Self {
            inner,
            intersections: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.intersections.load(Ordering::Relaxed)
    }
}

impl Scene for CountingScene {
    fn intersect(&self, ray: &mut Ray) {
        self.intersections.fetch_add(1, Ordering::Relaxed);
        self.inner.intersect(ray);
    }

    fn is_occluded(&self, ray: &Ray) -> bool {
        self.inner.is_occluded(ray)
    }

    fn material(&self, hit: &Hit) -> MaterialProperties {
        self.inner.material(hit)
    }

    fn geometry_normal(&self, hit: &Hit) -> Vec3 {
        self.inner.geometry_normal(hit)
    }

    fn shading_normal(&self, hit: &Hit) -> Vec3 {
        self.inner.shading_normal(hit)
    }
}

fn plane(material: MaterialProperties) -> TriangleScene {
    let mut builder = SceneBuilder::new();
    builder
        .add_mesh(&Mesh::quad(10.0, material), Mat4::IDENTITY)
        .unwrap();
    builder.build()
}

/// Two facing mirrors at y = 0 and y = 2.
fn mirror_corridor(glow: Color) -> TriangleScene {
    let mirror = MaterialProperties::metal(Color::ONE, 0.0).with_emissive(glow);
    let mut builder = SceneBuilder::new();
    builder
        .add_mesh(&Mesh::quad(10.0, mirror), Mat4::IDENTITY)
        .unwrap();
    let ceiling = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)) * Mat4::from_rotation_x(PI);
    builder.add_mesh(&Mesh::quad(10.0, mirror), ceiling).unwrap();
    builder.build()
}

fn black_sky() -> PinholeCamera {
    let mut camera = PinholeCamera::new().with_skybox(Skybox::Solid(Color::ZERO));
    camera.initialize();
    camera
}

#[test]
fn lambertian_plane_under_overhead_sun() {
    init_logger();
    let scene = plane(MaterialProperties::diffuse(Color::ONE));
    let mut lights = LightRegistry::new();
    lights.add_directional(DirectionalLight::new(-Vec3::Y, Color::ONE));

    let mut camera = PinholeCamera::new()
        .with_resolution(9, 9)
        .with_position(Vec3::new(0.3, 5.0, -0.2), Vec3::new(0.3, 0.0, -0.2), Vec3::Z)
        .with_fov(10.0)
        .with_skybox(Skybox::Solid(Color::ZERO));
    camera.initialize();

    let config = RenderConfig {
        bounces: 0,
        stochastic_lights: false,
        gamma_corrected: false,
        antialiasing: false,
        ..Default::default()
    };
    let integrator = Integrator::new(&config, &scene, &camera, &lights);
    let mut rng = StdRng::seed_from_u64(1);

    let mut ray = camera.primary_ray(4.0, 4.0);
    let color = integrator.trace(&mut ray, 0, &mut rng);

    // Diffuse 1/pi scaled by the (1 - F) share, plus a faint specular term
    for c in 0..3 {
        assert!((color[c] - FRAC_1_PI).abs() < 0.02, "{color:?}");
        assert!((color[c] - 0.3088).abs() < 1e-3, "{color:?}");
    }
    assert!((ray.hit.t - 5.0).abs() < 1e-3);

    // The same pixel through the frame driver
    let renderer = Renderer::new(integrator, 3);
    let mut frame = FrameBuffer::new(9, 9);
    renderer.render_frame(&mut frame, 0);
    renderer.render_frame(&mut frame, 1);
    assert_eq!(frame.samples_at(4, 4), 2);
    assert!((frame.average(4, 4) - color).length() < 1e-5);
}

#[test]
fn trace_at_budget_never_touches_the_scene() {
    let scene = CountingScene::new(mirror_corridor(Color::ONE));
    let camera = black_sky();
    let lights = LightRegistry::new();
    let config = RenderConfig {
        bounces: 3,
        ..Default::default()
    };
    let integrator = Integrator::new(&config, &scene, &camera, &lights);
    let mut rng = StdRng::seed_from_u64(0);

    let mut ray = Ray::new(Vec3::new(0.3, 1.0, -0.2), -Vec3::Y);
    let color = integrator.trace(&mut ray, integrator.bounce_budget(), &mut rng);
    assert_eq!(color, Color::ZERO);
    assert_eq!(scene.count(), 0);
}

#[test]
fn recursion_stops_after_the_bounce_budget() {
    let glow = Color::new(0.1, 0.2, 0.3);
    let scene = CountingScene::new(mirror_corridor(glow));
    let camera = black_sky();
    let lights = LightRegistry::new();
    let config = RenderConfig {
        bounces: 3,
        lighting: false,
        ..Default::default()
    };
    let integrator = Integrator::new(&config, &scene, &camera, &lights);
    let mut rng = StdRng::seed_from_u64(0);

    // Bounces forever between the mirrors until the budget runs out
    let mut ray = Ray::new(Vec3::new(0.3, 1.0, -0.2), -Vec3::Y);
    let color = integrator.trace(&mut ray, 0, &mut rng);

    assert_eq!(scene.count(), 4);
    assert!((color - glow * 4.0).length() < 1e-4, "{color:?}");
}

fn mixed_lights() -> LightRegistry {
    let mut lights = LightRegistry::new();
    lights
        .add_point(PointLight::new(Vec3::new(1.0, 2.0, 0.0), Color::splat(6.0)))
        .unwrap();
    lights
        .add_point(PointLight::new(Vec3::new(-2.0, 3.0, 1.0), Color::new(4.0, 2.0, 1.0)))
        .unwrap();
    lights.add_directional(DirectionalLight::new(Vec3::new(0.2, -1.0, 0.1), Color::ONE));
    lights.add_directional(DirectionalLight::new(
        Vec3::new(-0.5, -1.0, 0.0),
        Color::new(0.3, 0.3, 0.6),
    ));
    lights.add_spot(SpotLight::new(Vec3::new(0.0, 3.0, 0.0), -Vec3::Y, Color::splat(9.0)));
    lights
}

#[test]
fn stochastic_direct_lighting_is_unbiased() {
    let scene = SceneBuilder::new().build();
    let lights = mixed_lights();
    let config = RenderConfig::default();
    let direct = DirectLighting::new(&scene, &lights, &config.brdf, PointLightBrdfPolicy::PerLane);

    let material = MaterialProperties::plastic(Color::new(0.7, 0.5, 0.3), 0.5);
    let sp = ShadingPoint {
        position: Vec3::ZERO,
        normal: Vec3::Y,
        view: Vec3::new(0.0, 1.0, 1.0).normalize(),
        material: &material,
    };
    let mut rng = StdRng::seed_from_u64(21);

    // Every light evaluated once, no sampling involved
    let expected = direct.point_lights(&sp, &mut rng)
        + lights
            .directional
            .iter()
            .map(|l| direct.directional(l, &sp))
            .sum::<Color>()
        + lights.spots.iter().map(|l| direct.spot(l, &sp)).sum::<Color>();

    let trials = 40_000;
    let mut sum = Color::ZERO;
    for _ in 0..trials {
        sum += direct.sample(&sp, &mut rng);
    }
    let mean = sum / trials as f32;

    for c in 0..3 {
        let error = (mean[c] - expected[c]).abs() / expected[c];
        assert!(error < 0.03, "channel {c}: {} vs {}", mean[c], expected[c]);
    }

    // Each class on its own sums its lights in expectation too
    let mut directional = Color::ZERO;
    for _ in 0..4_000 {
        directional += direct.class_contribution(LightClass::Directional, &sp, &mut rng);
    }
    let exact: Color = lights.directional.iter().map(|l| direct.directional(l, &sp)).sum();
    assert!(((directional / 4_000.0) - exact).length() / exact.length() < 0.05);
}

#[test]
fn shared_lane_policy_weights_the_summed_radiance() {
    let scene = SceneBuilder::new().build();
    let mut lights = LightRegistry::new();
    let positions = [Vec3::new(2.0, 2.0, 0.0), Vec3::new(-1.0, 3.0, 1.0)];
    for p in positions {
        lights.add_point(PointLight::new(p, Color::splat(5.0))).unwrap();
    }
    let config = RenderConfig::default();
    let material = MaterialProperties::plastic(Color::ONE, 0.4);
    let view = Vec3::new(0.2, 1.0, 0.3).normalize();
    let sp = ShadingPoint {
        position: Vec3::ZERO,
        normal: Vec3::Y,
        view,
        material: &material,
    };

    let brdf = |p: Vec3| config.brdf.eval_combined_brdf(Vec3::Y, p.normalize(), view, &material);
    let radiance: Color = positions.iter().map(|p| Color::splat(5.0) / p.length_squared()).sum();

    let shared =
        DirectLighting::new(&scene, &lights, &config.brdf, PointLightBrdfPolicy::SharedLane);
    let per_lane =
        DirectLighting::new(&scene, &lights, &config.brdf, PointLightBrdfPolicy::PerLane);
    let mut rng = StdRng::seed_from_u64(4);

    let trials = 20_000;
    let mut sum = Color::ZERO;
    for _ in 0..trials {
        sum += shared.point_lights(&sp, &mut rng);
    }
    let mean = sum / trials as f32;
    let expected = 0.5 * (brdf(positions[0]) + brdf(positions[1])) * radiance;
    assert!((mean - expected).length() / expected.length() < 0.03);

    let exact: Color = positions
        .iter()
        .map(|p| brdf(*p) * Color::splat(5.0) / p.length_squared())
        .sum();
    let per_lane_value = per_lane.point_lights(&sp, &mut rng);
    assert!((per_lane_value - exact).length() < 1e-5);
}

#[test]
fn glass_exit_beyond_critical_angle_reflects_everything() {
    // Critical angle of 1.46 glass is about 43.2 degrees
    let critical = (1.0f32 / 1.46).asin().to_degrees();
    assert!((critical - 43.2).abs() < 0.1);

    for degrees in [45.0f32, 60.0, 80.0] {
        let (s, c) = degrees.to_radians().sin_cos();
        let split = dielectric_split(Vec3::new(s, c, 0.0), Vec3::Y);
        assert_eq!(split.fresnel, 1.0, "{degrees} deg");
        assert!(split.refraction.is_none());
    }

    let (s, c) = 40f32.to_radians().sin_cos();
    let split = dielectric_split(Vec3::new(s, c, 0.0), Vec3::Y);
    assert!(split.fresnel < 1.0);
    assert!(split.refraction.is_some());
}

#[test]
fn light_passes_through_a_glass_pane() {
    // Glass floor over a glowing floor, seen from above
    let mut builder = SceneBuilder::new();
    builder
        .add_mesh(&Mesh::quad(10.0, MaterialProperties::glass()), Mat4::IDENTITY)
        .unwrap();
    builder
        .add_mesh(
            &Mesh::quad(10.0, MaterialProperties::emitter(Color::ONE)),
            Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
        )
        .unwrap();
    let scene = builder.build();
    let camera = black_sky();
    let lights = LightRegistry::new();
    let config = RenderConfig {
        bounces: 2,
        ..Default::default()
    };
    let integrator = Integrator::new(&config, &scene, &camera, &lights);
    let mut rng = StdRng::seed_from_u64(0);

    let mut ray = Ray::new(Vec3::new(0.3, 1.0, -0.2), -Vec3::Y);
    let color = integrator.trace(&mut ray, 0, &mut rng);

    // Transmitted share of the emission at normal incidence
    let r0 = (0.46f32 / 2.46).powi(2);
    assert!((color - Color::splat(1.0 - r0)).length() < 1e-4, "{color:?}");
}
