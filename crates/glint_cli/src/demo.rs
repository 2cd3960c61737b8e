//! Built-in demo scene: three spheres on a floor under mixed lighting.

use glint_math::{Mat4, Vec3};
use glint_renderer::{
    Color, DirectionalLight, LightError, LightRegistry, MaterialProperties, Mesh, PinholeCamera,
    PointLight, SceneBuilder, SceneError, Skybox, SpotLight, TriangleScene,
};

const SPHERE_SEGMENTS: u32 = 48;
const SPHERE_RINGS: u32 = 24;

pub fn build_scene() -> Result<TriangleScene, SceneError> {
    let mut builder = SceneBuilder::new();

    let floor = Mesh::quad(20.0, MaterialProperties::plastic(Color::splat(0.6), 0.8));
    builder.add_mesh(&floor, Mat4::IDENTITY)?;

    let spheres = [
        (Vec3::new(-2.2, 1.0, 0.0), MaterialProperties::glass()),
        (Vec3::new(0.0, 1.0, -0.5), MaterialProperties::metal(Color::new(0.95, 0.93, 0.88), 0.0)),
        (Vec3::new(2.2, 1.0, 0.0), MaterialProperties::plastic(Color::new(0.8, 0.2, 0.1), 0.35)),
    ];
    for (centre, material) in spheres {
        let mesh = Mesh::uv_sphere(1.0, SPHERE_SEGMENTS, SPHERE_RINGS, material);
        builder.add_mesh(&mesh, Mat4::from_translation(centre))?;
    }

    // Small glowing panel behind the spheres
    let panel = Mesh::quad(0.5, MaterialProperties::emitter(Color::new(4.0, 3.6, 3.0)));
    let transform = Mat4::from_translation(Vec3::new(0.0, 2.5, -3.0))
        * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
    builder.add_mesh(&panel, transform)?;

    Ok(builder.build())
}

pub fn build_lights() -> Result<LightRegistry, LightError> {
    let mut lights = LightRegistry::new();
    lights.add_point(PointLight::new(Vec3::new(-3.0, 4.0, 3.0), Color::new(12.0, 11.0, 10.0)))?;
    lights.add_point(PointLight::new(Vec3::new(3.5, 3.0, 2.0), Color::new(4.0, 6.0, 9.0)))?;
    lights.add_directional(DirectionalLight::new(
        Vec3::new(0.3, -1.0, -0.4),
        Color::new(1.0, 0.95, 0.85),
    ));
    lights.add_spot(SpotLight::new(
        Vec3::new(0.0, 6.0, 1.0),
        Vec3::new(0.0, -1.0, -0.25),
        Color::splat(30.0),
    ));
    Ok(lights)
}

pub fn build_camera(width: u32, height: u32, distortion: f32, skybox: Skybox) -> PinholeCamera {
    let mut camera = PinholeCamera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(0.0, 2.5, 8.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y)
        .with_fov(40.0)
        .with_distortion(distortion)
        .with_skybox(skybox);
    camera.initialize();
    camera
}
