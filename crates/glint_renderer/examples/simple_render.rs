//! Simple path tracer example.
//!
//! Renders a sphere scene lit by a sun and a point light, and saves it in
//! PPM format.

use std::fs::File;
use std::io::{BufWriter, Write};

use glint_math::{Mat4, Vec3};
use glint_renderer::{
    color_to_rgba, Color, DirectionalLight, FrameBuffer, Integrator, LightRegistry,
    MaterialProperties, Mesh, PinholeCamera, PointLight, RenderConfig, Renderer, SceneBuilder,
    Skybox, TriangleScene,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAMES: u64 = 32;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("Glint Path Tracer - Simple Example");
    println!("==================================");

    // Build the scene
    let start = std::time::Instant::now();
    let scene = build_scene()?;
    println!(
        "Scene built in {:?} ({} triangles)",
        start.elapsed(),
        scene.triangle_count()
    );

    let mut lights = LightRegistry::new();
    lights.add_directional(DirectionalLight::new(
        Vec3::new(-0.4, -1.0, -0.3),
        Color::new(1.0, 0.95, 0.9),
    ));
    lights.add_point(PointLight::new(Vec3::new(2.0, 3.0, 2.0), Color::splat(8.0)))?;

    // Set up camera
    let mut camera = PinholeCamera::new()
        .with_resolution(400, 225)
        .with_position(
            Vec3::new(13.0, 2.0, 3.0), // look_from
            Vec3::new(0.0, 0.0, 0.0),  // look_at
            Vec3::new(0.0, 1.0, 0.0),  // vup
        )
        .with_fov(20.0)
        .with_skybox(Skybox::default());
    camera.initialize();

    let config = RenderConfig {
        bounces: 4,
        ..Default::default()
    };

    println!(
        "Rendering {}x{} @ {} frames...",
        camera.image_width, camera.image_height, FRAMES
    );

    let start = std::time::Instant::now();
    let renderer = Renderer::new(Integrator::new(&config, &scene, &camera, &lights), 42);
    let mut frame = FrameBuffer::new(camera.image_width, camera.image_height);
    for i in 0..FRAMES {
        renderer.render_frame(&mut frame, i);
    }
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.ppm";
    save_ppm(&frame, filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> Result<TriangleScene, glint_renderer::SceneError> {
    let mut builder = SceneBuilder::new();

    // Ground
    builder.add_mesh(
        &Mesh::quad(50.0, MaterialProperties::diffuse(Color::splat(0.5))),
        Mat4::IDENTITY,
    )?;

    // Three main spheres
    let main = [
        (Vec3::new(0.0, 1.0, 0.0), MaterialProperties::glass()),
        (
            Vec3::new(-4.0, 1.0, 0.0),
            MaterialProperties::diffuse(Color::new(0.4, 0.2, 0.1)),
        ),
        (
            Vec3::new(4.0, 1.0, 0.0),
            MaterialProperties::metal(Color::new(0.7, 0.6, 0.5), 0.0),
        ),
    ];
    for (centre, material) in main {
        builder.add_mesh(
            &Mesh::uv_sphere(1.0, 48, 24, material),
            Mat4::from_translation(centre),
        )?;
    }

    // Small random spheres
    let mut rng = StdRng::seed_from_u64(7);
    for a in -5..5 {
        for b in -5..5 {
            let centre = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            if (centre - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            let material = if choose_mat < 0.8 {
                let albedo = Color::new(rng.gen(), rng.gen(), rng.gen()) * rng.gen::<f32>();
                MaterialProperties::plastic(albedo, 0.3 + 0.7 * rng.gen::<f32>())
            } else if choose_mat < 0.95 {
                let albedo = Color::splat(0.5) + 0.5 * Color::new(rng.gen(), rng.gen(), rng.gen());
                MaterialProperties::metal(albedo, 0.5 * rng.gen::<f32>())
            } else {
                MaterialProperties::glass()
            };

            builder.add_mesh(
                &Mesh::uv_sphere(0.2, 16, 8, material),
                Mat4::from_translation(centre),
            )?;
        }
    }

    Ok(builder.build())
}

fn save_ppm(frame: &FrameBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", frame.width, frame.height)?;
    writeln!(writer, "255")?;

    for y in 0..frame.height {
        for x in 0..frame.width {
            let rgba = color_to_rgba(frame.average(x, y));
            writeln!(writer, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
        }
    }

    Ok(())
}
