use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use glint_renderer::{
    EnvironmentMap, FrameBuffer, Integrator, PostProcess, RenderConfig, Renderer, Skybox,
};

mod demo;

/// Render the built-in demo scene with the glint path tracer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON render configuration; omitted fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Number of accumulated frames
    #[arg(short, long, default_value_t = 16)]
    frames: u32,

    /// Override the configured bounce count
    #[arg(short, long)]
    bounces: Option<u32>,

    /// Base seed of the per-row random streams
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Equirectangular environment map used as the skybox
    #[arg(short, long)]
    environment: Option<PathBuf>,

    /// Light every hit with the first directional light only
    #[arg(long)]
    deterministic_lights: bool,

    /// Panini projection strength, 0 keeps the image rectilinear
    #[arg(long, default_value_t = 0.0)]
    distortion: f32,

    /// Apply the default vignette when the config has no post_process section
    #[arg(long)]
    post_process: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(bounces) = args.bounces {
        config.bounces = bounces;
    }
    if args.deterministic_lights {
        config.stochastic_lights = false;
    }
    if args.post_process && config.post_process.is_none() {
        config.post_process = Some(PostProcess::default());
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", config.to_json_string()?);
        return Ok(());
    }
    debug!("Render config: {config:?}");

    let skybox = match &args.environment {
        Some(path) => Skybox::Equirect(
            EnvironmentMap::open(path)
                .with_context(|| format!("Failed to load environment map {}", path.display()))?,
        ),
        None => Skybox::default(),
    };

    let scene = demo::build_scene().context("Failed to build demo scene")?;
    let lights = demo::build_lights().context("Failed to build demo lights")?;
    let camera = demo::build_camera(args.width, args.height, args.distortion, skybox);
    info!(
        "Scene: {} triangles in {} instances",
        scene.triangle_count(),
        scene.instance_count()
    );

    let renderer = Renderer::new(Integrator::new(&config, &scene, &camera, &lights), args.seed);
    let mut frame = FrameBuffer::new(camera.image_width, camera.image_height);

    let start = Instant::now();
    let frames = args.frames.max(1);
    for i in 0..frames {
        renderer.render_frame(&mut frame, u64::from(i));
    }
    info!("Rendered {} frames in {:.2?}", frames, start.elapsed());

    let image = frame
        .to_image_with(config.post_process.as_ref())
        .context("Frame buffer does not match its dimensions")?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Saved {}", args.output.display());

    Ok(())
}
