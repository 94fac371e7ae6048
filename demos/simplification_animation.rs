//! Step through the quadtree simplification of a synthetic 3D photo
//!
//! Prints one line per collapsed region, the way a viewer would redraw the
//! mesh after every step.

mod scene;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::info;

use photomesh_core::{CameraFov, Settings};
use photomesh_pipeline::{MemorySink, PhotoInputs, PhotoPipeline};
use scene::Scene;

#[derive(ValueEnum, Clone, Copy)]
enum Layer {
    Foreground,
    Background,
}

/// Replay the simplification of one mesh layer step by step
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Depth map resolution (pixels per side)
    #[clap(short, long, default_value_t = 64)]
    size: usize,

    /// Which mesh to simplify
    #[clap(short, long, value_enum, default_value_t = Layer::Background)]
    layer: Layer,

    /// Flatness threshold
    #[clap(long, default_value_t = 0.025)]
    delta: f32,

    /// Stop after this many steps
    #[clap(long)]
    max_steps: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Keep the dense meshes so they can be simplified afterwards
    let settings = Settings {
        perform_simplification: false,
        maximum_delta_distance: args.delta,
        ..Default::default()
    };
    let pipeline = PhotoPipeline::new(settings)?;
    let scene = Scene::ball_and_wall(args.size)?;
    let inputs = PhotoInputs {
        color: &scene.color,
        depth: &scene.depth,
        foreground: &scene.foreground,
        fov: CameraFov::default(),
    };
    let photo = pipeline.generate(inputs, &mut MemorySink::new())?;

    let mut steps = match args.layer {
        Layer::Foreground => photo.dense.foreground_steps(pipeline.simplifier())?,
        Layer::Background => photo.dense.background_steps(pipeline.simplifier())?,
    };
    info!("Starting from {} triangles", steps.faces().len());

    let limit = args.max_steps.unwrap_or(usize::MAX);
    let mut taken = 0;
    while taken < limit {
        let Some(step) = steps.next() else { break };
        taken += 1;
        println!(
            "step {:>5}: collapsed [{}..{}]x[{}..{}], removed {:>5}, now {:>7} triangles",
            taken,
            step.region.x1,
            step.region.x2,
            step.region.y1,
            step.region.y2,
            step.removed_triangles,
            steps.faces().len()
        );
    }

    info!(
        "{} regions collapsed, {} triangles remain{}",
        steps.regions().len(),
        steps.faces().len(),
        if steps.is_finished() { "" } else { " (stopped early)" }
    );
    Ok(())
}
