//! Generate a 3D photo from a synthetic scene and report what came out
//!
//! ```text
//! cargo run --bin generate_photo -- --size 256 --settings my_settings.json
//! ```

mod scene;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use photomesh_core::{CameraFov, ImageSource, Settings};
use photomesh_pipeline::{MemorySink, PhotoInputs, PhotoPipeline};
use scene::Scene;

/// Build foreground and background meshes for a ball in front of a wall
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Depth map resolution (pixels per side)
    #[clap(short, long, default_value_t = 128)]
    size: usize,

    /// JSON settings file; missing fields take their defaults
    #[clap(long)]
    settings: Option<PathBuf>,

    /// Print the effective settings as JSON and exit
    #[clap(long)]
    dump_settings: bool,

    /// Horizontal field of view in degrees
    #[clap(long, default_value_t = 45.0)]
    hfov: f32,

    /// Vertical field of view in degrees
    #[clap(long, default_value_t = 58.0)]
    vfov: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<Settings>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => Settings::default(),
    };
    if args.dump_settings {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let scene = Scene::ball_and_wall(args.size)?;
    let pipeline = PhotoPipeline::new(settings)?;
    let mut sink = MemorySink::new();
    let inputs = PhotoInputs {
        color: &scene.color,
        depth: &scene.depth,
        foreground: &scene.foreground,
        fov: CameraFov::new(args.hfov, args.vfov),
    };

    let start = Instant::now();
    let photo = pipeline.generate(inputs, &mut sink)?;
    info!("Generated in {:?}", start.elapsed());

    for object in sink.children(photo.root) {
        if let Some(mesh) = &object.mesh {
            println!(
                "{:<12} {:>8} vertices {:>8} triangles {:>8} indices",
                object.name,
                mesh.vertex_count(),
                mesh.face_count(),
                mesh.triangle_indices().len()
            );
        }
    }
    for texture in &sink.textures {
        println!(
            "{:<32} {}x{} ({} texels to fill)",
            texture.name,
            texture.image.width(),
            texture.image.height(),
            texture.image.transparent_count()
        );
    }
    println!("{:#?}", photo.diagnostics);

    Ok(())
}
