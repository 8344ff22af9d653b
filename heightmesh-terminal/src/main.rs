/// Heightmesh - turn a BMP into a heightmap mesh or pixel mosaic
///
/// Usage: heightmesh <image.bmp> [--height 30] [--mode heightmap|mosaic]
///
/// Controls in the preview:
///   - WASD / Arrow Keys: Rotate
///   - E/R: Roll
///   - P: Toggle perspective/orthographic
///   - +/-: Zoom
///   - Q/ESC: Quit
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use heightmesh_terminal::{build_mesh, summary, MeshMode, Settings, TerminalApp};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "heightmesh", version, about = "Build meshes from BMP images")]
struct Args {
    /// BMP file to read
    image: PathBuf,

    /// TOML settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Elevation given to pure white
    #[arg(long = "height")]
    height_scale: Option<f32>,

    #[arg(long, value_enum)]
    mode: Option<MeshMode>,

    /// Skip UV generation
    #[arg(long)]
    no_uvs: bool,

    /// Down-sample so neither side exceeds this many pixels
    #[arg(long)]
    max_sample: Option<u32>,

    /// Scale the mesh to this world width
    #[arg(long)]
    world_width: Option<f32>,

    /// Print the mesh summary and exit without the preview
    #[arg(long)]
    stats: bool,

    #[arg(long)]
    debug: bool,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(height_scale) = self.height_scale {
            settings.height_scale = height_scale;
        }
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if self.no_uvs {
            settings.generate_uvs = false;
        }
        if self.max_sample.is_some() {
            settings.max_sample_size = self.max_sample;
        }
        if self.world_width.is_some() {
            settings.world_width = self.world_width;
        }
        settings.debug_mode |= self.debug;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log_filter()))
        .init();

    info!("Loading {}", args.image.display());
    let data = fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let (grid, mesh) = build_mesh(&data, &settings)
        .with_context(|| format!("Failed to build a mesh from {}", args.image.display()))?;

    println!("{}", summary(&grid, &mesh));
    if args.stats {
        return Ok(());
    }

    let mut app = TerminalApp::new(mesh)?;
    app.run()?;
    Ok(())
}
