//! # Blockyard Loader
//!
//! Headless run of the whole pipeline: load block types and terrain config,
//! generate the world, mesh every chunk in parallel and print statistics.
//!
//! ```bash
//! blockyard --blocks data/blocks.toml --terrain data/terrain.toml
//! blockyard --seed 42 --extent 8 4 8 --chunk-size 32
//! RUST_LOG=debug blockyard        # per-chunk rebuild logs
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use blockyard::voxel::{IndexMode, TerrainConfig};
use blockyard::{AppContext, AppResult};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

/// Generates and meshes a block world, then reports mesh statistics.
#[derive(Parser, Debug)]
#[command(name = "blockyard", version)]
struct Args {
    /// Block type registry (TOML). Built-in blocks if omitted.
    #[arg(long)]
    blocks: Option<PathBuf>,

    /// Terrain config (TOML). Defaults if omitted.
    #[arg(long)]
    terrain: Option<PathBuf>,

    /// Override the world seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the chunk grid size.
    #[arg(long, num_args = 3, value_names = ["W", "H", "D"])]
    extent: Option<Vec<u32>>,

    /// Override the chunk edge length.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Override the index encoding.
    #[arg(long, value_enum)]
    index_mode: Option<IndexArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IndexArg {
    List,
    Fan,
}

impl From<IndexArg> for IndexMode {
    fn from(arg: IndexArg) -> Self {
        match arg {
            IndexArg::List => Self::TriangleList,
            IndexArg::Fan => Self::TriangleFan,
        }
    }
}

impl Args {
    fn apply(&self, mut config: TerrainConfig) -> TerrainConfig {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some([w, h, d]) = self.extent.as_deref() {
            config.extent = [*w, *h, *d];
        }
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(mode) = self.index_mode {
            config.index_mode = mode.into();
        }
        config
    }
}

/// Logs a progress line each time `label` crosses another tenth.
fn progress_logger() -> impl FnMut(&str, f32) {
    let mut last = None;
    move |label: &str, fraction: f32| {
        let tenth = (fraction * 10.0).floor() as i32;
        if last != Some((label.to_owned(), tenth)) {
            info!("{label}: {:>3.0}%", fraction * 100.0);
            last = Some((label.to_owned(), tenth));
        }
    }
}

fn run(args: &Args) -> AppResult<()> {
    let mut context = AppContext::new();
    let registry = context.registry(args.blocks.as_deref())?;
    let config = args.apply((*context.terrain_config(args.terrain.as_deref())?).clone());
    info!(
        blocks = registry.len(),
        seed = config.seed,
        chunk_size = config.chunk_size,
        extent = ?config.extent,
        "starting"
    );

    let started = Instant::now();
    context.generate_terrain(&config, &registry, progress_logger())?;
    let generated = started.elapsed();

    let stats = context.rebuild_meshes(progress_logger())?;
    let meshed = started.elapsed() - generated;

    println!("═══════════════════════════════════════════");
    println!("                 BLOCKYARD");
    println!("═══════════════════════════════════════════");
    println!("{stats}");
    println!("generation:    {:.1} ms", generated.as_secs_f64() * 1000.0);
    println!("meshing:       {:.1} ms", meshed.as_secs_f64() * 1000.0);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
