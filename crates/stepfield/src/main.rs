use clap::Parser;
use std::path::PathBuf;
use stepfield::config::BatchConfig;
use stepfield::tiles::TileSampling;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// List available course recipes
    #[arg(long)]
    list_recipes: bool,

    /// Batch config file (RON, extension optional); defaults to ./stepfield.ron
    #[arg(long)]
    config: Option<PathBuf>,

    /// Difficulty levels of the tile grid
    #[arg(long)]
    rows: Option<usize>,

    /// Recipe variants per difficulty level
    #[arg(long)]
    cols: Option<usize>,

    /// Sample this many random (difficulty, variant) pairs instead of a grid
    #[arg(long)]
    random: Option<usize>,

    /// Base seed for the batch
    #[arg(long)]
    seed: Option<u64>,

    /// Course length in meters
    #[arg(long)]
    length: Option<f32>,

    /// Course width in meters
    #[arg(long)]
    width: Option<f32>,

    /// Grid resolution in meters per cell
    #[arg(long)]
    resolution: Option<f32>,

    /// Generator preset: default, rough, gentle
    #[arg(long)]
    preset: Option<String>,

    /// Generator config file (RON); overrides --preset
    #[arg(long)]
    generator: Option<PathBuf>,

    /// Manifest output path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include full height grids in the manifest
    #[arg(long)]
    include_heights: bool,
}

impl Args {
    /// Command-line flags take priority over the loaded config
    fn apply(self, config: &mut BatchConfig) {
        if let Some(rows) = self.rows {
            config.batch.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.batch.cols = cols;
        }
        if let Some(count) = self.random {
            config.batch.sampling = TileSampling::Random;
            config.batch.count = count;
        }
        if let Some(seed) = self.seed {
            config.batch.seed = seed;
        }
        if let Some(length) = self.length {
            config.course.length_m = length;
        }
        if let Some(width) = self.width {
            config.course.width_m = width;
        }
        if let Some(resolution) = self.resolution {
            config.course.resolution_m = resolution;
        }
        if let Some(preset) = self.preset {
            config.generator.preset = preset;
        }
        if self.generator.is_some() {
            config.generator.file = self.generator;
        }
        if let Some(output) = self.output {
            config.batch.output = output;
        }
        if self.include_heights {
            config.batch.include_heights = true;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Handle --list-recipes flag
    if args.list_recipes {
        stepfield::list_recipes();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => BatchConfig::load_from(path)?,
        None => BatchConfig::load()?,
    };
    args.apply(&mut config);

    let manifest = stepfield::run_batch(&config)?;
    if !manifest.failed.is_empty() {
        log::warn!(
            "{} of {} tiles failed",
            manifest.failed.len(),
            manifest.failed.len() + manifest.tiles.len()
        );
    }
    Ok(())
}
