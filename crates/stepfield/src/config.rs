//! Batch configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `stepfield.ron` file (if exists)
//! 3. Environment variables prefixed with `STEPFIELD_`
//!
//! Example environment variable: `STEPFIELD_BATCH__ROWS=10`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use stepfield_core::GeneratorConfig;

use crate::tiles::TileSampling;

/// Main batch configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchConfig {
    #[serde(default)]
    pub course: CourseConfig,

    #[serde(default)]
    pub batch: TilingConfig,

    #[serde(default)]
    pub generator: GeneratorSource,
}

/// Dimensions shared by every tile of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Course length in meters
    pub length_m: f32,
    /// Course width in meters
    pub width_m: f32,
    /// Meters per grid cell
    pub resolution_m: f32,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            length_m: 12.0,
            width_m: 4.0,
            resolution_m: 0.05,
        }
    }
}

/// How the tiles of a batch are chosen and where they go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilingConfig {
    pub sampling: TileSampling,
    /// Difficulty levels (grid sampling)
    pub rows: usize,
    /// Recipe variants per level (grid sampling)
    pub cols: usize,
    /// Tile count (random sampling)
    pub count: usize,
    pub seed: u64,
    /// Manifest path
    pub output: PathBuf,
    /// Store full height grids in the manifest
    pub include_heights: bool,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            sampling: TileSampling::Grid,
            rows: 5,
            cols: 20,
            count: 100,
            seed: 0,
            output: PathBuf::from("stepfield_tiles.json"),
            include_heights: false,
        }
    }
}

/// Where the generator config comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSource {
    /// `default`, `rough` or `gentle`
    pub preset: String,
    /// RON file with a full `GeneratorConfig`; overrides `preset`
    pub file: Option<PathBuf>,
}

impl Default for GeneratorSource {
    fn default() -> Self {
        Self {
            preset: "default".to_string(),
            file: None,
        }
    }
}

impl GeneratorSource {
    pub fn resolve(&self) -> Result<GeneratorConfig> {
        if let Some(path) = &self.file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read generator config {}", path.display()))?;
            return GeneratorConfig::from_ron(&text)
                .with_context(|| format!("Invalid generator config {}", path.display()));
        }

        match self.preset.as_str() {
            "default" => Ok(GeneratorConfig::default()),
            "rough" => Ok(GeneratorConfig::preset_rough()),
            "gentle" => Ok(GeneratorConfig::preset_gentle()),
            other => anyhow::bail!(
                "Unknown generator preset '{other}' (expected default, rough or gentle)"
            ),
        }
    }
}

impl BatchConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `stepfield.ron` file (if exists)
    /// 3. Environment variables prefixed with `STEPFIELD_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("stepfield"))
    }

    /// Same layering with an explicit config file (extension optional)
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = TilingConfig::default();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("course.length_m", 12.0)?
            .set_default("course.width_m", 4.0)?
            .set_default("course.resolution_m", 0.05)?
            .set_default("batch.sampling", "grid")?
            .set_default("batch.rows", defaults.rows as i64)?
            .set_default("batch.cols", defaults.cols as i64)?
            .set_default("batch.count", defaults.count as i64)?
            .set_default("batch.seed", defaults.seed as i64)?
            .set_default("batch.output", defaults.output.to_string_lossy().into_owned())?
            .set_default("batch.include_heights", false)?
            .set_default("generator.preset", "default")?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::with_name(&path.to_string_lossy())
                    .format(config::FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (STEPFIELD_BATCH__ROWS, etc.)
            .add_source(Environment::with_prefix("STEPFIELD").separator("__"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
