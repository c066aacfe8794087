//! Tile planning and parallel batch generation
//!
//! A batch is a list of `(difficulty, variant)` pairs, each with its own seed derived
//! from the base seed, so every tile can be rebuilt on its own from the manifest.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use stepfield_core::{CourseGenerator, CourseRequest, HeightStats};

use crate::config::{CourseConfig, TilingConfig};

/// Strategy for choosing the `(difficulty, variant)` of each tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileSampling {
    /// `rows` difficulty levels by `cols` evenly spaced variants
    Grid,
    /// `count` uniformly random pairs
    Random,
}

/// One planned tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub difficulty: f32,
    pub variant: f32,
    pub seed: u64,
}

/// Plan every tile of a batch
pub fn plan_tiles(tiling: &TilingConfig) -> Vec<TileSpec> {
    match tiling.sampling {
        TileSampling::Grid => plan_grid(tiling.rows, tiling.cols, tiling.seed),
        TileSampling::Random => plan_random(tiling.count, tiling.seed),
    }
}

/// Row `r` gets difficulty `r / (rows - 1)`, column `c` gets variant `c / cols`
fn plan_grid(rows: usize, cols: usize, base_seed: u64) -> Vec<TileSpec> {
    let mut tiles = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let difficulty = if rows > 1 {
            row as f32 / (rows - 1) as f32
        } else {
            0.0
        };
        for col in 0..cols {
            let variant = col as f32 / cols as f32;
            let index = tiles.len();
            tiles.push(TileSpec {
                index,
                row,
                col,
                difficulty,
                variant,
                seed: derive_seed(base_seed, index, difficulty, variant),
            });
        }
    }
    tiles
}

fn plan_random(count: usize, base_seed: u64) -> Vec<TileSpec> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(base_seed);
    (0..count)
        .map(|index| {
            let difficulty = rng.gen_range(0.0f32..=1.0);
            let variant = rng.gen_range(0.0f32..1.0);
            TileSpec {
                index,
                row: 0,
                col: index,
                difficulty,
                variant,
                seed: derive_seed(base_seed, index, difficulty, variant),
            }
        })
        .collect()
}

/// Derive a deterministic tile seed
///
/// Changing the base seed or the tile's parameters changes the seed.
fn derive_seed(base_seed: u64, index: usize, difficulty: f32, variant: f32) -> u64 {
    let mut hasher = DefaultHasher::new();
    base_seed.hash(&mut hasher);
    index.hash(&mut hasher);
    difficulty.to_bits().hash(&mut hasher);
    variant.to_bits().hash(&mut hasher);
    hasher.finish()
}

/// Manifest entry for one generated tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub seed: u64,
    pub difficulty: f32,
    pub variant: f32,
    pub recipe_index: usize,
    pub recipe_name: String,
    /// `(length_idx, width_idx)`
    pub shape: (usize, usize),
    pub spawn_end: i32,
    pub tail_start: i32,
    pub goals: Vec<(i32, i32)>,
    pub stats: HeightStats,
    /// Row-major elevations along the course axis, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heights: Option<Vec<Vec<f32>>>,
}

/// Tile that failed to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTile {
    pub index: usize,
    pub difficulty: f32,
    pub variant: f32,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generator: String,
    pub length_m: f32,
    pub width_m: f32,
    pub resolution_m: f32,
    pub tiles: Vec<TileRecord>,
    pub failed: Vec<FailedTile>,
}

/// Generate every tile in parallel; failed tiles are logged and skipped
pub fn generate_tiles(
    generator: &CourseGenerator<'_>,
    course: &CourseConfig,
    tiles: &[TileSpec],
    include_heights: bool,
    pb: &ProgressBar,
) -> Manifest {
    let results: Vec<std::result::Result<TileRecord, FailedTile>> = tiles
        .par_iter()
        .map(|tile| {
            let result = generate_tile(generator, course, tile, include_heights);
            pb.inc(1);
            result
        })
        .collect();

    let mut records = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(failure) => failed.push(failure),
        }
    }

    Manifest {
        generator: generator.config().name.clone(),
        length_m: course.length_m,
        width_m: course.width_m,
        resolution_m: course.resolution_m,
        tiles: records,
        failed,
    }
}

fn generate_tile(
    generator: &CourseGenerator<'_>,
    course: &CourseConfig,
    tile: &TileSpec,
    include_heights: bool,
) -> std::result::Result<TileRecord, FailedTile> {
    let request = CourseRequest::new(
        course.length_m,
        course.width_m,
        course.resolution_m,
        tile.difficulty,
        tile.variant,
    );

    match generator.generate_seeded(&request, tile.seed) {
        Ok(generated) => {
            let shape = generated.height_field.dims();
            let stats = generated.height_field.stats();
            let heights = include_heights.then(|| {
                generated
                    .height_field
                    .into_heights()
                    .outer_iter()
                    .map(|row| row.to_vec())
                    .collect()
            });
            Ok(TileRecord {
                index: tile.index,
                row: tile.row,
                col: tile.col,
                seed: tile.seed,
                difficulty: generated.difficulty,
                variant: tile.variant,
                recipe_index: generated.recipe_index,
                recipe_name: generated.recipe_name,
                shape,
                spawn_end: generated.spawn_end,
                tail_start: generated.tail_start,
                goals: generated.goals.to_pairs(),
                stats,
                heights,
            })
        }
        Err(e) => {
            log::warn!(
                "Skipping tile {} (difficulty {:.2}, variant {:.3}): {}",
                tile.index,
                tile.difficulty,
                tile.variant,
                e
            );
            Err(FailedTile {
                index: tile.index,
                difficulty: tile.difficulty,
                variant: tile.variant,
                error: e.to_string(),
            })
        }
    }
}

pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let json = serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepfield_core::GeneratorConfig;

    fn tiling(sampling: TileSampling) -> TilingConfig {
        TilingConfig {
            sampling,
            rows: 3,
            cols: 4,
            count: 6,
            seed: 42,
            ..TilingConfig::default()
        }
    }

    #[test]
    fn test_grid_plan() {
        let tiles = plan_tiles(&tiling(TileSampling::Grid));
        assert_eq!(tiles.len(), 12);

        assert_eq!(tiles[0].difficulty, 0.0);
        assert_eq!(tiles[0].variant, 0.0);
        assert_eq!(tiles[4].row, 1);
        assert_eq!(tiles[4].difficulty, 0.5);
        assert_eq!(tiles[11].difficulty, 1.0);
        assert_eq!(tiles[11].variant, 0.75);

        assert!(tiles.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn test_single_row_grid() {
        let tiles = plan_grid(1, 3, 0);
        assert!(tiles.iter().all(|t| t.difficulty == 0.0));
    }

    #[test]
    fn test_random_plan_in_range() {
        let tiles = plan_tiles(&tiling(TileSampling::Random));
        assert_eq!(tiles.len(), 6);
        for tile in &tiles {
            assert!((0.0..=1.0).contains(&tile.difficulty));
            assert!((0.0..1.0).contains(&tile.variant));
        }
    }

    #[test]
    fn test_deterministic_planning() {
        let a = plan_tiles(&tiling(TileSampling::Random));
        let b = plan_tiles(&tiling(TileSampling::Random));
        assert_eq!(a, b);

        let mut other = tiling(TileSampling::Random);
        other.seed = 43;
        assert_ne!(a, plan_tiles(&other));
    }

    #[test]
    fn test_tile_seeds_unique() {
        let tiles = plan_tiles(&tiling(TileSampling::Grid));
        let mut seeds: Vec<_> = tiles.iter().map(|t| t.seed).collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), tiles.len());
    }

    #[test]
    fn test_generate_batch() {
        let generator = CourseGenerator::new(GeneratorConfig::default()).unwrap();
        let course = CourseConfig::default();
        let tiles = plan_tiles(&tiling(TileSampling::Grid));

        let manifest = generate_tiles(&generator, &course, &tiles, true, &ProgressBar::hidden());
        assert_eq!(manifest.tiles.len(), 12);
        assert!(manifest.failed.is_empty());

        let first = &manifest.tiles[0];
        assert_eq!(first.shape, (240, 80));
        assert_eq!(first.goals.len(), 8);
        assert_eq!(first.recipe_index, 0);
        let heights = first.heights.as_ref().unwrap();
        assert_eq!(heights.len(), 240);
        assert_eq!(heights[0].len(), 80);
    }

    #[test]
    fn test_failed_tiles_are_skipped() {
        let generator = CourseGenerator::new(GeneratorConfig::default()).unwrap();
        // Too short for spawn plus six obstacles
        let course = CourseConfig {
            length_m: 2.0,
            ..CourseConfig::default()
        };
        let tiles = plan_grid(1, 2, 0);

        let manifest = generate_tiles(&generator, &course, &tiles, false, &ProgressBar::hidden());
        assert!(manifest.tiles.is_empty());
        assert_eq!(manifest.failed.len(), 2);
        assert!(manifest.failed[0].error.contains("too short"));
    }

    #[test]
    fn test_write_manifest() {
        let generator = CourseGenerator::new(GeneratorConfig::default()).unwrap();
        let course = CourseConfig::default();
        let tiles = plan_grid(2, 2, 1);
        let manifest = generate_tiles(&generator, &course, &tiles, false, &ProgressBar::hidden());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("tiles.json");
        write_manifest(&path, &manifest).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let restored: Manifest = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.tiles, manifest.tiles);
        assert!(!text.contains("\"heights\""));
    }
}
