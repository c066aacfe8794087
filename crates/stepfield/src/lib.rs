//! Headless batch generation of obstacle-course tiles

pub mod config;
pub mod tiles;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use stepfield_core::{standard_catalog, CourseGenerator};

use crate::config::BatchConfig;
use crate::tiles::Manifest;

/// List all recipes of the standard catalog
pub fn list_recipes() {
    let catalog = standard_catalog();
    println!("Available recipes:");
    println!();
    for (index, recipe) in catalog.iter().enumerate() {
        println!("  [{}] {}", index, recipe.name);
        println!("      {}", recipe.description);
    }
    println!();
    println!("Total: {} recipes", catalog.len());
}

/// Create a progress bar style
fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// Generate the whole batch and write its manifest
pub fn run_batch(config: &BatchConfig) -> Result<Manifest> {
    let generator_config = config.generator.resolve()?;
    let generator = CourseGenerator::new(generator_config)?;

    let tiles = tiles::plan_tiles(&config.batch);
    if tiles.is_empty() {
        anyhow::bail!("Batch has no tiles (check rows/cols/count)");
    }

    let pb = ProgressBar::new(tiles.len() as u64);
    pb.set_style(progress_style());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.println(format!(
        "Generating {} tiles ({:?} sampling, {} x {} m at {} m, generator '{}')",
        tiles.len(),
        config.batch.sampling,
        config.course.length_m,
        config.course.width_m,
        config.course.resolution_m,
        generator.config().name
    ));

    let manifest = tiles::generate_tiles(
        &generator,
        &config.course,
        &tiles,
        config.batch.include_heights,
        &pb,
    );
    pb.finish_with_message("done");

    tiles::write_manifest(&config.batch.output, &manifest)?;
    log::info!(
        "Wrote {} tiles ({} failed) to {}",
        manifest.tiles.len(),
        manifest.failed.len(),
        config.batch.output.display()
    );

    Ok(manifest)
}
