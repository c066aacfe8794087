//! Course recipes and variant dispatch

mod catalog;

pub use catalog::{select, standard_catalog, RecipeCatalog};

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyProfile;
use crate::error::CourseResult;
use crate::layout::{CourseBuilder, CoursePattern, LayoutConfig, LayoutOutcome};
use crate::quantize::Quantizer;
use crate::rng::CourseRng;

/// A named, fixed composition of obstacles forming one complete course
///
/// Parameter choices (difficulty offsets, spacing, lateral offsets, goal anchors)
/// live on the pattern's steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub pattern: CoursePattern,
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        pattern: CoursePattern,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            pattern,
        }
    }

    /// Lay out this recipe on a fresh `length_idx x width_idx` grid
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        length_idx: usize,
        width_idx: usize,
        quantizer: Quantizer,
        layout: &LayoutConfig,
        profile: &DifficultyProfile,
        difficulty: f32,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<LayoutOutcome> {
        CourseBuilder::new(length_idx, width_idx, quantizer, layout, profile, difficulty)?
            .run(&self.pattern, rng)
    }
}
