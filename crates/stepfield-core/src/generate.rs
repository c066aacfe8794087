//! Course generation entry points

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::difficulty::clamp_difficulty;
use crate::error::{CourseError, CourseResult};
use crate::goals::{validate_course, GoalSequence};
use crate::height_field::HeightField;
use crate::quantize::Quantizer;
use crate::recipes::{standard_catalog, RecipeCatalog};
use crate::rng::{seeded, CourseRng};

/// Largest grid `generate` will allocate (cells, 256 MiB of `f32`)
pub const MAX_GRID_CELLS: usize = 1 << 26;

/// Inputs of one course build
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseRequest {
    pub length_m: f32,
    pub width_m: f32,
    pub resolution_m: f32,
    /// 0.0 = easiest, 1.0 = hardest; clamped
    pub difficulty: f32,
    /// Recipe selector in `[0, 1)`
    pub variant: f32,
}

impl CourseRequest {
    pub fn new(
        length_m: f32,
        width_m: f32,
        resolution_m: f32,
        difficulty: f32,
        variant: f32,
    ) -> Self {
        Self {
            length_m,
            width_m,
            resolution_m,
            difficulty,
            variant,
        }
    }

    /// Grid shape `(length_idx, width_idx)` for this request
    pub fn dims(&self) -> CourseResult<(usize, usize)> {
        let quantizer = Quantizer::new(self.resolution_m)?;
        let length_idx = self.axis_cells(&quantizer, "length", self.length_m)?;
        let width_idx = self.axis_cells(&quantizer, "width", self.width_m)?;

        let cells = length_idx.saturating_mul(width_idx);
        if cells > MAX_GRID_CELLS {
            return Err(CourseError::GridTooLarge {
                cells,
                max: MAX_GRID_CELLS,
            });
        }
        Ok((length_idx, width_idx))
    }

    fn axis_cells(
        &self,
        quantizer: &Quantizer,
        what: &'static str,
        meters: f32,
    ) -> CourseResult<usize> {
        let invalid = CourseError::InvalidUnit { what, value: meters };
        if !meters.is_finite() || meters <= 0.0 {
            return Err(invalid);
        }
        let cells = quantizer.scalar(meters).map_err(|_| invalid.clone())?;
        if cells < 1 {
            return Err(invalid);
        }
        Ok(cells as usize)
    }
}

/// Finished course: the height field and the goals a policy has to reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub height_field: HeightField,
    pub goals: GoalSequence,
    pub recipe_index: usize,
    pub recipe_name: String,
    /// Difficulty after clamping
    pub difficulty: f32,
    /// First cell past the spawn zone
    pub spawn_end: i32,
    /// First cell of the flat tail
    pub tail_start: i32,
}

/// Course generator bound to a config and a recipe catalog
pub struct CourseGenerator<'c> {
    config: GeneratorConfig,
    catalog: &'c RecipeCatalog,
}

impl CourseGenerator<'static> {
    /// Generator over the standard catalog
    pub fn new(config: GeneratorConfig) -> CourseResult<Self> {
        Self::with_catalog(config, standard_catalog())
    }
}

impl<'c> CourseGenerator<'c> {
    pub fn with_catalog(
        config: GeneratorConfig,
        catalog: &'c RecipeCatalog,
    ) -> CourseResult<Self> {
        config.validate()?;
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'c RecipeCatalog {
        self.catalog
    }

    /// Build one course, drawing all randomness from `rng`
    pub fn generate(
        &self,
        request: &CourseRequest,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<Course> {
        let quantizer = Quantizer::new(request.resolution_m)?;
        let (length_idx, width_idx) = request.dims()?;
        if request.difficulty.is_nan() {
            return Err(CourseError::InvalidDifficulty(request.difficulty));
        }
        let difficulty = clamp_difficulty(request.difficulty);

        let recipe_index = self.catalog.select(request.variant)?;
        let recipe = self
            .catalog
            .get(recipe_index)
            .ok_or(CourseError::InvalidVariant(request.variant))?;

        let outcome = recipe.build(
            length_idx,
            width_idx,
            quantizer,
            &self.config.layout,
            &self.config.difficulty,
            difficulty,
            rng,
        )?;
        validate_course(&outcome.field, &outcome.goals)?;

        log::debug!(
            "generated '{}' ({length_idx}x{width_idx}, difficulty {difficulty:.2}): {}",
            recipe.name,
            outcome.field.stats()
        );

        Ok(Course {
            height_field: outcome.field,
            goals: outcome.goals,
            recipe_index,
            recipe_name: recipe.name.clone(),
            difficulty,
            spawn_end: outcome.spawn_end,
            tail_start: outcome.tail_start,
        })
    }

    /// Build one course from a fresh generator seeded with `seed`
    pub fn generate_seeded(&self, request: &CourseRequest, seed: u64) -> CourseResult<Course> {
        let mut rng = seeded(seed);
        self.generate(request, &mut rng)
    }
}

/// Build one course with the default config and the standard catalog
pub fn generate(request: &CourseRequest, seed: u64) -> CourseResult<Course> {
    CourseGenerator::new(GeneratorConfig::default())?.generate_seeded(request, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{CoursePattern, ObstacleKind};
    use crate::recipes::Recipe;

    fn request(difficulty: f32, variant: f32) -> CourseRequest {
        CourseRequest::new(12.0, 4.0, 0.05, difficulty, variant)
    }

    #[test]
    fn test_dims() {
        assert_eq!(request(0.5, 0.0).dims().unwrap(), (240, 80));
        assert_eq!(
            CourseRequest::new(8.0, 2.5, 0.1, 0.0, 0.0).dims().unwrap(),
            (80, 25)
        );
    }

    #[test]
    fn test_invalid_dimensions() {
        for (length, width) in [(0.0, 4.0), (12.0, -1.0), (f32::NAN, 4.0), (12.0, 0.01)] {
            let req = CourseRequest::new(length, width, 0.05, 0.5, 0.0);
            assert!(
                matches!(req.dims(), Err(CourseError::InvalidUnit { .. })),
                "{length}x{width}"
            );
        }
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let err = CourseRequest::new(1.0e6, 4.0, 0.05, 0.5, 0.0).dims().unwrap_err();
        assert!(matches!(err, CourseError::GridTooLarge { .. }));

        // Beyond the index range of one axis
        let err = CourseRequest::new(1.0e12, 4.0, 0.05, 0.5, 0.0).dims().unwrap_err();
        assert!(matches!(err, CourseError::InvalidUnit { what: "length", .. }));
    }

    #[test]
    fn test_huge_layout_config_fails_cleanly() {
        let config = GeneratorConfig::from_ron("(layout: (spawn_length_m: 1e12))").unwrap();
        let generator = CourseGenerator::new(config).unwrap();
        let err = generator.generate_seeded(&request(0.5, 0.0), 1).unwrap_err();
        assert!(matches!(err, CourseError::InvalidUnit { what: "distance", .. }));

        let config = GeneratorConfig::from_ron("(layout: (spawn_length_m: 1e8))").unwrap();
        let generator = CourseGenerator::new(config).unwrap();
        let err = generator.generate_seeded(&request(0.5, 0.0), 1).unwrap_err();
        assert!(matches!(err, CourseError::CourseTooShort { .. }));
    }

    #[test]
    fn test_nan_difficulty_rejected() {
        let err = generate(&request(f32::NAN, 0.0), 1).unwrap_err();
        assert!(matches!(err, CourseError::InvalidDifficulty(_)));
    }

    #[test]
    fn test_out_of_range_difficulty_clamped() {
        let course = generate(&request(3.0, 0.0), 1).unwrap();
        assert_eq!(course.difficulty, 1.0);
    }

    #[test]
    fn test_invalid_variant_rejected() {
        let err = generate(&request(0.5, 1.0), 1).unwrap_err();
        assert!(matches!(err, CourseError::InvalidVariant(_)));
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = RecipeCatalog::new(vec![Recipe::new(
            "hurdles",
            "Only hurdles",
            CoursePattern::uniform(ObstacleKind::Hurdle),
        )]);
        let generator =
            CourseGenerator::with_catalog(GeneratorConfig::default(), &catalog).unwrap();
        let course = generator.generate_seeded(&request(0.5, 0.7), 3).unwrap();
        assert_eq!(course.recipe_index, 0);
        assert_eq!(course.recipe_name, "hurdles");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GeneratorConfig::default();
        config.layout.final_goal_offset_m = f32::INFINITY;
        assert!(matches!(
            CourseGenerator::new(config),
            Err(CourseError::InvalidConfig(_))
        ));
    }
}
