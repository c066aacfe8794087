//! Recipe registry and variant dispatcher

use once_cell::sync::Lazy;

use super::Recipe;
use crate::error::{CourseError, CourseResult};
use crate::layout::{CoursePattern, GoalAnchor, ObstacleKind, ObstacleStep};

static STANDARD: Lazy<RecipeCatalog> = Lazy::new(RecipeCatalog::standard);

/// Process-wide read-only catalog, built on first use
pub fn standard_catalog() -> &'static RecipeCatalog {
    &STANDARD
}

/// Ordered registry of recipes
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Single-kind runs, curated mixes, then every ordered pair of distinct kinds
    pub fn standard() -> Self {
        use GoalAnchor::*;
        use ObstacleKind::*;

        let step = ObstacleStep::new;
        let mut recipes = Vec::new();

        for kind in ObstacleKind::COURSE_KINDS {
            recipes.push(Recipe::new(
                format!("{}-run", kind.name()),
                format!("Six {} obstacles in a row", kind.name()),
                CoursePattern::uniform(kind),
            ));
        }

        recipes.push(Recipe::new(
            "staircase",
            "Three steps up with short treads, three steps down",
            CoursePattern::new([
                step(Step).spaced(0.1),
                step(Step).spaced(0.1),
                step(Step).spaced(0.3),
                step(StepDown).spaced(0.1),
                step(StepDown).spaced(0.1),
                step(StepDown).anchored(TrailingEdge),
            ]),
        ));
        recipes.push(Recipe::new(
            "gauntlet",
            "One of each, with an off-center beam and stone and a harder gap",
            CoursePattern::new([
                step(Platform),
                step(Gap).with_difficulty_offset(0.1),
                step(Beam).offset_laterally(0.4),
                step(Stone).offset_laterally(-0.4),
                step(Hurdle),
                step(Ramp).anchored(LeadingEdge),
            ]),
        ));
        if let Some(pattern) = CoursePattern::cycle(&[Waves, Mound, Slope]) {
            recipes.push(Recipe::new("rolling-hills", "Waves, mounds and side slopes", pattern));
        }
        recipes.push(Recipe::new(
            "jump-series",
            "Gaps widening along the course, hurdles and a short landing platform",
            CoursePattern::new([
                step(Gap),
                step(Platform).spaced(0.3),
                step(Gap).with_difficulty_offset(0.15),
                step(Hurdle).anchored(LeadingEdge),
                step(Gap).with_difficulty_offset(0.3),
                step(Hurdle),
            ]),
        ));
        recipes.push(Recipe::new(
            "stone-zigzag",
            "Stepping stones alternating left and right of the center line",
            CoursePattern::new(std::array::from_fn(|i| {
                let side = if i % 2 == 0 { 0.5 } else { -0.5 };
                step(Stone).offset_laterally(side).spaced(0.15)
            })),
        ));
        let slalom = [-0.6, 0.0, 0.6, 0.0, -0.6, 0.0];
        recipes.push(Recipe::new(
            "beam-slalom",
            "Beams swinging across the course",
            CoursePattern::new(slalom.map(|offset| step(Beam).offset_laterally(offset))),
        ));
        recipes.push(Recipe::new(
            "hurdle-rhythm",
            "Evenly spaced hurdles",
            CoursePattern::uniform(Hurdle).map_steps(|s| s.spaced(0.6)),
        ));
        recipes.push(Recipe::new(
            "climb",
            "Ramps getting steeper along the course",
            CoursePattern::uniform(Ramp).ramped(0.5),
        ));

        for a in ObstacleKind::COURSE_KINDS {
            for b in ObstacleKind::COURSE_KINDS {
                if a == b {
                    continue;
                }
                recipes.push(Recipe::new(
                    format!("{}-{}", a.name(), b.name()),
                    format!("Alternating {} and {}, easing in", a.name(), b.name()),
                    CoursePattern::alternating(a, b).ramped(0.2),
                ));
            }
        }

        Self { recipes }
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Recipe> {
        self.recipes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|r| r.name.as_str())
    }

    /// Index and recipe by name
    pub fn find(&self, name: &str) -> Option<(usize, &Recipe)> {
        self.recipes.iter().enumerate().find(|(_, r)| r.name == name)
    }

    /// Recipe index for a variant in `[0, 1)`: `floor(variant * len)`
    pub fn select(&self, variant: f32) -> CourseResult<usize> {
        if !variant.is_finite() || !(0.0..1.0).contains(&variant) || self.is_empty() {
            return Err(CourseError::InvalidVariant(variant));
        }
        let index = (variant * self.len() as f32).floor() as usize;
        Ok(index.min(self.len() - 1))
    }
}

/// Recipe index for `variant` in `catalog`
pub fn select(variant: f32, catalog: &RecipeCatalog) -> CourseResult<usize> {
    catalog.select(variant)
}
