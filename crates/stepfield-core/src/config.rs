//! Generator configuration
//!
//! Bundles the layout geometry and the difficulty profile so a curriculum can be
//! tuned from a RON file without touching code.

use serde::{Deserialize, Serialize};

use crate::difficulty::{AffineRange, DifficultyProfile};
use crate::error::{CourseError, CourseResult};
use crate::layout::LayoutConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub name: String,
    pub layout: LayoutConfig,
    pub difficulty: DifficultyProfile,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            layout: LayoutConfig::default(),
            difficulty: DifficultyProfile::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> CourseResult<()> {
        self.layout.validate()?;
        self.difficulty.validate().map_err(CourseError::InvalidConfig)
    }

    pub fn from_ron(text: &str) -> CourseResult<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> CourseResult<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}

// ============================================================================
// Preset helpers
// ============================================================================

impl GeneratorConfig {
    /// Uneven ground between spawn and tail
    pub fn preset_rough() -> Self {
        Self {
            name: "Rough".to_string(),
            layout: LayoutConfig {
                roughness_m: 0.02,
                ..LayoutConfig::default()
            },
            ..Self::default()
        }
    }

    /// Low obstacles and short gaps at every difficulty
    pub fn preset_gentle() -> Self {
        Self {
            name: "Gentle".to_string(),
            difficulty: DifficultyProfile {
                platform_height: AffineRange::new(0.03, 0.10, 0.06, 0.14),
                gap_length: AffineRange::new(0.10, 0.10, 0.15, 0.10),
                hurdle_height: AffineRange::new(0.03, 0.07, 0.06, 0.10),
                step_height: AffineRange::new(0.03, 0.07, 0.05, 0.10),
                ..DifficultyProfile::default()
            },
            ..Self::default()
        }
    }
}
