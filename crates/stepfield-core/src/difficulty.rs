//! Difficulty parameterization
//!
//! Maps a difficulty scalar (0.0 = easiest, 1.0 = hardest) to sampling ranges for each
//! obstacle dimension. The mapping is deterministic; sampling from the returned range is
//! done by the layout engine with its own RNG.
//!
//! All lengths and heights are in meters.

use serde::{Deserialize, Serialize};

/// Obstacle dimension that scales with difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    PlatformHeight,
    PlatformLength,
    /// Pit length for gaps, and flat spacing between obstacles
    GapLength,
    RampHeight,
    RampLength,
    BeamWidth,
    StoneSize,
    StepHeight,
    HurdleHeight,
    HurdleThickness,
    WaveAmplitude,
    WaveLength,
    /// Signed lateral offset of narrow obstacles from the course center line
    LateralJitter,
}

impl Attribute {
    pub const ALL: [Attribute; 13] = [
        Attribute::PlatformHeight,
        Attribute::PlatformLength,
        Attribute::GapLength,
        Attribute::RampHeight,
        Attribute::RampLength,
        Attribute::BeamWidth,
        Attribute::StoneSize,
        Attribute::StepHeight,
        Attribute::HurdleHeight,
        Attribute::HurdleThickness,
        Attribute::WaveAmplitude,
        Attribute::WaveLength,
        Attribute::LateralJitter,
    ];
}

/// Closed sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

/// Range whose bounds are affine in difficulty: `base + slope * difficulty`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineRange {
    pub min_base: f32,
    pub min_slope: f32,
    pub max_base: f32,
    pub max_slope: f32,
}

impl AffineRange {
    pub const fn new(min_base: f32, min_slope: f32, max_base: f32, max_slope: f32) -> Self {
        Self {
            min_base,
            min_slope,
            max_base,
            max_slope,
        }
    }

    /// Range that ignores difficulty
    pub const fn fixed(min: f32, max: f32) -> Self {
        Self::new(min, 0.0, max, 0.0)
    }

    /// Symmetric range `[-(base + slope*d), base + slope*d]`
    pub const fn symmetric(base: f32, slope: f32) -> Self {
        Self::new(-base, -slope, base, slope)
    }

    pub fn at(&self, difficulty: f32) -> ParamRange {
        let d = clamp_difficulty(difficulty);
        ParamRange {
            min: self.min_base + self.min_slope * d,
            max: self.max_base + self.max_slope * d,
        }
    }
}

/// Clamp to [0, 1]; NaN maps to 0
pub fn clamp_difficulty(difficulty: f32) -> f32 {
    if difficulty.is_nan() {
        0.0
    } else {
        difficulty.clamp(0.0, 1.0)
    }
}

/// Difficulty-to-range formulas for every attribute
///
/// Defaults keep the worst case of one obstacle slot (forward jitter + longest
/// obstacle + widest spacing) at 1.5 m, so six obstacles fit a 12 m course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyProfile {
    pub platform_height: AffineRange,
    pub platform_length: AffineRange,
    pub gap_length: AffineRange,
    pub ramp_height: AffineRange,
    pub ramp_length: AffineRange,
    pub beam_width: AffineRange,
    pub stone_size: AffineRange,
    pub step_height: AffineRange,
    pub hurdle_height: AffineRange,
    pub hurdle_thickness: AffineRange,
    pub wave_amplitude: AffineRange,
    pub wave_length: AffineRange,
    pub lateral_jitter: AffineRange,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            platform_height: AffineRange::new(0.05, 0.25, 0.10, 0.35),
            platform_length: AffineRange::new(0.9, -0.2, 1.0, -0.1),
            gap_length: AffineRange::new(0.10, 0.25, 0.20, 0.25),
            ramp_height: AffineRange::new(0.05, 0.20, 0.10, 0.30),
            ramp_length: AffineRange::fixed(0.8, 1.0),
            beam_width: AffineRange::new(0.60, -0.35, 0.80, -0.40),
            stone_size: AffineRange::new(0.80, -0.40, 1.00, -0.40),
            step_height: AffineRange::new(0.05, 0.15, 0.08, 0.20),
            hurdle_height: AffineRange::new(0.05, 0.20, 0.10, 0.30),
            hurdle_thickness: AffineRange::fixed(0.10, 0.20),
            wave_amplitude: AffineRange::new(0.02, 0.08, 0.04, 0.10),
            wave_length: AffineRange::new(1.0, -0.3, 1.2, -0.3),
            lateral_jitter: AffineRange::symmetric(0.10, 0.30),
        }
    }
}

impl DifficultyProfile {
    pub fn formula(&self, attribute: Attribute) -> AffineRange {
        match attribute {
            Attribute::PlatformHeight => self.platform_height,
            Attribute::PlatformLength => self.platform_length,
            Attribute::GapLength => self.gap_length,
            Attribute::RampHeight => self.ramp_height,
            Attribute::RampLength => self.ramp_length,
            Attribute::BeamWidth => self.beam_width,
            Attribute::StoneSize => self.stone_size,
            Attribute::StepHeight => self.step_height,
            Attribute::HurdleHeight => self.hurdle_height,
            Attribute::HurdleThickness => self.hurdle_thickness,
            Attribute::WaveAmplitude => self.wave_amplitude,
            Attribute::WaveLength => self.wave_length,
            Attribute::LateralJitter => self.lateral_jitter,
        }
    }

    pub fn range_for(&self, attribute: Attribute, difficulty: f32) -> ParamRange {
        self.formula(attribute).at(difficulty)
    }

    /// Check that every range is finite and ordered over the whole difficulty domain
    pub fn validate(&self) -> Result<(), String> {
        for attribute in Attribute::ALL {
            for d in [0.0, 1.0] {
                let range = self.range_for(attribute, d);
                if !range.min.is_finite() || !range.max.is_finite() {
                    return Err(format!("{attribute:?} has a non-finite bound"));
                }
                if range.min > range.max {
                    return Err(format!(
                        "{attribute:?} at difficulty {d}: min {} > max {}",
                        range.min, range.max
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Sampling range for an attribute under the default profile
pub fn range_for(attribute: Attribute, difficulty: f32) -> ParamRange {
    DifficultyProfile::default().range_for(attribute, difficulty)
}
