//! Meters to grid-index conversion
//!
//! All conversions round half away from zero (`f32::round`).

use crate::error::{CourseError, CourseResult};

/// Convert a distance in meters to a grid index
pub fn to_index_scalar(value: f32, resolution: f32) -> CourseResult<i32> {
    Quantizer::new(resolution)?.scalar(value)
}

/// Convert a sequence of distances in meters to grid indices, preserving length and order
pub fn to_index_many(values: &[f32], resolution: f32) -> CourseResult<Vec<i32>> {
    Quantizer::new(resolution)?.many(values)
}

/// Quantizer with a validated resolution (meters per cell)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    resolution: f32,
}

impl Quantizer {
    pub fn new(resolution: f32) -> CourseResult<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(CourseError::InvalidUnit {
                what: "resolution",
                value: resolution,
            });
        }
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn scalar(&self, value: f32) -> CourseResult<i32> {
        if !value.is_finite() {
            return Err(CourseError::InvalidUnit {
                what: "distance",
                value,
            });
        }
        let cells = (value / self.resolution).round();
        // `i32::MAX as f32` rounds up to 2^31, already out of range
        if !(i32::MIN as f32..i32::MAX as f32).contains(&cells) {
            return Err(CourseError::InvalidUnit {
                what: "distance",
                value,
            });
        }
        Ok(cells as i32)
    }

    pub fn many(&self, values: &[f32]) -> CourseResult<Vec<i32>> {
        values.iter().map(|&v| self.scalar(v)).collect()
    }

    /// Quantize a length that must cover at least one cell
    pub fn extent(&self, value: f32) -> CourseResult<i32> {
        Ok(self.scalar(value)?.max(1))
    }
}
