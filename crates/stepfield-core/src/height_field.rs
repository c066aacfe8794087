//! Dense elevation grid owned by a single course build
//!
//! Axis 0 runs along the course (length), axis 1 across it (width). Elevations are
//! in meters; the consuming simulator does its own vertical quantization.

use std::ops::Range;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{CourseError, CourseResult};

/// Sentinel elevation for pits the policy has to jump or avoid
pub const PIT_HEIGHT: f32 = -2.0;

/// Half-open rectangle in signed grid indices: `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
}

impl GridRect {
    pub fn new(x0: i32, x1: i32, y0: i32, y1: i32) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn length(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn width(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Center cell (rounded down)
    pub fn center(&self) -> (i32, i32) {
        ((self.x0 + self.x1) / 2, (self.y0 + self.y1) / 2)
    }
}

/// Rectangle that has been checked against the grid dimensions
#[derive(Debug, Clone)]
pub struct CellRect {
    pub xs: Range<usize>,
    pub ys: Range<usize>,
}

/// Elevation grid in meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightField {
    heights: Array2<f32>,
    resolution: f32,
}

impl HeightField {
    /// Flat field of `length_idx x width_idx` cells
    pub fn new(length_idx: usize, width_idx: usize, resolution: f32) -> Self {
        Self {
            heights: Array2::zeros((length_idx, width_idx)),
            resolution,
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        self.heights.dim()
    }

    pub fn length_idx(&self) -> usize {
        self.heights.dim().0
    }

    pub fn width_idx(&self) -> usize {
        self.heights.dim().1
    }

    /// Meters per cell
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn heights(&self) -> &Array2<f32> {
        &self.heights
    }

    pub fn into_heights(self) -> Array2<f32> {
        self.heights
    }

    /// Elevation at a signed cell index, `None` outside the grid
    pub fn get(&self, x: i32, y: i32) -> Option<f32> {
        if x < 0 || y < 0 {
            return None;
        }
        self.heights.get([x as usize, y as usize]).copied()
    }

    /// Ground at default elevation (neither painted nor pit)
    pub fn is_flat_at(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(0.0)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some()
    }

    /// Check that `rect` is non-empty and lies entirely inside the grid
    pub fn validate(&self, rect: &GridRect) -> CourseResult<CellRect> {
        let (length_idx, width_idx) = self.dims();
        let inside = rect.x0 >= 0
            && rect.y0 >= 0
            && rect.x1 as i64 <= length_idx as i64
            && rect.y1 as i64 <= width_idx as i64;

        if rect.is_empty() || !inside {
            return Err(CourseError::OutOfBounds {
                rect: *rect,
                length_idx,
                width_idx,
            });
        }

        Ok(CellRect {
            xs: rect.x0 as usize..rect.x1 as usize,
            ys: rect.y0 as usize..rect.y1 as usize,
        })
    }

    /// Overwrite a rectangle with a constant elevation
    pub fn fill(&mut self, rect: &GridRect, height: f32) -> CourseResult<()> {
        let cells = self.validate(rect)?;
        self.heights
            .slice_mut(s![cells.xs, cells.ys])
            .fill(height);
        Ok(())
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, height: f32) {
        self.heights[[x, y]] = height;
    }

    pub(crate) fn at(&self, x: usize, y: usize) -> f32 {
        self.heights[[x, y]]
    }

    /// Every cell holds a finite elevation
    pub fn all_finite(&self) -> bool {
        self.heights.iter().all(|h| h.is_finite())
    }

    /// Every cell in the leading `rows` along the course axis is exactly zero
    pub fn is_flat_prefix(&self, rows: usize) -> bool {
        let rows = rows.min(self.length_idx());
        self.heights
            .slice(s![..rows, ..])
            .iter()
            .all(|&h| h == 0.0)
    }

    pub fn stats(&self) -> HeightStats {
        let count = self.heights.len().max(1) as f32;
        let min = self.heights.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = self.heights.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let mean = self.heights.iter().sum::<f32>() / count;
        let pit_cells = self.heights.iter().filter(|&&h| h == PIT_HEIGHT).count();
        HeightStats {
            min,
            max,
            mean,
            pit_cells,
        }
    }
}

/// Summary of a height field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub pit_cells: usize,
}

impl std::fmt::Display for HeightStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "min={:.3}m max={:.3}m mean={:.3}m pits={}",
            self.min, self.max, self.mean, self.pit_cells
        )
    }
}
