//! Obstacle primitive library
//!
//! Stateless painters that write a height profile into one rectangle of a
//! `HeightField`. Every painter validates its rectangle first and fails with
//! `OutOfBounds` instead of clipping.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::CourseResult;
use crate::height_field::{GridRect, HeightField, PIT_HEIGHT};
use crate::rng::CourseRng;

/// Axis along which a ramp varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampAxis {
    /// Along the course (x); a classic up or down ramp
    Course,
    /// Across the course (y); a side slope
    Lateral,
}

/// Footprint of a stepping stone inside its rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Footprint {
    Square,
    /// Ellipse inscribed in the rectangle
    Disc,
}

/// One height profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Constant elevation
    Platform { height: f32 },
    /// Linear from `start` at the leading cell to `end` at the trailing cell of `axis`
    Ramp { start: f32, end: f32, axis: RampAxis },
    /// Raised foothold; cells outside the footprint keep their elevation
    Stone { height: f32, footprint: Footprint },
    /// Radial cone falling from `peak` at the center to zero at the inscribed ellipse
    Mound { peak: f32 },
    /// Sine wave across the lateral axis, added to the existing elevation
    Undulation {
        amplitude: f32,
        /// Wavelength in cells
        wavelength: f32,
        phase: f32,
    },
    /// Pit sentinel
    Pit,
}

impl Primitive {
    /// Paint this primitive into `rect`
    pub fn paint(&self, field: &mut HeightField, rect: &GridRect) -> CourseResult<()> {
        match *self {
            Primitive::Platform { height } => field.fill(rect, height),
            Primitive::Pit => field.fill(rect, PIT_HEIGHT),
            Primitive::Ramp { start, end, axis } => paint_ramp(field, rect, start, end, axis),
            Primitive::Stone { height, footprint } => {
                paint_stone(field, rect, height, footprint)
            }
            Primitive::Mound { peak } => paint_mound(field, rect, peak),
            Primitive::Undulation {
                amplitude,
                wavelength,
                phase,
            } => add_undulation(field, rect, amplitude, wavelength, phase),
        }
    }

    /// Highest elevation this primitive can write (0 for additive/negative profiles)
    pub fn peak(&self) -> f32 {
        match *self {
            Primitive::Platform { height } | Primitive::Stone { height, .. } => height,
            Primitive::Ramp { start, end, .. } => start.max(end),
            Primitive::Mound { peak } => peak,
            Primitive::Undulation { amplitude, .. } => amplitude.abs(),
            Primitive::Pit => PIT_HEIGHT,
        }
    }
}

/// Fraction along `len` cells for cell `i`: 0 at the first cell, 1 at the last
fn ramp_t(i: usize, len: usize) -> f32 {
    if len <= 1 {
        0.0
    } else {
        i as f32 / (len - 1) as f32
    }
}

fn paint_ramp(
    field: &mut HeightField,
    rect: &GridRect,
    start: f32,
    end: f32,
    axis: RampAxis,
) -> CourseResult<()> {
    let cells = field.validate(rect)?;
    let (len_x, len_y) = (cells.xs.len(), cells.ys.len());

    for (i, x) in cells.xs.clone().enumerate() {
        for (j, y) in cells.ys.clone().enumerate() {
            let t = match axis {
                RampAxis::Course => ramp_t(i, len_x),
                RampAxis::Lateral => ramp_t(j, len_y),
            };
            field.set(x, y, start + (end - start) * t);
        }
    }
    Ok(())
}

/// Normalized elliptical distance of cell (i, j) from the rect center; 1.0 at the rim
fn radial_distance(i: usize, j: usize, len_x: usize, len_y: usize) -> f32 {
    let rx = len_x as f32 * 0.5;
    let ry = len_y as f32 * 0.5;
    let dx = (i as f32 + 0.5 - rx) / rx;
    let dy = (j as f32 + 0.5 - ry) / ry;
    (dx * dx + dy * dy).sqrt()
}

fn paint_stone(
    field: &mut HeightField,
    rect: &GridRect,
    height: f32,
    footprint: Footprint,
) -> CourseResult<()> {
    let cells = field.validate(rect)?;
    let (len_x, len_y) = (cells.xs.len(), cells.ys.len());

    for (i, x) in cells.xs.clone().enumerate() {
        for (j, y) in cells.ys.clone().enumerate() {
            let inside = match footprint {
                Footprint::Square => true,
                Footprint::Disc => radial_distance(i, j, len_x, len_y) <= 1.0,
            };
            if inside {
                field.set(x, y, height);
            }
        }
    }
    Ok(())
}

fn paint_mound(field: &mut HeightField, rect: &GridRect, peak: f32) -> CourseResult<()> {
    let cells = field.validate(rect)?;
    let (len_x, len_y) = (cells.xs.len(), cells.ys.len());

    for (i, x) in cells.xs.clone().enumerate() {
        for (j, y) in cells.ys.clone().enumerate() {
            let falloff = (1.0 - radial_distance(i, j, len_x, len_y)).max(0.0);
            let h = peak * falloff;
            if h > field.at(x, y) {
                field.set(x, y, h);
            }
        }
    }
    Ok(())
}

fn add_undulation(
    field: &mut HeightField,
    rect: &GridRect,
    amplitude: f32,
    wavelength: f32,
    phase: f32,
) -> CourseResult<()> {
    let cells = field.validate(rect)?;
    let wavelength = wavelength.max(1.0);

    for x in cells.xs.clone() {
        for (j, y) in cells.ys.clone().enumerate() {
            let h = field.at(x, y);
            if h == PIT_HEIGHT {
                continue;
            }
            let wave = amplitude * (TAU * j as f32 / wavelength + phase).sin();
            field.set(x, y, h + wave);
        }
    }
    Ok(())
}

/// Add uniform noise in `[-amplitude, amplitude]`, snapped to multiples of `step`
///
/// Pit cells are left untouched.
pub fn add_roughness(
    field: &mut HeightField,
    rect: &GridRect,
    amplitude: f32,
    step: f32,
    rng: &mut dyn CourseRng,
) -> CourseResult<()> {
    let cells = field.validate(rect)?;
    if amplitude <= 0.0 {
        return Ok(());
    }

    for x in cells.xs.clone() {
        for y in cells.ys.clone() {
            let h = field.at(x, y);
            if h == PIT_HEIGHT {
                continue;
            }
            let mut noise = rng.uniform(-amplitude, amplitude);
            if step > 0.0 {
                noise = (noise / step).round() * step;
            }
            field.set(x, y, h + noise);
        }
    }
    Ok(())
}
