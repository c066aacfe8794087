//! Course layout engine
//!
//! Walks a cursor along the course axis and places one obstacle per slot:
//!
//! `Spawn -> Obstacle(0) -> ... -> Obstacle(5) -> Tail -> Done`
//!
//! The spawn zone and the tail are flat and span the full width. Every obstacle
//! records exactly one goal, so a finished course always has `GOAL_COUNT` goals.

use std::f32::consts::TAU;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::difficulty::{clamp_difficulty, Attribute, DifficultyProfile, ParamRange};
use crate::error::{CourseError, CourseResult};
use crate::goals::{GoalSequence, GOAL_COUNT};
use crate::height_field::{GridRect, HeightField};
use crate::primitives::{add_roughness, Footprint, Primitive, RampAxis};
use crate::quantize::Quantizer;
use crate::rng::CourseRng;

/// Obstacles per course: every goal except spawn and final belongs to one
pub const OBSTACLE_SLOTS: usize = GOAL_COUNT - 2;

/// Geometry of the fixed parts of a course (meters)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Flat spawn zone at the start of the course
    pub spawn_length_m: f32,
    /// Distance of the spawn goal before the end of the spawn zone
    pub spawn_goal_inset_m: f32,
    /// Distance of the final goal past the last obstacle slot
    pub final_goal_offset_m: f32,
    /// Margin on each side that obstacle footholds stay out of
    pub lateral_margin_m: f32,
    /// Upper bound of the forward jitter applied to each obstacle
    pub max_forward_jitter_m: f32,
    /// Amplitude of additive noise between spawn and tail (0 = off)
    pub roughness_m: f32,
    /// Vertical step the noise is snapped to
    pub roughness_step_m: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spawn_length_m: 2.0,
            spawn_goal_inset_m: 0.25,
            final_goal_offset_m: 0.4,
            lateral_margin_m: 0.3,
            max_forward_jitter_m: 0.05,
            roughness_m: 0.0,
            roughness_step_m: 0.005,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> CourseResult<()> {
        let fields = [
            ("spawn_length_m", self.spawn_length_m),
            ("spawn_goal_inset_m", self.spawn_goal_inset_m),
            ("final_goal_offset_m", self.final_goal_offset_m),
            ("lateral_margin_m", self.lateral_margin_m),
            ("max_forward_jitter_m", self.max_forward_jitter_m),
            ("roughness_m", self.roughness_m),
            ("roughness_step_m", self.roughness_step_m),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CourseError::config(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if self.spawn_length_m == 0.0 {
            return Err(CourseError::config("spawn_length_m must be > 0"));
        }
        Ok(())
    }
}

/// Kind of obstacle a recipe can place in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Raised flat box across the lateral band
    Platform,
    /// Ramp rising along the course, dropping back at its end
    Ramp,
    /// Side slope across the lateral band
    Slope,
    /// Narrow walkway over a full-width pit
    Beam,
    /// Single raised stepping stone
    Stone,
    /// Stair step one level above the previous step
    Step,
    /// Stair step one level below the previous step
    StepDown,
    /// Full-width pit
    Gap,
    /// Thin full-width bar to step over
    Hurdle,
    /// Sinusoidal ground across the lateral band
    Waves,
    /// Radial mound
    Mound,
}

impl ObstacleKind {
    /// Kinds that make a sensible course on their own
    pub const COURSE_KINDS: [ObstacleKind; 10] = [
        ObstacleKind::Platform,
        ObstacleKind::Ramp,
        ObstacleKind::Slope,
        ObstacleKind::Beam,
        ObstacleKind::Stone,
        ObstacleKind::Step,
        ObstacleKind::Gap,
        ObstacleKind::Hurdle,
        ObstacleKind::Waves,
        ObstacleKind::Mound,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ObstacleKind::Platform => "platform",
            ObstacleKind::Ramp => "ramp",
            ObstacleKind::Slope => "slope",
            ObstacleKind::Beam => "beam",
            ObstacleKind::Stone => "stone",
            ObstacleKind::Step => "step",
            ObstacleKind::StepDown => "step-down",
            ObstacleKind::Gap => "gap",
            ObstacleKind::Hurdle => "hurdle",
            ObstacleKind::Waves => "waves",
            ObstacleKind::Mound => "mound",
        }
    }

    /// Where the goal of this kind goes unless a recipe says otherwise
    pub fn default_anchor(&self) -> GoalAnchor {
        match self {
            ObstacleKind::Gap | ObstacleKind::Hurdle => GoalAnchor::TrailingEdge,
            _ => GoalAnchor::Center,
        }
    }

    fn is_stair(&self) -> bool {
        matches!(self, ObstacleKind::Step | ObstacleKind::StepDown)
    }

    /// Attribute that sets the footprint length along the course axis
    fn length_attribute(&self) -> Attribute {
        match self {
            ObstacleKind::Ramp | ObstacleKind::Slope => Attribute::RampLength,
            ObstacleKind::Stone => Attribute::StoneSize,
            ObstacleKind::Gap => Attribute::GapLength,
            ObstacleKind::Hurdle => Attribute::HurdleThickness,
            ObstacleKind::Platform
            | ObstacleKind::Beam
            | ObstacleKind::Step
            | ObstacleKind::StepDown
            | ObstacleKind::Waves
            | ObstacleKind::Mound => Attribute::PlatformLength,
        }
    }
}

/// Position of an obstacle's goal relative to its footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalAnchor {
    /// Center of the foothold
    Center,
    /// Last cell before the obstacle
    LeadingEdge,
    /// First cell past the obstacle
    TrailingEdge,
}

/// One slot of a course pattern, with optional per-slot parameter choices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleStep {
    pub kind: ObstacleKind,
    pub anchor: GoalAnchor,
    /// Added to the course difficulty for this slot, then clamped to `[0, 1]`
    #[serde(default)]
    pub difficulty_offset: f32,
    /// Fixed lateral offset of the foothold from the center line (meters)
    #[serde(default)]
    pub lateral_offset_m: Option<f32>,
    /// Fixed run-out after the obstacle (meters)
    #[serde(default)]
    pub spacing_m: Option<f32>,
}

impl ObstacleStep {
    pub fn new(kind: ObstacleKind) -> Self {
        Self {
            kind,
            anchor: kind.default_anchor(),
            difficulty_offset: 0.0,
            lateral_offset_m: None,
            spacing_m: None,
        }
    }

    pub fn anchored(self, anchor: GoalAnchor) -> Self {
        Self { anchor, ..self }
    }

    pub fn with_difficulty_offset(self, difficulty_offset: f32) -> Self {
        Self {
            difficulty_offset,
            ..self
        }
    }

    pub fn offset_laterally(self, meters: f32) -> Self {
        Self {
            lateral_offset_m: Some(meters),
            ..self
        }
    }

    pub fn spaced(self, meters: f32) -> Self {
        Self {
            spacing_m: Some(meters),
            ..self
        }
    }
}

impl From<ObstacleKind> for ObstacleStep {
    fn from(kind: ObstacleKind) -> Self {
        Self::new(kind)
    }
}

/// Ordered obstacle slots of a course
///
/// Always exactly `OBSTACLE_SLOTS` long, so the goal sequence cannot come out short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePattern {
    steps: [ObstacleStep; OBSTACLE_SLOTS],
}

impl CoursePattern {
    pub fn new(steps: [ObstacleStep; OBSTACLE_SLOTS]) -> Self {
        Self { steps }
    }

    pub fn from_kinds(kinds: [ObstacleKind; OBSTACLE_SLOTS]) -> Self {
        Self::new(kinds.map(ObstacleStep::new))
    }

    /// Same kind in every slot
    pub fn uniform(kind: ObstacleKind) -> Self {
        Self::from_kinds([kind; OBSTACLE_SLOTS])
    }

    /// `a, b, a, b, ...`
    pub fn alternating(a: ObstacleKind, b: ObstacleKind) -> Self {
        Self::from_kinds(std::array::from_fn(|i| if i % 2 == 0 { a } else { b }))
    }

    /// Repeat `kinds` until every slot is filled; `None` for an empty list
    pub fn cycle(kinds: &[ObstacleKind]) -> Option<Self> {
        if kinds.is_empty() {
            return None;
        }
        Some(Self::from_kinds(std::array::from_fn(|i| {
            kinds[i % kinds.len()]
        })))
    }

    /// Apply `f` to every step
    pub fn map_steps(self, f: impl FnMut(ObstacleStep) -> ObstacleStep) -> Self {
        Self::new(self.steps.map(f))
    }

    /// Spread difficulty offsets linearly over the slots, from `-spread / 2` to `spread / 2`
    pub fn ramped(mut self, spread: f32) -> Self {
        let last = (OBSTACLE_SLOTS - 1) as f32;
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.difficulty_offset = spread * (i as f32 / last - 0.5);
        }
        self
    }

    pub fn steps(&self) -> &[ObstacleStep] {
        &self.steps
    }

    pub fn kinds(&self) -> impl Iterator<Item = ObstacleKind> + '_ {
        self.steps.iter().map(|s| s.kind)
    }
}

/// Forward-progress state of a course build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Next free cell along the course axis
    pub x: i32,
    /// Course center line
    pub mid_y: i32,
    /// Elevation of the current staircase (0 when not on stairs)
    pub stair_height: f32,
}

/// Lateral cells obstacle footholds may occupy: `[lo, hi)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateralBand {
    pub lo: i32,
    pub hi: i32,
}

impl LateralBand {
    pub fn width(&self) -> i32 {
        self.hi - self.lo
    }

    /// Place a span of `size` cells centered near `center`, shifted to stay inside the band
    pub fn place(&self, center: i32, size: i32) -> CourseResult<(i32, i32)> {
        if size > self.width() {
            return Err(CourseError::CourseTooNarrow {
                required: size,
                available: self.width(),
            });
        }
        let y0 = center.saturating_sub(size / 2).clamp(self.lo, self.hi - size);
        Ok((y0, y0 + size))
    }
}

/// One primitive applied to one rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintLayer {
    pub rect: GridRect,
    pub primitive: Primitive,
}

/// Concrete obstacle instance, resolved from an `ObstacleStep` at layout time
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleSpec {
    pub kind: ObstacleKind,
    /// Full footprint along the course axis
    pub extent: GridRect,
    /// Part of the obstacle the policy is meant to stand on or cross
    pub foothold: GridRect,
    /// Painted in order
    pub layers: SmallVec<[PaintLayer; 2]>,
    pub goal: IVec2,
}

/// Build stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStage {
    Spawn,
    Obstacle(usize),
    Tail,
    Done,
}

/// Finished layout
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub field: HeightField,
    pub goals: GoalSequence,
    /// First cell past the spawn zone
    pub spawn_end: i32,
    /// First cell of the flat tail
    pub tail_start: i32,
}

/// Sequential course builder; owns the height field until `finish`
pub struct CourseBuilder<'a> {
    field: HeightField,
    quantizer: Quantizer,
    layout: &'a LayoutConfig,
    profile: &'a DifficultyProfile,
    difficulty: f32,
    length: i32,
    width: i32,
    band: LateralBand,
    cursor: Cursor,
    goals: Vec<IVec2>,
    stage: LayoutStage,
    painted_until: i32,
    spawn_end: i32,
    final_offset: i32,
}

impl<'a> CourseBuilder<'a> {
    pub fn new(
        length_idx: usize,
        width_idx: usize,
        quantizer: Quantizer,
        layout: &'a LayoutConfig,
        profile: &'a DifficultyProfile,
        difficulty: f32,
    ) -> CourseResult<Self> {
        let too_large = || CourseError::GridTooLarge {
            cells: length_idx.saturating_mul(width_idx),
            max: i32::MAX as usize,
        };
        let length = i32::try_from(length_idx).map_err(|_| too_large())?;
        let width = i32::try_from(width_idx).map_err(|_| too_large())?;

        let spawn_end = quantizer.extent(layout.spawn_length_m)?;
        let final_offset = quantizer.extent(layout.final_goal_offset_m)?;

        // Spawn, one cell per obstacle, then room for the final goal
        let required =
            i64::from(spawn_end) + OBSTACLE_SLOTS as i64 + i64::from(final_offset) + 1;
        if required > i64::from(length) {
            return Err(too_short(required, length));
        }

        let margin = quantizer.scalar(layout.lateral_margin_m)?.max(0);
        let band = LateralBand {
            lo: margin,
            hi: width - margin,
        };
        if band.width() < 1 {
            return Err(CourseError::CourseTooNarrow {
                required: margin.saturating_mul(2).saturating_add(1),
                available: width,
            });
        }

        Ok(Self {
            field: HeightField::new(length_idx, width_idx, quantizer.resolution()),
            quantizer,
            layout,
            profile,
            difficulty,
            length,
            width,
            band,
            cursor: Cursor {
                x: 0,
                mid_y: width / 2,
                stair_height: 0.0,
            },
            goals: Vec::with_capacity(GOAL_COUNT),
            stage: LayoutStage::Spawn,
            painted_until: 0,
            spawn_end,
            final_offset,
        })
    }

    pub fn stage(&self) -> LayoutStage {
        self.stage
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn band(&self) -> LateralBand {
        self.band
    }

    /// Cells `pattern` needs when every sample lands on its upper bound
    ///
    /// Sampled lengths never exceed this, so a course that passes `check_fits`
    /// holds the pattern for every seed.
    pub fn required_length(&self, pattern: &CoursePattern) -> CourseResult<i64> {
        let jitter = self.quantizer.scalar(self.layout.max_forward_jitter_m)?.max(0);
        let mut required = i64::from(self.spawn_end) + i64::from(self.final_offset) + 1;
        for step in pattern.steps() {
            let difficulty = self.step_difficulty(step);
            let longest = upper(self.range(step.kind.length_attribute(), difficulty));
            let spacing = match step.spacing_m {
                Some(meters) => self.quantizer.extent(meters)?,
                None => self
                    .quantizer
                    .extent(upper(self.range(Attribute::GapLength, difficulty)))?,
            };
            required += i64::from(jitter)
                + i64::from(self.quantizer.extent(longest)?)
                + i64::from(spacing);
        }
        Ok(required)
    }

    /// Reject a pattern that could run out of room for some seed
    pub fn check_fits(&self, pattern: &CoursePattern) -> CourseResult<()> {
        let required = self.required_length(pattern)?;
        if required > i64::from(self.length) {
            return Err(too_short(required, self.length));
        }
        Ok(())
    }

    /// Spawn, every slot of `pattern`, then the tail
    pub fn run(
        mut self,
        pattern: &CoursePattern,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<LayoutOutcome> {
        self.check_fits(pattern)?;
        self.place_spawn()?;
        for step in pattern.steps() {
            self.place_obstacle(*step, rng)?;
        }
        self.finish(rng)
    }

    /// Flat spawn zone over the full width; goal just before its end
    pub fn place_spawn(&mut self) -> CourseResult<()> {
        self.expect_stage(LayoutStage::Spawn, "place_spawn")?;

        let spawn = GridRect::new(0, self.spawn_end, 0, self.width);
        Primitive::Platform { height: 0.0 }.paint(&mut self.field, &spawn)?;

        let inset = self.quantizer.scalar(self.layout.spawn_goal_inset_m)?;
        let goal_x = self.spawn_end.saturating_sub(inset).clamp(0, self.spawn_end - 1);
        self.goals.push(IVec2::new(goal_x, self.cursor.mid_y));

        self.cursor.x = self.spawn_end;
        self.painted_until = self.spawn_end;
        self.stage = LayoutStage::Obstacle(0);
        Ok(())
    }

    /// Resolve, paint and record the goal of the next obstacle slot
    pub fn place_obstacle(
        &mut self,
        step: ObstacleStep,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<ObstacleSpec> {
        let slot = match self.stage {
            LayoutStage::Obstacle(slot) => slot,
            other => {
                return Err(CourseError::invariant(format!(
                    "place_obstacle called in stage {other:?}"
                )))
            }
        };

        let spec = self.resolve(step, rng)?;

        if spec.extent.x0 < self.painted_until {
            return Err(CourseError::OutOfBounds {
                rect: spec.extent,
                length_idx: self.field.length_idx(),
                width_idx: self.field.width_idx(),
            });
        }
        let required = i64::from(spec.extent.x1) + i64::from(self.final_offset) + 1;
        if required > i64::from(self.length) {
            return Err(too_short(required, self.length));
        }

        for layer in &spec.layers {
            layer.primitive.paint(&mut self.field, &layer.rect)?;
        }
        self.goals.push(spec.goal);
        self.painted_until = spec.extent.x1;

        let spacing = match step.spacing_m {
            Some(meters) => self.quantizer.extent(meters)?,
            None => self.cells(Attribute::GapLength, self.step_difficulty(&step), rng)?,
        };
        self.cursor.x = span_end(spec.extent.x1, spacing, self.length)?;

        log::trace!(
            "slot {slot}: {} x={}..{} goal=({}, {})",
            spec.kind.name(),
            spec.extent.x0,
            spec.extent.x1,
            spec.goal.x,
            spec.goal.y
        );

        self.stage = if slot + 1 == OBSTACLE_SLOTS {
            LayoutStage::Tail
        } else {
            LayoutStage::Obstacle(slot + 1)
        };
        Ok(spec)
    }

    /// Optional roughness, flat tail, final goal
    pub fn finish(mut self, rng: &mut dyn CourseRng) -> CourseResult<LayoutOutcome> {
        self.expect_stage(LayoutStage::Tail, "finish")?;

        let tail_start = self.cursor.x;
        let final_x = i64::from(tail_start) + i64::from(self.final_offset);
        if final_x >= i64::from(self.length) {
            return Err(too_short(final_x + 1, self.length));
        }
        let final_x = final_x as i32;

        if self.layout.roughness_m > 0.0 && tail_start > self.spawn_end {
            let course = GridRect::new(self.spawn_end, tail_start, 0, self.width);
            add_roughness(
                &mut self.field,
                &course,
                self.layout.roughness_m,
                self.layout.roughness_step_m,
                rng,
            )?;
        }

        let tail = GridRect::new(tail_start, self.length, 0, self.width);
        Primitive::Platform { height: 0.0 }.paint(&mut self.field, &tail)?;

        self.goals.push(IVec2::new(final_x, self.cursor.mid_y));
        self.stage = LayoutStage::Done;

        Ok(LayoutOutcome {
            field: self.field,
            goals: GoalSequence::try_from(self.goals)?,
            spawn_end: self.spawn_end,
            tail_start,
        })
    }

    fn expect_stage(&self, expected: LayoutStage, op: &str) -> CourseResult<()> {
        if self.stage != expected {
            return Err(CourseError::invariant(format!(
                "{op} called in stage {:?}, expected {expected:?}",
                self.stage
            )));
        }
        Ok(())
    }

    fn step_difficulty(&self, step: &ObstacleStep) -> f32 {
        clamp_difficulty(self.difficulty + step.difficulty_offset)
    }

    fn range(&self, attribute: Attribute, difficulty: f32) -> ParamRange {
        self.profile.range_for(attribute, difficulty)
    }

    /// Sample a value in meters
    fn meters(&self, attribute: Attribute, difficulty: f32, rng: &mut dyn CourseRng) -> f32 {
        rng.sample(self.range(attribute, difficulty))
    }

    /// Sample a length and quantize it to at least one cell
    fn cells(
        &self,
        attribute: Attribute,
        difficulty: f32,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<i32> {
        self.quantizer.extent(self.meters(attribute, difficulty, rng))
    }

    /// Center line shifted by the step's fixed offset, or by a sampled one
    fn lateral_center(
        &self,
        step: &ObstacleStep,
        difficulty: f32,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<i32> {
        let offset = match step.lateral_offset_m {
            Some(meters) => meters,
            None => self.meters(Attribute::LateralJitter, difficulty, rng),
        };
        let dy = self.quantizer.scalar(offset)?;
        Ok(self.cursor.mid_y.saturating_add(dy))
    }

    fn resolve(
        &mut self,
        step: ObstacleStep,
        rng: &mut dyn CourseRng,
    ) -> CourseResult<ObstacleSpec> {
        let d = self.step_difficulty(&step);
        let dx = self
            .quantizer
            .scalar(rng.uniform(0.0, self.layout.max_forward_jitter_m))?
            .max(0);
        let length = self.length;
        let x0 = span_end(self.cursor.x, dx, length)?;
        let band = self.band;
        let width = self.width;
        let full_width = |len: i32| -> CourseResult<GridRect> {
            Ok(GridRect::new(x0, span_end(x0, len, length)?, 0, width))
        };
        let across_band = |len: i32| -> CourseResult<GridRect> {
            Ok(GridRect::new(x0, span_end(x0, len, length)?, band.lo, band.hi))
        };

        if !step.kind.is_stair() {
            self.cursor.stair_height = 0.0;
        }

        let (extent, foothold, layers): (GridRect, GridRect, SmallVec<[PaintLayer; 2]>) =
            match step.kind {
                ObstacleKind::Platform => {
                    let rect = across_band(self.cells(Attribute::PlatformLength, d, rng)?)?;
                    let height = self.meters(Attribute::PlatformHeight, d, rng);
                    (rect, rect, smallvec![layer(rect, Primitive::Platform { height })])
                }
                ObstacleKind::Ramp => {
                    let rect = across_band(self.cells(Attribute::RampLength, d, rng)?)?;
                    let height = self.meters(Attribute::RampHeight, d, rng);
                    let ramp = Primitive::Ramp {
                        start: 0.0,
                        end: height,
                        axis: RampAxis::Course,
                    };
                    (rect, rect, smallvec![layer(rect, ramp)])
                }
                ObstacleKind::Slope => {
                    let rect = across_band(self.cells(Attribute::RampLength, d, rng)?)?;
                    let height = self.meters(Attribute::RampHeight, d, rng);
                    let (start, end) = if rng.coin_flip() {
                        (0.0, height)
                    } else {
                        (height, 0.0)
                    };
                    let slope = Primitive::Ramp {
                        start,
                        end,
                        axis: RampAxis::Lateral,
                    };
                    (rect, rect, smallvec![layer(rect, slope)])
                }
                ObstacleKind::Beam => {
                    let len = self.cells(Attribute::PlatformLength, d, rng)?;
                    let beam_width = self.cells(Attribute::BeamWidth, d, rng)?;
                    let center = self.lateral_center(&step, d, rng)?;
                    let (y0, y1) = band.place(center, beam_width)?;
                    let pit = full_width(len)?;
                    let beam = GridRect::new(pit.x0, pit.x1, y0, y1);
                    (
                        pit,
                        beam,
                        smallvec![
                            layer(pit, Primitive::Pit),
                            layer(beam, Primitive::Platform { height: 0.0 }),
                        ],
                    )
                }
                ObstacleKind::Stone => {
                    let size = self.cells(Attribute::StoneSize, d, rng)?;
                    let center = self.lateral_center(&step, d, rng)?;
                    let (y0, y1) = band.place(center, size)?;
                    let rect = GridRect::new(x0, span_end(x0, size, length)?, y0, y1);
                    let footprint = if rng.coin_flip() {
                        Footprint::Disc
                    } else {
                        Footprint::Square
                    };
                    let height = self.meters(Attribute::StepHeight, d, rng);
                    (
                        rect,
                        rect,
                        smallvec![layer(rect, Primitive::Stone { height, footprint })],
                    )
                }
                ObstacleKind::Step | ObstacleKind::StepDown => {
                    let rect = across_band(self.cells(Attribute::PlatformLength, d, rng)?)?;
                    let rise = self.meters(Attribute::StepHeight, d, rng);
                    let height = if step.kind == ObstacleKind::Step {
                        self.cursor.stair_height + rise
                    } else {
                        (self.cursor.stair_height - rise).max(0.0)
                    };
                    self.cursor.stair_height = height;
                    (rect, rect, smallvec![layer(rect, Primitive::Platform { height })])
                }
                ObstacleKind::Gap => {
                    let pit = full_width(self.cells(Attribute::GapLength, d, rng)?)?;
                    let foothold = GridRect::new(pit.x0, pit.x1, band.lo, band.hi);
                    (pit, foothold, smallvec![layer(pit, Primitive::Pit)])
                }
                ObstacleKind::Hurdle => {
                    let bar = full_width(self.cells(Attribute::HurdleThickness, d, rng)?)?;
                    let height = self.meters(Attribute::HurdleHeight, d, rng);
                    let foothold = GridRect::new(bar.x0, bar.x1, band.lo, band.hi);
                    (bar, foothold, smallvec![layer(bar, Primitive::Platform { height })])
                }
                ObstacleKind::Waves => {
                    let rect = across_band(self.cells(Attribute::PlatformLength, d, rng)?)?;
                    let waves = Primitive::Undulation {
                        amplitude: self.meters(Attribute::WaveAmplitude, d, rng),
                        wavelength: self.cells(Attribute::WaveLength, d, rng)? as f32,
                        phase: rng.uniform(0.0, TAU),
                    };
                    (rect, rect, smallvec![layer(rect, waves)])
                }
                ObstacleKind::Mound => {
                    let len = self.cells(Attribute::PlatformLength, d, rng)?;
                    let lateral = len.min(band.width());
                    let center = self.lateral_center(&step, d, rng)?;
                    let (y0, y1) = band.place(center, lateral)?;
                    let rect = GridRect::new(x0, span_end(x0, len, length)?, y0, y1);
                    let peak = self.meters(Attribute::RampHeight, d, rng);
                    (rect, rect, smallvec![layer(rect, Primitive::Mound { peak })])
                }
            };

        let (_, center_y) = foothold.center();
        let goal_x = match step.anchor {
            GoalAnchor::Center => foothold.center().0,
            GoalAnchor::LeadingEdge => extent.x0 - 1,
            GoalAnchor::TrailingEdge => extent.x1,
        };

        Ok(ObstacleSpec {
            kind: step.kind,
            extent,
            foothold,
            layers,
            goal: IVec2::new(goal_x, center_y),
        })
    }
}

fn layer(rect: GridRect, primitive: Primitive) -> PaintLayer {
    PaintLayer { rect, primitive }
}

/// `x0 + len` along the course axis; overflow means the course cannot hold it
fn span_end(x0: i32, len: i32, available: i32) -> CourseResult<i32> {
    x0.checked_add(len).ok_or(CourseError::CourseTooShort {
        required: i32::MAX,
        available,
    })
}

fn too_short(required: i64, available: i32) -> CourseError {
    CourseError::CourseTooShort {
        required: i32::try_from(required).unwrap_or(i32::MAX),
        available,
    }
}

/// Largest value `CourseRng::sample` can return for `range`
fn upper(range: ParamRange) -> f32 {
    range.min.max(range.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_field::PIT_HEIGHT;
    use crate::rng::seeded;

    const RES: f32 = 0.05;

    fn builder<'a>(
        layout: &'a LayoutConfig,
        profile: &'a DifficultyProfile,
        difficulty: f32,
    ) -> CourseBuilder<'a> {
        CourseBuilder::new(240, 80, Quantizer::new(RES).unwrap(), layout, profile, difficulty)
            .unwrap()
    }

    #[test]
    fn test_spawn_goal_position() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 0.5);

        b.place_spawn().unwrap();
        assert_eq!(b.goals[0], IVec2::new(35, 40));
        assert_eq!(b.cursor().x, 40);
        assert_eq!(b.stage(), LayoutStage::Obstacle(0));
    }

    #[test]
    fn test_full_run_produces_all_goals() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut rng = seeded(11);

        for kind in ObstacleKind::COURSE_KINDS {
            let outcome = builder(&layout, &profile, 1.0)
                .run(&CoursePattern::uniform(kind), &mut rng)
                .unwrap();
            assert_eq!(outcome.goals.len(), GOAL_COUNT, "{kind:?}");
            assert_eq!(outcome.spawn_end, 40);
            assert!(outcome.tail_start < 240);
            assert!(outcome.field.is_flat_prefix(40), "{kind:?}");
        }
    }

    #[test]
    fn test_obstacle_before_spawn_rejected() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 0.5);
        let mut rng = seeded(1);

        let err = b
            .place_obstacle(ObstacleKind::Platform.into(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, CourseError::InvariantViolation(_)));
    }

    #[test]
    fn test_finish_before_last_slot_rejected() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 0.5);
        let mut rng = seeded(1);

        b.place_spawn().unwrap();
        b.place_obstacle(ObstacleKind::Platform.into(), &mut rng)
            .unwrap();
        assert!(matches!(
            b.finish(&mut rng),
            Err(CourseError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_seventh_obstacle_rejected() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 0.0);
        let mut rng = seeded(2);

        b.place_spawn().unwrap();
        for _ in 0..OBSTACLE_SLOTS {
            b.place_obstacle(ObstacleKind::Hurdle.into(), &mut rng)
                .unwrap();
        }
        assert_eq!(b.stage(), LayoutStage::Tail);
        assert!(b
            .place_obstacle(ObstacleKind::Hurdle.into(), &mut rng)
            .is_err());
    }

    #[test]
    fn test_too_short_course_rejected_upfront() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let q = Quantizer::new(RES).unwrap();

        let result = CourseBuilder::new(50, 80, q, &layout, &profile, 0.5);
        assert!(matches!(
            result,
            Err(CourseError::CourseTooShort { available: 50, .. })
        ));
    }

    #[test]
    fn test_course_running_out_of_room_rejected() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let q = Quantizer::new(RES).unwrap();
        let mut rng = seeded(4);

        // Room for spawn and tail, not for six platforms
        let pattern = CoursePattern::uniform(ObstacleKind::Platform);
        let b = CourseBuilder::new(80, 80, q, &layout, &profile, 0.5).unwrap();
        let required = b.required_length(&pattern).unwrap();
        let err = b.run(&pattern, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            CourseError::CourseTooShort { required: r, available: 80 } if i64::from(r) == required
        ));
    }

    #[test]
    fn test_required_length_is_worst_case() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let q = Quantizer::new(RES).unwrap();
        let pattern = CoursePattern::uniform(ObstacleKind::Platform);

        // 40 spawn + 8 offset + 1, then 6 x (1 jitter + 18 platform + 9 spacing)
        let b = CourseBuilder::new(216, 80, q, &layout, &profile, 1.0).unwrap();
        assert_eq!(b.required_length(&pattern).unwrap(), 217);
        assert!(matches!(
            b.check_fits(&pattern),
            Err(CourseError::CourseTooShort { required: 217, available: 216 })
        ));

        for seed in 0..64 {
            let outcome = CourseBuilder::new(217, 80, q, &layout, &profile, 1.0)
                .unwrap()
                .run(&pattern, &mut seeded(seed))
                .unwrap();
            assert!(outcome.goals.last().x < 217);
        }
    }

    #[test]
    fn test_huge_layout_rejected_without_overflow() {
        let layout = LayoutConfig {
            spawn_length_m: 1e8,
            final_goal_offset_m: 1e8,
            ..LayoutConfig::default()
        };
        let profile = DifficultyProfile::default();
        let q = Quantizer::new(RES).unwrap();

        let result = CourseBuilder::new(240, 80, q, &layout, &profile, 0.5);
        assert!(matches!(
            result,
            Err(CourseError::CourseTooShort { required: i32::MAX, available: 240 })
        ));
    }

    #[test]
    fn test_too_narrow_course_rejected() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let q = Quantizer::new(RES).unwrap();

        // 0.3 m margins leave nothing of a 0.5 m course
        let result = CourseBuilder::new(240, 10, q, &layout, &profile, 0.5);
        assert!(matches!(result, Err(CourseError::CourseTooNarrow { .. })));
    }

    #[test]
    fn test_gap_goal_on_landing_side() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 1.0);
        let mut rng = seeded(8);

        b.place_spawn().unwrap();
        let spec = b
            .place_obstacle(ObstacleKind::Gap.into(), &mut rng)
            .unwrap();
        assert_eq!(spec.goal.x, spec.extent.x1);
        assert_eq!(b.field.get(spec.extent.x0, 0), Some(PIT_HEIGHT));
        assert!(b.field.is_flat_at(spec.goal.x, spec.goal.y));
    }

    #[test]
    fn test_beam_goal_on_beam() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 1.0);
        let mut rng = seeded(21);

        b.place_spawn().unwrap();
        let spec = b
            .place_obstacle(ObstacleKind::Beam.into(), &mut rng)
            .unwrap();
        assert_eq!(b.field.get(spec.goal.x, spec.goal.y), Some(0.0));
        assert_eq!(b.field.get(spec.extent.x0, 0), Some(PIT_HEIGHT));
        assert!(spec.foothold.y0 >= b.band().lo);
        assert!(spec.foothold.y1 <= b.band().hi);
    }

    #[test]
    fn test_stairs_climb_and_descend() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 0.5);
        let mut rng = seeded(5);

        b.place_spawn().unwrap();
        let mut heights = Vec::new();
        for kind in [
            ObstacleKind::Step,
            ObstacleKind::Step,
            ObstacleKind::Step,
            ObstacleKind::StepDown,
            ObstacleKind::StepDown,
            ObstacleKind::StepDown,
        ] {
            let spec = b.place_obstacle(kind.into(), &mut rng).unwrap();
            heights.push(spec.layers[0].primitive.peak());
        }
        assert!(heights[0] < heights[1] && heights[1] < heights[2]);
        assert!(heights[3] < heights[2] && heights[4] <= heights[3]);
        assert!(heights.iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn test_anchor_override() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 0.5);
        let mut rng = seeded(6);

        b.place_spawn().unwrap();
        let step = ObstacleStep::new(ObstacleKind::Platform).anchored(GoalAnchor::LeadingEdge);
        let spec = b.place_obstacle(step, &mut rng).unwrap();
        assert_eq!(spec.goal.x, spec.extent.x0 - 1);
    }

    #[test]
    fn test_lateral_offset_moves_foothold() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();

        let mut centers = Vec::new();
        for offset in [0.5, -0.5] {
            let mut b = builder(&layout, &profile, 0.5);
            b.place_spawn().unwrap();
            let step = ObstacleStep::new(ObstacleKind::Stone).offset_laterally(offset);
            let spec = b.place_obstacle(step, &mut seeded(12)).unwrap();
            assert!(b.field.get(spec.goal.x, spec.goal.y).unwrap() > 0.0);
            centers.push(spec.goal.y);
        }
        // Center line is y = 40; 0.5 m is 10 cells
        assert_eq!(centers, vec![50, 30]);
    }

    #[test]
    fn test_spacing_override_fixes_run_out() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();
        let mut b = builder(&layout, &profile, 1.0);
        let mut rng = seeded(13);

        b.place_spawn().unwrap();
        let step = ObstacleStep::new(ObstacleKind::Platform).spaced(0.5);
        let spec = b.place_obstacle(step, &mut rng).unwrap();
        assert_eq!(b.cursor().x, spec.extent.x1 + 10);
    }

    #[test]
    fn test_difficulty_offset_raises_obstacle() {
        let layout = LayoutConfig::default();
        let profile = DifficultyProfile::default();

        let hurdle_height = |step: ObstacleStep| {
            let mut b = builder(&layout, &profile, 0.0);
            b.place_spawn().unwrap();
            let spec = b.place_obstacle(step, &mut seeded(14)).unwrap();
            spec.layers[0].primitive.peak()
        };

        let easy = hurdle_height(ObstacleStep::new(ObstacleKind::Hurdle));
        let hard =
            hurdle_height(ObstacleStep::new(ObstacleKind::Hurdle).with_difficulty_offset(1.0));
        // Hurdle height is within [0.05, 0.10] at 0 and [0.25, 0.40] at 1
        assert!(easy <= 0.10);
        assert!(hard >= 0.25);
    }

    #[test]
    fn test_roughness_keeps_spawn_and_tail_flat() {
        let layout = LayoutConfig {
            roughness_m: 0.03,
            ..LayoutConfig::default()
        };
        let profile = DifficultyProfile::default();
        let mut rng = seeded(9);

        let outcome = builder(&layout, &profile, 0.5)
            .run(&CoursePattern::uniform(ObstacleKind::Platform), &mut rng)
            .unwrap();
        assert!(outcome.field.is_flat_prefix(40));
        let tail_start = outcome.tail_start as usize;
        let (length_idx, width_idx) = outcome.field.dims();
        for x in tail_start..length_idx {
            for y in 0..width_idx {
                assert!(outcome.field.is_flat_at(x as i32, y as i32));
            }
        }
    }

    #[test]
    fn test_band_place_clamps_inside() {
        let band = LateralBand { lo: 6, hi: 74 };
        assert_eq!(band.place(40, 10).unwrap(), (35, 45));
        assert_eq!(band.place(0, 10).unwrap(), (6, 16));
        assert_eq!(band.place(100, 10).unwrap(), (64, 74));
        assert!(band.place(40, 69).is_err());
    }

    #[test]
    fn test_pattern_constructors() {
        let alt = CoursePattern::alternating(ObstacleKind::Platform, ObstacleKind::Gap);
        let kinds: Vec<_> = alt.kinds().collect();
        assert_eq!(kinds[0], ObstacleKind::Platform);
        assert_eq!(kinds[1], ObstacleKind::Gap);
        assert_eq!(kinds[5], ObstacleKind::Gap);

        let cyc = CoursePattern::cycle(&[
            ObstacleKind::Ramp,
            ObstacleKind::Stone,
            ObstacleKind::Hurdle,
            ObstacleKind::Waves,
        ])
        .unwrap();
        let kinds: Vec<_> = cyc.kinds().collect();
        assert_eq!(kinds[4], ObstacleKind::Ramp);
        assert_eq!(kinds[5], ObstacleKind::Stone);

        assert!(CoursePattern::cycle(&[]).is_none());
        assert_eq!(cyc.steps().len(), OBSTACLE_SLOTS);

        let ramped = CoursePattern::uniform(ObstacleKind::Ramp).ramped(0.5);
        let offsets: Vec<_> = ramped.steps().iter().map(|s| s.difficulty_offset).collect();
        assert!((offsets[0] + 0.25).abs() < 1e-6);
        assert!((offsets[5] - 0.25).abs() < 1e-6);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_layout_config_validation() {
        assert!(LayoutConfig::default().validate().is_ok());

        let negative = LayoutConfig {
            lateral_margin_m: -0.1,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(CourseError::InvalidConfig(_))
        ));

        let no_spawn = LayoutConfig {
            spawn_length_m: 0.0,
            ..LayoutConfig::default()
        };
        assert!(no_spawn.validate().is_err());
    }
}
