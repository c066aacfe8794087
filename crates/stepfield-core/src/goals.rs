//! Goal sequence and post-generation course validation

use std::ops::Index;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{CourseError, CourseResult};
use crate::height_field::HeightField;

/// Number of waypoints in every course
pub const GOAL_COUNT: usize = 8;

/// Ordered waypoints in grid indices: `x` along the course, `y` across it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSequence([IVec2; GOAL_COUNT]);

impl GoalSequence {
    pub fn new(goals: [IVec2; GOAL_COUNT]) -> Self {
        Self(goals)
    }

    pub fn as_slice(&self) -> &[IVec2] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &IVec2> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        GOAL_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Spawn goal
    pub fn first(&self) -> IVec2 {
        self.0[0]
    }

    /// Final goal on the flat tail
    pub fn last(&self) -> IVec2 {
        self.0[GOAL_COUNT - 1]
    }

    pub fn into_array(self) -> [IVec2; GOAL_COUNT] {
        self.0
    }

    pub fn to_pairs(&self) -> Vec<(i32, i32)> {
        self.0.iter().map(|g| (g.x, g.y)).collect()
    }
}

impl Index<usize> for GoalSequence {
    type Output = IVec2;

    fn index(&self, index: usize) -> &IVec2 {
        &self.0[index]
    }
}

impl TryFrom<Vec<IVec2>> for GoalSequence {
    type Error = CourseError;

    fn try_from(goals: Vec<IVec2>) -> CourseResult<Self> {
        let count = goals.len();
        let goals: [IVec2; GOAL_COUNT] = goals.try_into().map_err(|_| {
            CourseError::invariant(format!("expected {GOAL_COUNT} goals, got {count}"))
        })?;
        Ok(Self(goals))
    }
}

/// Check a finished course before it is handed to the caller
///
/// - every cell finite
/// - every goal inside the grid
/// - goals ordered along the course axis
/// - first and last goal on flat ground
pub fn validate_course(field: &HeightField, goals: &GoalSequence) -> CourseResult<()> {
    if !field.all_finite() {
        return Err(CourseError::invariant("height field contains non-finite cells"));
    }

    for (i, goal) in goals.iter().enumerate() {
        if !field.contains(goal.x, goal.y) {
            let (length_idx, width_idx) = field.dims();
            return Err(CourseError::invariant(format!(
                "goal {i} at ({}, {}) outside {length_idx}x{width_idx} grid",
                goal.x, goal.y
            )));
        }
    }

    for (i, pair) in goals.as_slice().windows(2).enumerate() {
        if pair[1].x < pair[0].x {
            return Err(CourseError::invariant(format!(
                "goal {} at x={} is behind goal {i} at x={}",
                i + 1,
                pair[1].x,
                pair[0].x
            )));
        }
    }

    for (label, goal) in [("spawn", goals.first()), ("final", goals.last())] {
        if !field.is_flat_at(goal.x, goal.y) {
            return Err(CourseError::invariant(format!(
                "{label} goal at ({}, {}) is not on flat ground",
                goal.x, goal.y
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_field::{GridRect, PIT_HEIGHT};

    fn straight_goals() -> GoalSequence {
        GoalSequence::new(std::array::from_fn(|i| IVec2::new(5 + i as i32 * 10, 10)))
    }

    #[test]
    fn test_valid_course_passes() {
        let field = HeightField::new(100, 20, 0.1);
        assert!(validate_course(&field, &straight_goals()).is_ok());
    }

    #[test]
    fn test_try_from_wrong_length() {
        let err = GoalSequence::try_from(vec![IVec2::ZERO; 5]).unwrap_err();
        assert!(matches!(err, CourseError::InvariantViolation(_)));

        let ok = GoalSequence::try_from(vec![IVec2::ONE; GOAL_COUNT]).unwrap();
        assert_eq!(ok.len(), GOAL_COUNT);
        assert_eq!(ok[3], IVec2::ONE);
    }

    #[test]
    fn test_goal_outside_grid_rejected() {
        let field = HeightField::new(60, 20, 0.1);
        // Last goal at x=75
        let err = validate_course(&field, &straight_goals()).unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_goals_out_of_order_rejected() {
        let field = HeightField::new(100, 20, 0.1);
        let mut goals = straight_goals().into_array();
        goals.swap(2, 3);
        let err = validate_course(&field, &GoalSequence::new(goals)).unwrap_err();
        assert!(err.to_string().contains("behind"));
    }

    #[test]
    fn test_final_goal_over_pit_rejected() {
        let mut field = HeightField::new(100, 20, 0.1);
        field.fill(&GridRect::new(70, 80, 0, 20), PIT_HEIGHT).unwrap();
        let err = validate_course(&field, &straight_goals()).unwrap_err();
        assert!(err.to_string().contains("final"));
    }

    #[test]
    fn test_spawn_goal_on_platform_rejected() {
        let mut field = HeightField::new(100, 20, 0.1);
        field.fill(&GridRect::new(0, 10, 0, 20), 0.2).unwrap();
        let err = validate_course(&field, &straight_goals()).unwrap_err();
        assert!(err.to_string().contains("spawn"));
    }

    #[test]
    fn test_accessors() {
        let goals = straight_goals();
        assert_eq!(goals.first(), IVec2::new(5, 10));
        assert_eq!(goals.last(), IVec2::new(75, 10));
        assert_eq!(goals.to_pairs()[1], (15, 10));
        assert_eq!(goals.iter().count(), GOAL_COUNT);
    }
}
