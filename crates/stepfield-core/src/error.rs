//! Error taxonomy for course generation
//!
//! Every variant is fatal for the current `generate()` call. Callers that build
//! batches of tiles may skip a failed tile, but the engine never degrades silently.

use crate::height_field::GridRect;

/// Centralized error type for all course generation operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CourseError {
    #[error("invalid {what}: {value} (must be finite, > 0 and within the grid index range)")]
    InvalidUnit { what: &'static str, value: f32 },

    #[error("grid of {cells} cells exceeds the limit of {max}")]
    GridTooLarge { cells: usize, max: usize },

    #[error("write to {rect:?} outside height field of {length_idx}x{width_idx} cells")]
    OutOfBounds {
        rect: GridRect,
        length_idx: usize,
        width_idx: usize,
    },

    #[error("course too short: needs {required} cells along the course axis, has {available}")]
    CourseTooShort { required: i32, available: i32 },

    #[error("course too narrow: needs {required} lateral cells, has {available}")]
    CourseTooNarrow { required: i32, available: i32 },

    #[error("variant {0} outside [0, 1)")]
    InvalidVariant(f32),

    #[error("difficulty {0} is not a number")]
    InvalidDifficulty(f32),

    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    #[error("course invariant violated: {0}")]
    InvariantViolation(String),

    #[error("RON error: {0}")]
    Ron(String),
}

impl CourseError {
    pub fn invariant<T: ToString>(msg: T) -> Self {
        CourseError::InvariantViolation(msg.to_string())
    }

    pub fn config<T: ToString>(msg: T) -> Self {
        CourseError::InvalidConfig(msg.to_string())
    }
}

impl From<ron::Error> for CourseError {
    fn from(err: ron::Error) -> Self {
        CourseError::Ron(err.to_string())
    }
}

impl From<ron::error::SpannedError> for CourseError {
    fn from(err: ron::error::SpannedError) -> Self {
        CourseError::Ron(err.to_string())
    }
}

/// Result type alias for course generation
pub type CourseResult<T> = Result<T, CourseError>;
