//! Procedural obstacle courses for legged-robot locomotion curricula
//!
//! [`generate`] turns a course size, a grid resolution, a difficulty and a variant
//! into a height field plus eight ordered goals.

pub mod config;
pub mod difficulty;
pub mod error;
pub mod generate;
pub mod goals;
pub mod height_field;
pub mod layout;
pub mod primitives;
pub mod quantize;
pub mod recipes;
pub mod rng;

pub use config::GeneratorConfig;
pub use error::{CourseError, CourseResult};
pub use generate::{generate, Course, CourseGenerator, CourseRequest};
pub use goals::{GoalSequence, GOAL_COUNT};
pub use height_field::{HeightField, HeightStats, PIT_HEIGHT};
pub use quantize::{to_index_many, to_index_scalar};
pub use recipes::{select, standard_catalog, Recipe, RecipeCatalog};
pub use rng::CourseRng;
