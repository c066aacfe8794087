//! RNG trait abstraction for course generation
//!
//! Every primitive and recipe draws from an explicitly passed `CourseRng` so that
//! tiles generated concurrently stay reproducible. There is no process-wide generator.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::difficulty::ParamRange;

/// Generator used when a course is built from a plain `u64` seed
pub type CourseSeedRng = Xoshiro256StarStar;

/// Create the per-course generator for a seed
pub fn seeded(seed: u64) -> CourseSeedRng {
    Xoshiro256StarStar::seed_from_u64(seed)
}

/// Random number source for course generation
pub trait CourseRng {
    /// Generate random f32 in [0.0, 1.0)
    fn unit_f32(&mut self) -> f32;

    /// Generate random boolean with 50% probability
    fn coin_flip(&mut self) -> bool {
        self.unit_f32() < 0.5
    }

    /// Uniform value in [lo, hi); returns `lo` for an empty or inverted interval
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        lo + (hi - lo) * self.unit_f32()
    }

    /// Uniform value inside a difficulty range
    fn sample(&mut self, range: ParamRange) -> f32 {
        self.uniform(range.min, range.max)
    }
}

impl<T: ?Sized + rand::Rng> CourseRng for T {
    fn unit_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }
}
