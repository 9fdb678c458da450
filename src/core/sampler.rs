// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};

/// Reproducible stream of sample values. Every worker owns its own clone and
/// reseeds it before each unit of work, so the values drawn depend only on
/// the seed and never on which thread consumed the stream.
pub trait Sampler: Send + Sync {
    /// Restart the stream deterministically.
    fn seed(&mut self, seed: u64);

    /// Next value in [0, 1). An inactive lane returns 0 and leaves the
    /// stream untouched.
    fn next_1d(&mut self, active: bool) -> Float;

    fn next_2d(&mut self, active: bool) -> Vector2f;

    /// Requested samples per pixel.
    fn sample_count(&self) -> u32;

    fn set_sample_count(&mut self, sample_count: u32);

    /// Independent copy for another worker.
    fn clone_sampler(&self) -> Box<dyn Sampler>;

    fn describe(&self) -> String {
        String::from("Sampler")
    }
}
