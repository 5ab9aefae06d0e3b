//! Seeded randomness for the simulated scene.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, StandardNormal, Uniform};

/// Noise source shared by every simulated device.
///
/// A seed of 0 draws from entropy; any other seed makes runs repeatable.
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
    unit: Uniform<f32>,
}

impl NoiseGenerator {
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng,
            unit: Uniform::new(0.0f32, 1.0),
        }
    }

    /// Zero-mean Gaussian sample.
    #[inline]
    pub fn gaussian(&mut self, stddev: f32) -> f32 {
        if stddev <= 0.0 {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Detector-style confidence in `[low, high)`.
    #[inline]
    pub fn confidence(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.unit.sample(&mut self.rng)
    }

    /// True with the given probability.
    #[inline]
    pub fn chance(&mut self, probability: f32) -> bool {
        self.unit.sample(&mut self.rng) < probability
    }
}
