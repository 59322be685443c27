//! Deterministic world-generation RNG resource.
//!
//! Wraps `ChaCha8Rng` so every stage draws from one seeded stream and the same
//! seed reproduces the same world on every platform. Stages take
//! `&mut WorldRng` explicitly instead of reaching for `rand::thread_rng()`.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{Bounds, DEFAULT_SEED};

/// Seeded RNG shared by all generation stages.
///
/// `rng.0` is a `ChaCha8Rng`, so any `rand::Rng` method works on it directly.
/// The helpers below cover the draws the stages repeat most often.
#[derive(Resource, Debug, Clone)]
pub struct WorldRng(pub ChaCha8Rng);

impl Default for WorldRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl WorldRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// True with probability `p`. Values outside `[0, 1]` saturate.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.0.gen_bool(p)
        }
    }

    /// Uniform integer in `[bounds.min, bounds.max]`.
    pub fn in_bounds_u32(&mut self, bounds: &Bounds<u32>) -> u32 {
        if bounds.min >= bounds.max {
            bounds.min
        } else {
            self.0.gen_range(bounds.min..=bounds.max)
        }
    }

    /// Uniform float in `[bounds.min, bounds.max)`, or `min` for an empty range.
    pub fn in_bounds_f64(&mut self, bounds: &Bounds<f64>) -> f64 {
        bounds.min + self.unit() * (bounds.max - bounds.min)
    }

    pub fn in_bounds_f32(&mut self, bounds: &Bounds<f32>) -> f32 {
        bounds.min + self.0.gen::<f32>() * (bounds.max - bounds.min)
    }

    /// Uniform in `[-amount, amount)`.
    pub fn jitter(&mut self, amount: f32) -> f32 {
        (self.0.gen::<f32>() - 0.5) * 2.0 * amount
    }

    /// Uniform index into a collection of length `len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
