//! Sources of simulated data.
//!
//! Performance numbers and conflict occurrence are random in PromptVCS. All
//! randomness goes through [`RandomSource`] so tests can inject fixed values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::PerformanceMetrics;

/// A stream of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible stream from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`. An empty list always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    values: Vec<f64>,
    pos: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            pos: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Create the random source described by an optional seed.
pub fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    }
}

// ---------------------------------------------------------------------------
// Performance sampling
// ---------------------------------------------------------------------------

/// Metrics given to the "Initial commit" created with a repository.
pub const INITIAL_COMMIT_PERFORMANCE: PerformanceMetrics = PerformanceMetrics {
    accuracy: 85,
    speed: 120,
    cost: 0.05,
};

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Metrics for a new version: accuracy 75..=100, speed 50..=350 ms,
/// cost 0.01..=0.16.
pub fn sample_version_performance(random: &mut dyn RandomSource) -> PerformanceMetrics {
    PerformanceMetrics {
        accuracy: (random.next_f64() * 25.0 + 75.0).round() as u32,
        speed: (random.next_f64() * 300.0 + 50.0).round() as u32,
        cost: round_cents(random.next_f64() * 0.15 + 0.01),
    }
}

/// Metrics for a new repository: accuracy 80..=100, speed 50..=250 ms,
/// cost 0.01..=0.11.
pub fn sample_repository_performance(random: &mut dyn RandomSource) -> PerformanceMetrics {
    PerformanceMetrics {
        accuracy: (random.next_f64() * 20.0 + 80.0).round() as u32,
        speed: (random.next_f64() * 200.0 + 50.0).round() as u32,
        cost: round_cents(random.next_f64() * 0.1 + 0.01),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_performance_bounds() {
        let mut low = SequenceRandom::new(vec![0.0]);
        let p = sample_version_performance(&mut low);
        assert_eq!(p.accuracy, 75);
        assert_eq!(p.speed, 50);
        assert_eq!(p.cost, 0.01);

        let mut high = SequenceRandom::new(vec![0.999_999]);
        let p = sample_version_performance(&mut high);
        assert_eq!(p.accuracy, 100);
        assert_eq!(p.speed, 350);
        assert_eq!(p.cost, 0.16);
    }

    #[test]
    fn test_repository_performance_bounds() {
        let mut seeded = SeededRandom::new(7);
        for _ in 0..200 {
            let p = sample_repository_performance(&mut seeded);
            assert!((80..=100).contains(&p.accuracy));
            assert!((50..=250).contains(&p.speed));
            assert!(p.cost >= 0.01 && p.cost <= 0.11);
        }
    }

    #[test]
    fn test_sequence_cycles() {
        let mut seq = SequenceRandom::new(vec![0.1, 0.9]);
        assert_eq!(seq.next_f64(), 0.1);
        assert_eq!(seq.next_f64(), 0.9);
        assert_eq!(seq.next_f64(), 0.1);
        assert_eq!(SequenceRandom::default().next_f64(), 0.0);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..10 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }
}
