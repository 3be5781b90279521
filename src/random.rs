//! Randomness collaborator used for shortcode generation and click defaults

use std::sync::Mutex;

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random draws
pub trait RandomSource: Send + Sync {
    /// A string of `len` characters drawn uniformly from `[A-Za-z0-9]`
    fn alphanumeric(&self, len: usize) -> String;

    /// A uniform index in `0..bound`. `bound` must be non-zero.
    fn index(&self, bound: usize) -> usize;
}

/// Backed by the thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn alphanumeric(&self, len: usize) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn index(&self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

/// Deterministic generator for reproducible runs
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn alphanumeric(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn index(&self, bound: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(0..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphanumeric_has_requested_length_and_alphabet() {
        let code = ThreadRandom.alphanumeric(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn seeded_is_reproducible() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        assert_eq!(a.alphanumeric(12), b.alphanumeric(12));
        assert_eq!(a.index(8), b.index(8));
    }

    #[test]
    fn index_stays_in_bounds() {
        let rng = SeededRandom::new(1);
        for _ in 0..200 {
            assert!(rng.index(8) < 8);
        }
    }
}
