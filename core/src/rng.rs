//! Deterministic random number generation for the trainer.
//!
//! RULE: Nothing in the trainer may call any platform RNG.
//! All randomness flows through TrainerRng instances derived from the
//! single master seed in the trainer configuration.
//!
//! Each concern gets its own RNG stream, seeded deterministically from
//! (master_seed XOR stream_index). This means:
//!   - Changing the episode count never changes the simulated records.
//!   - Each stream is fully reproducible in isolation.
//!
//! The inference path uses no randomness at all.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Stable stream assignments. NEVER reorder or remove entries — only
/// append. Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngStream {
    /// Synthetic customer record generation.
    Simulation = 0,
    /// Epsilon-greedy exploration and per-episode shuffling.
    Exploration = 1,
}

impl RngStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simulation => "simulation",
            Self::Exploration => "exploration",
        }
    }
}

/// A named, deterministic RNG for a single trainer concern.
pub struct TrainerRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl TrainerRng {
    pub fn new(master_seed: u64, stream: RngStream) -> Self {
        let derived_seed =
            master_seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: stream.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a usize in [0, n).
    pub fn next_usize_below(&mut self, n: usize) -> usize {
        self.next_u64_below(n as u64) as usize
    }

    /// Roll a u64 in [lo, hi).
    pub fn next_u64_in_range(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(hi > lo, "range must be non-empty");
        lo + self.next_u64_below(hi - lo)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}
