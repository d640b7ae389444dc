//! Seeded random streams for resolution.
//!
//! Every probabilistic decision in the engine draws from a [`TurnRng`].
//! A stream is addressed by `(run seed, turn, phase, engagement index)`, so
//! an engagement sees the same numbers no matter which worker resolves it
//! or in what order engagements complete.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::math::Fixed;

/// Stream slot reserved for fog-of-war estimates inside a phase.
pub const INTEL_STREAM: u32 = u32::MAX;

/// A deterministic random stream.
#[derive(Debug, Clone)]
pub struct TurnRng {
    inner: ChaCha8Rng,
}

impl TurnRng {
    /// Create a stream directly from a seed (stream 0).
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derive the stream for one engagement of one phase of one turn.
    #[must_use]
    pub fn for_engagement(run_seed: u64, turn: u32, phase_index: u8, engagement: u32) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(mix(run_seed, u64::from(turn)));
        inner.set_stream((u64::from(phase_index) << 32) | u64::from(engagement));
        Self { inner }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> Fixed {
        Fixed::from_bits(i64::from(self.inner.next_u32()))
    }

    /// Bernoulli trial: `true` with probability `p`.
    pub fn chance(&mut self, p: Fixed) -> bool {
        self.unit() < p
    }

    /// Uniform draw in `[-1, 1)`.
    pub fn signed_unit(&mut self) -> Fixed {
        self.unit() * Fixed::from_num(2) - Fixed::ONE
    }

    /// Vary `base` by up to `±variance` of itself: `base * (1 + U(-v, v))`.
    pub fn roll(&mut self, base: Fixed, variance: Fixed) -> Fixed {
        base * (Fixed::ONE + self.signed_unit() * variance)
    }

    /// Uniform draw in `[low, high]`.
    pub fn range_fixed(&mut self, low: Fixed, high: Fixed) -> Fixed {
        low + (high - low) * self.unit()
    }

    /// Uniform integer draw in `[low, high]` (inclusive).
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..=high)
    }
}

/// SplitMix64 finalizer used to spread turn numbers across seed space.
fn mix(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
