//! Deterministic seeded RNG wrapper.
//!
//! The same seed always reproduces the same fleet, the same posted loads,
//! and the same simulated signal stream.  Child RNGs are derived with a
//! golden-ratio mixing constant so independent components (seeding,
//! observer signals) never share a stream even when created from one
//! root seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Deterministic RNG for fleet seeding and simulated signals.
pub struct FleetRng(SmallRng);

impl FleetRng {
    pub fn new(seed: u64) -> Self {
        FleetRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive an independent child RNG.  `offset` distinguishes siblings
    /// created from the same parent state.
    pub fn child(&mut self, offset: u64) -> FleetRng {
        let child_seed: u64 = self.0.gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        FleetRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice; `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
