// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use rand::{
    rngs::SmallRng,
    Rng,
    SeedableRng,
};

/// Upon the insertion of a new node in the list, the node is replicated to high
/// levels with a certain probability as determined by a `LevelGenerator`.
pub trait LevelGenerator {
    /// The total number of levels that are assumed to exist for this level
    /// generator.
    fn total(&self) -> usize;
    /// Generate a random level for a new node in the range `[1, cap]`, where
    /// `cap` is clamped to `[1, self.total()]`.
    ///
    /// This must never return a level that is `> self.total()`.
    fn random(&mut self, cap: usize) -> usize;
}

/// A level generator which will produce geometrically distributed numbers.
///
/// The probability of generating level `n` is `p` times the probability of
/// generating level `n-1`, with the probability truncated at the cap passed to
/// [`LevelGenerator::random`].
#[derive(Clone, Debug)]
pub struct GeometricalLevelGenerator {
    total: usize,
    p: f64,
    rng: SmallRng, // Fast generator
}

impl GeometricalLevelGenerator {
    /// Create a new GeometricalLevelGenerator with `total` number of levels,
    /// and `p` as the probability that a given node is present in the next
    /// level.
    ///
    /// # Panics
    ///
    /// `p` must be between 0 and 1 and will panic otherwise.  Similarly,
    /// `total` must be at greater or equal to 1.
    pub fn new(total: usize, p: f64) -> Self {
        Self::with_rng(total, p, SmallRng::from_entropy())
    }

    /// Same as [`GeometricalLevelGenerator::new`], but every draw is
    /// reproducible from `seed`.
    pub fn with_seed(total: usize, p: f64, seed: u64) -> Self {
        Self::with_rng(total, p, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(total: usize, p: f64, rng: SmallRng) -> Self {
        if total == 0 {
            panic!("total must be non-zero.");
        }
        if p <= 0.0 || p >= 1.0 {
            panic!("p must be in (0, 1).");
        }
        GeometricalLevelGenerator { total, p, rng }
    }
}

impl LevelGenerator for GeometricalLevelGenerator {
    fn random(&mut self, cap: usize) -> usize {
        let cap = cap.clamp(1, self.total);
        let mut level = 1;
        while level < cap && self.rng.gen_bool(self.p) {
            level += 1;
        }
        level
    }

    fn total(&self) -> usize {
        self.total
    }
}
