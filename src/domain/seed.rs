//! Deterministic per-genome seed derivation shared by the GA and harmony
//! search. No global RNG state is ever kept; every stochastic draw is made
//! from a freshly seeded generator derived from the run's master seed plus
//! the structural identity of what is being evaluated.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Derives a reproducible seed from a master seed, a generation/iteration
/// index, and the genome being evaluated (an order permutation paired with
/// per-position variant choices). Same inputs always hash to the same seed,
/// independent of evaluation order — required for `rayon`'s parallel map to
/// stay deterministic regardless of which thread lands on which genome.
pub fn derive_seed(master_seed: u64, generation: usize, genome: &[(usize, usize)]) -> u64 {
    let mut hasher = DefaultHasher::new();
    master_seed.hash(&mut hasher);
    generation.hash(&mut hasher);
    genome.hash(&mut hasher);
    hasher.finish()
}
