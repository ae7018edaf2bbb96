//! Deterministic, splittable RNG derivation for the random samplers.
//!
//! Two independent seeds flow through a sampler:
//!
//! - the **partition-allocation seed**, derived from the user-supplied
//!   `state.seed` (or a fixed fallback), identical across every cooperating
//!   partition;
//! - the **construction seed**, drawn once when the sampler mask is built
//!   and carried immutably in the mask tree, shared by every partition that
//!   starts an iteration over the same constructed mask.
//!
//! Per output row `m` (the row's ordinal position in the full, unpartitioned
//! target set), the draw RNG is *re-derived* from the construction seed and
//! `m` rather than advanced from a shared running stream. This is a
//! splittable-RNG substitute for the stream jump-ahead the original
//! implementation relied on: it gives identical results whether a row is
//! reached by iterating the whole support in one pass or by iterating an
//! arbitrary, possibly out-of-order, subset of windows.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Binomial, Distribution};

/// Hashes a user-supplied seed string into a `u64`, used to seed the
/// partition-allocation RNG identically across all cooperating partitions.
pub fn hash_seed(seed: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    hasher.finish()
}

/// Derives the per-row draw seed from a sampler's construction seed and the
/// row's ordinal position.
pub fn row_seed(construction_seed: u64, m: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    construction_seed.hash(&mut hasher);
    m.hash(&mut hasher);
    hasher.finish()
}

pub fn rng_for_row(construction_seed: u64, m: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(row_seed(construction_seed, m))
}

pub fn rng_from_seed(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Draws a multinomial-distributed vector `(n_0, ..., n_{k-1})` with
/// `sum(n_i) == n`, proportioned by `weights` (need not sum to 1), via
/// sequential binomial conditioning: for each category in turn, draw a
/// binomial count from the trials and probability mass remaining.
pub fn multinomial(rng: &mut ChaCha12Rng, n: u64, weights: &[f64]) -> Vec<u64> {
    let mut counts = vec![0u64; weights.len()];
    let mut remaining_trials = n;
    let mut remaining_mass: f64 = weights.iter().sum();
    for (idx, &w) in weights.iter().enumerate() {
        if remaining_trials == 0 || remaining_mass <= 0.0 {
            break;
        }
        if idx == weights.len() - 1 {
            counts[idx] = remaining_trials;
            break;
        }
        let p = (w / remaining_mass).clamp(0.0, 1.0);
        let drawn = if p <= 0.0 {
            0
        } else if p >= 1.0 {
            remaining_trials
        } else {
            Binomial::new(remaining_trials, p)
                .expect("binomial parameters validated above")
                .sample(rng)
        };
        counts[idx] = drawn;
        remaining_trials -= drawn;
        remaining_mass -= w;
    }
    counts
}
