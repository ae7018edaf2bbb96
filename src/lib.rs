//! csa - an algebra for describing, composing, and enumerating connection sets
//!
//! A connection set is a relation between two (possibly unbounded) index
//! spaces, optionally decorated with per-pair values, used to specify
//! connectivity between neuron populations. Expressions are built from
//! primitive masks (identity, random, interval products, explicit pairs),
//! combined algebraically (intersection, multiset sum, difference,
//! complement), and evaluated lazily over a caller-chosen rectangular
//! window — identically across any number of cooperating partitions.

pub mod cset;
pub mod error;
pub mod interval;
pub mod interval_set;
pub mod mask;
pub mod window;

pub use cset::{table_value_fns, ConnectionSet, ConnectionSetSnapshot, ValueFn};
pub use error::{CsaError, Result};
pub use interval::{Index, Interval};
pub use interval_set::IntervalSet;
pub use mask::{
    ExplicitMask, FanIn, FanOut, IntervalSetMask, Mask, MaskSnapshot, SampleN,
};
pub use window::{IterationState, Window};

/// The identity mask `{(i, i)}`.
pub fn one_to_one() -> Mask {
    Mask::OneToOne
}

/// An infinite Bernoulli mask: each candidate pair is independently included
/// with probability `p`.
pub fn random(p: f64) -> Mask {
    Mask::ConstantRandom(mask::ConstantRandomMask::new(p))
}

/// `sample_n(n) * m` draws exactly `n` pairs uniformly from a finite
/// `IntervalSetMask` base `m`.
pub fn sample_n(n: u64) -> SampleN {
    SampleN(n)
}

/// `fan_in(k) * m`: every target in `m` receives exactly `k` source draws.
pub fn fan_in(k: u64) -> FanIn {
    FanIn(k)
}

/// `fan_out(k) * m`: every source in `m` sends exactly `k` target draws.
pub fn fan_out(k: u64) -> FanOut {
    FanOut(k)
}

/// A finite mask backed by an explicitly listed relation.
pub fn explicit_mask(pairs: impl IntoIterator<Item = (Index, Index)>) -> Mask {
    Mask::Explicit(ExplicitMask::new(pairs))
}

/// The Cartesian product `s0 x s1`.
pub fn interval_set_mask(s0: IntervalSet, s1: IntervalSet) -> Mask {
    Mask::IntervalSet(IntervalSetMask::new(s0, s1))
}

/// A connection set pairing `mask` with `values`.
pub fn cset(mask: Mask, values: Vec<std::sync::Arc<dyn ValueFn>>) -> ConnectionSet {
    ConnectionSet::new(mask, values)
}

/// Enumerates `mask`'s post-order `(i, j)` pairs restricted to the window
/// `[low0, high0) x [low1, high1)`, under the given partition/seed state.
pub fn enumerate(
    mask: &Mask,
    low0: Index,
    high0: Index,
    low1: Index,
    high1: Index,
    state: &IterationState,
) -> Vec<(Index, Index)> {
    let mut snapshot = mask.start_iteration(state);
    snapshot
        .iterate(Window::new(low0, high0, low1, high1))
        .collect()
}

/// Enumerates the whole of a finite mask's bounding rectangle.
///
/// Fails with [`CsaError::InfiniteEnumeration`] if `mask` has no computable
/// bounds (see [`Mask::bounds`]).
pub fn enumerate_bounds(mask: &Mask, state: &IterationState) -> Result<Vec<(Index, Index)>> {
    let (low0, high0, low1, high1) = mask.bounds().ok_or(CsaError::InfiniteEnumeration)?;
    Ok(enumerate(mask, low0, high0, low1, high1, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartesian_product_scenario() {
        let m = interval_set_mask(IntervalSet::from_elements(0..=2), IntervalSet::from_elements(0..=1));
        let state = IterationState::single_partition();
        let got = enumerate_bounds(&m, &state).unwrap();
        assert_eq!(
            got,
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn intersection_scenario() {
        let identity = one_to_one();
        let bounded = interval_set_mask(
            IntervalSet::from_elements(0..=3),
            IntervalSet::from_elements(1..=2),
        );
        let combined = identity.intersection(bounded);
        let state = IterationState::single_partition();
        let got = enumerate(&combined, 0, 4, 0, 4, &state);
        assert_eq!(got, vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn sample_n_operator_dsl() {
        let base = interval_set_mask(
            IntervalSet::from_elements(0..=99),
            IntervalSet::from_elements(0..=99),
        );
        let sampler = (sample_n(1000) * base).unwrap();
        let state = IterationState::single_partition();
        let got = enumerate_bounds(&sampler, &state).unwrap();
        assert_eq!(got.len(), 1000);
    }

    #[test]
    fn fan_in_operator_dsl() {
        let base = interval_set_mask(
            IntervalSet::from_elements(0..=9),
            IntervalSet::from_elements(0..=4),
        );
        let sampler = (fan_in(3) * base).unwrap();
        let state = IterationState::single_partition();
        let got = enumerate_bounds(&sampler, &state).unwrap();
        for j in 0..5 {
            assert_eq!(got.iter().filter(|&&(_, jj)| jj == j).count(), 3);
        }
    }

    #[test]
    fn enumerate_bounds_on_infinite_mask_errors() {
        let state = IterationState::single_partition();
        assert_eq!(
            enumerate_bounds(&one_to_one(), &state),
            Err(CsaError::InfiniteEnumeration)
        );
    }

    #[test]
    fn explicit_mask_round_trip() {
        let m = explicit_mask([(5, 1), (0, 0), (3, 0)]);
        let state = IterationState::single_partition();
        let got = enumerate_bounds(&m, &state).unwrap();
        assert_eq!(got, vec![(0, 0), (3, 0), (5, 1)]);
    }
}
