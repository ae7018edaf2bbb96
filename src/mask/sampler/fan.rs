//! `FanIn(k) * base`: every target draws exactly `k` sources (subject to
//! partition-proportional splitting). `FanOut` is built on top of this by
//! composing with [`crate::mask::combinators::transpose_sorted`] — see
//! [`crate::mask::Mask::fan_out`].

use crate::interval::Index;
use crate::mask::leaves::IntervalSetMask;
use crate::window::{IterationState, Window};

use super::{fresh_construction_seed, rng, RowSampler};

#[derive(Debug, Clone)]
pub struct FanInMask {
    pub k: u64,
    pub base: IntervalSetMask,
    construction_seed: u64,
}

impl FanInMask {
    pub fn new(k: u64, base: IntervalSetMask) -> Self {
        Self {
            k,
            base,
            construction_seed: fresh_construction_seed(),
        }
    }

    pub fn bounds(&self) -> (Index, Index, Index, Index) {
        self.base.bounds()
    }

    pub fn start_iteration(&self, state: &IterationState) -> FanInSnapshot {
        let (mask, per_target) = match &state.partitions {
            None => {
                let n1 = mask_target_count(&self.base);
                (self.base.clone(), vec![self.k; n1])
            }
            Some(partitions) => {
                let intersected: Vec<IntervalSetMask> =
                    partitions.iter().map(|p| self.base.intersection(p)).collect();
                let selected = state.selected;
                let mask = intersected[selected].clone();
                let seed_str = state.seed.as_deref().unwrap_or("FanInRandomMask");
                let mut alloc_rng = rng::rng_from_seed(rng::hash_seed(seed_str));

                let per_target = mask
                    .set1
                    .element_iter()
                    .map(|j| {
                        let source_dist: Vec<f64> = intersected
                            .iter()
                            .map(|p| {
                                if p.set1.contains(j) {
                                    p.set0.cardinality() as f64
                                } else {
                                    0.0
                                }
                            })
                            .collect();
                        let dist = rng::multinomial(&mut alloc_rng, self.k, &source_dist);
                        dist[selected]
                    })
                    .collect();
                (mask, per_target)
            }
        };

        FanInSnapshot {
            sampler: RowSampler {
                mask,
                per_target,
                construction_seed: self.construction_seed,
            },
        }
    }
}

fn mask_target_count(mask: &IntervalSetMask) -> usize {
    mask.set1.cardinality() as usize
}

#[derive(Debug, Clone)]
pub struct FanInSnapshot {
    sampler: RowSampler,
}

impl FanInSnapshot {
    pub fn iterate(&mut self, window: Window) -> impl Iterator<Item = (Index, Index)> + '_ {
        self.sampler.iterate(window)
    }
}

/// `FanOut(k) * base`: every *source* sends out exactly `k` connections.
///
/// Implemented, per the component design, as `FanIn(k)` over the transposed
/// base followed by swapping the emitted pairs back — not as an independent
/// algorithm. This reuses `FanIn`'s partition-allocation machinery instead
/// of duplicating it for the other axis.
#[derive(Debug, Clone)]
pub struct FanOutMask {
    inner: FanInMask,
    original_bounds: (Index, Index, Index, Index),
}

impl FanOutMask {
    pub fn new(k: u64, base: IntervalSetMask) -> Self {
        let original_bounds = base.bounds();
        Self {
            inner: FanInMask::new(k, base.transpose()),
            original_bounds,
        }
    }

    pub fn bounds(&self) -> (Index, Index, Index, Index) {
        self.original_bounds
    }

    pub fn start_iteration(&self, state: &IterationState) -> FanOutSnapshot {
        FanOutSnapshot {
            inner: self.inner.start_iteration(&state.transposed()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FanOutSnapshot {
    inner: FanInSnapshot,
}

impl FanOutSnapshot {
    /// Transposition reorders the stream, so unlike every other snapshot
    /// here this collects a window's output before returning it — always
    /// bounded, since `window` is already finite.
    pub fn iterate(&mut self, window: Window) -> impl Iterator<Item = (Index, Index)> {
        let transposed_window = Window::new(window.low1, window.high1, window.low0, window.high0);
        let rows: Vec<_> = self.inner.iterate(transposed_window).collect();
        crate::mask::combinators::transpose_sorted(rows.into_iter()).into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::interval_set::IntervalSet;

    fn set(pairs: impl IntoIterator<Item = (Index, Index)>) -> IntervalSet {
        IntervalSet::from_intervals(pairs.into_iter().map(|(a, b)| Interval::new(a, b)))
    }

    #[test]
    fn each_target_gets_exactly_k_unpartitioned() {
        let base = IntervalSetMask::new(set([(0, 49)]), set([(0, 9)]));
        let mask = FanInMask::new(5, base.clone());
        let state = IterationState::single_partition();
        let mut snap = mask.start_iteration(&state);
        let b = mask.bounds();
        let got: Vec<_> = snap.iterate(Window::new(b.0, b.1, b.2, b.3)).collect();
        assert_eq!(got.len(), 5 * 10);
        for j in 0..10 {
            assert_eq!(got.iter().filter(|&&(_, jj)| jj == j).count(), 5);
        }
    }

    #[test]
    fn fan_out_gives_every_source_exactly_k_outgoing() {
        let base = IntervalSetMask::new(set([(0, 9)]), set([(0, 49)]));
        let mask = FanOutMask::new(5, base.clone());
        let state = IterationState::single_partition();
        let mut snap = mask.start_iteration(&state);
        let b = mask.bounds();
        let got: Vec<_> = snap.iterate(Window::new(b.0, b.1, b.2, b.3)).collect();
        assert_eq!(got.len(), 5 * 10);
        for i in 0..10 {
            assert_eq!(got.iter().filter(|&&(ii, _)| ii == i).count(), 5);
        }
    }

    #[test]
    fn fan_out_output_is_post_order_sorted() {
        let base = IntervalSetMask::new(set([(0, 19)]), set([(0, 19)]));
        let mask = FanOutMask::new(3, base.clone());
        let state = IterationState::single_partition();
        let mut snap = mask.start_iteration(&state);
        let b = mask.bounds();
        let got: Vec<_> = snap.iterate(Window::new(b.0, b.1, b.2, b.3)).collect();
        let mut sorted = got.clone();
        sorted.sort_by_key(|&(i, j)| (j, i));
        assert_eq!(got, sorted);
    }

    /// Splitting the target axis in two (the axis fan-in's partition
    /// allocation is keyed on) must not change how many pairs come out in
    /// total, and every target must still end up with exactly `k` across
    /// the two partitions combined — mirrors
    /// `sample_n::tests::partitioned_total_matches_unpartitioned`.
    #[test]
    fn fan_in_partitioned_total_matches_unpartitioned() {
        let base = IntervalSetMask::new(set([(0, 49)]), set([(0, 9)]));
        let mask = FanInMask::new(5, base.clone());

        let whole_state = IterationState::single_partition();
        let mut whole_snap = mask.start_iteration(&whole_state);
        let b = mask.bounds();
        let whole: Vec<_> = whole_snap
            .iterate(Window::new(b.0, b.1, b.2, b.3))
            .collect();

        let p0 = IntervalSetMask::new(set([(0, 49)]), set([(0, 4)]));
        let p1 = IntervalSetMask::new(set([(0, 49)]), set([(5, 9)]));
        let parts = vec![p0.clone(), p1.clone()];

        let s0 = IterationState::partitioned(parts.clone(), 0, "seed");
        let mut snap0 = mask.start_iteration(&s0);
        let b0 = p0.bounds();
        let got0: Vec<_> = snap0.iterate(Window::new(b0.0, b0.1, b0.2, b0.3)).collect();

        let s1 = IterationState::partitioned(parts, 1, "seed");
        let mut snap1 = mask.start_iteration(&s1);
        let b1 = p1.bounds();
        let got1: Vec<_> = snap1.iterate(Window::new(b1.0, b1.1, b1.2, b1.3)).collect();

        assert_eq!(got0.len() + got1.len(), whole.len());
        for j in 0..10 {
            let count = got0.iter().chain(got1.iter()).filter(|&&(_, jj)| jj == j).count();
            assert_eq!(count, 5, "target {j} should receive exactly k across both partitions");
        }
    }

    /// Same property as above for `FanOut`, partitioned along the source
    /// axis (the axis that becomes fan-in's target axis once transposed).
    #[test]
    fn fan_out_partitioned_total_matches_unpartitioned() {
        let base = IntervalSetMask::new(set([(0, 9)]), set([(0, 49)]));
        let mask = FanOutMask::new(5, base.clone());

        let whole_state = IterationState::single_partition();
        let mut whole_snap = mask.start_iteration(&whole_state);
        let b = mask.bounds();
        let whole: Vec<_> = whole_snap
            .iterate(Window::new(b.0, b.1, b.2, b.3))
            .collect();

        let p0 = IntervalSetMask::new(set([(0, 4)]), set([(0, 49)]));
        let p1 = IntervalSetMask::new(set([(5, 9)]), set([(0, 49)]));
        let parts = vec![p0.clone(), p1.clone()];

        let s0 = IterationState::partitioned(parts.clone(), 0, "seed");
        let mut snap0 = mask.start_iteration(&s0);
        let b0 = p0.bounds();
        let got0: Vec<_> = snap0.iterate(Window::new(b0.0, b0.1, b0.2, b0.3)).collect();

        let s1 = IterationState::partitioned(parts, 1, "seed");
        let mut snap1 = mask.start_iteration(&s1);
        let b1 = p1.bounds();
        let got1: Vec<_> = snap1.iterate(Window::new(b1.0, b1.1, b1.2, b1.3)).collect();

        assert_eq!(got0.len() + got1.len(), whole.len());
        for i in 0..10 {
            let count = got0.iter().chain(got1.iter()).filter(|&&(ii, _)| ii == i).count();
            assert_eq!(count, 5, "source {i} should send exactly k across both partitions");
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::interval::Interval;
    use crate::interval_set::IntervalSet;
    use proptest::prelude::*;

    fn set(pairs: impl IntoIterator<Item = (Index, Index)>) -> IntervalSet {
        IntervalSet::from_intervals(pairs.into_iter().map(|(a, b)| Interval::new(a, b)))
    }

    proptest! {
        /// Mirrors `sampler::proptests::whole_bounds_equals_concatenated_sub_windows`
        /// at the `FanInMask` level: splitting the target axis at an
        /// arbitrary point and summing both partitions' output must match
        /// running the whole base as a single partition.
        #[test]
        fn fan_in_partition_total_matches_whole(
            n0 in 1i64..20,
            n1 in 2i64..10,
            k in 1u64..5,
            split in 1i64..9,
        ) {
            let split = split.clamp(1, n1 - 1);
            let base = IntervalSetMask::new(set([(0, n0 - 1)]), set([(0, n1 - 1)]));
            let mask = FanInMask::new(k, base.clone());

            let whole_state = IterationState::single_partition();
            let mut whole_snap = mask.start_iteration(&whole_state);
            let b = mask.bounds();
            let whole: Vec<_> = whole_snap.iterate(Window::new(b.0, b.1, b.2, b.3)).collect();

            let p0 = IntervalSetMask::new(set([(0, n0 - 1)]), set([(0, split - 1)]));
            let p1 = IntervalSetMask::new(set([(0, n0 - 1)]), set([(split, n1 - 1)]));
            let parts = vec![p0.clone(), p1.clone()];

            let s0 = IterationState::partitioned(parts.clone(), 0, "seed");
            let mut snap0 = mask.start_iteration(&s0);
            let b0 = p0.bounds();
            let got0: Vec<_> = snap0.iterate(Window::new(b0.0, b0.1, b0.2, b0.3)).collect();

            let s1 = IterationState::partitioned(parts, 1, "seed");
            let mut snap1 = mask.start_iteration(&s1);
            let b1 = p1.bounds();
            let got1: Vec<_> = snap1.iterate(Window::new(b1.0, b1.1, b1.2, b1.3)).collect();

            prop_assert_eq!(got0.len() + got1.len(), whole.len());
        }

        /// Same property for `FanOutMask`, split along the source axis.
        #[test]
        fn fan_out_partition_total_matches_whole(
            n0 in 2i64..10,
            n1 in 1i64..20,
            k in 1u64..5,
            split in 1i64..9,
        ) {
            let split = split.clamp(1, n0 - 1);
            let base = IntervalSetMask::new(set([(0, n0 - 1)]), set([(0, n1 - 1)]));
            let mask = FanOutMask::new(k, base.clone());

            let whole_state = IterationState::single_partition();
            let mut whole_snap = mask.start_iteration(&whole_state);
            let b = mask.bounds();
            let whole: Vec<_> = whole_snap.iterate(Window::new(b.0, b.1, b.2, b.3)).collect();

            let p0 = IntervalSetMask::new(set([(0, split - 1)]), set([(0, n1 - 1)]));
            let p1 = IntervalSetMask::new(set([(split, n0 - 1)]), set([(0, n1 - 1)]));
            let parts = vec![p0.clone(), p1.clone()];

            let s0 = IterationState::partitioned(parts.clone(), 0, "seed");
            let mut snap0 = mask.start_iteration(&s0);
            let b0 = p0.bounds();
            let got0: Vec<_> = snap0.iterate(Window::new(b0.0, b0.1, b0.2, b0.3)).collect();

            let s1 = IterationState::partitioned(parts, 1, "seed");
            let mut snap1 = mask.start_iteration(&s1);
            let b1 = p1.bounds();
            let got1: Vec<_> = snap1.iterate(Window::new(b1.0, b1.1, b1.2, b1.3)).collect();

            prop_assert_eq!(got0.len() + got1.len(), whole.len());
        }
    }
}
