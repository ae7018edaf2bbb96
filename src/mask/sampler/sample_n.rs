//! `SampleN(N) * base`: draw exactly `N` connections from a finite
//! `IntervalSetMask` base, distributed uniformly over targets.

use crate::interval::Index;
use crate::mask::leaves::IntervalSetMask;
use crate::window::Window;
use crate::window::IterationState;

use super::{fresh_construction_seed, rng, RowSampler};

#[derive(Debug, Clone)]
pub struct SampleNMask {
    pub n: u64,
    pub base: IntervalSetMask,
    construction_seed: u64,
}

impl SampleNMask {
    pub fn new(n: u64, base: IntervalSetMask) -> Self {
        Self {
            n,
            base,
            construction_seed: fresh_construction_seed(),
        }
    }

    pub fn bounds(&self) -> (Index, Index, Index, Index) {
        self.base.bounds()
    }

    pub fn start_iteration(&self, state: &IterationState) -> SampleNSnapshot {
        let (mask, n_selected) = match &state.partitions {
            None => (self.base.clone(), self.n),
            Some(partitions) => {
                let intersected: Vec<IntervalSetMask> =
                    partitions.iter().map(|p| self.base.intersection(p)).collect();
                let sizes: Vec<f64> = intersected.iter().map(|m| m.cardinality() as f64).collect();
                let seed_str = state.seed.as_deref().unwrap_or("SampleNRandomMask");
                let mut alloc_rng = rng::rng_from_seed(rng::hash_seed(seed_str));
                let counts = rng::multinomial(&mut alloc_rng, self.n, &sizes);
                let selected = state.selected;
                (intersected[selected].clone(), counts[selected])
            }
        };

        let n1 = mask.set1.cardinality().max(1) as usize;
        let mut per_target_rng = rng::rng_from_seed(self.construction_seed);
        let per_target = rng::multinomial(&mut per_target_rng, n_selected, &vec![1.0; n1]);

        SampleNSnapshot {
            sampler: RowSampler {
                mask,
                per_target,
                construction_seed: self.construction_seed,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleNSnapshot {
    sampler: RowSampler,
}

impl SampleNSnapshot {
    pub fn iterate(&mut self, window: Window) -> impl Iterator<Item = (Index, Index)> + '_ {
        self.sampler.iterate(window)
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
    fn draws_exactly_n_unpartitioned() {
        let base = IntervalSetMask::new(set([(0, 99)]), set([(0, 9)]));
        let mask = SampleNMask::new(1000, base.clone());
        let state = IterationState::single_partition();
        let mut snap = mask.start_iteration(&state);
        let bounds = mask.bounds();
        let got: Vec<_> = snap
            .iterate(Window::new(bounds.0, bounds.1, bounds.2, bounds.3))
            .collect();
        assert_eq!(got.len(), 1000);
    }

    #[test]
    fn partitioned_total_matches_unpartitioned() {
        let base = IntervalSetMask::new(set([(0, 99)]), set([(0, 99)]));
        let mask = SampleNMask::new(1000, base.clone());

        let whole_state = IterationState::single_partition();
        let mut whole_snap = mask.start_iteration(&whole_state);
        let b = mask.bounds();
        let whole: Vec<_> = whole_snap
            .iterate(Window::new(b.0, b.1, b.2, b.3))
            .collect();

        let p0 = IntervalSetMask::new(set([(0, 99)]), set([(0, 49)]));
        let p1 = IntervalSetMask::new(set([(0, 99)]), set([(50, 99)]));
        let parts = vec![p0, p1];

        let s0 = IterationState::partitioned(parts.clone(), 0, "seed");
        let mut snap0 = mask.start_iteration(&s0);
        let b0 = p0_bounds(&parts, 0);
        let got0: Vec<_> = snap0.iterate(b0).collect();

        let s1 = IterationState::partitioned(parts.clone(), 1, "seed");
        let mut snap1 = mask.start_iteration(&s1);
        let b1 = p0_bounds(&parts, 1);
        let got1: Vec<_> = snap1.iterate(b1).collect();

        assert_eq!(got0.len() + got1.len(), whole.len());
    }

    fn p0_bounds(parts: &[IntervalSetMask], idx: usize) -> Window {
        let b = parts[idx].bounds();
        Window::new(b.0, b.1, b.2, b.3)
    }
}
