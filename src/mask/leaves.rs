//! Leaf mask representations: Cartesian products of interval sets and
//! explicit enumerations.

use crate::interval::Index;
use crate::interval_set::IntervalSet;
use crate::window::Window;

/// The Cartesian product of two interval sets, `S0 x S1`.
///
/// This is the fundamental finite building block samplers operate on: every
/// sampler's base must be one of these so that its support can be split into
/// disjoint rectangular partitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalSetMask {
    pub set0: IntervalSet,
    pub set1: IntervalSet,
}

impl IntervalSetMask {
    pub fn new(set0: IntervalSet, set1: IntervalSet) -> Self {
        Self { set0, set1 }
    }

    pub fn is_empty(&self) -> bool {
        self.set0.is_empty() || self.set1.is_empty()
    }

    pub fn cardinality(&self) -> u64 {
        self.set0.cardinality() * self.set1.cardinality()
    }

    /// The tight bounding rectangle, or all-zero if either axis is empty.
    pub fn bounds(&self) -> (Index, Index, Index, Index) {
        if self.is_empty() {
            return (0, 0, 0, 0);
        }
        (
            self.set0.min().expect("checked non-empty"),
            self.set0.max().expect("checked non-empty") + 1,
            self.set1.min().expect("checked non-empty"),
            self.set1.max().expect("checked non-empty") + 1,
        )
    }

    pub fn intersection(&self, other: &IntervalSetMask) -> IntervalSetMask {
        IntervalSetMask::new(
            self.set0.intersection(&other.set0),
            self.set1.intersection(&other.set1),
        )
    }

    pub fn union(&self, other: &IntervalSetMask) -> IntervalSetMask {
        IntervalSetMask::new(self.set0.union(&other.set0), self.set1.union(&other.set1))
    }

    /// Axes swapped: `S0 x S1` becomes `S1 x S0`.
    pub fn transpose(&self) -> IntervalSetMask {
        IntervalSetMask::new(self.set1.clone(), self.set0.clone())
    }

    /// Post-order `(j, i)` pairs restricted to `window`.
    pub fn iter_window(&self, window: Window) -> impl Iterator<Item = (Index, Index)> + '_ {
        let low0 = window.low0;
        let high0 = window.high0;
        self.set1
            .bounded_iter(window.low1, window.high1)
            .flat_map(move |j| {
                self.set0
                    .bounded_iter(low0, high0)
                    .map(move |i| (i, j))
            })
    }
}

/// A finite mask backed by an explicit, user-supplied list of pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExplicitMask {
    /// Sorted in post-order: ascending by `(j, i)`.
    connections: Vec<(Index, Index)>,
}

impl ExplicitMask {
    pub fn new(pairs: impl IntoIterator<Item = (Index, Index)>) -> Self {
        let mut v: Vec<(Index, Index)> = pairs.into_iter().collect();
        v.sort_by_key(|&(i, j)| (j, i));
        Self { connections: v }
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn cardinality(&self) -> u64 {
        self.connections.len() as u64
    }

    pub fn bounds(&self) -> (Index, Index, Index, Index) {
        if self.connections.is_empty() {
            return (0, 0, 0, 0);
        }
        let low0 = self.connections.iter().map(|&(i, _)| i).min().unwrap();
        let high0 = self.connections.iter().map(|&(i, _)| i).max().unwrap() + 1;
        let low1 = self.connections.first().unwrap().1;
        let high1 = self.connections.last().unwrap().1 + 1;
        (low0, high0, low1, high1)
    }

    pub fn iter_window(&self, window: Window) -> impl Iterator<Item = (Index, Index)> + '_ {
        self.connections.iter().copied().filter(move |&(i, j)| {
            j >= window.low1 && j < window.high1 && i >= window.low0 && i < window.high0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;

    fn set(pairs: impl IntoIterator<Item = (Index, Index)>) -> IntervalSet {
        IntervalSet::from_intervals(pairs.into_iter().map(|(a, b)| Interval::new(a, b)))
    }

    #[test]
    fn iset_mask_cartesian_product_post_order() {
        let m = IntervalSetMask::new(set([(0, 2)]), set([(0, 1)]));
        let w = Window::new(0, 3, 0, 2);
        let got: Vec<_> = m.iter_window(w).collect();
        assert_eq!(
            got,
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn iset_mask_bounds_empty() {
        let m = IntervalSetMask::default();
        assert_eq!(m.bounds(), (0, 0, 0, 0));
    }

    #[test]
    fn explicit_mask_sorts_post_order() {
        let m = ExplicitMask::new([(5, 1), (0, 0), (3, 0), (1, 1)]);
        let w = Window::new(0, 10, 0, 10);
        let got: Vec<_> = m.iter_window(w).collect();
        assert_eq!(got, vec![(0, 0), (3, 0), (5, 1), (1, 1)]);
    }

    #[test]
    fn explicit_mask_bounds() {
        let m = ExplicitMask::new([(2, 5), (8, 9), (1, 5)]);
        assert_eq!(m.bounds(), (1, 9, 5, 10));
    }
}
