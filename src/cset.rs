//! The connection-set algebra: a [`Mask`] decorated with value functions.
//!
//! A [`ConnectionSet`] pairs a relation with zero or more `(i, j) -> f64`
//! value functions (arity 0-3 in the common case, though nothing here caps
//! it). Iterating one yields `(i, j, values)` triples; algebraic combinators
//! lift straight through to the mask while the value functions ride along —
//! except for multiset sum, where each emitted pair must keep *its own*
//! originating values rather than some blended average, so that combinator
//! is implemented as its own co-sweep rather than delegated to `Mask`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CsaError, Result};
use crate::interval::Index;
use crate::mask::{Mask, MaskSnapshot};
use crate::window::{IterationState, Window};

/// A scalar-valued function of a connection-set pair.
///
/// Blanket-implemented for any `Fn(Index, Index) -> f64`, so ordinary
/// closures and function pointers (including the geometric value-function
/// collaborators out of this crate's scope — `disc`, `gaussian`, `block`,
/// `transpose`, `fix`) satisfy it directly.
pub trait ValueFn: Send + Sync {
    fn value(&self, i: Index, j: Index) -> f64;
}

impl<F> ValueFn for F
where
    F: Fn(Index, Index) -> f64 + Send + Sync,
{
    fn value(&self, i: Index, j: Index) -> f64 {
        self(i, j)
    }
}

/// A value function backed by a precomputed `(i, j) -> values` table rather
/// than a closure — the "explicit CSet" of the component design, used when
/// a caller already has raw finite value arrays instead of a formula.
/// Missing pairs default to `0.0`.
pub struct TableValueFn {
    table: Arc<HashMap<(Index, Index), Vec<f64>>>,
    column: usize,
}

impl ValueFn for TableValueFn {
    fn value(&self, i: Index, j: Index) -> f64 {
        self.table
            .get(&(i, j))
            .and_then(|row| row.get(self.column))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Builds one [`ValueFn`] per column of a materialized `(i, j) -> values`
/// table, for use with [`ConnectionSet::new`].
pub fn table_value_fns(
    table: HashMap<(Index, Index), Vec<f64>>,
    arity: usize,
) -> Vec<Arc<dyn ValueFn>> {
    let table = Arc::new(table);
    (0..arity)
        .map(|column| {
            Arc::new(TableValueFn {
                table: table.clone(),
                column,
            }) as Arc<dyn ValueFn>
        })
        .collect()
}

/// A mask decorated with an ordered list of value functions.
#[derive(Clone)]
pub enum ConnectionSet {
    /// A mask plus its value functions.
    Base {
        mask: Mask,
        values: Vec<Arc<dyn ValueFn>>,
    },
    /// `left ⊎ right`: each emitted pair keeps the value functions of
    /// whichever operand produced it.
    MultisetSum {
        combined_mask: Mask,
        left: Box<ConnectionSet>,
        right: Box<ConnectionSet>,
    },
}

impl fmt::Debug for ConnectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionSet::Base { mask, values } => f
                .debug_struct("ConnectionSet::Base")
                .field("mask", mask)
                .field("arity", &values.len())
                .finish(),
            ConnectionSet::MultisetSum { left, right, .. } => f
                .debug_struct("ConnectionSet::MultisetSum")
                .field("left", left)
                .field("right", right)
                .finish(),
        }
    }
}

impl ConnectionSet {
    /// A connection set with no value functions (arity 0): a bare mask.
    pub fn from_mask(mask: Mask) -> Self {
        ConnectionSet::Base {
            mask,
            values: Vec::new(),
        }
    }

    /// A connection set decorated with value functions.
    pub fn new(mask: Mask, values: Vec<Arc<dyn ValueFn>>) -> Self {
        ConnectionSet::Base { mask, values }
    }

    /// Number of value functions this connection set carries.
    pub fn arity(&self) -> usize {
        match self {
            ConnectionSet::Base { values, .. } => values.len(),
            ConnectionSet::MultisetSum { left, .. } => left.arity(),
        }
    }

    /// The underlying mask, folding `MultisetSum` down to its combined form.
    pub fn mask(&self) -> &Mask {
        match self {
            ConnectionSet::Base { mask, .. } => mask,
            ConnectionSet::MultisetSum { combined_mask, .. } => combined_mask,
        }
    }

    pub fn bounds(&self) -> Option<(Index, Index, Index, Index)> {
        self.mask().bounds()
    }

    /// `self ∩ m`: intersects the underlying mask with `m`, keeping each
    /// pair's originating values. Distributes into `MultisetSum`'s children
    /// since membership in `m` doesn't depend on which operand a pair came
    /// from.
    pub fn intersection(self, m: Mask) -> ConnectionSet {
        match self {
            ConnectionSet::Base { mask, values } => ConnectionSet::Base {
                mask: mask.intersection(m),
                values,
            },
            ConnectionSet::MultisetSum {
                combined_mask,
                left,
                right,
            } => ConnectionSet::MultisetSum {
                combined_mask: combined_mask.intersection(m.clone()),
                left: Box::new(left.intersection(m.clone())),
                right: Box::new(right.intersection(m)),
            },
        }
    }

    /// `self \ m`, by the same distribution argument as [`Self::intersection`].
    pub fn difference(self, m: Mask) -> ConnectionSet {
        match self {
            ConnectionSet::Base { mask, values } => ConnectionSet::Base {
                mask: mask.difference(m),
                values,
            },
            ConnectionSet::MultisetSum {
                combined_mask,
                left,
                right,
            } => ConnectionSet::MultisetSum {
                combined_mask: combined_mask.difference(m.clone()),
                left: Box::new(left.difference(m.clone())),
                right: Box::new(right.difference(m)),
            },
        }
    }

    /// `self ⊎ other`. Requires equal arity.
    pub fn multiset_sum(self, other: ConnectionSet) -> Result<ConnectionSet> {
        let (left_arity, right_arity) = (self.arity(), other.arity());
        if left_arity != right_arity {
            return Err(CsaError::ArityMismatch {
                left: left_arity,
                right: right_arity,
            });
        }
        let combined_mask = self.mask().clone().multiset_sum(other.mask().clone())?;
        Ok(ConnectionSet::MultisetSum {
            combined_mask,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    /// Lifts a scalar multiplication through every value function.
    pub fn scalar_mul(self, c: f64) -> ConnectionSet {
        self.map_values(move |f| {
            let f = f.clone();
            Arc::new(move |i, j| f.value(i, j) * c) as Arc<dyn ValueFn>
        })
    }

    /// Lifts a scalar addition through every value function.
    pub fn scalar_add(self, c: f64) -> ConnectionSet {
        self.map_values(move |f| {
            let f = f.clone();
            Arc::new(move |i, j| f.value(i, j) + c) as Arc<dyn ValueFn>
        })
    }

    fn map_values(self, f: impl Fn(&Arc<dyn ValueFn>) -> Arc<dyn ValueFn> + Clone) -> ConnectionSet {
        match self {
            ConnectionSet::Base { mask, values } => ConnectionSet::Base {
                mask,
                values: values.iter().map(&f).collect(),
            },
            ConnectionSet::MultisetSum {
                combined_mask,
                left,
                right,
            } => ConnectionSet::MultisetSum {
                combined_mask,
                left: Box::new(left.map_values(f.clone())),
                right: Box::new(right.map_values(f)),
            },
        }
    }

    pub fn start_iteration(&self, state: &IterationState) -> ConnectionSetSnapshot {
        match self {
            ConnectionSet::Base { mask, values } => ConnectionSetSnapshot::Base {
                snapshot: mask.start_iteration(state),
                values: values.clone(),
            },
            ConnectionSet::MultisetSum { left, right, .. } => ConnectionSetSnapshot::MultisetSum {
                left: Box::new(left.start_iteration(state)),
                right: Box::new(right.start_iteration(state)),
            },
        }
    }
}

impl std::ops::Mul<Mask> for ConnectionSet {
    type Output = ConnectionSet;
    fn mul(self, rhs: Mask) -> ConnectionSet {
        self.intersection(rhs)
    }
}

impl std::ops::Mul<f64> for ConnectionSet {
    type Output = ConnectionSet;
    fn mul(self, rhs: f64) -> ConnectionSet {
        self.scalar_mul(rhs)
    }
}

impl std::ops::Sub<Mask> for ConnectionSet {
    type Output = ConnectionSet;
    fn sub(self, rhs: Mask) -> ConnectionSet {
        self.difference(rhs)
    }
}

/// `ConnectionSet + ConnectionSet` models multiset sum, which can fail on
/// an arity mismatch or an overlapping-`IntervalSetMask` sum; `Output` is
/// therefore a `Result`, matching [`Mask`]'s own `Add` impl.
impl std::ops::Add for ConnectionSet {
    type Output = Result<ConnectionSet>;
    fn add(self, rhs: ConnectionSet) -> Result<ConnectionSet> {
        self.multiset_sum(rhs)
    }
}

/// The mutable per-iteration state paired with a [`ConnectionSet`].
pub enum ConnectionSetSnapshot {
    Base {
        snapshot: MaskSnapshot,
        values: Vec<Arc<dyn ValueFn>>,
    },
    MultisetSum {
        left: Box<ConnectionSetSnapshot>,
        right: Box<ConnectionSetSnapshot>,
    },
}

impl ConnectionSetSnapshot {
    /// Post-order `(i, j, values)` triples restricted to `window`.
    pub fn iterate<'a>(
        &'a mut self,
        window: Window,
    ) -> Box<dyn Iterator<Item = (Index, Index, Vec<f64>)> + 'a> {
        match self {
            ConnectionSetSnapshot::Base { snapshot, values } => {
                Box::new(snapshot.iterate(window).map(move |(i, j)| {
                    let row = values.iter().map(|v| v.value(i, j)).collect();
                    (i, j, row)
                }))
            }
            ConnectionSetSnapshot::MultisetSum { left, right } => {
                Box::new(multiset_sum_values_iter(left.iterate(window), right.iterate(window)))
            }
        }
    }
}

#[inline]
fn key(row: &(Index, Index, Vec<f64>)) -> (Index, Index) {
    (row.1, row.0)
}

/// Merges two value-carrying streams in post-order, preserving duplicates
/// and each side's own values (the behavior plain [`crate::mask::combinators::multiset_sum_iter`]
/// can't provide, since it only ever sees bare `(i, j)` pairs).
fn multiset_sum_values_iter<'a>(
    mut a: impl Iterator<Item = (Index, Index, Vec<f64>)> + 'a,
    mut b: impl Iterator<Item = (Index, Index, Vec<f64>)> + 'a,
) -> impl Iterator<Item = (Index, Index, Vec<f64>)> + 'a {
    let mut pa = a.next();
    let mut pb = b.next();
    std::iter::from_fn(move || match (pa.take(), pb.take()) {
        (None, None) => None,
        (Some(x), None) => {
            pb = None;
            pa = a.next();
            Some(x)
        }
        (None, Some(y)) => {
            pa = None;
            pb = b.next();
            Some(y)
        }
        (Some(x), Some(y)) => {
            if key(&x) <= key(&y) {
                pb = Some(y);
                pa = a.next();
                Some(x)
            } else {
                pa = Some(x);
                pb = b.next();
                Some(y)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::interval_set::IntervalSet;
    use crate::mask::IntervalSetMask;

    fn iset(pairs: impl IntoIterator<Item = (Index, Index)>) -> IntervalSet {
        IntervalSet::from_intervals(pairs.into_iter().map(|(a, b)| Interval::new(a, b)))
    }

    fn run(cset: &ConnectionSet, window: Window) -> Vec<(Index, Index, Vec<f64>)> {
        let state = IterationState::single_partition();
        let mut snap = cset.start_iteration(&state);
        snap.iterate(window).collect()
    }

    #[test]
    fn base_cset_evaluates_value_fn_per_pair() {
        let mask = Mask::IntervalSet(IntervalSetMask::new(iset([(0, 2)]), iset([(0, 0)])));
        let values: Vec<Arc<dyn ValueFn>> = vec![Arc::new(|i: Index, j: Index| (i + j) as f64)];
        let cset = ConnectionSet::new(mask, values);
        let got = run(&cset, Window::new(0, 3, 0, 1));
        assert_eq!(
            got,
            vec![(0, 0, vec![0.0]), (1, 0, vec![1.0]), (2, 0, vec![2.0])]
        );
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mask_a = Mask::IntervalSet(IntervalSetMask::new(iset([(0, 0)]), iset([(0, 0)])));
        let mask_b = Mask::IntervalSet(IntervalSetMask::new(iset([(1, 1)]), iset([(0, 0)])));
        let a = ConnectionSet::from_mask(mask_a);
        let b = ConnectionSet::new(mask_b, vec![Arc::new(|_, _| 1.0)]);
        assert!(matches!(
            a.multiset_sum(b),
            Err(CsaError::ArityMismatch { left: 0, right: 1 })
        ));
    }

    #[test]
    fn multiset_sum_keeps_each_operands_own_values() {
        let mask_a = Mask::IntervalSet(IntervalSetMask::new(iset([(0, 0)]), iset([(0, 0)])));
        let mask_b = Mask::IntervalSet(IntervalSetMask::new(iset([(1, 1)]), iset([(0, 0)])));
        let a = ConnectionSet::new(mask_a, vec![Arc::new(|_, _| 1.0)]);
        let b = ConnectionSet::new(mask_b, vec![Arc::new(|_, _| 2.0)]);
        let sum = a.multiset_sum(b).unwrap();
        let got = run(&sum, Window::new(0, 2, 0, 1));
        assert_eq!(got, vec![(0, 0, vec![1.0]), (1, 0, vec![2.0])]);
    }

    #[test]
    fn scalar_mul_lifts_through_values() {
        let mask = Mask::IntervalSet(IntervalSetMask::new(iset([(0, 1)]), iset([(0, 0)])));
        let values: Vec<Arc<dyn ValueFn>> = vec![Arc::new(|i: Index, _j: Index| i as f64)];
        let cset = ConnectionSet::new(mask, values).scalar_mul(10.0);
        let got = run(&cset, Window::new(0, 2, 0, 1));
        assert_eq!(got, vec![(0, 0, vec![0.0]), (1, 0, vec![10.0])]);
    }

    #[test]
    fn table_value_fn_defaults_missing_pairs_to_zero() {
        let mask = Mask::IntervalSet(IntervalSetMask::new(iset([(0, 2)]), iset([(0, 0)])));
        let mut table = HashMap::new();
        table.insert((1, 0), vec![5.0]);
        let values = table_value_fns(table, 1);
        let cset = ConnectionSet::new(mask, values);
        let got = run(&cset, Window::new(0, 3, 0, 1));
        assert_eq!(
            got,
            vec![(0, 0, vec![0.0]), (1, 0, vec![5.0]), (2, 0, vec![0.0])]
        );
    }
}
