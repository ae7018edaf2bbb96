//! Co-sweep merge algorithms over post-order-sorted `(i, j)` streams.
//!
//! Every combinator here assumes its inputs are already sorted ascending by
//! `(j, i)` — the invariant every mask's `iterate` upholds — and merges them
//! in a single forward pass without buffering.

use crate::interval::{Index, Interval};
use crate::interval_set::IntervalSet;
use crate::window::Window;

#[inline]
fn key((i, j): (Index, Index)) -> (Index, Index) {
    (j, i)
}

/// Pairs present in both streams (sorted-merge intersection).
pub fn intersection_iter<'a>(
    mut a: impl Iterator<Item = (Index, Index)> + 'a,
    mut b: impl Iterator<Item = (Index, Index)> + 'a,
) -> impl Iterator<Item = (Index, Index)> + 'a {
    let mut pa = a.next();
    let mut pb = b.next();
    std::iter::from_fn(move || loop {
        match (pa, pb) {
            (Some(x), Some(y)) => {
                if key(x) < key(y) {
                    pa = a.next();
                } else if key(y) < key(x) {
                    pb = b.next();
                } else {
                    pa = a.next();
                    pb = b.next();
                    return Some(x);
                }
            }
            _ => return None,
        }
    })
}

/// Multiset union: every pair from either stream, in merged post-order
/// (duplicates preserved, not deduplicated).
pub fn multiset_sum_iter<'a>(
    mut a: impl Iterator<Item = (Index, Index)> + 'a,
    mut b: impl Iterator<Item = (Index, Index)> + 'a,
) -> impl Iterator<Item = (Index, Index)> + 'a {
    let mut pa = a.next();
    let mut pb = b.next();
    std::iter::from_fn(move || match (pa, pb) {
        (None, None) => None,
        (Some(x), None) => {
            pa = a.next();
            Some(x)
        }
        (None, Some(y)) => {
            pb = b.next();
            Some(y)
        }
        (Some(x), Some(y)) => {
            if key(x) <= key(y) {
                pa = a.next();
                Some(x)
            } else {
                pb = b.next();
                Some(y)
            }
        }
    })
}

/// Pairs from `a` whose key does not occur in `b` (sorted-merge subtraction).
pub fn difference_iter<'a>(
    mut a: impl Iterator<Item = (Index, Index)> + 'a,
    mut b: impl Iterator<Item = (Index, Index)> + 'a,
) -> impl Iterator<Item = (Index, Index)> + 'a {
    let mut pa = a.next();
    let mut pb = b.next();
    std::iter::from_fn(move || loop {
        let x = pa?;
        match pb {
            Some(y) if key(y) < key(x) => {
                pb = b.next();
            }
            Some(y) if key(y) == key(x) => {
                pa = a.next();
                pb = b.next();
            }
            _ => {
                pa = a.next();
                return Some(x);
            }
        }
    })
}

/// Every `(i, j)` in `window` not produced by `inner`.
///
/// Walked one `j`-row at a time: `inner`'s sorted output is grouped by row
/// into an [`IntervalSet`] of excluded `i`s, and [`IntervalSet::complement`]
/// turns that into the row's included `i`s directly — the canonical
/// set-algebra operation this crate already exposes, rather than a
/// hand-rolled index walk duplicating it.
pub fn complement_iter<'a>(
    mut inner: impl Iterator<Item = (Index, Index)> + 'a,
    window: Window,
) -> impl Iterator<Item = (Index, Index)> + 'a {
    let mut next = inner.next();
    let mut j = window.low1;
    let mut row_j = window.low1;
    let mut row: std::vec::IntoIter<Index> = Vec::new().into_iter();
    std::iter::from_fn(move || loop {
        if let Some(i) = row.next() {
            return Some((i, row_j));
        }
        if j >= window.high1 {
            return None;
        }
        if window.low0 >= window.high0 {
            j += 1;
            continue;
        }
        let mut excluded = Vec::new();
        while let Some((ei, ej)) = next {
            if ej < j {
                next = inner.next();
            } else if ej == j {
                excluded.push(ei);
                next = inner.next();
            } else {
                break;
            }
        }
        let included = IntervalSet::from_elements(excluded)
            .complement(Interval::new(window.low0, window.high0 - 1));
        row_j = j;
        row = included.element_iter().collect::<Vec<_>>().into_iter();
        j += 1;
    })
}

/// Swaps `(i, j) -> (j, i)` in every pair and re-sorts into post-order.
///
/// Transposition inherently reorders the stream (a post-order-sorted input
/// is not post-order-sorted after swapping axes), so this buffers the
/// window's output — always bounded, since every `iterate` call is already
/// restricted to a finite window.
pub fn transpose_sorted(pairs: impl Iterator<Item = (Index, Index)>) -> Vec<(Index, Index)> {
    let mut v: Vec<(Index, Index)> = pairs.map(|(i, j)| (j, i)).collect();
    v.sort_by_key(|&p| key(p));
    v
}
