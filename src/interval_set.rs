//! A canonical container for finite, non-overlapping, sorted integer intervals.
//!
//! [`IntervalSet`] wraps a `Vec<Interval>` and guarantees the **canonical
//! invariant** at all times: intervals are sorted by start, non-overlapping,
//! and non-adjacent (touching intervals are merged).
//!
//! Read access is fully transparent via `Deref<Target = [Interval]>`.

use std::fmt::Display;
use std::ops::Deref;

use crate::error::{CsaError, Result};
use crate::interval::{Index, Interval};

/// A sorted, non-overlapping, non-adjacent set of closed integer intervals —
/// the compact representation of a finite subset of ℕ.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalSet(Vec<Interval>);

// ── Construction ────────────────────────────────────────────────────────

impl IntervalSet {
    /// The empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a canonical set from an arbitrary (possibly unsorted,
    /// possibly overlapping) sequence of intervals, merging as needed.
    pub fn from_intervals(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut v: Vec<Interval> = intervals.into_iter().collect();
        normalize(&mut v);
        Self(v)
    }

    /// Builds a canonical set from a bag of individual indices.
    pub fn from_elements(elements: impl IntoIterator<Item = Index>) -> Self {
        let v: Vec<Interval> = elements.into_iter().map(|x| Interval::new(x, x)).collect();
        Self::from_intervals(v)
    }

    /// Wraps a `Vec` that is **already in canonical form** without
    /// re-normalizing.
    ///
    /// In debug builds this asserts the invariant; in release builds the
    /// check is elided.
    ///
    /// # Logical safety
    ///
    /// The caller must ensure the input is sorted by start with no
    /// overlapping or adjacent intervals. Violating this in release mode
    /// silently produces incorrect results from downstream operations.
    pub fn from_sorted_unchecked(v: Vec<Interval>) -> Self {
        debug_assert!(is_canonical(&v), "IntervalSet: input is not canonical");
        Self(v)
    }
}

fn is_canonical(intervals: &[Interval]) -> bool {
    intervals
        .windows(2)
        .all(|w| w[0].end() + 1 < w[1].start())
}

fn normalize(v: &mut Vec<Interval>) {
    if v.len() <= 1 {
        return;
    }
    v.sort_by_key(|iv| iv.start());
    let mut merged: Vec<Interval> = Vec::with_capacity(v.len());
    for iv in v.drain(..) {
        match merged.last_mut() {
            Some(last) if last.abuts(&iv) => {
                if iv.end() > last.end() {
                    *last = Interval::new(last.start(), iv.end());
                }
            }
            _ => merged.push(iv),
        }
    }
    *v = merged;
}

// ── Queries ──────────────────────────────────────────────────────────────

impl IntervalSet {
    /// Total number of integers represented.
    pub fn cardinality(&self) -> u64 {
        self.0.iter().map(Interval::cardinality).sum()
    }

    /// `O(log k)` binary search over the disjoint intervals.
    pub fn contains(&self, x: Index) -> bool {
        self.0
            .binary_search_by(|iv| {
                if x < iv.start() {
                    std::cmp::Ordering::Greater
                } else if x > iv.end() {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn min(&self) -> Result<Index> {
        self.0.first().map(Interval::start).ok_or(CsaError::EmptySet)
    }

    pub fn max(&self) -> Result<Index> {
        self.0.last().map(Interval::end).ok_or(CsaError::EmptySet)
    }

    /// Number of elements `x` with `lo <= x < hi`.
    ///
    /// Used to compute a target's ordinal position in a sorted enumeration
    /// (e.g. by the samplers in [`crate::mask::sampler`]).
    pub fn count(&self, lo: Index, hi: Index) -> u64 {
        if lo >= hi {
            return 0;
        }
        let mut total = 0u64;
        for iv in &self.0 {
            if iv.end() < lo {
                continue;
            }
            if iv.start() >= hi {
                break;
            }
            let start = iv.start().max(lo);
            let end = iv.end().min(hi - 1);
            if start <= end {
                total += (end - start + 1) as u64;
            }
        }
        total
    }

    /// Every integer in the set, in ascending order.
    pub fn element_iter(&self) -> impl Iterator<Item = Index> + '_ {
        self.0.iter().flat_map(|iv| iv.start()..=iv.end())
    }

    /// Each disjoint interval, in ascending order.
    pub fn interval_iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.0.iter().copied()
    }

    /// The element at ordinal position `ord` (0-indexed) in ascending order,
    /// or `None` if `ord >= cardinality()`.
    ///
    /// The inverse of [`IntervalSet::count`]: samplers use this to map a
    /// uniformly-drawn ordinal position back to a concrete index without
    /// depending on which window happens to be in view.
    pub fn nth(&self, mut ord: u64) -> Option<Index> {
        for iv in &self.0 {
            let card = iv.cardinality();
            if ord < card {
                return Some(iv.start() + ord as Index);
            }
            ord -= card;
        }
        None
    }

    /// Every integer in `[lo, hi)`, in ascending order.
    pub fn bounded_iter(&self, lo: Index, hi: Index) -> impl Iterator<Item = Index> + '_ {
        self.0.iter().flat_map(move |iv| {
            let start = iv.start().max(lo);
            let end = iv.end().min(hi - 1);
            if start <= end {
                start..=end
            } else {
                // empty inclusive range: start > end picked so iterator yields nothing
                1..=0
            }
        })
    }
}

// ── Set algebra ──────────────────────────────────────────────────────────

impl IntervalSet {
    /// Sweep-based union of two canonical sets.
    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        let mut result: Vec<Interval> = Vec::with_capacity(self.0.len() + other.0.len());
        let (a, b) = (&self.0, &other.0);
        let mut i = 0usize;
        let mut j = 0usize;
        while i < a.len() && j < b.len() {
            if a[i].start() <= b[j].start() {
                push_merged(&mut result, a[i]);
                i += 1;
            } else {
                push_merged(&mut result, b[j]);
                j += 1;
            }
        }
        for iv in &a[i..] {
            push_merged(&mut result, *iv);
        }
        for iv in &b[j..] {
            push_merged(&mut result, *iv);
        }
        IntervalSet::from_sorted_unchecked(result)
    }

    /// Sweep-based intersection of two canonical sets.
    pub fn intersection(&self, other: &IntervalSet) -> IntervalSet {
        let (a, b) = (&self.0, &other.0);
        let mut result = Vec::with_capacity(a.len().min(b.len()));
        let mut i = 0usize;
        let mut j = 0usize;
        while i < a.len() && j < b.len() {
            if let Some(iv) = a[i].intersect(&b[j]) {
                result.push(iv);
            }
            if a[i].end() < b[j].end() {
                i += 1;
            } else if a[i].end() > b[j].end() {
                j += 1;
            } else {
                i += 1;
                j += 1;
            }
        }
        IntervalSet::from_sorted_unchecked(result)
    }

    /// Elements of `self` with every element of `other` removed.
    pub fn difference(&self, other: &IntervalSet) -> IntervalSet {
        if other.0.is_empty() {
            return self.clone();
        }
        let mut result = Vec::with_capacity(self.0.len());
        for iv in &self.0 {
            let mut cursor = iv.start();
            for sub in &other.0 {
                if sub.end() < cursor || sub.start() > iv.end() {
                    continue;
                }
                if sub.start() > cursor {
                    result.push(Interval::new(cursor, sub.start() - 1));
                }
                cursor = cursor.max(sub.end() + 1);
                if cursor > iv.end() {
                    break;
                }
            }
            if cursor <= iv.end() {
                result.push(Interval::new(cursor, iv.end()));
            }
        }
        IntervalSet::from_sorted_unchecked(result)
    }

    /// The complement of `self` within the closed bounding `interval`.
    pub fn complement(&self, interval: Interval) -> IntervalSet {
        if self.0.is_empty() {
            return IntervalSet::from_intervals([interval]);
        }
        let mut result = Vec::with_capacity(self.0.len() + 1);
        let mut cursor = interval.start();
        for iv in &self.0 {
            if iv.start() > cursor {
                result.push(Interval::new(cursor, iv.start() - 1));
            }
            cursor = cursor.max(iv.end() + 1);
        }
        if cursor <= interval.end() {
            result.push(Interval::new(cursor, interval.end()));
        }
        IntervalSet::from_sorted_unchecked(result)
    }
}

fn push_merged(result: &mut Vec<Interval>, iv: Interval) {
    if let Some(last) = result.last_mut() {
        if last.abuts(&iv) {
            if iv.end() > last.end() {
                *last = Interval::new(last.start(), iv.end());
            }
            return;
        }
    }
    result.push(iv);
}

// ── Trait impls ──────────────────────────────────────────────────────────

impl Deref for IntervalSet {
    type Target = [Interval];

    fn deref(&self) -> &[Interval] {
        &self.0
    }
}

impl From<Vec<Interval>> for IntervalSet {
    fn from(v: Vec<Interval>) -> Self {
        Self::from_intervals(v)
    }
}

impl FromIterator<Index> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Index>>(iter: I) -> Self {
        Self::from_elements(iter)
    }
}

impl Display for IntervalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, iv) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", iv)?;
        }
        write!(f, "}}")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for IntervalSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for IntervalSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Vec::<Interval>::deserialize(deserializer)?;
        Ok(Self::from_intervals(v))
    }
}
