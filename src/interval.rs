//! Closed integer intervals, the atoms [`crate::interval_set::IntervalSet`] is built from.

use std::fmt::Display;

/// An index into one of the two relation's index spaces.
///
/// Signed so that window arithmetic (`low - high`, negative probe windows)
/// stays uneventful even though the domain is conceptually ℕ.
pub type Index = i64;

/// A closed range `[start, end]` of indices, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start: Index,
    end: Index,
}

impl Interval {
    /// Creates the interval `[start, end]`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`.
    pub const fn new(start: Index, end: Index) -> Self {
        assert!(start <= end, "Interval start must be <= end");
        Self { start, end }
    }

    pub const fn start(&self) -> Index {
        self.start
    }

    pub const fn end(&self) -> Index {
        self.end
    }

    /// Number of integers covered by this interval.
    pub fn cardinality(&self) -> u64 {
        (self.end - self.start + 1) as u64
    }

    pub const fn contains(&self, x: Index) -> bool {
        self.start <= x && x <= self.end
    }

    /// True if the two intervals share at least one point.
    pub const fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True if the two intervals overlap or touch end-to-end
    /// (`self.end + 1 == other.start`), i.e. should be merged in a
    /// canonical [`crate::interval_set::IntervalSet`].
    pub const fn abuts(&self, other: &Interval) -> bool {
        self.overlaps(other) || self.end + 1 == other.start || other.end + 1 == self.start
    }

    /// Intersection with `other`, or `None` if disjoint.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if self.overlaps(other) {
            Some(Interval::new(
                self.start.max(other.start),
                self.end.min(other.end),
            ))
        } else {
            None
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Interval {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut t = serializer.serialize_tuple(2)?;
        t.serialize_element(&self.start)?;
        t.serialize_element(&self.end)?;
        t.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (start, end) = <(Index, Index)>::deserialize(deserializer)?;
        Ok(Self::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_counts_inclusive() {
        assert_eq!(Interval::new(3, 3).cardinality(), 1);
        assert_eq!(Interval::new(3, 10).cardinality(), 8);
    }

    #[test]
    fn contains_endpoints() {
        let iv = Interval::new(5, 10);
        assert!(iv.contains(5));
        assert!(iv.contains(10));
        assert!(!iv.contains(4));
        assert!(!iv.contains(11));
    }

    #[test]
    fn overlaps_detects_shared_point() {
        assert!(Interval::new(0, 10).overlaps(&Interval::new(10, 20)));
        assert!(!Interval::new(0, 9).overlaps(&Interval::new(10, 20)));
    }

    #[test]
    fn abuts_includes_touching() {
        assert!(Interval::new(0, 9).abuts(&Interval::new(10, 20)));
        assert!(!Interval::new(0, 8).abuts(&Interval::new(10, 20)));
    }

    #[test]
    fn intersect_partial() {
        let a = Interval::new(0, 10);
        let b = Interval::new(5, 20);
        assert_eq!(a.intersect(&b), Some(Interval::new(5, 10)));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = Interval::new(0, 5);
        let b = Interval::new(10, 20);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    #[should_panic]
    fn new_rejects_inverted_range() {
        Interval::new(10, 0);
    }
}
