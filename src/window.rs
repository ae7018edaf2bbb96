//! The rectangular window a [`crate::mask::Mask`] is enumerated over, and the
//! shared state threaded through a single top-level iteration.

use crate::interval::Index;
use crate::mask::IntervalSetMask;

/// A half-open rectangle `[low0, high0) x [low1, high1)` restricting
/// enumeration to a finite slice of index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub low0: Index,
    pub high0: Index,
    pub low1: Index,
    pub high1: Index,
}

impl Window {
    pub const fn new(low0: Index, high0: Index, low1: Index, high1: Index) -> Self {
        Self {
            low0,
            high0,
            low1,
            high1,
        }
    }

    /// The window exactly covering a finite mask's bounding rectangle.
    pub const fn from_bounds(bounds: (Index, Index, Index, Index)) -> Self {
        Self::new(bounds.0, bounds.1, bounds.2, bounds.3)
    }
}

/// Cooperative-partitioning state shared by every caller of a single logical
/// iteration, carried from [`crate::mask::Mask::start_iteration`] down
/// through every combinator to the leaf samplers.
///
/// Left at its default, a [`crate::mask::Mask`] enumerates its entire
/// support as a single partition.
#[derive(Debug, Clone, Default)]
pub struct IterationState {
    /// The disjoint partitions a sampler's support is split across. Absent
    /// means "single partition, no splitting".
    pub partitions: Option<Vec<IntervalSetMask>>,
    /// Which entry of `partitions` this caller is responsible for.
    pub selected: usize,
    /// Stable identifier agreed on by all cooperating callers, used to seed
    /// the partition-allocation RNG identically everywhere.
    pub seed: Option<String>,
}

impl IterationState {
    pub fn single_partition() -> Self {
        Self::default()
    }

    pub fn partitioned(partitions: Vec<IntervalSetMask>, selected: usize, seed: impl Into<String>) -> Self {
        Self {
            partitions: Some(partitions),
            selected,
            seed: Some(seed.into()),
        }
    }

    /// The same iteration state with every partition's axes swapped.
    ///
    /// Used by `FanOut(k)`, which is implemented as `FanIn(k)` over a
    /// transposed base: the partitions it allocates against must be
    /// transposed too, or a partition's share would be computed against the
    /// wrong axis.
    pub fn transposed(&self) -> Self {
        Self {
            partitions: self
                .partitions
                .as_ref()
                .map(|ps| ps.iter().map(IntervalSetMask::transpose).collect()),
            selected: self.selected,
            seed: self.seed.clone(),
        }
    }
}
