//! Structural error types for the connection-set algebra.

use thiserror::Error;

/// Errors produced by interval-set, mask, and connection-set operations.
///
/// All variants are structural: they are surfaced immediately at the point
/// of construction or iteration setup, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsaError {
    /// `min`/`max` called on an empty [`crate::interval_set::IntervalSet`].
    #[error("cannot take min/max of an empty IntervalSet")]
    EmptySet,

    /// Attempted to iterate an unbounded mask without an explicit window,
    /// or enumerate a mask (such as a bare complement) that has no finite
    /// bounding rectangle.
    #[error("cannot iterate an unbounded mask without an explicit window")]
    InfiniteEnumeration,

    /// A binary `ConnectionSet` operation was applied to operands of
    /// different arity.
    #[error("binary connection-set operation requires equal arity, got {left} and {right}")]
    ArityMismatch { left: usize, right: usize },

    /// Multiset sum of two `IntervalSetMask`s whose supports overlap on
    /// either axis. The algebra deliberately leaves this undefined rather
    /// than guessing a union semantics (see DESIGN.md).
    #[error("multiset sum of overlapping IntervalSetMasks is not supported")]
    UnsupportedOverlap,

    /// A sampler operator (`sample_n`, `fan_in`, `fan_out`) was applied to a
    /// base mask that is not an `IntervalSetMask`.
    #[error("sampler operators only apply to an IntervalSetMask base")]
    TypeMismatch,

    /// Internal: a co-sweep combinator observed an exhausted stream in a
    /// context that should be unreachable. Never constructed at the public
    /// boundary — real stream exhaustion is handled locally by returning
    /// `None` from the underlying iterator, not by raising this error.
    #[error("internal stream exhausted unexpectedly")]
    StreamExhausted,
}

pub type Result<T> = std::result::Result<T, CsaError>;
