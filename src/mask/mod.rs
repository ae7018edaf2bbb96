//! The mask algebra: a polymorphic, lazily-iterated relation on `ZxZ`.
//!
//! [`Mask`] is an immutable expression tree. Leaves are primitives
//! ([`IntervalSetMask`], [`ExplicitMask`], the samplers); interior nodes are
//! algebraic combinators. [`Mask::start_iteration`] walks the tree once,
//! producing a parallel [`MaskSnapshot`] tree that owns whatever mutable
//! per-iteration state a node needs (mostly sampler RNGs); the snapshot's
//! `iterate` then drains a post-order-sorted `(i, j)` stream for a window.

pub mod combinators;
pub mod leaves;
pub mod sampler;

use std::ops::{Mul, Not, Sub};

use tracing::trace;

use crate::error::{CsaError, Result};
use crate::interval::Index;
use crate::interval_set::IntervalSet;
use crate::window::{IterationState, Window};

pub use leaves::{ExplicitMask, IntervalSetMask};
pub use sampler::{ConstantRandomMask, FanInMask, FanOutMask, SampleNMask};
use sampler::{ConstantRandomSnapshot, FanInSnapshot, FanOutSnapshot, SampleNSnapshot};

/// A relation on `ZxZ`, possibly infinite, possibly value-free.
///
/// Cloning a `Mask` is cheap relative to iterating it: combinators box their
/// children, so the tree is an ordinary immutable expression graph.
#[derive(Debug, Clone)]
pub enum Mask {
    /// `S0 x S1`.
    IntervalSet(IntervalSetMask),
    /// An explicitly enumerated finite relation.
    Explicit(ExplicitMask),
    /// `inner` restricted to `set0 x set1`; the specialized form an
    /// `IntervalSetMask ∩ arbitrary mask` intersection takes so the
    /// arbitrary (possibly infinite) side is never walked outside the
    /// rectangle.
    ISetBounded {
        set0: IntervalSet,
        set1: IntervalSet,
        inner: Box<Mask>,
    },
    /// Generic sorted-merge intersection, used when neither operand is an
    /// `IntervalSetMask`.
    Intersection(Box<Mask>, Box<Mask>),
    /// Multiset sum: duplicates preserved.
    MultisetSum(Box<Mask>, Box<Mask>),
    /// Sorted-merge difference.
    Difference(Box<Mask>, Box<Mask>),
    /// The infinite complement of `inner`; only meaningful once intersected
    /// with something finite.
    Complement(Box<Mask>),
    /// The identity relation `{(i, i)}`.
    OneToOne,
    /// Infinite Bernoulli mask.
    ConstantRandom(ConstantRandomMask),
    /// `SampleN(n) * base`.
    SampleN(SampleNMask),
    /// `FanIn(k) * base`.
    FanIn(FanInMask),
    /// `FanOut(k) * base`.
    FanOut(Box<FanOutMask>),
}

impl Mask {
    /// The tight (or, for `ISetBounded`, conservative) bounding rectangle
    /// `(low0, high0, low1, high1)`, or `None` if the relation is unbounded.
    ///
    /// This is the Finite/Infinite dispatch tag (component D): combinators
    /// propagate it by the rules in the component design — intersection is
    /// finite if either side is, multiset sum only if both are, difference
    /// follows its left operand, complement is never finite on its own.
    pub fn bounds(&self) -> Option<(Index, Index, Index, Index)> {
        match self {
            Mask::IntervalSet(m) => Some(m.bounds()),
            Mask::Explicit(m) => Some(m.bounds()),
            Mask::ISetBounded { set0, set1, .. } => {
                Some(IntervalSetMask::new(set0.clone(), set1.clone()).bounds())
            }
            Mask::Intersection(a, b) => match (a.bounds(), b.bounds()) {
                (Some(ba), Some(bb)) => Some(intersect_rect(ba, bb)),
                (Some(ba), None) => Some(ba),
                (None, Some(bb)) => Some(bb),
                (None, None) => None,
            },
            Mask::MultisetSum(a, b) => match (a.bounds(), b.bounds()) {
                (Some(ba), Some(bb)) => Some(union_rect(ba, bb)),
                _ => None,
            },
            Mask::Difference(a, _) => a.bounds(),
            Mask::Complement(_) => None,
            Mask::OneToOne => None,
            Mask::ConstantRandom(_) => None,
            Mask::SampleN(m) => Some(m.bounds()),
            Mask::FanIn(m) => Some(m.bounds()),
            Mask::FanOut(m) => Some(m.bounds()),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.bounds().is_some()
    }

    /// Builds the [`MaskSnapshot`] tree for one top-level iteration.
    pub fn start_iteration(&self, state: &IterationState) -> MaskSnapshot {
        match self {
            Mask::IntervalSet(m) => MaskSnapshot::IntervalSet(m.clone()),
            Mask::Explicit(m) => MaskSnapshot::Explicit(m.clone()),
            Mask::ISetBounded { set0, set1, inner } => MaskSnapshot::ISetBounded {
                set0: set0.clone(),
                set1: set1.clone(),
                inner: Box::new(inner.start_iteration(state)),
            },
            Mask::Intersection(a, b) => MaskSnapshot::Intersection(
                Box::new(a.start_iteration(state)),
                Box::new(b.start_iteration(state)),
            ),
            Mask::MultisetSum(a, b) => MaskSnapshot::MultisetSum(
                Box::new(a.start_iteration(state)),
                Box::new(b.start_iteration(state)),
            ),
            Mask::Difference(a, b) => MaskSnapshot::Difference(
                Box::new(a.start_iteration(state)),
                Box::new(b.start_iteration(state)),
            ),
            Mask::Complement(inner) => {
                MaskSnapshot::Complement(Box::new(inner.start_iteration(state)))
            }
            Mask::OneToOne => MaskSnapshot::OneToOne,
            Mask::ConstantRandom(m) => MaskSnapshot::ConstantRandom(m.start_iteration()),
            Mask::SampleN(m) => MaskSnapshot::SampleN(m.start_iteration(state)),
            Mask::FanIn(m) => MaskSnapshot::FanIn(m.start_iteration(state)),
            Mask::FanOut(m) => MaskSnapshot::FanOut(Box::new(m.start_iteration(state))),
        }
    }

    /// Intersection `self ∩ other`, delegating to the specialized
    /// `IntervalSetMask`/`ISetBounded` forms where possible.
    pub fn intersection(self, other: Mask) -> Mask {
        match (self, other) {
            (Mask::IntervalSet(a), Mask::IntervalSet(b)) => Mask::IntervalSet(a.intersection(&b)),
            (Mask::IntervalSet(a), other) => Mask::ISetBounded {
                set0: a.set0,
                set1: a.set1,
                inner: Box::new(other),
            },
            (this, Mask::IntervalSet(b)) => Mask::ISetBounded {
                set0: b.set0,
                set1: b.set1,
                inner: Box::new(this),
            },
            (this, other) => Mask::Intersection(Box::new(this), Box::new(other)),
        }
    }

    /// Multiset sum `self ⊎ other`.
    ///
    /// Two `IntervalSetMask`s with disjoint supports are merged into a
    /// single `IntervalSetMask` over the unioned axes; overlapping
    /// `IntervalSetMask`s are rejected (see DESIGN.md open question) rather
    /// than guessing a union semantics. Every other combination falls back
    /// to the generic co-sweep combinator.
    pub fn multiset_sum(self, other: Mask) -> Result<Mask> {
        if let (Mask::IntervalSet(a), Mask::IntervalSet(b)) = (&self, &other) {
            let overlap = a
                .set0
                .interval_iter()
                .any(|ia| b.set0.interval_iter().any(|ib| ia.overlaps(&ib)))
                && a
                    .set1
                    .interval_iter()
                    .any(|ia| b.set1.interval_iter().any(|ib| ia.overlaps(&ib)));
            if overlap {
                return Err(CsaError::UnsupportedOverlap);
            }
            trace!(share0 = a.set0.cardinality(), share1 = b.set0.cardinality(), "disjoint IntervalSetMask multiset sum folded into a union");
            return Ok(Mask::IntervalSet(a.union(b)));
        }
        Ok(Mask::MultisetSum(Box::new(self), Box::new(other)))
    }

    /// Difference `self \ other`.
    pub fn difference(self, other: Mask) -> Mask {
        Mask::Difference(Box::new(self), Box::new(other))
    }

    /// The complement of `self` within `ZxZ`. Only useful intersected with
    /// a finite mask — on its own it has no bounding rectangle.
    pub fn complement(self) -> Mask {
        Mask::Complement(Box::new(self))
    }

}

fn intersect_rect(
    a: (Index, Index, Index, Index),
    b: (Index, Index, Index, Index),
) -> (Index, Index, Index, Index) {
    (
        a.0.max(b.0),
        a.1.min(b.1),
        a.2.max(b.2),
        a.3.min(b.3),
    )
}

fn union_rect(
    a: (Index, Index, Index, Index),
    b: (Index, Index, Index, Index),
) -> (Index, Index, Index, Index) {
    (a.0.min(b.0), a.1.max(b.1), a.2.min(b.2), a.3.max(b.3))
}

impl Mul for Mask {
    type Output = Mask;
    fn mul(self, rhs: Mask) -> Mask {
        self.intersection(rhs)
    }
}

impl Sub for Mask {
    type Output = Mask;
    fn sub(self, rhs: Mask) -> Mask {
        self.difference(rhs)
    }
}

impl Not for Mask {
    type Output = Mask;
    fn not(self) -> Mask {
        self.complement()
    }
}

/// `std::ops::Add` for [`Mask`] models multiset sum, which can fail (see
/// [`Mask::multiset_sum`]); `Output` is therefore a `Result` rather than a
/// bare `Mask`, so `a + b` must be handled with `?` or a match.
impl std::ops::Add for Mask {
    type Output = Result<Mask>;
    fn add(self, rhs: Mask) -> Result<Mask> {
        self.multiset_sum(rhs)
    }
}

/// `sample_n(n)`: an operator value that, multiplied by an `IntervalSetMask`
/// base, produces a finite sampler mask. Mirrors the source DSL's
/// operator-object construction (`sampleN(N) * M`).
#[derive(Debug, Clone, Copy)]
pub struct SampleN(pub u64);

impl Mul<Mask> for SampleN {
    type Output = Result<Mask>;
    fn mul(self, rhs: Mask) -> Result<Mask> {
        match rhs {
            Mask::IntervalSet(base) => Ok(Mask::SampleN(SampleNMask::new(self.0, base))),
            _ => Err(CsaError::TypeMismatch),
        }
    }
}

/// `fan_in(k)`: see [`SampleN`].
#[derive(Debug, Clone, Copy)]
pub struct FanIn(pub u64);

impl Mul<Mask> for FanIn {
    type Output = Result<Mask>;
    fn mul(self, rhs: Mask) -> Result<Mask> {
        match rhs {
            Mask::IntervalSet(base) => Ok(Mask::FanIn(FanInMask::new(self.0, base))),
            _ => Err(CsaError::TypeMismatch),
        }
    }
}

/// `fan_out(k)`: see [`SampleN`]. Built as fan-in over the transposed base
/// (component design §4.5), so it shares `FanIn`'s partition-allocation
/// machinery rather than duplicating it.
#[derive(Debug, Clone, Copy)]
pub struct FanOut(pub u64);

impl Mul<Mask> for FanOut {
    type Output = Result<Mask>;
    fn mul(self, rhs: Mask) -> Result<Mask> {
        match rhs {
            Mask::IntervalSet(base) => Ok(Mask::FanOut(Box::new(FanOutMask::new(self.0, base)))),
            _ => Err(CsaError::TypeMismatch),
        }
    }
}

/// The mutable per-iteration state paired 1:1 with a [`Mask]` node,
/// produced by [`Mask::start_iteration`].
pub enum MaskSnapshot {
    IntervalSet(IntervalSetMask),
    Explicit(ExplicitMask),
    ISetBounded {
        set0: IntervalSet,
        set1: IntervalSet,
        inner: Box<MaskSnapshot>,
    },
    Intersection(Box<MaskSnapshot>, Box<MaskSnapshot>),
    MultisetSum(Box<MaskSnapshot>, Box<MaskSnapshot>),
    Difference(Box<MaskSnapshot>, Box<MaskSnapshot>),
    Complement(Box<MaskSnapshot>),
    OneToOne,
    ConstantRandom(ConstantRandomSnapshot),
    SampleN(SampleNSnapshot),
    FanIn(FanInSnapshot),
    FanOut(Box<FanOutSnapshot>),
}

impl MaskSnapshot {
    /// Post-order `(i, j)` pairs restricted to `window`. May be iterated
    /// multiple times for disjoint windows of the same snapshot.
    pub fn iterate<'a>(&'a mut self, window: Window) -> Box<dyn Iterator<Item = (Index, Index)> + 'a> {
        match self {
            MaskSnapshot::IntervalSet(m) => Box::new(m.iter_window(window)),
            MaskSnapshot::Explicit(m) => Box::new(m.iter_window(window)),
            MaskSnapshot::ISetBounded { set0, set1, inner } => {
                Box::new(iset_bounded_iter(set0, set1, inner, window))
            }
            MaskSnapshot::Intersection(a, b) => Box::new(combinators::intersection_iter(
                a.iterate(window),
                b.iterate(window),
            )),
            MaskSnapshot::MultisetSum(a, b) => Box::new(combinators::multiset_sum_iter(
                a.iterate(window),
                b.iterate(window),
            )),
            MaskSnapshot::Difference(a, b) => Box::new(combinators::difference_iter(
                a.iterate(window),
                b.iterate(window),
            )),
            MaskSnapshot::Complement(inner) => {
                Box::new(combinators::complement_iter(inner.iterate(window), window))
            }
            MaskSnapshot::OneToOne => Box::new(one_to_one_iter(window)),
            MaskSnapshot::ConstantRandom(s) => Box::new(s.iterate(window)),
            MaskSnapshot::SampleN(s) => Box::new(s.iterate(window)),
            MaskSnapshot::FanIn(s) => Box::new(s.iterate(window)),
            MaskSnapshot::FanOut(s) => Box::new(s.iterate(window)),
        }
    }
}

fn iset_bounded_iter<'a>(
    set0: &'a IntervalSet,
    set1: &'a IntervalSet,
    inner: &'a mut MaskSnapshot,
    window: Window,
) -> impl Iterator<Item = (Index, Index)> + 'a {
    let clipped = clip_window(window, set0, set1);
    clipped.into_iter().flat_map(move |w| {
        inner
            .iterate(w)
            .filter(|&(i, j)| set0.contains(i) && set1.contains(j))
    })
}

fn clip_window(window: Window, set0: &IntervalSet, set1: &IntervalSet) -> Option<Window> {
    if set0.is_empty() || set1.is_empty() {
        return None;
    }
    let low0 = window.low0.max(set0.min().expect("checked non-empty"));
    let high0 = window.high0.min(set0.max().expect("checked non-empty") + 1);
    let low1 = window.low1.max(set1.min().expect("checked non-empty"));
    let high1 = window.high1.min(set1.max().expect("checked non-empty") + 1);
    if low0 >= high0 || low1 >= high1 {
        None
    } else {
        Some(Window::new(low0, high0, low1, high1))
    }
}

/// Emits `(i, i)` for every `i` in the intersection of both window axes —
/// see DESIGN.md for why this (rather than the full square) is the intended
/// `OneToOne` semantics.
fn one_to_one_iter(window: Window) -> impl Iterator<Item = (Index, Index)> {
    let low = window.low0.max(window.low1);
    let high = window.high0.min(window.high1);
    (low..high).map(|i| (i, i))
}
