//! Deterministic, partition-safe random samplers.
//!
//! Every sampler here captures a construction-time seed when its mask is
//! built and re-derives a fresh RNG per output row from that seed, rather
//! than advancing a single running stream. See [`rng`] for why.

pub mod rng;

use rand::Rng;
use rand_chacha::ChaCha12Rng;

use crate::interval::Index;
use crate::mask::leaves::IntervalSetMask;
use crate::window::Window;

mod constant_random;
mod fan;
mod sample_n;

pub use constant_random::{ConstantRandomMask, ConstantRandomSnapshot};
pub use fan::{FanInMask, FanInSnapshot, FanOutMask, FanOutSnapshot};
pub use sample_n::{SampleNMask, SampleNSnapshot};

/// Draws a fresh `u64` to serve as a sampler's construction seed.
///
/// Called once per sampler builder invocation; the resulting seed is then
/// carried immutably in the mask tree so every partition that starts an
/// iteration over the *same* constructed mask re-derives identical per-row
/// streams.
pub(crate) fn fresh_construction_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Shared row-by-row sampling logic used by [`SampleNSnapshot`] and
/// [`FanInSnapshot`]: for each target row, draw `per_target[row]` source
/// indices uniformly (with replacement) from the *entire* unwindowed source
/// axis, then keep the ones that land inside the current window.
///
/// Drawing against the full axis rather than the window keeps a row's
/// output independent of which window happens to be requested, which is
/// what makes restricted-window iteration agree with whole-bounds
/// iteration (the windowed-vs-whole-bounds testable property).
#[derive(Debug, Clone)]
pub(crate) struct RowSampler {
    pub mask: IntervalSetMask,
    pub per_target: Vec<u64>,
    pub construction_seed: u64,
}

impl RowSampler {
    pub fn iterate(&mut self, window: Window) -> impl Iterator<Item = (Index, Index)> + '_ {
        let n0 = self.mask.set0.cardinality();
        let set0 = &self.mask.set0;
        let construction_seed = self.construction_seed;
        let per_target = &self.per_target;
        let low1_offset = self.mask.set1.count(Index::MIN, window.low1);

        self.mask
            .set1
            .bounded_iter(window.low1, window.high1)
            .enumerate()
            .flat_map(move |(row_offset, j)| {
                let m = low1_offset + row_offset as u64;
                let count = per_target.get(m as usize).copied().unwrap_or(0);
                let mut rng: ChaCha12Rng = rng::rng_for_row(construction_seed, m);
                let mut drawn: Vec<Index> = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    if n0 == 0 {
                        break;
                    }
                    let ord = rng.gen_range(0..n0);
                    if let Some(i) = set0.nth(ord) {
                        if i >= window.low0 && i < window.high0 {
                            drawn.push(i);
                        }
                    }
                }
                drawn.sort_unstable();
                drawn.into_iter().map(move |i| (i, j))
            })
    }
}
