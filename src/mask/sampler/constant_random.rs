//! A Bernoulli mask: each candidate pair is included independently with
//! probability `p`.

use rand::Rng;
use rand_chacha::ChaCha12Rng;

use crate::interval::Index;
use crate::window::Window;

use super::{fresh_construction_seed, rng};

/// Infinite-capable Bernoulli mask over the full `ZxZ` candidate space.
///
/// Not partition-safe: the draw stream is reset to the construction seed on
/// every `start_iteration` and consumed in post-order regardless of which
/// window is requested, so splitting iteration across workers changes which
/// draws land in each worker's share (unlike the finite samplers, which
/// re-derive their stream per output row).
#[derive(Debug, Clone)]
pub struct ConstantRandomMask {
    pub p: f64,
    construction_seed: u64,
}

impl ConstantRandomMask {
    pub fn new(p: f64) -> Self {
        Self {
            p,
            construction_seed: fresh_construction_seed(),
        }
    }

    pub fn start_iteration(&self) -> ConstantRandomSnapshot {
        ConstantRandomSnapshot {
            p: self.p,
            rng: rng::rng_from_seed(self.construction_seed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstantRandomSnapshot {
    p: f64,
    rng: ChaCha12Rng,
}

impl ConstantRandomSnapshot {
    pub fn iterate(&mut self, window: Window) -> impl Iterator<Item = (Index, Index)> + '_ {
        let p = self.p;
        let rng = &mut self.rng;
        (window.low1..window.high1).flat_map(move |j| {
            let rng = &mut *rng;
            (window.low0..window.high0)
                .filter(move |_| rng.gen::<f64>() < p)
                .map(move |i| (i, j))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_zero_emits_nothing() {
        let mask = ConstantRandomMask::new(0.0);
        let mut snap = mask.start_iteration();
        let got: Vec<_> = snap.iterate(Window::new(0, 10, 0, 10)).collect();
        assert!(got.is_empty());
    }

    #[test]
    fn p_one_emits_every_candidate() {
        let mask = ConstantRandomMask::new(1.0);
        let mut snap = mask.start_iteration();
        let got: Vec<_> = snap.iterate(Window::new(0, 3, 0, 2)).collect();
        assert_eq!(got.len(), 6);
    }

    #[test]
    fn repeated_start_iteration_reproduces_same_draws() {
        let mask = ConstantRandomMask::new(0.5);
        let mut snap1 = mask.start_iteration();
        let got1: Vec<_> = snap1.iterate(Window::new(0, 20, 0, 20)).collect();
        let mut snap2 = mask.start_iteration();
        let got2: Vec<_> = snap2.iterate(Window::new(0, 20, 0, 20)).collect();
        assert_eq!(got1, got2);
    }
}
