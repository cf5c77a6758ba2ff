//! Stochastic mechanics: the injected uniform source and weighted picks.
//! The engine never reaches for a global RNG; callers pass a `UniformSource`.

use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// Something that yields uniform floats in [0, 1).
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

/// 53 high bits of a u64 as a float in [0, 1).
#[inline]
fn unit_from_u64(x: u64) -> f64 {
    ((x >> 11) as f64) / ((1u64 << 53) as f64)
}

impl UniformSource for WyRand {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        unit_from_u64(self.next_u64())
    }
}

/// Adapter for any `rand_core` generator.
#[derive(Clone, Debug)]
pub struct RngSource<R>(pub R);

impl<R: RngCore> UniformSource for RngSource<R> {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        unit_from_u64(self.0.next_u64())
    }
}

/// Scripted uniforms, cycled. Values are clamped into [0, 1).
#[derive(Clone, Debug)]
pub struct SequenceSource {
    values: Vec<f64>,
    pos: usize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self { values: values.into(), pos: 0 }
    }
}

impl UniformSource for SequenceSource {
    fn next_uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        if v.is_finite() { v.clamp(0.0, 1.0 - f64::EPSILON) } else { 0.0 }
    }
}

/// Seeded WyRand, the default draw source.
pub fn seeded_source(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Cumulative-distribution pick. Non-positive or non-finite weights are
/// never selected; `None` when nothing has weight.
pub fn pick_weighted(weights: &[f64], u: f64) -> Option<usize> {
    let usable = |w: f64| w.is_finite() && w > 0.0;
    let total: f64 = weights.iter().copied().filter(|&w| usable(w)).sum();
    if total <= 0.0 {
        return None;
    }
    let target = u.clamp(0.0, 1.0) * total;
    let mut acc = 0.0;
    let mut last = None;
    for (i, &w) in weights.iter().enumerate() {
        if !usable(w) {
            continue;
        }
        acc += w;
        last = Some(i);
        if target < acc {
            return Some(i);
        }
    }
    // float shortfall at u → 1
    last
}

/// Draw one index from `weights` using `rng`.
#[inline]
pub fn draw_weighted(weights: &[f64], rng: &mut impl UniformSource) -> Option<usize> {
    pick_weighted(weights, rng.next_uniform())
}
