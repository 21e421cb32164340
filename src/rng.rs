// src/rng.rs
//
// Randomness as an explicit, per-run resource.
//
// All stochastic phases draw from a `DrawSource` passed in by the caller;
// nothing touches a process-global generator. The production source is a
// seeded ChaCha8 stream (one per run). `ScriptedDraws` replays a fixed
// sequence of uniforms so tests can force attacker / detection outcomes and
// count exactly how many draws a step consumed.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform random draws for the simulation core.
pub trait DrawSource {
    /// Uniform draw in [0, 1).
    fn uniform(&mut self) -> f64;

    /// Uniform integer in [0, n). `n` must be > 0.
    fn index(&mut self, n: usize) -> usize;

    /// Bernoulli trial: fires iff a fresh uniform is `< p`. One draw.
    fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p
    }
}

impl DrawSource for ChaCha8Rng {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn index(&mut self, n: usize) -> usize {
        self.gen_range(0..n)
    }
}

impl<D: DrawSource + ?Sized> DrawSource for &mut D {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }

    fn index(&mut self, n: usize) -> usize {
        (**self).index(n)
    }
}

/// Fresh per-run stream.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Replays scripted uniforms, then continues from a seeded fallback stream.
///
/// `index(n)` consumes one scripted uniform `u` and returns `floor(u * n)`.
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
    script: VecDeque<f64>,
    fallback: ChaCha8Rng,
    consumed: usize,
}

impl ScriptedDraws {
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        Self {
            script: draws.into_iter().collect(),
            fallback: seeded_rng(0),
            consumed: 0,
        }
    }

    pub fn with_fallback_seed(mut self, seed: u64) -> Self {
        self.fallback = seeded_rng(seed);
        self
    }

    /// Total draws taken so far (scripted + fallback).
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Scripted draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next(&mut self) -> f64 {
        self.consumed += 1;
        match self.script.pop_front() {
            Some(u) => u,
            None => self.fallback.gen::<f64>(),
        }
    }
}

impl DrawSource for ScriptedDraws {
    fn uniform(&mut self) -> f64 {
        self.next()
    }

    fn index(&mut self, n: usize) -> usize {
        let u = self.next();
        ((u * n as f64) as usize).min(n.saturating_sub(1))
    }
}
