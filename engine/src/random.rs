use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of bounded uniform noise consumed by the price engine.
///
/// Passed explicitly so tests can replace it with a scripted sequence.
pub trait RandomSource: Send {
    /// Uniform integer in `[min, max]`, both bounds inclusive.
    fn uniform_int(&mut self, min: i64, max: i64) -> i64;

    /// Uniform real in `[min, max)`.
    fn uniform_real(&mut self, min: f64, max: f64) -> f64;
}

/// Hands out independent random sources, one per compute worker.
pub trait RandomSourceFactory: Send + Sync {
    fn fork(&self) -> Box<dyn RandomSource>;
}

/// `StdRng`-backed source.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible source for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn uniform_real(&mut self, min: f64, max: f64) -> f64 {
        // gen_range panics on an empty range
        if min.is_nan() || max.is_nan() || min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Forks fresh OS-seeded sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropyRandomFactory;

impl RandomSourceFactory for EntropyRandomFactory {
    fn fork(&self) -> Box<dyn RandomSource> {
        Box::new(StdRandom::from_entropy())
    }
}

/// Forks seeded sources: the n-th fork uses `seed + n`.
///
/// Two factories built from the same seed hand out identical sequences as
/// long as forks are requested in the same order.
#[derive(Debug)]
pub struct SeededRandomFactory {
    next_seed: AtomicU64,
}

impl SeededRandomFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            next_seed: AtomicU64::new(seed),
        }
    }
}

impl RandomSourceFactory for SeededRandomFactory {
    fn fork(&self) -> Box<dyn RandomSource> {
        let seed = self.next_seed.fetch_add(1, Ordering::Relaxed);
        Box::new(StdRandom::seeded(seed))
    }
}

/// Replays fixed values, for deterministic fixtures.
///
/// Integers and reals come from separate queues. Every value is clamped into
/// the requested bounds; an exhausted queue yields `0` (clamped likewise).
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    ints: VecDeque<i64>,
    reals: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(ints: impl IntoIterator<Item = i64>, reals: impl IntoIterator<Item = f64>) -> Self {
        Self {
            ints: ints.into_iter().collect(),
            reals: reals.into_iter().collect(),
        }
    }

    /// Zero noise on every draw.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Script for a single price-engine step.
    pub fn step(supply_change: i64, demand_change: i64, rnd_pct: f64) -> Self {
        Self::new([supply_change, demand_change], [rnd_pct])
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        let v = self.ints.pop_front().unwrap_or(0);
        v.clamp(min, max.max(min))
    }

    fn uniform_real(&mut self, min: f64, max: f64) -> f64 {
        let v = self.reals.pop_front().unwrap_or(0.0);
        v.clamp(min, max.max(min))
    }
}

/// Every fork replays the same script from the start.
impl RandomSourceFactory for ScriptedRandom {
    fn fork(&self) -> Box<dyn RandomSource> {
        Box::new(self.clone())
    }
}
