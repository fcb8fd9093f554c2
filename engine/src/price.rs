//! Price engine
//!
//! Maps one stock's previous state to its next state. Each step:
//!
//! 1. nudges supply and demand by a uniform integer in `[-10, 10]`
//!    (floored at 1),
//! 2. draws a uniform noise percentage in `[-5%, 5%)`,
//! 3. adds a bias proportional to the supply/demand imbalance, clamped to ±3%,
//! 4. applies the combined move to the previous price, rounds it half away
//!    from zero and floors it at [`MIN_PRICE`].
//!
//! Randomness is drawn in a fixed order (supply, demand, noise) so a scripted
//! source reproduces exact prices.

use crate::history::{HISTORY_CAPACITY, append_bounded};
use crate::random::RandomSource;
use crate::stock::{MIN_LEVEL, MIN_PRICE, NextState, StockRecord, StockUpdate};

/// Max absolute supply / demand change per step.
pub const LEVEL_STEP: i64 = 10;

/// Max absolute noise percentage per step.
pub const NOISE_PCT: f64 = 0.05;

/// Imbalance-to-bias gain.
pub const BIAS_GAIN: f64 = 0.1;

/// Max absolute bias percentage per step.
pub const MAX_BIAS_PCT: f64 = 0.03;

/// Upper bound on `|noise + bias|`.
pub const MAX_MOVE_PCT: f64 = NOISE_PCT + MAX_BIAS_PCT;

/// Computes the next price, supply and demand for `prev`.
pub fn compute(prev: &StockRecord, rng: &mut dyn RandomSource) -> NextState {
    let supply_change = rng.uniform_int(-LEVEL_STEP, LEVEL_STEP);
    let demand_change = rng.uniform_int(-LEVEL_STEP, LEVEL_STEP);

    let supply = prev
        .supply_or_default()
        .saturating_add(supply_change)
        .max(MIN_LEVEL);
    let demand = prev
        .demand_or_default()
        .saturating_add(demand_change)
        .max(MIN_LEVEL);

    let rnd_pct = rng.uniform_real(-NOISE_PCT, NOISE_PCT);
    let pct_move = rnd_pct + bias_pct(supply, demand);

    let raw_price = prev.price_or_default() as f64 * (1.0 + pct_move);

    NextState {
        price: round_price(raw_price).max(MIN_PRICE),
        supply,
        demand,
        raw_price,
        pct_move,
    }
}

/// Full next-state record: engine step plus the rolled history.
pub fn advance(prev: &StockRecord, rng: &mut dyn RandomSource, now_ms: u64) -> StockUpdate {
    let next = compute(prev, rng);

    StockUpdate {
        current_price: next.price,
        history: append_bounded(&prev.history, next.price, HISTORY_CAPACITY),
        supply: next.supply,
        demand: next.demand,
        last_updated_ms: now_ms,
    }
}

/// Normalized demand excess, in `[-1, 1]`.
///
/// Both levels are at least [`MIN_LEVEL`] by the time this runs, so the
/// denominator is at least 2.
pub fn imbalance(supply: i64, demand: i64) -> f64 {
    let s = supply as f64;
    let d = demand as f64;
    (d - s) / (d + s)
}

pub fn bias_pct(supply: i64, demand: i64) -> f64 {
    (imbalance(supply, demand) * BIAS_GAIN).clamp(-MAX_BIAS_PCT, MAX_BIAS_PCT)
}

/// Rounds half away from zero; out-of-range values saturate.
pub fn round_price(raw: f64) -> i64 {
    raw.round() as i64
}
