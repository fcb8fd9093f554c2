use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest price a stock can be quoted at.
pub const MIN_PRICE: i64 = 10;

/// Lowest supply or demand level.
pub const MIN_LEVEL: i64 = 1;

/// Price assumed when a record carries none.
pub const DEFAULT_PRICE: i64 = 0;

/// Supply / demand assumed when a record carries none.
pub const DEFAULT_LEVEL: i64 = 1;

/// Opaque, stable identifier of a stock record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockId(String);

impl StockId {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StockId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for StockId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

/// A stock as read from the store.
///
/// Numeric fields are optional because records are created outside this
/// system and may be incomplete. The engine substitutes defaults for absent
/// values instead of rejecting the record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: StockId,
    pub current_price: Option<i64>,
    pub supply: Option<i64>,
    pub demand: Option<i64>,
    /// Past prices, oldest first.
    pub history: Vec<i64>,
    pub last_updated_ms: Option<u64>,
}

impl StockRecord {
    /// Fully populated record with an empty history.
    pub fn new(id: impl Into<StockId>, price: i64, supply: i64, demand: i64) -> Self {
        Self {
            id: id.into(),
            current_price: Some(price),
            supply: Some(supply),
            demand: Some(demand),
            history: Vec::new(),
            last_updated_ms: None,
        }
    }

    pub fn with_history(mut self, history: Vec<i64>) -> Self {
        self.history = history;
        self
    }

    pub fn price_or_default(&self) -> i64 {
        self.current_price.unwrap_or(DEFAULT_PRICE)
    }

    pub fn supply_or_default(&self) -> i64 {
        self.supply.unwrap_or(DEFAULT_LEVEL)
    }

    pub fn demand_or_default(&self) -> i64 {
        self.demand.unwrap_or(DEFAULT_LEVEL)
    }
}

/// Output of one price-engine step for a single stock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NextState {
    pub price: i64,
    pub supply: i64,
    pub demand: i64,

    /// Price before rounding and the floor at [`MIN_PRICE`].
    pub raw_price: f64,
    /// Combined percentage move (noise + bias) applied to the previous price.
    pub pct_move: f64,
}

/// Every field written back to the store for one stock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub current_price: i64,
    pub history: Vec<i64>,
    pub supply: i64,
    pub demand: i64,
    pub last_updated_ms: u64,
}
