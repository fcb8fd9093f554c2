use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::stock::{StockId, StockRecord, StockUpdate};

/// Durable home of the stock records.
///
/// The cycle reads it once and writes it once; it never creates or deletes
/// records.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Every stock currently stored, unfiltered.
    async fn list_all_stocks(&self) -> Result<Vec<StockRecord>>;

    /// Applies every update or none of them.
    ///
    /// Fails if any id is unknown to the store.
    async fn batch_update(&self, updates: &BTreeMap<StockId, StockUpdate>) -> Result<()>;
}
