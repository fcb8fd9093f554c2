use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::cycle::CommitResult;
use crate::error::CycleError;
use crate::logger::warn_if_slow;
use crate::stock::repository::StockRepository;
use crate::stock::{StockId, StockUpdate};

/// Writes a cycle's updates to the store as one all-or-nothing batch.
///
/// There is no retry here: a rejected batch fails the cycle and the next
/// scheduled cycle recomputes from the store's unchanged state.
pub struct BatchCommitter {
    repo: Arc<dyn StockRepository>,
}

impl BatchCommitter {
    pub fn new(repo: Arc<dyn StockRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip_all, fields(batch_len = updates.len()))]
    pub async fn commit(
        &self,
        updates: &BTreeMap<StockId, StockUpdate>,
    ) -> Result<CommitResult, CycleError> {
        if updates.is_empty() {
            debug!("empty batch; store untouched");
            return Ok(CommitResult { updated_count: 0 });
        }

        warn_if_slow("db_batch_update", Duration::from_millis(500), async {
            self.repo.batch_update(updates).await
        })
        .await
        .map_err(CycleError::BatchCommit)?;

        Ok(CommitResult {
            updated_count: updates.len(),
        })
    }
}
