//! Cycle runner.
//!
//! Responsibilities:
//! - Refuse overlapping cycles (single-flight guard owned by the runner).
//! - Read one snapshot of every stock.
//! - Fan the snapshot out to blocking compute workers, each with its own
//!   random source, and fan the results back in keyed by stock id.
//! - Hand the complete update set to the committer in a single call.
//!
//! Nothing is written before the commit. Dropping a cycle future at any
//! earlier point leaves the store exactly as the previous cycle left it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use engine::price;
use engine::random::RandomSourceFactory;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, field, info, instrument, warn};
use uuid::Uuid;

use crate::cycle::CycleReport;
use crate::cycle::committer::BatchCommitter;
use crate::error::CycleError;
use crate::logger::warn_if_slow;
use crate::metrics::counters::Counters;
use crate::stock::repository::StockRepository;
use crate::stock::{StockId, StockRecord, StockUpdate};
use crate::time::now_ms;

pub struct CycleRunner {
    /// Snapshot source.
    repo: Arc<dyn StockRepository>,

    committer: BatchCommitter,

    /// One fork per compute worker.
    rng: Arc<dyn RandomSourceFactory>,

    /// Upper bound on compute workers per cycle.
    workers: usize,

    /// Held for the whole cycle; contention means a cycle is in progress.
    guard: Mutex<()>,

    /// Observability counters (does not affect behavior).
    counters: Counters,
}

impl CycleRunner {
    pub fn new(
        repo: Arc<dyn StockRepository>,
        rng: Arc<dyn RandomSourceFactory>,
        workers: usize,
        counters: Counters,
    ) -> Self {
        Self {
            committer: BatchCommitter::new(Arc::clone(&repo)),
            repo,
            rng,
            workers: workers.max(1),
            guard: Mutex::new(()),
            counters,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Runs one cycle and logs its outcome.
    ///
    /// Returns [`CycleError::AlreadyRunning`] immediately if another cycle
    /// holds the guard; it never waits for it.
    #[instrument(skip(self), fields(cycle_id = field::Empty))]
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let Ok(_guard) = self.guard.try_lock() else {
            Counters::bump(&self.counters.cycles_skipped, 1);
            warn!("previous cycle still running; skipping trigger");
            return Err(CycleError::AlreadyRunning);
        };

        tracing::Span::current().record("cycle_id", field::display(Uuid::new_v4()));

        let result = self.run_exclusive().await;

        match &result {
            Ok(report) => {
                Counters::bump(&self.counters.cycles_ok, 1);
                Counters::bump(&self.counters.records_updated, report.updated_count as u64);
                info!(updated_count = report.updated_count, "cycle complete");
            }
            Err(e) => {
                Counters::bump(&self.counters.cycles_failed, 1);
                error!(error = %e, "cycle failed");
            }
        }

        result
    }

    /// [`run_cycle`](Self::run_cycle) bounded by `deadline`.
    ///
    /// On expiry the in-flight cycle is dropped before or during its commit;
    /// an uncommitted batch is rolled back by the store.
    pub async fn run_cycle_within(&self, deadline: Duration) -> Result<CycleReport, CycleError> {
        match tokio::time::timeout(deadline, self.run_cycle()).await {
            Ok(result) => result,
            Err(_) => {
                Counters::bump(&self.counters.cycles_failed, 1);
                error!(
                    deadline_ms = deadline.as_millis() as u64,
                    "cycle deadline exceeded; uncommitted work discarded"
                );
                Err(CycleError::DeadlineExceeded(deadline))
            }
        }
    }

    async fn run_exclusive(&self) -> Result<CycleReport, CycleError> {
        // One timestamp for the whole cycle.
        let now_ms = now_ms();

        let snapshot = warn_if_slow("db_list_all_stocks", Duration::from_millis(200), async {
            self.repo.list_all_stocks().await
        })
        .await
        .map_err(CycleError::SnapshotRead)?;

        if snapshot.is_empty() {
            debug!("empty snapshot; nothing to update");
            return Ok(CycleReport { updated_count: 0 });
        }

        debug!(stocks = snapshot.len(), "snapshot loaded");

        let updates = self.compute_updates(snapshot, now_ms).await?;
        let committed = self.committer.commit(&updates).await?;

        Ok(CycleReport {
            updated_count: committed.updated_count,
        })
    }

    /// Splits the snapshot into at most `workers` contiguous chunks and
    /// computes each chunk on a blocking worker.
    ///
    /// Workers own their chunk and their random source; nothing is shared.
    /// The result is ordered by id regardless of completion order.
    async fn compute_updates(
        &self,
        snapshot: Vec<StockRecord>,
        now_ms: u64,
    ) -> Result<BTreeMap<StockId, StockUpdate>, CycleError> {
        let chunk_size = snapshot.len().div_ceil(self.workers);
        let mut records = snapshot.into_iter();
        let mut set = JoinSet::new();

        loop {
            let chunk: Vec<StockRecord> = records.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let mut rng = self.rng.fork();
            set.spawn_blocking(move || {
                chunk
                    .iter()
                    .map(|prev| (prev.id.clone(), price::advance(prev, rng.as_mut(), now_ms)))
                    .collect::<Vec<_>>()
            });
        }

        let mut out = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let computed = joined.map_err(|e| CycleError::Worker(e.to_string()))?;
            out.extend(computed);
        }

        Ok(out)
    }
}
