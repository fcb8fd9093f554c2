//! Fixed-cadence trigger for update cycles.
//!
//! The loop awaits each cycle before waiting for the next tick, so it never
//! overlaps cycles by itself; the runner's guard still covers other callers
//! sharing the same runner.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cycle::runner::CycleRunner;

/// Triggers `run_cycle` every `interval` until `shutdown` resolves.
///
/// The first cycle fires immediately. Ticks missed while a slow cycle runs
/// are skipped rather than replayed. A failed cycle is logged by the runner
/// and does not stop the loop. Returns the number of cycles triggered.
pub async fn run_cycle_loop<F>(
    runner: Arc<CycleRunner>,
    interval: Duration,
    deadline: Duration,
    shutdown: F,
) -> u64
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    let mut triggered = 0u64;

    info!(
        interval_secs = interval.as_secs(),
        deadline_secs = deadline.as_secs(),
        "cycle loop started"
    );

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!(triggered, "shutdown requested; cycle loop stopped");
                break;
            }

            _ = ticker.tick() => {
                triggered += 1;
                // Outcome is logged and counted by the runner.
                let _ = runner.run_cycle_within(deadline).await;
            }
        }
    }

    triggered
}
