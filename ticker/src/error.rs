use std::time::Duration;

use thiserror::Error;

/// Reasons a single update cycle ends without committing.
///
/// None of these are fatal to the process: the next scheduled cycle starts
/// from whatever the store last committed.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("snapshot read failed: {0:#}")]
    SnapshotRead(anyhow::Error),

    #[error("batch commit failed: {0:#}")]
    BatchCommit(anyhow::Error),

    #[error("previous cycle still running")]
    AlreadyRunning,

    #[error("compute worker failed: {0}")]
    Worker(String),

    #[error("cycle exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}
