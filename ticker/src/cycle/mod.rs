//! One update cycle: snapshot, per-stock compute, single batch commit.

pub mod committer;
pub mod runner;

/// Outcome of a successful cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub updated_count: usize,
}

/// Outcome of a successful batch write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitResult {
    pub updated_count: usize,
}
