use serde::{Deserialize, Serialize};

/// Item counts for one queue. `claimed` items were stolen by a run that
/// neither deleted them nor finished (abort, failure, crash).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: u64,
    pub claimed: u64,
}

impl QueueCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.claimed
    }
}

/// What one `run_all()` did with the items it deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Handler invoked and succeeded.
    pub executed: u64,
    /// Operator chose skip.
    pub skipped: u64,
    /// Dry-run: would have been executed.
    pub simulated: u64,
}

impl RunSummary {
    pub fn processed(&self) -> u64 {
        self.executed + self.skipped + self.simulated
    }
}
