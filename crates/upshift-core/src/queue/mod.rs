//! Queue module: the task queue port and its SQLite implementation.

mod record;
mod sqlite;

pub use record::{ClaimedItem, DiscardedItem};
pub use sqlite::{QueueStore, SqliteQueue};

use async_trait::async_trait;

use crate::domain::{RunId, Task};
use crate::error::StoreError;
use crate::observability::QueueCounts;

/// Weight used by `enqueue`. Lower weights are stolen first.
pub const DEFAULT_WEIGHT: i64 = 0;

/// Queue port (interface).
///
/// Two-phase consumption:
/// - `steal_next` claims the head item but keeps it stored.
/// - `delete` removes it for good once it was handled.
///
/// Anything claimed and never deleted is stolen again by the next run, so
/// execution is at-least-once across process restarts.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Number of undeleted items, claimed ones included.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Claim the head item (lowest weight, then insertion order), whether or
    /// not an earlier run already claimed it. `None` on an empty queue.
    async fn steal_next(&self, run_id: RunId) -> Result<Option<ClaimedItem>, StoreError>;

    /// Permanently remove a claimed item.
    async fn delete(&self, item: &ClaimedItem) -> Result<(), StoreError>;

    /// Append a task with an explicit weight.
    async fn enqueue_with_weight(&self, task: Task, weight: i64) -> Result<(), StoreError>;

    async fn enqueue(&self, task: Task) -> Result<(), StoreError> {
        self.enqueue_with_weight(task, DEFAULT_WEIGHT).await
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError>;

    /// Append an operator-facing message. Messages outlive failed runs and
    /// are reported once the upgrade completes.
    async fn record_message(&self, message: &str) -> Result<(), StoreError>;

    /// Messages recorded so far, oldest first.
    async fn messages(&self) -> Result<Vec<String>, StoreError>;
}
