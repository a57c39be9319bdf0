//! Claimed item: a stolen queue row plus its decoded task.

use chrono::{DateTime, Utc};

use crate::domain::{ItemId, RunId, Task};

/// A task the current run has stolen from the queue.
///
/// Dropping it without `TaskQueue::delete` leaves the row in place, so the
/// next run steals the same item again.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedItem {
    pub id: ItemId,
    pub task: Task,

    /// Times this item has been stolen, this claim included.
    /// Above 1 means an earlier run claimed it and never finished it.
    pub claims: u32,

    pub claimed_by: RunId,
    pub claimed_at: DateTime<Utc>,
}

impl ClaimedItem {
    pub fn title(&self) -> &str {
        self.task.title()
    }

    /// Was this item left behind by an earlier run?
    pub fn is_reclaim(&self) -> bool {
        self.claims > 1
    }
}

/// A head item removed without decoding its payload.
///
/// `title` is `None` when the stored payload is not a readable task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedItem {
    pub id: ItemId,
    pub title: Option<String>,
}

impl DiscardedItem {
    /// Title if readable, otherwise the item id.
    pub fn label(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.id.to_string())
    }
}
