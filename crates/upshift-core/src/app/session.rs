//! UpgradeSession - run の前後処理
//!
//! - Fresh: 新しい plan で queue を作り直す（途中の upgrade が残っていたら拒否）
//! - Retry: 永続化された queue をそのまま読み直す（先頭の claimed item を再実行）
//! - Skip: 読み直した上で先頭 item を 1 件だけ捨てる

use std::io;

use tracing::{info, warn};

use crate::domain::{QueueName, QueueSpec, Task};
use crate::error::StoreError;
use crate::observability::QueueCounts;
use crate::ports::Console;
use crate::queue::{QueueStore, SqliteQueue, TaskQueue};
use crate::runtime::HandlerRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    Fresh,
    Retry,
    Skip,
}

impl ResumeMode {
    /// Skip wins over retry; neither means a fresh start.
    pub fn from_flags(retry: bool, skip: bool) -> Self {
        if skip {
            ResumeMode::Skip
        } else if retry {
            ResumeMode::Retry
        } else {
            ResumeMode::Fresh
        }
    }

    pub fn is_first_try(self) -> bool {
        self == ResumeMode::Fresh
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(
        "cannot begin upgrade: queue {queue} still holds {pending} item(s) from an incomplete upgrade; resume with --retry or --skip"
    )]
    IncompleteUpgradePending { queue: QueueName, pending: u64 },

    #[error(
        "cannot resume upgrade: no persisted queue named {0}; run a regular upgrade (without --retry or --skip)"
    )]
    NothingToResume(QueueName),

    #[error("plan uses callbacks with no registered handler: {0:?}")]
    MissingHandlers(Vec<String>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("console: {0}")]
    Console(#[from] io::Error),
}

pub struct UpgradeSession<'a> {
    store: &'a QueueStore,
    spec: QueueSpec,
}

impl<'a> UpgradeSession<'a> {
    pub fn new(store: &'a QueueStore, spec: QueueSpec) -> Self {
        Self { store, spec }
    }

    pub fn spec(&self) -> &QueueSpec {
        &self.spec
    }

    /// Produce the queue the runner should drain.
    ///
    /// `plan` is only read for `Fresh`; resumes work off what was persisted.
    pub async fn prepare(
        &self,
        mode: ResumeMode,
        plan: &[Task],
        registry: &HandlerRegistry,
        console: &dyn Console,
    ) -> Result<SqliteQueue, SessionError> {
        match mode {
            ResumeMode::Fresh => self.start_fresh(plan, registry).await,
            ResumeMode::Retry => self.resume(),
            ResumeMode::Skip => {
                let queue = self.resume()?;
                // discard without decoding: a broken payload must stay skippable
                if let Some(item) = queue.discard_head()? {
                    console.write_line(&format!("Skip task: {}", item.label()))?;
                    warn!(queue = %self.spec.name, item = %item.id, title = ?item.title, "skipped head item");
                }
                Ok(queue)
            }
        }
    }

    async fn start_fresh(
        &self,
        plan: &[Task],
        registry: &HandlerRegistry,
    ) -> Result<SqliteQueue, SessionError> {
        if self.store.find(&self.spec.name)?.is_some() {
            let existing = self.store.load(&self.spec.name, &self.spec.kind)?;
            let pending = existing.count().await?;
            if pending > 0 {
                return Err(SessionError::IncompleteUpgradePending {
                    queue: self.spec.name.clone(),
                    pending,
                });
            }
        }

        let missing = registry.missing_for(plan);
        if !missing.is_empty() {
            return Err(SessionError::MissingHandlers(missing));
        }

        let queue = self.store.create(&self.spec, true)?;
        for task in plan {
            queue.enqueue(task.clone()).await?;
        }
        info!(queue = %self.spec.name, tasks = plan.len(), "upgrade queue prepared");
        Ok(queue)
    }

    fn resume(&self) -> Result<SqliteQueue, SessionError> {
        match self.store.load(&self.spec.name, &self.spec.kind) {
            Ok(queue) => {
                info!(queue = %self.spec.name, "resuming upgrade queue");
                Ok(queue)
            }
            Err(StoreError::QueueNotFound { name, .. }) => Err(SessionError::NothingToResume(name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Counts for the session's queue, `None` if it was never created.
    pub async fn status(&self) -> Result<Option<QueueCounts>, SessionError> {
        if self.store.find(&self.spec.name)?.is_none() {
            return Ok(None);
        }
        let queue = self.store.load(&self.spec.name, &self.spec.kind)?;
        Ok(Some(queue.counts().await?))
    }

    /// Messages handlers recorded across every run of this upgrade.
    /// Empty when the queue does not exist.
    pub async fn messages(&self) -> Result<Vec<String>, SessionError> {
        if self.store.find(&self.spec.name)?.is_none() {
            return Ok(Vec::new());
        }
        let queue = self.store.load(&self.spec.name, &self.spec.kind)?;
        Ok(queue.messages().await?)
    }

    /// Close out a successful run. Messages are cleared; the queue itself is
    /// dropped unless this was a dry run.
    pub fn finish(&self, dry_run: bool) -> Result<(), SessionError> {
        if dry_run {
            self.store.clear_messages(&self.spec.name)?;
        } else {
            self.store.drop_queue(&self.spec.name)?;
        }
        Ok(())
    }
}
