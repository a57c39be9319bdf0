use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Callback, ItemId, RunId, Task};
use crate::error::{FailureCause, HandlerError, RegistryError, StoreError};
use crate::ports::LogSink;
use crate::queue::TaskQueue;
use crate::typed::{Handler, Operation, TypedHandler};

/// Result of a handler that did not raise.
///
/// `Declined` is the "returned false" case: the handler ran but reports it
/// did not do its job. The runner treats it as fatal, same as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Declined,
}

impl From<bool> for Outcome {
    fn from(ok: bool) -> Self {
        if ok { Outcome::Done } else { Outcome::Declined }
    }
}

/// What a handler gets to see while it runs.
///
/// The queue is exposed so a step can enqueue follow-up tasks; the runner
/// re-reads the count every iteration, so they run in the same pass.
pub struct TaskContext<'a> {
    queue: &'a dyn TaskQueue,
    log: &'a dyn LogSink,
    run_id: RunId,
    item_id: ItemId,
}

impl<'a> TaskContext<'a> {
    pub fn new(queue: &'a dyn TaskQueue, log: &'a dyn LogSink, run_id: RunId, item_id: ItemId) -> Self {
        Self {
            queue,
            log,
            run_id,
            item_id,
        }
    }

    pub fn queue(&self) -> &'a dyn TaskQueue {
        self.queue
    }

    pub fn log(&self) -> &'a dyn LogSink {
        self.log
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Leave a message for the operator, shown after the upgrade completes.
    pub async fn record_message(&self, message: &str) -> Result<(), StoreError> {
        self.queue.record_message(message).await
    }
}

/// Object-safe handler, one per operation id.
///
/// Arguments arrive exactly as stored; decoding them is the handler's job
/// (`TypedHandler` does it for `Operation` types).
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &TaskContext<'_>,
        args: &[serde_json::Value],
    ) -> Result<Outcome, FailureCause>;
}

/// Registry of handlers (operation id -> handler).
///
/// Built during initialization (mutable), read-only while a run is going.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        callback: &Callback,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), RegistryError> {
        let key = callback.operation_id();
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered(key));
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Register a typed handler under `O::CALLBACK`.
    pub fn register_operation<O, H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        O: Operation,
        H: Handler<O> + 'static,
    {
        self.register(&O::callback(), Arc::new(TypedHandler::<O, H>::new(handler)))
    }

    pub fn get(&self, callback: &Callback) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&callback.operation_id()).cloned()
    }

    pub fn contains(&self, callback: &Callback) -> bool {
        self.handlers.contains_key(&callback.operation_id())
    }

    /// Registered operation ids, sorted.
    pub fn registered_callbacks(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Operation ids used by `tasks` that have no handler, sorted and unique.
    pub fn missing_for(&self, tasks: &[Task]) -> Vec<String> {
        tasks
            .iter()
            .filter(|t| !self.contains(t.callback()))
            .map(|t| t.callback().operation_id())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve the task's callback and run it.
    pub async fn dispatch(&self, ctx: &TaskContext<'_>, task: &Task) -> Result<Outcome, FailureCause> {
        let handler = self
            .get(task.callback())
            .ok_or_else(|| FailureCause::HandlerNotFound(task.callback().operation_id()))?;
        handler.handle(ctx, task.arguments()).await
    }
}

impl FailureCause {
    /// Wrap any handler error as a raised failure.
    pub fn handler(err: impl Into<HandlerError>) -> Self {
        FailureCause::Handler(err.into())
    }
}
