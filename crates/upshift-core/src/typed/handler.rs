//! Handler trait - Operation を実行する Handler の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<O>)
//! - Type erasure パターン (TypedHandler<O, H> → TaskHandler)

use std::marker::PhantomData;

use async_trait::async_trait;

use super::task::Operation;
use crate::error::{FailureCause, HandlerError};
use crate::runtime::{Outcome, TaskContext, TaskHandler};

/// Typed handler: receives the decoded operation instead of raw arguments.
///
/// ```ignore
/// struct AddColumnHandler;
///
/// #[async_trait]
/// impl Handler<AddColumn> for AddColumnHandler {
///     async fn handle(&self, ctx: &TaskContext<'_>, op: AddColumn) -> Result<Outcome, HandlerError> {
///         ctx.log().info(&format!("adding {}.{}", op.table, op.column));
///         Ok(Outcome::Done)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<O: Operation>: Send + Sync {
    async fn handle(&self, ctx: &TaskContext<'_>, op: O) -> Result<Outcome, HandlerError>;
}

/// Erases `O` so typed handlers fit in the registry's
/// `HashMap<String, Arc<dyn TaskHandler>>`.
pub struct TypedHandler<O: Operation, H: Handler<O>> {
    handler: H,
    _marker: PhantomData<fn() -> O>,
}

impl<O: Operation, H: Handler<O>> TypedHandler<O, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<O: Operation, H: Handler<O>> TaskHandler for TypedHandler<O, H> {
    async fn handle(
        &self,
        ctx: &TaskContext<'_>,
        args: &[serde_json::Value],
    ) -> Result<Outcome, FailureCause> {
        let op = O::decode(args).map_err(|source| FailureCause::InvalidArguments {
            callback: O::CALLBACK.to_string(),
            source,
        })?;
        self.handler.handle(ctx, op).await.map_err(FailureCause::Handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, QueueSpec, RunId};
    use crate::impls::TracingLogSink;
    use crate::queue::QueueStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Threshold {
        limit: i64,
        value: i64,
    }

    impl Operation for Threshold {
        const CALLBACK: &'static str = "Check::threshold";
    }

    struct ThresholdHandler;

    #[async_trait]
    impl Handler<Threshold> for ThresholdHandler {
        async fn handle(&self, _ctx: &TaskContext<'_>, op: Threshold) -> Result<Outcome, HandlerError> {
            if op.value < 0 {
                return Err("negative value".into());
            }
            Ok(Outcome::from(op.value <= op.limit))
        }
    }

    async fn run(args: Vec<serde_json::Value>) -> Result<Outcome, FailureCause> {
        let store = QueueStore::open_in_memory().unwrap();
        let queue = store.create(&QueueSpec::sql("t"), true).unwrap();
        let sink = TracingLogSink::new();
        let ctx = TaskContext::new(&queue, &sink, RunId::generate(), ItemId::new(1));
        TypedHandler::<Threshold, _>::new(ThresholdHandler)
            .handle(&ctx, &args)
            .await
    }

    #[tokio::test]
    async fn decodes_and_runs() {
        assert_eq!(run(vec![json!(10), json!(3)]).await.unwrap(), Outcome::Done);
        assert_eq!(run(vec![json!(10), json!(30)]).await.unwrap(), Outcome::Declined);
    }

    #[tokio::test]
    async fn bad_arguments_map_to_invalid_arguments() {
        let err = run(vec![json!("ten")]).await.unwrap_err();
        assert!(matches!(err, FailureCause::InvalidArguments { callback, .. } if callback == "Check::threshold"));
    }

    #[tokio::test]
    async fn handler_error_maps_to_handler_cause() {
        let err = run(vec![json!(10), json!(-1)]).await.unwrap_err();
        assert!(matches!(err, FailureCause::Handler(_)));
        assert_eq!(err.to_string(), "negative value");
    }
}
