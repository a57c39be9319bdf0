//! Built-in operations a plan file can call.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use upshift_core::app::{App, AppBuilder};
use upshift_core::domain::{Callback, Task};
use upshift_core::error::HandlerError;
use upshift_core::queue::TaskQueue;
use upshift_core::runtime::{Outcome, TaskContext};
use upshift_core::typed::{Handler, Operation};

/// `Upshift::log(message)`: write a line to the task log.
#[derive(Debug, Deserialize)]
pub struct Log {
    pub message: String,
}

impl Operation for Log {
    const CALLBACK: &'static str = "Upshift::log";
}

/// `Upshift::note(message)`: leave a message shown after the upgrade.
#[derive(Debug, Deserialize)]
pub struct Note {
    pub message: String,
}

impl Operation for Note {
    const CALLBACK: &'static str = "Upshift::note";
}

/// `Upshift::sleep(millis)`.
#[derive(Debug, Deserialize)]
pub struct Sleep {
    pub millis: u64,
}

impl Operation for Sleep {
    const CALLBACK: &'static str = "Upshift::sleep";
}

/// `Upshift::fail(message)`: always raises.
#[derive(Debug, Deserialize)]
pub struct Fail {
    pub message: String,
}

impl Operation for Fail {
    const CALLBACK: &'static str = "Upshift::fail";
}

/// `Upshift::check(ok)`: declines when `ok` is false.
#[derive(Debug, Deserialize)]
pub struct Check {
    pub ok: bool,
}

impl Operation for Check {
    const CALLBACK: &'static str = "Upshift::check";
}

/// `Upshift::enqueue(title, callback, [arguments])`: queue a follow-up task.
#[derive(Debug, Deserialize)]
pub struct Enqueue {
    pub title: String,
    pub callback: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

impl Operation for Enqueue {
    const CALLBACK: &'static str = "Upshift::enqueue";
}

struct LogHandler;

#[async_trait]
impl Handler<Log> for LogHandler {
    async fn handle(&self, ctx: &TaskContext<'_>, op: Log) -> Result<Outcome, HandlerError> {
        ctx.log().info(&op.message);
        Ok(Outcome::Done)
    }
}

struct NoteHandler;

#[async_trait]
impl Handler<Note> for NoteHandler {
    async fn handle(&self, ctx: &TaskContext<'_>, op: Note) -> Result<Outcome, HandlerError> {
        ctx.record_message(&op.message).await?;
        Ok(Outcome::Done)
    }
}

struct SleepHandler;

#[async_trait]
impl Handler<Sleep> for SleepHandler {
    async fn handle(&self, _ctx: &TaskContext<'_>, op: Sleep) -> Result<Outcome, HandlerError> {
        tokio::time::sleep(Duration::from_millis(op.millis)).await;
        Ok(Outcome::Done)
    }
}

struct FailHandler;

#[async_trait]
impl Handler<Fail> for FailHandler {
    async fn handle(&self, _ctx: &TaskContext<'_>, op: Fail) -> Result<Outcome, HandlerError> {
        Err(op.message.into())
    }
}

struct CheckHandler;

#[async_trait]
impl Handler<Check> for CheckHandler {
    async fn handle(&self, _ctx: &TaskContext<'_>, op: Check) -> Result<Outcome, HandlerError> {
        Ok(Outcome::from(op.ok))
    }
}

struct EnqueueHandler;

#[async_trait]
impl Handler<Enqueue> for EnqueueHandler {
    async fn handle(&self, ctx: &TaskContext<'_>, op: Enqueue) -> Result<Outcome, HandlerError> {
        let task = Task::new(op.title, Callback::parse(&op.callback), op.arguments);
        ctx.log().info(&format!("enqueueing follow-up task \"{}\"", task.title()));
        ctx.queue().enqueue(task).await?;
        Ok(Outcome::Done)
    }
}

/// Every built-in operation, registered and checked.
pub fn builtin_app() -> anyhow::Result<App> {
    let app = AppBuilder::new()
        .register::<Log, _>(LogHandler)?
        .register::<Note, _>(NoteHandler)?
        .register::<Sleep, _>(SleepHandler)?
        .register::<Fail, _>(FailHandler)?
        .register::<Check, _>(CheckHandler)?
        .register::<Enqueue, _>(EnqueueHandler)?
        .expect_callbacks(&[
            Log::CALLBACK,
            Note::CALLBACK,
            Sleep::CALLBACK,
            Fail::CALLBACK,
            Check::CALLBACK,
            Enqueue::CALLBACK,
        ])
        .build()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use upshift_core::domain::{ItemId, QueueSpec, RunId};
    use upshift_core::error::FailureCause;
    use upshift_core::impls::TracingLogSink;
    use upshift_core::queue::{QueueStore, SqliteQueue};

    async fn dispatch_on(
        queue: &SqliteQueue,
        callback: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<Outcome, FailureCause> {
        let app = builtin_app().unwrap();
        let sink = TracingLogSink::new();
        let ctx = TaskContext::new(queue, &sink, RunId::generate(), ItemId::new(1));
        let task = Task::new("t", Callback::parse(callback), args);
        app.registry.dispatch(&ctx, &task).await
    }

    async fn dispatch(callback: &str, args: Vec<serde_json::Value>) -> (Result<Outcome, FailureCause>, u64) {
        let store = QueueStore::open_in_memory().unwrap();
        let queue = store.create(&QueueSpec::sql("ops"), true).unwrap();
        let result = dispatch_on(&queue, callback, args).await;
        (result, queue.count().await.unwrap())
    }

    #[tokio::test]
    async fn log_and_sleep_succeed() {
        let (result, _) = dispatch(Log::CALLBACK, vec![json!("hello")]).await;
        assert_eq!(result.unwrap(), Outcome::Done);
        let (result, _) = dispatch(Sleep::CALLBACK, vec![json!(1)]).await;
        assert_eq!(result.unwrap(), Outcome::Done);
    }

    #[tokio::test]
    async fn fail_raises_and_check_declines() {
        let (result, _) = dispatch(Fail::CALLBACK, vec![json!("disk full")]).await;
        assert_eq!(result.unwrap_err().to_string(), "disk full");

        let (result, _) = dispatch(Check::CALLBACK, vec![json!(false)]).await;
        assert_eq!(result.unwrap(), Outcome::Declined);
    }

    #[tokio::test]
    async fn enqueue_adds_follow_up_with_default_arguments() {
        let (result, count) = dispatch(
            Enqueue::CALLBACK,
            vec![json!("Rebuild triggers"), json!("Upshift::log")],
        )
        .await;
        assert_eq!(result.unwrap(), Outcome::Done);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn note_records_message_on_the_queue() {
        let store = QueueStore::open_in_memory().unwrap();
        let queue = store.create(&QueueSpec::sql("ops"), true).unwrap();
        let result = dispatch_on(&queue, Note::CALLBACK, vec![json!("Rebuild the menu cache.")]).await;
        assert_eq!(result.unwrap(), Outcome::Done);
        assert_eq!(queue.messages().await.unwrap(), vec!["Rebuild the menu cache."]);
    }

    #[tokio::test]
    async fn wrong_arguments_are_rejected() {
        let (result, _) = dispatch(Sleep::CALLBACK, vec![json!("soon")]).await;
        assert!(matches!(result, Err(FailureCause::InvalidArguments { .. })));
    }
}
