use crate::domain::RunId;
use crate::ports::{LogLevel, LogSink};

/// Forwards task log lines to `tracing`, tagged with the run they belong to.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogSink {
    run_id: Option<RunId>,
}

impl TracingLogSink {
    pub fn new() -> Self {
        Self { run_id: None }
    }

    pub fn for_run(run_id: RunId) -> Self {
        Self {
            run_id: Some(run_id),
        }
    }
}

impl Default for TracingLogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, message: &str) {
        let run = self.run_id.map(|id| id.to_string()).unwrap_or_default();
        match level {
            LogLevel::Debug => tracing::debug!(target: "upshift::task", run = %run, "{message}"),
            LogLevel::Info => tracing::info!(target: "upshift::task", run = %run, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "upshift::task", run = %run, "{message}"),
            LogLevel::Error => tracing::error!(target: "upshift::task", run = %run, "{message}"),
        }
    }
}
