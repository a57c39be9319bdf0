use thiserror::Error;

use crate::domain::{QueueKind, QueueName};

/// Error type handlers return for a raised failure.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported verbosity level: {0}")]
    UnsupportedVerbosity(i8),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("task codec: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("queue not found: name={name} kind={kind}")]
    QueueNotFound { name: QueueName, kind: QueueKind },

    #[error("queue {name} has kind={found}, expected kind={expected}")]
    KindMismatch {
        name: QueueName,
        expected: QueueKind,
        found: QueueKind,
    },

    #[error("queue store lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler for callback '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Why a task counts as failed. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("task returned false")]
    Declined,

    #[error("no handler registered for callback '{0}'")]
    HandlerNotFound(String),

    #[error("invalid arguments for callback '{callback}': {source}")]
    InvalidArguments {
        callback: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Handler(#[source] HandlerError),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    /// The operator chose `abort`. The current item stays claimed.
    #[error("Aborted")]
    AbortedByOperator,

    /// A task failed. The item stays claimed for diagnosis and resume.
    #[error("error executing task \"{title}\": {cause}")]
    TaskExecutionFailed {
        title: String,
        #[source]
        cause: FailureCause,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("console: {0}")]
    Console(#[from] std::io::Error),
}

impl RunnerError {
    /// Title of the failing task, if this is a task failure.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            RunnerError::TaskExecutionFailed { title, .. } => Some(title),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_displays_as_aborted() {
        assert_eq!(RunnerError::AbortedByOperator.to_string(), "Aborted");
    }

    #[test]
    fn task_failure_names_title_and_cause() {
        let err = RunnerError::TaskExecutionFailed {
            title: "Add column".to_string(),
            cause: FailureCause::Declined,
        };
        let msg = err.to_string();
        assert!(msg.contains("Add column"));
        assert!(msg.contains("task returned false"));
        assert_eq!(err.failed_task(), Some("Add column"));
        assert_eq!(RunnerError::AbortedByOperator.failed_task(), None);
    }

    #[test]
    fn handler_cause_displays_source_message() {
        let cause = FailureCause::Handler("disk full".into());
        assert_eq!(cause.to_string(), "disk full");
    }

    #[test]
    fn panic_cause_carries_payload() {
        let cause = FailureCause::Panicked("index out of bounds".to_string());
        assert_eq!(cause.to_string(), "handler panicked: index out of bounds");
    }
}
