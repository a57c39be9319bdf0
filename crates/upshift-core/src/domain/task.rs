use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between callback path segments.
pub const CALLBACK_SEPARATOR: &str = "::";

/// Reference to the logic a task runs: an ordered list of path segments.
///
/// The joined form (`Upgrade::runSql`) is the operation id the handler
/// registry is keyed by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Callback(Vec<String>);

impl Callback {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Split an operation id (`A::B`) back into segments.
    /// An empty string is the empty callback.
    pub fn parse(operation_id: &str) -> Self {
        if operation_id.is_empty() {
            return Self::default();
        }
        Self::new(operation_id.split(CALLBACK_SEPARATOR))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn operation_id(&self) -> String {
        self.0.join(CALLBACK_SEPARATOR)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.operation_id())
    }
}

/// A unit of upgrade work persisted in the queue.
///
/// Immutable once built: the queue stores it as JSON and hands back a copy
/// on every claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    title: String,
    callback: Callback,
    #[serde(default)]
    arguments: Vec<serde_json::Value>,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        callback: Callback,
        arguments: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            title: title.into(),
            callback,
            arguments,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn arguments(&self) -> &[serde_json::Value] {
        &self.arguments
    }
}

/// Name of a persisted queue (`upgrade`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueName(String);

impl QueueName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Storage kind a queue was created with. Loading checks it matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueKind(String);

impl QueueKind {
    /// The only kind this crate persists; only SQL queues are resumable.
    pub const SQL: &'static str = "sql";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn sql() -> Self {
        Self::new(Self::SQL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Name + kind: everything needed to find a queue again after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: QueueName,
    pub kind: QueueKind,
}

impl QueueSpec {
    pub fn new(name: impl Into<String>, kind: QueueKind) -> Self {
        Self {
            name: QueueName::new(name),
            kind,
        }
    }

    pub fn sql(name: impl Into<String>) -> Self {
        Self::new(name, QueueKind::sql())
    }
}
