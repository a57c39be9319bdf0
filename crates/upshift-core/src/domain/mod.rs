//! Domain model (ids, tasks, queue identity, verbosity).

pub mod ids;
pub mod task;
pub mod verbosity;

pub use ids::{ItemId, RunId};
pub use task::{Callback, QueueKind, QueueName, QueueSpec, Task, CALLBACK_SEPARATOR};
pub use verbosity::Verbosity;
