//! upshift-core
//!
//! Runs a persisted, resumable upgrade queue interactively.
//!
//! # モジュール構成
//! - **domain**: Task, Callback, ids, queue identity, verbosity
//! - **queue**: TaskQueue port + SQLite 実装（two-phase steal / delete）
//! - **runtime**: handler registry, TaskContext
//! - **typed**: 型付き Operation API（Operation trait, Handler trait）
//! - **ports**: Console, LogSink
//! - **impls**: TerminalConsole, TracingLogSink
//! - **runner**: QueueRunner と callback の表示用ヘルパー
//! - **app**: AppBuilder, UpgradeSession

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod runner;
pub mod runtime;
pub mod typed;

#[cfg(test)]
mod testing;

pub use config::RunnerConfig;
pub use error::{FailureCause, RunnerError, StoreError};
pub use runner::{QueueRunner, render_callback};
