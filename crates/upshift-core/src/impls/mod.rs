//! Impls - ports の実装
//!
//! - TerminalConsole: stdin/stdout の対話コンソール
//! - TracingLogSink: handler ログを tracing に流す

pub mod terminal_console;
pub mod tracing_sink;

pub use self::terminal_console::TerminalConsole;
pub use self::tracing_sink::TracingLogSink;
