//! Console port - 対話的な出力と確認プロンプト

use std::io;

use crate::domain::Verbosity;

/// One answer of a multiple-choice prompt: `key` is what the operator types
/// and what `Console::choice` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice<'a> {
    pub key: &'a str,
    pub label: &'a str,
}

impl<'a> Choice<'a> {
    pub const fn new(key: &'a str, label: &'a str) -> Self {
        Self { key, label }
    }
}

/// Interactive console the runner reports to.
///
/// Methods take `&self`: implementations own whatever locking their output
/// needs. `choice` and `confirm` block the calling thread until answered.
pub trait Console: Send + Sync {
    /// Write without a line terminator.
    fn write(&self, text: &str) -> io::Result<()>;

    fn write_line(&self, text: &str) -> io::Result<()>;

    fn new_line(&self) -> io::Result<()> {
        self.write_line("")
    }

    /// Ask a multiple-choice question and return the chosen key.
    /// `default` is returned on an empty answer.
    fn choice(&self, question: &str, choices: &[Choice<'_>], default: &str) -> io::Result<String>;

    fn confirm(&self, question: &str, default: bool) -> io::Result<bool>;

    fn verbosity(&self) -> Verbosity;
}
