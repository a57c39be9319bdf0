//! Ports - 抽象化レイヤー
//!
//! Runner が外部とやり取りする境界。
//! - Console: operator への出力と確認プロンプト
//! - LogSink: handler 用のログ出力先
//!
//! The task queue port lives in `crate::queue` next to its SQLite adapter.

pub mod console;
pub mod log_sink;

pub use self::console::{Choice, Console};
pub use self::log_sink::{LogLevel, LogSink};
