//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **AppBuilder**: handler 登録と起動時検証
//! - **UpgradeSession**: queue の準備（fresh / retry / skip）と後始末

pub mod builder;
pub mod session;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::session::{ResumeMode, SessionError, UpgradeSession};
