//! Typed - 型付き Operation API
//!
//! callback 名の typo を型で排除し、Handler との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Operation` trait, `Handler<O>` trait - 型安全
//! - **内部（Dyn）**: `runtime::TaskHandler` - object-safe, registry に格納

pub mod handler;
pub mod task;

pub use self::handler::{Handler, TypedHandler};
pub use self::task::Operation;
