//! AppBuilder - handler 登録とワイヤリング
//!
//! # Fail-fast 設計
//! - expect_callbacks() で必要な callback を宣言
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す（run を始める前に落とす）

use std::sync::Arc;

use crate::domain::Callback;
use crate::error::RegistryError;
use crate::runtime::{HandlerRegistry, TaskHandler};
use crate::typed::{Handler, Operation};

/// ```ignore
/// let app = AppBuilder::new()
///     .register::<AddColumn, _>(AddColumnHandler)?
///     .expect_callbacks(&["Schema::addColumn"])
///     .build()?;
/// ```
pub struct AppBuilder {
    registry: HandlerRegistry,
    expected: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing handlers for callbacks: {0:?}")]
    MissingCallbacks(Vec<String>),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            expected: None,
        }
    }

    /// Register a typed handler under `O::CALLBACK`.
    pub fn register<O, H>(mut self, handler: H) -> Result<Self, RegistryError>
    where
        O: Operation,
        H: Handler<O> + 'static,
    {
        self.registry.register_operation::<O, H>(handler)?;
        Ok(self)
    }

    /// Register an untyped handler for an arbitrary callback.
    pub fn register_handler(
        mut self,
        callback: &str,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<Self, RegistryError> {
        self.registry.register(&Callback::parse(callback), handler)?;
        Ok(self)
    }

    pub fn expect_callbacks(mut self, callbacks: &[&str]) -> Self {
        self.expected = Some(callbacks.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected) = &self.expected {
            let registered = self.registry.registered_callbacks();
            let missing: Vec<String> = expected
                .iter()
                .filter(|c| !registered.contains(c))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingCallbacks(missing));
            }
        }
        Ok(App {
            registry: self.registry,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wired application: the handler table a runner dispatches through.
pub struct App {
    pub registry: HandlerRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureCause, HandlerError};
    use crate::runtime::{Outcome, TaskContext};
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Rebuild {}

    impl Operation for Rebuild {
        const CALLBACK: &'static str = "Schema::rebuildTriggers";
    }

    struct RebuildHandler;

    #[async_trait]
    impl Handler<Rebuild> for RebuildHandler {
        async fn handle(&self, _ctx: &TaskContext<'_>, _op: Rebuild) -> Result<Outcome, HandlerError> {
            Ok(Outcome::Done)
        }
    }

    struct Noop;

    #[async_trait]
    impl TaskHandler for Noop {
        async fn handle(
            &self,
            _ctx: &TaskContext<'_>,
            _args: &[serde_json::Value],
        ) -> Result<Outcome, FailureCause> {
            Ok(Outcome::Done)
        }
    }

    #[test]
    fn build_success() {
        let app = AppBuilder::new()
            .register::<Rebuild, _>(RebuildHandler)
            .unwrap()
            .register_handler("Upgrade::noop", Arc::new(Noop))
            .unwrap()
            .expect_callbacks(&[Rebuild::CALLBACK, "Upgrade::noop"])
            .build()
            .unwrap();
        assert_eq!(app.registry.len(), 2);
    }

    #[test]
    fn build_missing_callbacks() {
        let app = AppBuilder::new()
            .register::<Rebuild, _>(RebuildHandler)
            .unwrap()
            .expect_callbacks(&[Rebuild::CALLBACK, "Upgrade::finish"])
            .build();
        assert!(matches!(
            app,
            Err(BuildError::MissingCallbacks(missing)) if missing == vec!["Upgrade::finish".to_string()]
        ));
    }

    #[test]
    fn double_registration_fails() {
        let result = AppBuilder::new()
            .register::<Rebuild, _>(RebuildHandler)
            .unwrap()
            .register::<Rebuild, _>(RebuildHandler);
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }
}
