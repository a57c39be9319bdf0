//! Runner configuration.

use serde::{Deserialize, Serialize};

/// Immutable configuration for one run.
///
/// Verbosity is not here: the console owns it (`Console::verbosity`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunnerConfig {
    /// Claim and delete items but never invoke handlers.
    pub dry_run: bool,
    /// Ask the operator before each task.
    pub step: bool,
}

impl RunnerConfig {
    pub fn new(dry_run: bool, step: bool) -> Self {
        Self { dry_run, step }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_everything_for_real() {
        let config = RunnerConfig::default();
        assert!(!config.dry_run);
        assert!(!config.step);
    }

    #[test]
    fn deserializes_kebab_case_with_defaults() {
        let config: RunnerConfig = serde_json::from_str(r#"{"dry-run": true}"#).unwrap();
        assert_eq!(config, RunnerConfig::new(true, false));
    }
}
