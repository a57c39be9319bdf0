//! Settings file (`upshift.toml`) とコマンドライン上書き

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "upshift.toml";
pub const DEFAULT_DATABASE: &str = "upshift.sqlite";
pub const DEFAULT_QUEUE: &str = "upgrade";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: PathBuf,
    pub queue: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            queue: DEFAULT_QUEUE.to_string(),
        }
    }
}

impl Settings {
    pub fn parse(input: &str) -> Result<Self> {
        toml::from_str(input).context("failed to parse upshift settings")
    }

    /// An explicit `path` must exist; otherwise `upshift.toml` in the
    /// working directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid settings {}", path.display()))
    }

    pub fn with_overrides(mut self, database: Option<PathBuf>, queue: Option<String>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        if let Some(queue) = queue {
            self.queue = queue;
        }
        self
    }
}
