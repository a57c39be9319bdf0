//! Upgrade plan file.
//!
//! ```toml
//! notice = "Back up the database before continuing."
//!
//! [[task]]
//! title = "Add column civicrm_contact.preferred_language"
//! callback = "Upshift::log"
//! arguments = ["adding column"]
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use upshift_core::domain::{Callback, Task};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Shown before a fresh upgrade; the operator must confirm it.
    pub notice: Option<String>,
    #[serde(rename = "task", default)]
    tasks: Vec<PlanTask>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanTask {
    title: String,
    callback: String,
    #[serde(default)]
    arguments: Vec<serde_json::Value>,
}

impl Plan {
    pub fn parse(input: &str) -> Result<Self> {
        let plan: Self = toml::from_str(input).context("failed to parse upgrade plan")?;
        if let Some(task) = plan.tasks.iter().find(|t| Callback::parse(&t.callback).is_empty()) {
            bail!("task \"{}\" has an empty callback", task.title);
        }
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read plan {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid plan {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
            .into_iter()
            .map(|t| Task::new(t.title, Callback::parse(&t.callback), t.arguments))
            .collect()
    }
}
