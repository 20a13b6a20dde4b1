use anyhow::{Context, Result, anyhow, bail};
use pkg_constants::sensor::PARAM_DATASET;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Per-run context handed to a sensor on every poke.
///
/// Matches the mapping a workflow scheduler renders for a task run:
///
/// ```json
/// { "task_id": "wait-for-sales", "params": { "dataset": "sales.orders" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorContext {
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl SensorContext {
    /// Context whose `params.dataset` names the given dataset.
    pub fn for_dataset(dataset: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.params
            .insert(PARAM_DATASET.to_string(), Value::String(dataset.into()));
        ctx
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Read a context from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sensor context {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse sensor context {}", path.display()))
    }

    /// A required, non-empty string parameter.
    pub fn param_str(&self, key: &str) -> Result<&str> {
        let value = self
            .params
            .get(key)
            .ok_or_else(|| anyhow!("missing required parameter 'params.{}'", key))?;
        let s = value
            .as_str()
            .ok_or_else(|| anyhow!("parameter 'params.{}' must be a string (got {})", key, value))?;
        if s.is_empty() {
            bail!("parameter 'params.{}' must not be empty", key);
        }
        Ok(s)
    }

    /// The `params.dataset` identifier.
    pub fn dataset(&self) -> Result<&str> {
        self.param_str(PARAM_DATASET)
    }
}
