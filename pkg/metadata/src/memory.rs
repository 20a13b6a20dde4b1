use anyhow::{Context, Result};
use async_trait::async_trait;
use pkg_types::dataset::DatasetStatus;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::MetadataService;

/// In-memory readiness table.
///
/// Backs offline dry runs (`--metadata-file`) and tests. Datasets that were
/// never registered are not ready.
#[derive(Clone, Default)]
pub struct StaticMetadataService {
    datasets: Arc<RwLock<HashMap<String, bool>>>,
}

impl StaticMetadataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(datasets: HashMap<String, bool>) -> Self {
        Self {
            datasets: Arc::new(RwLock::new(datasets)),
        }
    }

    /// Load a YAML map of `dataset: ready`.
    ///
    /// ```yaml
    /// sales.orders: true
    /// events: false
    /// ```
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata file {}", path.display()))?;
        let datasets: HashMap<String, bool> = if content.trim().is_empty() {
            HashMap::new()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse metadata file {}", path.display()))?
        };
        info!(
            "Loaded {} dataset(s) from metadata file {}",
            datasets.len(),
            path.display()
        );
        Ok(Self::from_map(datasets))
    }

    pub async fn set_ready(&self, dataset: impl Into<String>, ready: bool) {
        self.datasets.write().await.insert(dataset.into(), ready);
    }

    pub async fn len(&self) -> usize {
        self.datasets.read().await.len()
    }
}

#[async_trait]
impl MetadataService for StaticMetadataService {
    fn name(&self) -> &str {
        "static"
    }

    async fn dataset_status(&self, dataset: &str) -> Result<DatasetStatus> {
        let known = self.datasets.read().await.get(dataset).copied();
        Ok(match known {
            Some(true) => DatasetStatus::ready(dataset),
            Some(false) => DatasetStatus::not_ready(dataset),
            None => DatasetStatus {
                message: Some("dataset not registered".to_string()),
                ..DatasetStatus::not_ready(dataset)
            },
        })
    }
}
