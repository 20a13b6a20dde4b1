use anyhow::{Context, Result};
use async_trait::async_trait;
use pkg_constants::sensor::DEFAULT_SENSOR_TASK_ID;
use pkg_metadata::{MetadataService, check_metadata_service};
use pkg_types::sensor::SensorContext;
use std::sync::Arc;
use tracing::{debug, info};

use crate::Sensor;

/// Reports whether the dataset named by `params.dataset` is ready.
pub struct DatasetReadySensor {
    task_id: String,
    /// Dataset rendered into the run context by [`DatasetReadySensor::context`].
    dataset: Option<String>,
    metadata: Arc<dyn MetadataService>,
}

impl DatasetReadySensor {
    pub fn new(metadata: Arc<dyn MetadataService>) -> Self {
        Self {
            task_id: DEFAULT_SENSOR_TASK_ID.to_string(),
            dataset: None,
            metadata,
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Run context carrying this sensor's parameters.
    pub fn context(&self) -> SensorContext {
        let ctx = match &self.dataset {
            Some(ds) => SensorContext::for_dataset(ds.as_str()),
            None => SensorContext::default(),
        };
        ctx.with_task_id(self.task_id.as_str())
    }
}

#[async_trait]
impl Sensor for DatasetReadySensor {
    fn name(&self) -> &str {
        &self.task_id
    }

    async fn poke(&self, ctx: &SensorContext) -> Result<bool> {
        let dataset = ctx
            .dataset()
            .with_context(|| format!("sensor {} cannot poke", self.task_id))?;
        debug!("Sensor {}: poking dataset {}", self.task_id, dataset);

        let ready = check_metadata_service(self.metadata.as_ref(), dataset).await?;
        if ready {
            info!("Sensor {}: dataset {} is ready", self.task_id, dataset);
        } else {
            info!("Sensor {}: dataset {} not ready yet", self.task_id, dataset);
        }
        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_metadata::StaticMetadataService;

    async fn sensor() -> DatasetReadySensor {
        let metadata = StaticMetadataService::new();
        metadata.set_ready("sales.orders", true).await;
        metadata.set_ready("events", false).await;
        DatasetReadySensor::new(Arc::new(metadata))
    }

    #[tokio::test]
    async fn ready_dataset_returns_true() {
        let s = sensor().await;
        let ctx = SensorContext::for_dataset("sales.orders");
        assert!(s.poke(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn not_ready_dataset_returns_false() {
        let s = sensor().await;
        assert!(!s.poke(&SensorContext::for_dataset("events")).await.unwrap());
        assert!(!s.poke(&SensorContext::for_dataset("unregistered")).await.unwrap());
    }

    #[tokio::test]
    async fn missing_dataset_param_fails() {
        let s = sensor().await;
        let err = s.poke(&SensorContext::default()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("params.dataset"));
    }

    #[tokio::test]
    async fn readiness_tracks_the_store() {
        let metadata = StaticMetadataService::new();
        let s = DatasetReadySensor::new(Arc::new(metadata.clone()));
        let ctx = SensorContext::for_dataset("events");

        assert!(!s.poke(&ctx).await.unwrap());
        metadata.set_ready("events", true).await;
        assert!(s.poke(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn configured_dataset_flows_into_context() {
        let s = sensor()
            .await
            .with_task_id("wait-for-sales")
            .with_dataset("sales.orders");
        let ctx = s.context();
        assert_eq!(ctx.task_id.as_deref(), Some("wait-for-sales"));
        assert_eq!(ctx.dataset().unwrap(), "sales.orders");
        assert!(s.poke(&ctx).await.unwrap());

        let bare = sensor().await.context();
        assert!(s.poke(&bare).await.is_err());
    }

    #[test]
    fn defaults() {
        let s = DatasetReadySensor::new(Arc::new(StaticMetadataService::new()));
        assert_eq!(s.name(), DEFAULT_SENSOR_TASK_ID);
        assert!(s.dataset().is_none());
    }
}
