//! Metadata service access: the capability trait the sensor depends on,
//! an HTTP client for the real service, and a static in-memory table.

pub mod http;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use pkg_constants::network::{DEFAULT_METADATA_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use pkg_types::dataset::DatasetStatus;
use pkg_types::validate::validate_dataset_id;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use http::HttpMetadataService;
pub use memory::StaticMetadataService;

/// Anything that can answer "is this dataset ready?".
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Look up the current status of `dataset`.
    /// A dataset the service has never heard of is reported as not ready.
    async fn dataset_status(&self, dataset: &str) -> Result<DatasetStatus>;
}

/// Single readiness lookup against the metadata service.
///
/// One request, no retry: the caller's scheduler decides when to ask again.
pub async fn check_metadata_service(service: &dyn MetadataService, dataset: &str) -> Result<bool> {
    validate_dataset_id(dataset)?;
    let status = service.dataset_status(dataset).await?;
    debug!(
        "metadata[{}]: dataset {} ready={}{}",
        service.name(),
        dataset,
        status.ready,
        status
            .message
            .as_deref()
            .map(|m| format!(" ({})", m))
            .unwrap_or_default()
    );
    Ok(status.ready)
}

/// Where and how to reach the metadata service.
#[derive(Debug, Clone)]
pub struct MetadataSettings {
    pub url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    /// When set, answer from this YAML table instead of the HTTP service.
    pub file: Option<String>,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_METADATA_URL.to_string(),
            token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            file: None,
        }
    }
}

/// Build the metadata backend selected by `settings`.
pub fn connect(settings: &MetadataSettings) -> Result<Arc<dyn MetadataService>> {
    match &settings.file {
        Some(path) => Ok(Arc::new(StaticMetadataService::from_yaml_file(path)?)),
        None => Ok(Arc::new(HttpMetadataService::new(
            &settings.url,
            settings.token.clone(),
            settings.request_timeout,
        )?)),
    }
}
