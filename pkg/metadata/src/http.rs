use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use pkg_constants::network::{DATASET_STATUS_SEGMENT, DATASETS_API_PREFIX};
use pkg_types::dataset::DatasetStatus;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info};

use crate::MetadataService;

/// Client for the metadata service's dataset status endpoint:
/// `GET {base}/api/v1/datasets/{dataset}/status`.
#[derive(Clone)]
pub struct HttpMetadataService {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpMetadataService {
    pub fn new(base_url: &str, token: Option<String>, request_timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow!("invalid metadata service URL '{}': {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            bail!("metadata service URL '{}' cannot be used as a base", base_url);
        }
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build metadata HTTP client")?;
        info!(
            "Metadata service at {} (timeout={}s, auth={})",
            base_url,
            request_timeout.as_secs(),
            if token.is_some() { "bearer" } else { "none" }
        );
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Status URL for `dataset`; the identifier is encoded as a single path segment.
    fn status_url(&self, dataset: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("metadata service URL '{}' cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(DATASETS_API_PREFIX.trim_start_matches('/').split('/'))
            .push(dataset)
            .push(DATASET_STATUS_SEGMENT);
        Ok(url)
    }
}

#[async_trait]
impl MetadataService for HttpMetadataService {
    fn name(&self) -> &str {
        "http"
    }

    async fn dataset_status(&self, dataset: &str) -> Result<DatasetStatus> {
        let url = self.status_url(dataset)?;
        debug!("GET {}", url);

        let mut req = self.client.get(url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("metadata request to {} failed", url))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Dataset {} is unknown to the metadata service", dataset);
            return Ok(DatasetStatus {
                message: Some("dataset not found in metadata service".to_string()),
                ..DatasetStatus::not_ready(dataset)
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "metadata service returned {} for dataset '{}': {}",
                status,
                dataset,
                body.trim()
            );
        }

        let parsed: DatasetStatus = resp
            .json()
            .await
            .with_context(|| format!("invalid dataset status from {}", url))?;
        if parsed.dataset != dataset {
            bail!(
                "metadata service answered for dataset '{}' when asked about '{}'",
                parsed.dataset,
                dataset
            );
        }
        Ok(parsed)
    }
}
