use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readiness of a dataset as reported by the metadata service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatus {
    pub dataset: String,
    pub ready: bool,
    /// When the metadata service last saw the dataset change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Free-form detail from the service (e.g. "partition 2024-06-01 pending")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DatasetStatus {
    pub fn ready(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ready: true,
            updated_at: None,
            message: None,
        }
    }

    pub fn not_ready(dataset: impl Into<String>) -> Self {
        Self {
            ready: false,
            ..Self::ready(dataset)
        }
    }
}
