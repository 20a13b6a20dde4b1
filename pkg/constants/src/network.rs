//! Metadata service connection constants.

/// Default metadata service base URL (HTTP).
pub const DEFAULT_METADATA_URL: &str = "http://127.0.0.1:8585";

/// Path prefix of the dataset API on the metadata service.
/// Full path = `DATASETS_API_PREFIX/{dataset}/status`.
pub const DATASETS_API_PREFIX: &str = "/api/v1/datasets";

/// Trailing path segment of the dataset status endpoint.
pub const DATASET_STATUS_SEGMENT: &str = "status";

/// Per-request transport timeout for metadata lookups, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
