use anyhow::Context;
use serde::{Deserialize, Serialize};

/// CLI configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// metadata-url: https://metadata.internal:8585
/// token: my-secret-token
/// request-timeout-secs: 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DsgateConfigFile {
    #[serde(default, alias = "metadata-url")]
    pub metadata_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,
    /// Local YAML map of `dataset: ready` used instead of the HTTP service
    #[serde(default, alias = "metadata-file")]
    pub metadata_file: Option<String>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e).with_context(|| format!("failed to read config file {}", path)),
    };
    // An empty file deserializes to YAML null; treat it like a missing one.
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let config: T = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path))?;
    Ok(config)
}
