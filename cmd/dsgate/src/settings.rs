use pkg_constants::network::{DEFAULT_METADATA_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use pkg_metadata::MetadataSettings;
use pkg_types::config::DsgateConfigFile;
use std::time::Duration;

/// Metadata options given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub file: Option<String>,
}

/// Merge: CLI args > config file > defaults.
///
/// A `--metadata-url` on the command line also drops a `metadata-file` coming
/// from the config file, so an explicit URL always reaches the HTTP service.
pub fn resolve(cli: MetadataOverrides, file: DsgateConfigFile) -> MetadataSettings {
    let url_from_cli = cli.url.is_some();
    let url = cli
        .url
        .or(file.metadata_url)
        .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string());
    let token = cli.token.or(file.token);
    let timeout_secs = cli
        .timeout_secs
        .or(file.request_timeout_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let metadata_file = match cli.file {
        Some(f) => Some(f),
        None if url_from_cli => None,
        None => file.metadata_file,
    };

    MetadataSettings {
        url,
        token,
        request_timeout: Duration::from_secs(timeout_secs),
        file: metadata_file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_cfg() -> DsgateConfigFile {
        DsgateConfigFile {
            metadata_url: Some("http://from-file:8585".into()),
            token: Some("file-token".into()),
            request_timeout_secs: Some(3),
            metadata_file: None,
        }
    }

    #[test]
    fn defaults_when_nothing_given() {
        let s = resolve(MetadataOverrides::default(), DsgateConfigFile::default());
        assert_eq!(s.url, DEFAULT_METADATA_URL);
        assert!(s.token.is_none());
        assert_eq!(s.request_timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert!(s.file.is_none());
    }

    #[test]
    fn file_fills_gaps() {
        let s = resolve(MetadataOverrides::default(), file_cfg());
        assert_eq!(s.url, "http://from-file:8585");
        assert_eq!(s.token.as_deref(), Some("file-token"));
        assert_eq!(s.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn cli_wins() {
        let cli = MetadataOverrides {
            url: Some("http://from-cli:9000".into()),
            timeout_secs: Some(30),
            ..Default::default()
        };
        let s = resolve(cli, file_cfg());
        assert_eq!(s.url, "http://from-cli:9000");
        assert_eq!(s.token.as_deref(), Some("file-token"));
        assert_eq!(s.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn cli_url_overrides_file_table() {
        let file = DsgateConfigFile {
            metadata_file: Some("/etc/dsgate/datasets.yaml".into()),
            ..Default::default()
        };
        let s = resolve(MetadataOverrides::default(), file.clone());
        assert_eq!(s.file.as_deref(), Some("/etc/dsgate/datasets.yaml"));

        let cli = MetadataOverrides {
            url: Some("http://meta:8585".into()),
            ..Default::default()
        };
        assert!(resolve(cli, file).file.is_none());
    }
}
