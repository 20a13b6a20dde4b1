//! Filesystem path constants.

/// Default config file path for the CLI.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dsgate/config.yaml";
