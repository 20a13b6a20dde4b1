use anyhow::{Result, bail};
use pkg_constants::quota::{MAX_NAME_LEN, MAX_SUBDOMAIN_LEN};
use pkg_constants::sensor::MAX_DATASET_ID_LEN;

/// Validate a Kubernetes-style object name (DNS label).
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > MAX_NAME_LEN {
        bail!(
            "name '{}' exceeds {} characters (got {})",
            name,
            MAX_NAME_LEN,
            name.len()
        );
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a DNS-1123 subdomain object name (what the control plane
/// requires of most object names, ResourceQuota included).
/// Rules: dot-separated labels of lowercase `[a-z0-9-]`, each starting and
/// ending with an alphanumeric, max 253 chars in total.
pub fn validate_subdomain_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > MAX_SUBDOMAIN_LEN {
        bail!(
            "name '{}' exceeds {} characters (got {})",
            name,
            MAX_SUBDOMAIN_LEN,
            name.len()
        );
    }
    for label in name.split('.') {
        if label.is_empty() {
            bail!("name '{}' must not have empty dot-separated parts", name);
        }
        if label.starts_with('-') || label.ends_with('-') {
            bail!(
                "name '{}' must start and end each dot-separated part with a letter or digit",
                name
            );
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            bail!(
                "name '{}' must contain only lowercase letters, digits, hyphens, and dots [a-z0-9-.]",
                name
            );
        }
    }
    Ok(())
}

/// Validate a dataset identifier as passed to the metadata service.
///
/// Identifiers are opaque to us (`sales.orders`, `warehouse/events`), so only
/// emptiness, length, and whitespace/control characters are rejected.
pub fn validate_dataset_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("dataset identifier must not be empty");
    }
    if id.len() > MAX_DATASET_ID_LEN {
        bail!(
            "dataset identifier exceeds {} characters (got {})",
            MAX_DATASET_ID_LEN,
            id.len()
        );
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        bail!(
            "dataset identifier '{}' must not contain whitespace or control characters",
            id.escape_default()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("tenant-quota").is_ok());
        assert!(validate_name("analytics").is_ok());
        assert!(validate_name("team-42").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("Tenant").is_err());
        assert!(validate_name("tenant_quota").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("tenant.quota").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn subdomain_names() {
        assert!(validate_subdomain_name("tenant.quota").is_ok());
        assert!(validate_subdomain_name("tenanta-quota").is_ok());
        assert!(validate_subdomain_name("a.b-c.d9").is_ok());
        assert!(validate_subdomain_name(&"a".repeat(253)).is_ok());

        assert!(validate_subdomain_name("").is_err());
        assert!(validate_subdomain_name(".bad").is_err());
        assert!(validate_subdomain_name("bad.").is_err());
        assert!(validate_subdomain_name("a..b").is_err());
        assert!(validate_subdomain_name("a.-b").is_err());
        assert!(validate_subdomain_name("tenantA-quota").is_err());
        assert!(validate_subdomain_name("tenant_quota").is_err());
        assert!(validate_subdomain_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn dataset_ids() {
        assert!(validate_dataset_id("sales.orders").is_ok());
        assert!(validate_dataset_id("warehouse/events_2024").is_ok());
        assert!(validate_dataset_id("").is_err());
        assert!(validate_dataset_id("has space").is_err());
        assert!(validate_dataset_id("tab\there").is_err());
        assert!(validate_dataset_id(&"d".repeat(254)).is_err());
    }
}
