//! ResourceQuota schema constants.

/// `apiVersion` of a core ResourceQuota object.
pub const QUOTA_API_VERSION: &str = "v1";

/// `kind` of a ResourceQuota object.
pub const QUOTA_KIND: &str = "ResourceQuota";

/// Hard-limit key for total CPU limits across the namespace.
pub const LIMITS_CPU: &str = "limits.cpu";

/// Hard-limit key for total memory limits across the namespace.
pub const LIMITS_MEMORY: &str = "limits.memory";

/// Hard-limit key for the number of pods in the namespace.
pub const PODS: &str = "pods";

/// Maximum length of a DNS-label object name.
pub const MAX_NAME_LEN: usize = 63;

/// Maximum length of a DNS subdomain object name.
pub const MAX_SUBDOMAIN_LEN: usize = 253;
