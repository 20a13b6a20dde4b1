use anyhow::{Context, Result, bail};
use pkg_constants::quota::{LIMITS_CPU, LIMITS_MEMORY, PODS, QUOTA_API_VERSION, QUOTA_KIND};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::quantity::Quantity;
use crate::validate::{validate_name, validate_subdomain_name};

/// Resource quota for a namespace — caps pod count, CPU, and memory.
///
/// Serialized with the control plane's own field names so the same file
/// can be handed to `kubectl apply`:
///
/// ```yaml
/// apiVersion: v1
/// kind: ResourceQuota
/// metadata:
///   name: tenant-quota
///   namespace: analytics
/// spec:
///   hard:
///     limits.cpu: "4"
///     limits.memory: 8Gi
///     pods: "10"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuota {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: QuotaSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaSpec {
    #[serde(default)]
    pub hard: QuotaHard,
}

/// Hard ceilings keyed by resource name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaHard {
    /// Total CPU limits, as a core count (`"4"`, `"2500m"`)
    #[serde(rename = "limits.cpu", default, skip_serializing_if = "Option::is_none")]
    pub limits_cpu: Option<Quantity>,
    /// Total memory limits, with a binary unit suffix (`"8Gi"`)
    #[serde(rename = "limits.memory", default, skip_serializing_if = "Option::is_none")]
    pub limits_memory: Option<Quantity>,
    /// Maximum number of pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<Quantity>,
    /// Any other resource names (`requests.cpu`, `services`, ...)
    #[serde(flatten)]
    pub other: BTreeMap<String, Quantity>,
}

/// Numeric meaning of a hard limit, decided by its resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceValue {
    /// `*cpu` resources
    Millicores(u64),
    /// `*memory`, `*storage` and `hugepages-*` resources
    Bytes(u64),
    /// `pods` and `count/*` object counts, which must be whole
    Count(u64),
    /// Any other resource; `None` when the value is not a whole number
    Other(Option<u64>),
}

impl ResourceValue {
    /// Interpret `quantity` for the resource named `resource`.
    pub fn of(resource: &str, quantity: &Quantity) -> Result<Self> {
        Ok(if resource.ends_with("cpu") {
            Self::Millicores(quantity.cpu_millis()?)
        } else if resource.ends_with("memory")
            || resource.ends_with("storage")
            || resource.contains("hugepages-")
        {
            Self::Bytes(quantity.bytes()?)
        } else if resource == PODS || resource.starts_with("count/") {
            Self::Count(quantity.count()?)
        } else {
            // Must still fit the numeric range even when it isn't whole.
            quantity.bytes()?;
            Self::Other(quantity.count().ok())
        })
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millicores(m) => write!(f, "{}m", m),
            Self::Bytes(b) => write!(f, "{} bytes", b),
            Self::Count(n) | Self::Other(Some(n)) => write!(f, "{}", n),
            Self::Other(None) => f.write_str("-"),
        }
    }
}

impl QuotaHard {
    /// All declared entries as `(resource name, quantity)`, well-known keys first.
    pub fn entries(&self) -> Vec<(&str, &Quantity)> {
        let mut out = Vec::with_capacity(3 + self.other.len());
        if let Some(q) = &self.limits_cpu {
            out.push((LIMITS_CPU, q));
        }
        if let Some(q) = &self.limits_memory {
            out.push((LIMITS_MEMORY, q));
        }
        if let Some(q) = &self.pods {
            out.push((PODS, q));
        }
        out.extend(self.other.iter().map(|(k, v)| (k.as_str(), v)));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.limits_cpu.is_none()
            && self.limits_memory.is_none()
            && self.pods.is_none()
            && self.other.is_empty()
    }
}

impl ResourceQuota {
    pub fn new(name: impl Into<String>, namespace: Option<String>, hard: QuotaHard) -> Self {
        Self {
            api_version: QUOTA_API_VERSION.to_string(),
            kind: QUOTA_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace,
                ..Default::default()
            },
            spec: QuotaSpec { hard },
        }
    }

    /// Load a manifest from disk. `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read quota manifest {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        parsed.with_context(|| format!("failed to parse quota manifest {}", path.display()))
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the manifest against the control plane's schema rules.
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.api_version != QUOTA_API_VERSION {
            bail!(
                "apiVersion must be '{}' (got '{}')",
                QUOTA_API_VERSION,
                self.api_version
            );
        }
        if self.kind != QUOTA_KIND {
            bail!("kind must be '{}' (got '{}')", QUOTA_KIND, self.kind);
        }
        validate_subdomain_name(&self.metadata.name).context("invalid metadata.name")?;
        if let Some(ns) = &self.metadata.namespace {
            validate_name(ns).context("invalid metadata.namespace")?;
        }

        if self.spec.hard.is_empty() {
            bail!("spec.hard must declare at least one resource");
        }
        self.resource_values()?;
        Ok(())
    }

    /// Every hard limit with its numeric interpretation, well-known keys first.
    /// Fails on the first value that does not parse for its resource family.
    pub fn resource_values(&self) -> Result<Vec<(&str, &Quantity, ResourceValue)>> {
        self.spec
            .hard
            .entries()
            .into_iter()
            .map(|(resource, quantity)| {
                if resource.is_empty() {
                    bail!("spec.hard contains an empty resource name");
                }
                let value = ResourceValue::of(resource, quantity)
                    .with_context(|| format!("invalid spec.hard.{}", resource))?;
                Ok((resource, quantity, value))
            })
            .collect()
    }

    /// Namespace the quota applies to, `default` when unset.
    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or("default")
    }
}
