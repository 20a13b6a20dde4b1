//! Readiness sensors.
//!
//! A sensor exposes one operation, [`Sensor::poke`], which an external
//! scheduler calls once per interval until it returns `true` or the
//! scheduler gives up. Sensors hold no state between pokes.

pub mod dataset;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pkg_types::sensor::SensorContext;
use serde::{Deserialize, Serialize};

pub use dataset::DatasetReadySensor;

#[async_trait]
pub trait Sensor: Send + Sync {
    /// Task id the sensor is registered under.
    fn name(&self) -> &str;

    /// Check the condition once. `Ok(false)` means "not yet".
    async fn poke(&self, ctx: &SensorContext) -> Result<bool>;
}

/// Outcome of a single poke, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokeReport {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub params: serde_json::Value,
    pub ready: bool,
    pub checked_at: DateTime<Utc>,
}

/// Poke `sensor` once and record the outcome.
pub async fn poke_once(sensor: &dyn Sensor, ctx: &SensorContext) -> Result<PokeReport> {
    let ready = sensor.poke(ctx).await?;
    Ok(PokeReport {
        task_id: ctx
            .task_id
            .clone()
            .unwrap_or_else(|| sensor.name().to_string()),
        run_id: ctx.run_id.clone(),
        params: serde_json::to_value(&ctx.params)?,
        ready,
        checked_at: Utc::now(),
    })
}
