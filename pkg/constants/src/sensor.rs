//! Sensor constants.

/// Context parameter that names the dataset to check.
pub const PARAM_DATASET: &str = "dataset";

/// Maximum length of a dataset identifier.
pub const MAX_DATASET_ID_LEN: usize = 253;

/// Default task id for the dataset readiness sensor.
pub const DEFAULT_SENSOR_TASK_ID: &str = "dataset-ready";

/// Process exit code when a poke reports ready.
pub const EXIT_READY: i32 = 0;

/// Process exit code when a poke reports not ready.
/// Errors exit with 1.
pub const EXIT_NOT_READY: i32 = 2;
