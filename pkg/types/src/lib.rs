//! Shared data model: the ResourceQuota manifest, resource quantities,
//! sensor run context, dataset status, and config file types.

pub mod config;
pub mod dataset;
pub mod quantity;
pub mod quota;
pub mod sensor;
pub mod validate;
