//! Ambient helpers shared by the catalog crates: logging setup, health type
//! and process-wide metrics.

pub mod types;
pub mod utils;
pub mod metrics;
