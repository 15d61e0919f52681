//! CLI command implementations.

pub mod audit;
pub mod checks;
pub mod metrics;
