//! Observability: tracing setup and metric helpers.
//!
//! # Modules
//!
//! - [`logging`] - Global tracing subscriber installation
//! - [`metrics`] - Metric recording wrappers (names and labels in one place)

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
