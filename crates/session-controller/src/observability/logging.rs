//! Tracing subscriber setup for host applications.
//!
//! The controller only emits `tracing` events (targets `sc.actor.session`,
//! `sc.actor.mailbox`, `sc.transport`); installing a subscriber is the
//! embedding application's call. [`init_tracing`] is the batteries-included
//! installer for hosts that do not bring their own.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use common::config::ObservabilityConfig;

/// Fallback directives when both `SC_LOG` and the configured level fail to
/// parse.
const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global tracing subscriber.
///
/// The filter comes from the `SC_LOG` environment variable when set
/// (full directive syntax, e.g. `sc.actor.session=trace,info`), otherwise
/// the configured log level applies across all targets. With `json_logs`
/// the subscriber emits one JSON object per line for log shippers.
///
/// # Errors
///
/// Returns [`TryInitError`] when a global subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = match std::env::var("SC_LOG") {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(&config.log_level),
    }
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}
