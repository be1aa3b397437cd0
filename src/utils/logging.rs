//! Logging initialization for hosts embedding the resolver
//!
//! The resolver only emits `tracing` events; installing a subscriber is the
//! host's call. These helpers cover the common setups:
//! - Respects RUST_LOG environment variable
//! - Falls back to a configured filter, then to "info"
//! - Optional JSON output behind the `json-logging` feature
//!
//! # Usage
//! ```rust,no_run
//! use reference_resolver::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::env::{env_is_set, env_opt};

/// Pick the filter directive: RUST_LOG, then the configured filter, then "info"
fn filter_directive(rust_log: Option<String>, configured: Option<&str>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| "info".to_string())
}

fn build_filter(filter: Option<&str>) -> EnvFilter {
    EnvFilter::new(filter_directive(env_opt("RUST_LOG"), filter))
}

/// Initialize human-readable logging
///
/// # Arguments
/// * `filter` - Optional log filter from config (e.g. "reference_resolver=debug").
///              RUST_LOG takes precedence when set.
pub fn init_logging(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(!env_is_set("NO_COLOR")),
        )
        .with(build_filter(filter))
        .init();
}

/// Initialize logging with JSON output (for log aggregation)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(build_filter(filter))
        .init();
}

/// Initialize logging from a `LoggingConfig`
///
/// JSON output falls back to human-readable output when the
/// `json-logging` feature is disabled.
pub fn init_logging_from_config(config: Option<&LoggingConfig>) {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            init_json_logging(filter);
        }
        #[cfg(not(feature = "json-logging"))]
        {
            init_logging(filter);
        }
    } else {
        init_logging(filter);
    }
}
