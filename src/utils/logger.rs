use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Parses `logging.level` into a filter.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            level
        )),
    }
}

/// Installs the global subscriber. `RUST_LOG` directives refine the configured level,
/// e.g. `RUST_LOG=oidc_loadgen::oidc=debug`.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), String> {
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let result = match logging_config.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().json().with_current_span(false).flatten_event(true))
            .try_init(),
        // Human-readable console output; also the fallback for unknown formats
        _ => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    result.map_err(|e| format!("Failed to initialize logging: {}", e))
}
