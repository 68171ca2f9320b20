use crate::errors::{AppError, AppResult};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Level used when neither `--log-level` nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "warn";

/// Parses a `--log-level` value, case-insensitively.
///
/// Besides the tracing level names, `warning`, `critical`, `fatal` and `notset`
/// are accepted for compatibility with existing cron entries.
pub fn parse_log_level(value: &str) -> AppResult<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" | "notset" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(AppError::InvalidInput(format!(
            "{} is not a valid log level",
            value.to_uppercase()
        ))),
    }
}

/// Installs the global subscriber, logging to stderr so that dry-run output on
/// stdout stays clean.
pub fn init(level: Option<LevelFilter>) -> AppResult<()> {
    let env_filter = match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| AppError::IoError(format!("Failed to initialise logging: {e}")))
}
