// sentri/src/logging.rs
//
// Global tracing subscriber. Level and format come from the CLI, then from the
// `logging` section of the configuration. `RUST_LOG` overrides both.

use anyhow::{Result, bail};
use std::io;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sentri_core::domain::config::LogFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    pub fn new(level: &str, format: LogFormat) -> Result<Self> {
        Ok(Self {
            level: parse_level(level)?,
            format,
        })
    }
}

/// Accepts tracing names plus the `warning` / `critical` spellings common in
/// existing configuration files.
pub fn parse_level(raw: &str) -> Result<Level> {
    let level = match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        other => bail!("Unknown log level '{other}'"),
    };
    Ok(level)
}

/// Installs the global subscriber. Logs go to stderr so stdout stays readable.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = build_env_filter(config.level);
    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(io::stderr),
            )
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).with_writer(io::stderr))
            .try_init()?,
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_ascii_lowercase();
        EnvFilter::new(format!("warn,sentri={level},sentri_core={level}"))
    })
}
