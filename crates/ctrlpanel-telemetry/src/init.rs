//! Subscriber installation for the control panel binaries.
//!
//! Logs always go to stderr; stdout carries tables and JSON documents.
//! `RUST_LOG` wins over the configured level when it is set.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Level used when neither `RUST_LOG` nor a flag is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for an unparsable level and
/// [`TelemetryError::SubscriberInstall`] when a subscriber is already set.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let filter = env_filter(config.level)?;
    let (json, pretty) = match config.format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(io::stderr),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(
                fmt::layer()
                    .compact()
                    .with_ansi(io::stderr().is_terminal())
                    .with_target(false)
                    .with_writer(io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })?;

    let _ = BUILD_SHA.set(config.build_sha.to_string());
    tracing::debug!(build_sha = build_sha(), format = ?config.format, "logging ready");
    Ok(())
}

/// Build identifier recorded by [`init_logging`], `dev` before that.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Span wrapping one CLI command; every event inside carries the trace id
/// that is also sent to the backend as `x-request-id`.
#[must_use]
pub fn command_span(command: &'static str, trace_id: &str) -> Span {
    tracing::info_span!("command", command, trace_id = %trace_id)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Level or filter directive (`warn`, `ctrlpanel_core=debug`, ...).
    pub level: &'a str,
    /// Output format.
    pub format: LogFormat,
    /// Build identifier.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: option_env!("CTRLPANEL_BUILD_SHA").unwrap_or("dev"),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Compact human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty for debug builds, JSON for release builds.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Format named `name`; unknown names fall back to [`LogFormat::infer`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "text" => Self::Pretty,
            _ => Self::infer(),
        }
    }
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidFilter {
        directive: level.to_string(),
        source,
    })
}
