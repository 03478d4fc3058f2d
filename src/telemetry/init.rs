// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Log sink setup for the CLI.
//!
//! Output always goes to stderr so tool results on stdout stay clean.
//! `RUST_LOG` overrides whatever filter the selected preset would use.

use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Filter used by `--debug`: everything from this crate, only warnings from dependencies.
const DEBUG_DIRECTIVE: &str = "calltrace=trace,warn";

/// How much the CLI logs, chosen from its flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Use the configured log level.
    #[default]
    Normal,
    /// `--verbose`: debug events plus one line per closed tool span.
    Verbose,
    /// `--debug`: trace events with span enter/close and source locations.
    Debug,
}

impl Verbosity {
    /// `--debug` beats `--verbose`.
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        match (verbose, debug) {
            (_, true) => Self::Debug,
            (true, false) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }
}

/// Settings for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level used when neither `RUST_LOG` nor a directive applies.
    pub default_level: Level,

    /// Span lifecycle events to emit. Closing a tool span logs its timing.
    pub span_events: FmtSpan,

    /// Include file and line of each event.
    pub include_file_line: bool,

    /// Include the module path of each event.
    pub include_target: bool,

    pub ansi_colors: bool,

    pub compact: bool,

    /// Filter directive used when `RUST_LOG` is unset.
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            span_events: FmtSpan::NONE,
            include_file_line: false,
            include_target: true,
            ansi_colors: true,
            compact: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Pick the preset for the CLI's flags.
    ///
    /// `Normal` follows the configured `log_level`; the other two ignore it.
    pub fn for_cli(log_level: &str, verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Normal => Self::from_log_level(log_level),
            Verbosity::Verbose => Self {
                default_level: Level::DEBUG,
                span_events: FmtSpan::CLOSE,
                ..Self::default()
            },
            Verbosity::Debug => Self {
                default_level: Level::TRACE,
                span_events: FmtSpan::ENTER | FmtSpan::CLOSE,
                include_file_line: true,
                compact: false,
                filter_directive: Some(DEBUG_DIRECTIVE.to_string()),
                ..Self::default()
            },
        }
    }

    /// Build a config from a level name such as `"info"` or `"DEBUG"`.
    ///
    /// Unknown names fall back to INFO.
    pub fn from_log_level(level: &str) -> Self {
        Self {
            default_level: level.parse::<Level>().unwrap_or(Level::INFO),
            ..Self::default()
        }
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        if let Ok(from_env) = EnvFilter::try_from_default_env() {
            return from_env;
        }
        self.filter_directive
            .as_deref()
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(self.default_level.to_string()))
    }
}

/// Keeps the subscriber installed; logs a final event when dropped.
pub struct TelemetryGuard {
    _private: (),
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Telemetry shutting down");
    }
}

/// Install the global subscriber. Fails if one is already set.
///
/// ```rust,ignore
/// let config = TelemetryConfig::for_cli("info", Verbosity::from_flags(verbose, debug));
/// let _guard = init_telemetry(&config)?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_span_events(config.span_events.clone());

    let registry = tracing_subscriber::registry().with(config.env_filter());
    let installed = if config.compact {
        registry.with(fmt_layer.compact()).try_init()
    } else {
        registry.with(fmt_layer).try_init()
    };
    installed.map_err(|e| io::Error::other(e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
    }

    #[test]
    fn test_normal_follows_configured_level() {
        let config = TelemetryConfig::for_cli("warn", Verbosity::Normal);
        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.span_events, FmtSpan::NONE);
        assert!(config.filter_directive.is_none());
        assert!(config.compact);
    }

    #[test]
    fn test_verbose_logs_closed_tool_spans() {
        let config = TelemetryConfig::for_cli("warn", Verbosity::Verbose);
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.span_events, FmtSpan::CLOSE);
        assert!(!config.include_file_line);
    }

    #[test]
    fn test_debug_scopes_trace_to_this_crate() {
        let config = TelemetryConfig::for_cli("error", Verbosity::Debug);
        assert_eq!(config.default_level, Level::TRACE);
        assert_eq!(config.filter_directive.as_deref(), Some(DEBUG_DIRECTIVE));
        assert!(config.include_file_line);
        assert!(!config.compact);
        assert!(EnvFilter::try_new(DEBUG_DIRECTIVE).is_ok());
    }

    #[test]
    fn test_from_log_level() {
        assert_eq!(TelemetryConfig::from_log_level("debug").default_level, Level::DEBUG);
        assert_eq!(TelemetryConfig::from_log_level("WARN").default_level, Level::WARN);
        assert_eq!(TelemetryConfig::from_log_level("nonsense").default_level, Level::INFO);
        assert!(!TelemetryConfig::from_log_level("info").with_ansi(false).ansi_colors);
    }
}
