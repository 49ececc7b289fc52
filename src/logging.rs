//! Logging setup for the `plume` binaries.
//!
//! Everything is written to stderr: stdout carries command output and, for
//! `plume serve`, the channel protocol itself.

use std::env;
use std::io;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Minimum level shown when no filter environment variable is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    const fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Off => "off",
        }
    }
}

/// Builds the filter: `PLUME_LOG`, then `RUST_LOG`, then `level` for this crate.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    for var in ["PLUME_LOG", "RUST_LOG"] {
        if let Ok(directives) = env::var(var) {
            if !directives.trim().is_empty() {
                return EnvFilter::new(directives);
            }
        }
    }
    EnvFilter::new(format!("plume={}", level.to_filter_string()))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Renders an API key for logs: a short prefix plus its length.
pub fn redact_key(key: &str) -> String {
    if key.is_empty() {
        return "<empty>".to_string();
    }
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}… ({} chars)", key.chars().count())
}
