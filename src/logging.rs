//! Logging setup for the distributor binary
//!
//! Library code only emits `tracing` events; a binary opts in to output by
//! calling [`init`] once. Output goes to stderr so that stdout carries only
//! the command's JSON result. `RUST_LOG` overrides the chosen level.

use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    /// Default
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map a `-v` count: none → Info, one → Debug, more → Trace
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Install the global subscriber; fails if one is already set
pub fn try_init(level: LogLevel) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Log(e.to_string()))
}

/// Install the global subscriber
///
/// A second call leaves the existing subscriber in place and reports the
/// refusal at debug level through it.
pub fn init(level: LogLevel) {
    if let Err(e) = try_init(level) {
        tracing::debug!("Keeping existing log subscriber: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(2), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(10), LogLevel::Trace);
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Error.as_str(), "error");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }

    #[test]
    fn test_second_init_is_error() {
        init(LogLevel::Warn);
        assert!(matches!(try_init(LogLevel::Warn), Err(Error::Log(_))));
        // init keeps the first subscriber and does not panic
        init(LogLevel::Trace);
    }
}
