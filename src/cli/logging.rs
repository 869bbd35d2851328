//! Logging initialization

use std::cell::OnceCell;
use std::io::IsTerminal;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Registry, fmt, reload};

/// Log level accepted values, as shown in help and error messages
pub const LOG_LEVELS: &str = "trace|debug|info|warn|error|fatal|panic";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogLevelError {
    #[error("unknown log level '{0}' (expected {levels})", levels = LOG_LEVELS)]
    Unknown(String),

    #[error("failed to apply log level: {0}")]
    Reload(String),
}

/// Logging backend driven by the pre-run hook
#[cfg_attr(test, mockall::automock)]
pub trait LogBootstrap {
    /// Install the logging backend; calling it again is a no-op
    fn init(&self);

    /// Apply a level name; an empty name selects the default level
    fn set_level(&self, level: &str) -> Result<(), LogLevelError>;
}

/// Parse a level name into a filter
///
/// `fatal` and `panic` have no tracing equivalent and map to `error`.
pub fn parse_level(level: &str) -> Result<LevelFilter, LogLevelError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "" | "info" => Ok(LevelFilter::INFO),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "warn" => Ok(LevelFilter::WARN),
        "error" | "fatal" | "panic" => Ok(LevelFilter::ERROR),
        _ => Err(LogLevelError::Unknown(level.to_string())),
    }
}

type LevelHandle = reload::Handle<LevelFilter, Registry>;

/// `tracing-subscriber` backed bootstrap writing to stderr
///
/// Logs go to stderr so that commands printing to stdout (completion
/// scripts, plans) are never interleaved with log lines.
#[derive(Default)]
pub struct TracingBootstrap {
    // None when another global subscriber was already installed
    handle: OnceCell<Option<LevelHandle>>,
}

impl TracingBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }
}

impl LogBootstrap for TracingBootstrap {
    fn init(&self) {
        self.handle.get_or_init(|| {
            let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(std::io::stderr().is_terminal())
                        .with_target(false),
                )
                .try_init();

            match installed {
                Ok(()) => Some(handle),
                Err(e) => {
                    tracing::debug!("Logging already initialized: {}", e);
                    None
                }
            }
        });
    }

    fn set_level(&self, level: &str) -> Result<(), LogLevelError> {
        let filter = parse_level(level)?;
        if let Some(Some(handle)) = self.handle.get() {
            handle
                .reload(filter)
                .map_err(|e| LogLevelError::Reload(e.to_string()))?;
        }
        Ok(())
    }
}
