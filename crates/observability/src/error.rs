//! Logging setup errors.

use tracing_subscriber::util::TryInitError;

/// Errors from directive parsing and subscriber installation.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log directive {0:?}")]
    InvalidDirective(String),

    #[error("unknown log level {level:?} in directive {directive:?}")]
    UnknownLevel { directive: String, level: String },

    /// Logging was already initialized in this process. The installed
    /// directives are left untouched.
    #[error("logging is already initialized")]
    AlreadyInitialized,

    #[error("failed to install global subscriber: {0}")]
    Install(#[from] TryInitError),
}
