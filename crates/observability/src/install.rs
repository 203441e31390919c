//! One-time installation of the global log subscriber.

use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{LogDirectiveSet, LogError};

/// Directives installed in this process. Written once, read without locking.
static INSTALLED: OnceLock<LogDirectiveSet> = OnceLock::new();

/// Serializes installation attempts.
static INSTALL_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Output format of the installed `fmt` layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines on stdout.
    #[default]
    Text,
    /// One JSON object per line on stdout.
    Json,
    /// Human-readable lines captured by the test harness.
    Test,
}

/// Parse `directives` and install them as the process-wide log filter.
///
/// Succeeds once per process. Later calls fail with
/// [`LogError::AlreadyInitialized`] and leave the installed filter as it was.
pub fn initialize(directives: &str) -> Result<(), LogError> {
    initialize_with(LogDirectiveSet::parse(directives)?, LogFormat::Text)
}

/// Install an already-parsed directive set with the given output format.
pub fn initialize_with(set: LogDirectiveSet, format: LogFormat) -> Result<(), LogError> {
    let _guard = INSTALL_LOCK.lock();
    if INSTALLED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let directives = set.to_string();
    let filter = EnvFilter::builder()
        .parse(&directives)
        .map_err(|_| LogError::InvalidDirective(directives))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Text => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Test => fmt::layer().with_test_writer().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()?;

    // Cannot fail: the lock is held and the slot was checked empty above.
    let _ = INSTALLED.set(set);

    tracing::debug!(directives = %installed_display(), "logging initialized");
    Ok(())
}

/// The directives installed by [`initialize`], if any.
pub fn installed() -> Option<&'static LogDirectiveSet> {
    INSTALLED.get()
}

fn installed_display() -> String {
    installed().map(ToString::to_string).unwrap_or_default()
}
