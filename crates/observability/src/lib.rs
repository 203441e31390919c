//! Logging setup for the Ant client.
//!
//! - [`LogDirectiveSet`] - `scope=level` directives with longest-scope matching
//! - [`initialize`] / [`initialize_with`] - install the process-wide subscriber, once
//! - [`LogArgs`] / [`init_logging`] - CLI flags mapped onto directives
//!
//! ```no_run
//! ant_observability::initialize("info,ant_net_bootstrap=debug")?;
//! # Ok::<(), ant_observability::LogError>(())
//! ```

mod args;
mod directives;
mod error;
mod install;

pub use args::{LOG_ENV, LogArgs, init_logging};
pub use directives::{DEFAULT_LEVEL, LogDirectiveSet};
pub use error::LogError;
pub use install::{LogFormat, initialize, initialize_with, installed};
