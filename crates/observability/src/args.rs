//! Logging CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{level_filters::LevelFilter, warn};

use crate::{LogDirectiveSet, LogError, LogFormat, initialize_with};

/// Environment variable consulted for directives when no verbosity flag is given.
pub const LOG_ENV: &str = "RUST_LOG";

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(skip)] // CLI-only, count action doesn't make sense in config
    pub verbosity: u8,

    /// Log filter directive (e.g., "ant_net_bootstrap=debug,libp2p=info").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub json: bool,
}

impl LogArgs {
    /// Build the directive set.
    ///
    /// Precedence:
    /// 1. `--quiet` yields `error` and ignores everything else
    /// 2. otherwise the base comes from `RUST_LOG` if it parses, else from verbosity
    /// 3. `--log.filter` directives are applied on top
    pub fn directives(&self) -> Result<LogDirectiveSet, LogError> {
        if self.quiet {
            return Ok(LogDirectiveSet::default().with_default(LevelFilter::ERROR));
        }

        let base = match self.verbosity {
            0 => std::env::var(LOG_ENV)
                .ok()
                .and_then(|env| LogDirectiveSet::parse(&env).ok())
                .map(|set| set.to_string())
                .unwrap_or_else(|| "info".to_string()),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };

        match &self.filter {
            Some(filter) => LogDirectiveSet::parse(&format!("{base},{filter}")),
            None => LogDirectiveSet::parse(&base),
        }
    }

    /// The `RUST_LOG` value [`directives`](Self::directives) skipped because it
    /// does not parse, with the parse error.
    pub fn ignored_env(&self) -> Option<(String, LogError)> {
        if self.quiet || self.verbosity > 0 {
            return None;
        }
        let value = std::env::var(LOG_ENV).ok()?;
        LogDirectiveSet::parse(&value).err().map(|err| (value, err))
    }

    pub fn format(&self) -> LogFormat {
        if self.json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Initialize logging from command line arguments.
pub fn init_logging(args: &LogArgs) -> Result<(), LogError> {
    initialize_with(args.directives()?, args.format())?;
    if let Some((value, error)) = args.ignored_env() {
        warn!(env = LOG_ENV, %value, %error, "Ignoring invalid log directives");
    }
    Ok(())
}
