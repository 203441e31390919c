//! Bootstrap CLI arguments.

use std::time::Duration;

use ant_net_dialer::{
    DEFAULT_DIAL_ATTEMPTS, DEFAULT_DIAL_BACKOFF_MS, DEFAULT_DIAL_TIMEOUT_SECS, DialerConfig,
};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{BootstrapPolicy, DEFAULT_MAX_CONCURRENT_DIALS, DEFAULT_TARGET_CONNECTIONS};

/// Bootstrap configuration.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Bootstrap")]
#[serde(default)]
pub struct BootstrapArgs {
    /// Timeout for a single dial try in seconds.
    #[arg(long = "bootstrap.dial-timeout", default_value_t = DEFAULT_DIAL_TIMEOUT_SECS)]
    pub dial_timeout_secs: u64,

    /// Dial tries per peer.
    #[arg(long = "bootstrap.attempts", default_value_t = DEFAULT_DIAL_ATTEMPTS)]
    pub attempts: usize,

    /// Initial delay between tries in milliseconds, doubled after each retry.
    #[arg(long = "bootstrap.backoff-ms", default_value_t = DEFAULT_DIAL_BACKOFF_MS)]
    pub backoff_ms: u64,

    /// Maximum number of simultaneous dials.
    #[arg(long = "bootstrap.max-concurrent-dials", default_value_t = DEFAULT_MAX_CONCURRENT_DIALS)]
    pub max_concurrent_dials: usize,

    /// Stop dialing once this many peers are connected (0 dials every peer).
    #[arg(long = "bootstrap.target-connections", default_value_t = DEFAULT_TARGET_CONNECTIONS)]
    pub target_connections: usize,

    /// Dial peers in random order.
    #[arg(long = "bootstrap.shuffle")]
    pub shuffle: bool,
}

impl Default for BootstrapArgs {
    fn default() -> Self {
        Self {
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
            attempts: DEFAULT_DIAL_ATTEMPTS,
            backoff_ms: DEFAULT_DIAL_BACKOFF_MS,
            max_concurrent_dials: DEFAULT_MAX_CONCURRENT_DIALS,
            target_connections: DEFAULT_TARGET_CONNECTIONS,
            shuffle: false,
        }
    }
}

impl BootstrapArgs {
    pub fn dialer_config(&self) -> DialerConfig {
        DialerConfig::default()
            .with_timeout(Duration::from_secs(self.dial_timeout_secs))
            .with_attempts(self.attempts)
            .with_backoff(Duration::from_millis(self.backoff_ms))
    }

    pub fn policy(&self) -> BootstrapPolicy {
        BootstrapPolicy::default()
            .with_target_connections(self.target_connections)
            .with_max_concurrent_dials(self.max_concurrent_dials)
            .with_shuffle(self.shuffle)
    }
}

impl From<&BootstrapArgs> for BootstrapPolicy {
    fn from(args: &BootstrapArgs) -> Self {
        args.policy()
    }
}
