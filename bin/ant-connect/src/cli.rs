//! Command line interface.

use std::path::PathBuf;

use ant_client::{BootstrapArgs, ClientConfig, SwarmConfig};
use ant_observability::LogArgs;
use clap::Parser;
use eyre::{Result, WrapErr};

/// Connect to bootstrap peers and hold the connections until interrupted.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Bootstrap peer multiaddress, e.g. `/ip4/1.2.3.4/tcp/1634/p2p/12D3KooW...`.
    #[arg(long = "peer", value_name = "MULTIADDR", required = true)]
    pub(crate) peers: Vec<String>,

    /// TOML configuration file. Flags that differ from their defaults override it.
    #[arg(long, value_name = "FILE", env = "ANT_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) bootstrap: BootstrapArgs,

    #[command(flatten)]
    pub(crate) transport: SwarmConfig,

    #[command(flatten)]
    pub(crate) logs: LogArgs,
}

impl Cli {
    pub(crate) fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .wrap_err_with(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if self.bootstrap != BootstrapArgs::default() {
            config.bootstrap = self.bootstrap.clone();
        }
        if self.transport != SwarmConfig::default() {
            config.transport = self.transport.clone();
        }
        Ok(config)
    }
}
