//! Client error types.

use std::{io, path::PathBuf};

use ant_net_bootstrap::BootstrapError;
use ant_net_dialer::{DialFailure, TransportError};
use ant_net_multiaddr::{EndpointDescriptor, ParseError};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Address at the given input position is malformed.
    #[error("invalid bootstrap address #{0}: {1}")]
    Parse(usize, #[source] ParseError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A peer added after bootstrap could not be connected.
    #[error("failed to connect to {endpoint}: {reason}")]
    Dial {
        endpoint: EndpointDescriptor,
        reason: DialFailure,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
