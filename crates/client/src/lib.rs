//! Network client entry point.
//!
//! ```no_run
//! # async fn run() -> Result<(), ant_client::ConnectError> {
//! let client = ant_client::Client::connect(&[
//!     "/ip4/127.0.0.1/tcp/36075/ws/p2p/12D3KooWJ4Yp8CjrbuUyeLDsAgMfCb3GAYMoBvJCRp1axjHr9cf8",
//! ])
//! .await?;
//! println!("connected to {} peers", client.peer_count());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ConfigError, ConnectError};

pub use ant_net_bootstrap::{BootstrapArgs, BootstrapError, ConnectedPeer, PeerFailure};
pub use ant_net_dialer::{DialFailure, SwarmConfig, TransportError};
pub use ant_net_multiaddr::{EndpointDescriptor, ParseError, PeerIdentity};
