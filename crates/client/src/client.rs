//! The connected client.

use std::time::Duration;

use ant_net_bootstrap::{BootstrapCoordinator, BootstrapError, ConnectedPeer, PeerFailure};
use ant_net_dialer::{CancellationToken, ConnectionOutcome, Dialer, SwarmTransport, Transport};
use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};
use tracing::{debug, info};

use crate::{ClientConfig, ConnectError};

/// A client joined to the network through at least one bootstrap peer.
///
/// Owns every connection it made; dropping the client closes them all.
pub struct Client<T: Transport = SwarmTransport> {
    dialer: Dialer<T>,
    peers: Vec<ConnectedPeer<T::Connection>>,
    failures: Vec<PeerFailure>,
}

impl Client<SwarmTransport> {
    /// Connect over libp2p with default configuration.
    pub async fn connect<S: AsRef<str>>(addresses: &[S]) -> Result<Self, ConnectError> {
        Self::connect_with_config(&ClientConfig::default(), addresses).await
    }

    /// Connect over libp2p.
    pub async fn connect_with_config<S: AsRef<str>>(
        config: &ClientConfig,
        addresses: &[S],
    ) -> Result<Self, ConnectError> {
        let endpoints = parse_addresses(addresses)?;
        if endpoints.is_empty() {
            return Err(BootstrapError::NoPeersConfigured.into());
        }
        let transport = SwarmTransport::new(&config.transport).await?;
        Self::bootstrap(transport, config, &endpoints).await
    }
}

impl<T: Transport> Client<T> {
    /// Connect over any transport.
    ///
    /// Every address is parsed before the first dial; the first malformed one
    /// fails the call with its input position.
    pub async fn connect_with<S: AsRef<str>>(
        transport: T,
        config: &ClientConfig,
        addresses: &[S],
    ) -> Result<Self, ConnectError> {
        let endpoints = parse_addresses(addresses)?;
        Self::bootstrap(transport, config, &endpoints).await
    }

    async fn bootstrap(
        transport: T,
        config: &ClientConfig,
        endpoints: &[EndpointDescriptor],
    ) -> Result<Self, ConnectError> {
        let dialer = Dialer::new(transport, config.bootstrap.dialer_config());
        let coordinator = BootstrapCoordinator::new(dialer, config.bootstrap.policy());
        let result = coordinator.bootstrap(endpoints).await?;
        info!(
            peers = result.peer_count(),
            failed = result.failures.len(),
            "Client connected"
        );
        Ok(Self {
            dialer: coordinator.dialer().clone(),
            peers: result.connected,
            failures: result.failures,
        })
    }

    /// Connected peer identities, in the order they were added.
    pub fn peers(&self) -> Vec<PeerIdentity> {
        self.peers.iter().map(|peer| peer.identity).collect()
    }

    pub fn connected_peers(&self) -> &[ConnectedPeer<T::Connection>] {
        &self.peers
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn is_connected(&self, peer: &PeerIdentity) -> bool {
        self.find(peer).is_some()
    }

    /// Latency observed when the connection to `peer` was established.
    pub fn latency(&self, peer: &PeerIdentity) -> Option<Duration> {
        self.find(peer).map(|peer| peer.latency)
    }

    /// Bootstrap peers that failed during the initial round.
    pub fn bootstrap_failures(&self) -> &[PeerFailure] {
        &self.failures
    }

    /// Dial one more peer. Already-connected identities are not dialed again.
    pub async fn add_peer(&mut self, address: &str) -> Result<PeerIdentity, ConnectError> {
        let endpoint =
            EndpointDescriptor::parse(address).map_err(|err| ConnectError::Parse(0, err))?;
        let identity = endpoint.peer();
        if self.is_connected(&identity) {
            debug!(%identity, "Peer already connected");
            return Ok(identity);
        }

        match self.dialer.dial(&endpoint, &CancellationToken::new()).await {
            ConnectionOutcome::Connected(live) => {
                info!(%endpoint, latency = ?live.latency, "Connected to peer");
                let index = self.peers.iter().map(|peer| peer.index + 1).max().unwrap_or(0);
                self.peers.push(ConnectedPeer {
                    index,
                    endpoint,
                    identity: live.identity,
                    connection: live.connection,
                    latency: live.latency,
                });
                Ok(identity)
            }
            ConnectionOutcome::Unreachable(reason) | ConnectionOutcome::Rejected(reason) => {
                Err(ConnectError::Dial { endpoint, reason })
            }
        }
    }

    /// Close the connection to `peer`. Returns whether it was connected.
    pub fn disconnect(&mut self, peer: &PeerIdentity) -> bool {
        let before = self.peers.len();
        self.peers.retain(|connected| connected.identity != *peer);
        let removed = self.peers.len() != before;
        if removed {
            debug!(%peer, "Disconnected peer");
        }
        removed
    }

    /// Close every connection.
    pub fn close(mut self) {
        self.close_all();
    }

    fn close_all(&mut self) {
        if !self.peers.is_empty() {
            info!(peers = self.peers.len(), "Closing client connections");
            self.peers.clear();
        }
    }

    fn find(&self, peer: &PeerIdentity) -> Option<&ConnectedPeer<T::Connection>> {
        self.peers.iter().find(|connected| connected.identity == *peer)
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        self.close_all();
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("peers", &self.peers())
            .field("failures", &self.failures.len())
            .finish_non_exhaustive()
    }
}

fn parse_addresses<S: AsRef<str>>(addresses: &[S]) -> Result<Vec<EndpointDescriptor>, ConnectError> {
    addresses
        .iter()
        .enumerate()
        .map(|(index, address)| {
            EndpointDescriptor::parse(address.as_ref()).map_err(|err| ConnectError::Parse(index, err))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ant_net_multiaddr::ParseError;

    #[test]
    fn parse_reports_first_bad_index() {
        let peer = PeerIdentity::random();
        let addresses = [
            format!("/ip4/127.0.0.1/tcp/1634/p2p/{peer}"),
            "/ip4/127.0.0.1/tcp/1634".to_string(),
            "garbage".to_string(),
        ];
        let err = parse_addresses(&addresses).unwrap_err();
        assert!(matches!(err, ConnectError::Parse(1, ParseError::MissingIdentity)));
    }

    #[test]
    fn parse_keeps_order() {
        let peers = [PeerIdentity::random(), PeerIdentity::random()];
        let addresses: Vec<_> = peers
            .iter()
            .map(|peer| format!("/dns4/bootnode.example/tcp/1634/p2p/{peer}"))
            .collect();
        let endpoints = parse_addresses(&addresses).unwrap();
        let parsed: Vec<_> = endpoints.iter().map(EndpointDescriptor::peer).collect();
        assert_eq!(parsed, peers);
    }
}
