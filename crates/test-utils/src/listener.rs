//! A real libp2p peer to dial.

use std::{fmt, time::Duration};

use ant_net_dialer::TransportError;
use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};
use futures::StreamExt;
use libp2p::{Multiaddr, SwarmBuilder, noise, ping, swarm::SwarmEvent, tcp, yamux};
use tokio::task::JoinHandle;
use tracing::trace;

/// libp2p peer listening on loopback and answering pings. Stops when dropped.
#[derive(Debug)]
pub struct ListeningPeer {
    identity: PeerIdentity,
    address: Multiaddr,
    task: JoinHandle<()>,
}

impl ListeningPeer {
    /// Listen on `address`, e.g. `/ip4/127.0.0.1/tcp/0/ws`.
    pub async fn spawn(address: &str) -> Result<Self, TransportError> {
        let mut swarm = SwarmBuilder::with_new_identity()
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )
            .map_err(setup)?
            .with_dns()
            .map_err(setup)?
            .with_websocket(noise::Config::new, yamux::Config::default)
            .await
            .map_err(setup)?
            .with_behaviour(|_| ping::Behaviour::default())
            .map_err(setup)?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(Duration::from_secs(60)))
            .build();

        let listen: Multiaddr = address.parse().map_err(setup)?;
        swarm.listen_on(listen).map_err(setup)?;
        let address = loop {
            match swarm.select_next_some().await {
                SwarmEvent::NewListenAddr { address, .. } => break address,
                SwarmEvent::ListenerError { error, .. } => return Err(setup(error)),
                _ => {}
            }
        };

        let identity = PeerIdentity::from(*swarm.local_peer_id());
        trace!(%identity, %address, "Test peer listening");
        let task = tokio::spawn(async move {
            loop {
                let event = swarm.select_next_some().await;
                trace!(?event, "Test peer event");
            }
        });

        Ok(Self {
            identity,
            address,
            task,
        })
    }

    pub fn identity(&self) -> PeerIdentity {
        self.identity
    }

    /// Listen address, without the `/p2p` suffix.
    pub fn address(&self) -> &Multiaddr {
        &self.address
    }

    pub fn endpoint(&self) -> EndpointDescriptor {
        self.endpoint_as(self.identity)
    }

    /// This peer's address, expecting `peer` to answer.
    pub fn endpoint_as(&self, peer: PeerIdentity) -> EndpointDescriptor {
        EndpointDescriptor::parse(&format!("{}/p2p/{peer}", self.address))
            .unwrap_or_else(|err| panic!("listen address {}: {err}", self.address))
    }
}

impl Drop for ListeningPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn setup(error: impl fmt::Display) -> TransportError {
    TransportError::Setup(error.to_string())
}
