//! Test utilities for the bootstrap crates.
//!
//! [`MockTransport`] answers dials from a per-address script and records what
//! happened through a shared [`MockStats`] handle. [`ListeningPeer`] is a real
//! libp2p peer for tests that dial over sockets.

mod listener;
mod transport;

pub use listener::ListeningPeer;
pub use transport::{MockConnection, MockStats, MockTransport, Script};

use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};

/// Endpoint on `127.0.0.1:{port}` with a fresh random identity.
pub fn endpoint(port: u16) -> EndpointDescriptor {
    endpoint_for(port, PeerIdentity::random())
}

/// Endpoint on `127.0.0.1:{port}` expecting `peer`.
pub fn endpoint_for(port: u16, peer: PeerIdentity) -> EndpointDescriptor {
    EndpointDescriptor::parse(&format!("/ip4/127.0.0.1/tcp/{port}/p2p/{peer}"))
        .unwrap_or_else(|err| panic!("test endpoint on port {port}: {err}"))
}

/// Install a test-writer subscriber; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
