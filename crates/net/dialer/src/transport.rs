//! Transport collaborator interface.

use std::fmt::Debug;

use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};
use async_trait::async_trait;

use crate::TransportError;

/// A live connection to a remote peer.
///
/// Dropping the handle closes the connection and releases its resources.
pub trait PeerConnection: Debug + Send + Sync + 'static {
    /// Identity the remote proved during the handshake.
    fn remote_identity(&self) -> PeerIdentity;
}

/// Dial primitive provided by the network stack.
///
/// Implementations must release any partially-established resources when the
/// returned future is dropped before completion.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Connection: PeerConnection;

    /// Dial `endpoint.transport()`, expecting `endpoint.peer()` on the other side.
    async fn dial(&self, endpoint: &EndpointDescriptor)
    -> Result<Self::Connection, TransportError>;
}
