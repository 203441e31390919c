//! Peer identity newtype.

use std::fmt;
use std::str::FromStr;

use libp2p::PeerId;

use crate::ParseError;

/// Cryptographic identity of a remote peer.
///
/// Wraps the libp2p [`PeerId`] (a multihash of the peer's public key). Equality is
/// byte-exact; the canonical text form is base58 (`12D3KooW...`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerIdentity(PeerId);

impl PeerIdentity {
    pub const fn new(peer_id: PeerId) -> Self {
        Self(peer_id)
    }

    /// Random identity, for tests and ephemeral local peers.
    pub fn random() -> Self {
        Self(PeerId::random())
    }

    pub const fn peer_id(&self) -> &PeerId {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        PeerId::from_bytes(bytes)
            .map(Self)
            .map_err(|_| ParseError::InvalidIdentityEncoding {
                value: format!("0x{}", bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()),
            })
    }
}

impl FromStr for PeerIdentity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeerId::from_str(s)
            .map(Self)
            .map_err(|_| ParseError::InvalidIdentityEncoding {
                value: s.to_owned(),
            })
    }
}

impl From<PeerId> for PeerIdentity {
    fn from(peer_id: PeerId) -> Self {
        Self(peer_id)
    }
}

impl From<PeerIdentity> for PeerId {
    fn from(identity: PeerIdentity) -> Self {
        identity.0
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PeerIdentity").field(&self.0.to_base58()).finish()
    }
}
