//! Error types for bootstrap rounds.

use std::fmt;

use ant_net_dialer::DialFailure;
use ant_net_multiaddr::EndpointDescriptor;

/// One endpoint that did not yield a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    /// Position of the endpoint in the round's input.
    pub index: usize,
    pub endpoint: EndpointDescriptor,
    pub reason: DialFailure,
}

impl fmt::Display for PeerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.index, self.endpoint, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("no bootstrap peers configured")]
    NoPeersConfigured,
    /// Every endpoint failed; one entry per input endpoint, in input order.
    #[error("all {} bootstrap peers unreachable", .0.len())]
    AllPeersUnreachable(Vec<PeerFailure>),
    #[error("a bootstrap round is already in progress")]
    RoundInProgress,
}
