//! Dial error types.

use ant_net_multiaddr::PeerIdentity;

/// Errors reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Nothing accepted the connection. The endpoint may come up later.
    #[error("connection refused: {0}")]
    Refused(String),
    /// The transport gave up on the endpoint for good.
    #[error("dial failed: {0}")]
    Failed(String),
    /// The handshake completed with a peer other than the one dialed.
    #[error("remote identified as {obtained}")]
    IdentityMismatch { obtained: PeerIdentity },
    #[error("transport setup failed: {0}")]
    Setup(String),
    #[error("transport is shut down")]
    Closed,
}

/// Why a single endpoint did not produce a usable connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialFailure {
    #[error("timed out")]
    TimedOut,
    #[error("transport refused: {0}")]
    TransportRefused(String),
    #[error("identity mismatch: expected {expected}, obtained {obtained}")]
    IdentityMismatch {
        expected: PeerIdentity,
        obtained: PeerIdentity,
    },
    #[error("cancelled")]
    Cancelled,
}

impl DialFailure {
    /// Failures worth another try against the same endpoint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TimedOut | Self::TransportRefused(_))
    }
}
