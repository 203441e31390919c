//! Result of a single dial.

use std::time::Duration;

use ant_net_multiaddr::PeerIdentity;

use crate::DialFailure;

/// A connection confirmed to reach the expected identity.
#[derive(Debug)]
pub struct LiveConnection<C> {
    pub connection: C,
    pub identity: PeerIdentity,
    /// Time from the start of the successful try to the established connection.
    pub latency: Duration,
}

/// Outcome of dialing one endpoint.
#[derive(Debug)]
pub enum ConnectionOutcome<C> {
    Connected(LiveConnection<C>),
    /// Nothing usable answered: timeout, refusal or cancellation.
    Unreachable(DialFailure),
    /// Something answered but was not the expected peer.
    Rejected(DialFailure),
}

impl<C> ConnectionOutcome<C> {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn failure(&self) -> Option<&DialFailure> {
        match self {
            Self::Connected(_) => None,
            Self::Unreachable(failure) | Self::Rejected(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<LiveConnection<C>, DialFailure> {
        match self {
            Self::Connected(live) => Ok(live),
            Self::Unreachable(failure) | Self::Rejected(failure) => Err(failure),
        }
    }
}
