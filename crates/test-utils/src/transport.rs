//! Scripted in-memory transport.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ant_net_dialer::{PeerConnection, Transport, TransportError};
use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};
use async_trait::async_trait;
use libp2p::Multiaddr;
use parking_lot::Mutex;
use tracing::trace;

/// How the mock answers a dial to one transport address.
#[derive(Debug, Clone)]
pub enum Script {
    /// Complete the handshake as `peer` after `after`.
    Accept { peer: PeerIdentity, after: Duration },
    /// Fail with [`TransportError::Refused`] after `after`, on every dial.
    Refuse { reason: String, after: Duration },
    /// Fail with [`TransportError::Failed`] after `after`.
    Fail { reason: String, after: Duration },
    /// Fail with [`TransportError::IdentityMismatch`] after `after`.
    Mismatch { obtained: PeerIdentity, after: Duration },
    /// Never answer.
    Hang,
}

#[derive(Debug, Default)]
struct State {
    started: AtomicUsize,
    completed: AtomicUsize,
    cancelled: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    dialed: Mutex<Vec<Multiaddr>>,
}

/// Shared view of everything a [`MockTransport`] has done.
#[derive(Debug, Clone, Default)]
pub struct MockStats(Arc<State>);

impl MockStats {
    /// Dials started.
    pub fn started(&self) -> usize {
        self.0.started.load(Ordering::SeqCst)
    }

    /// Dials that ran to an answer.
    pub fn completed(&self) -> usize {
        self.0.completed.load(Ordering::SeqCst)
    }

    /// Dials dropped before answering.
    pub fn cancelled(&self) -> usize {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.0.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous in-flight dials seen.
    pub fn max_in_flight(&self) -> usize {
        self.0.max_in_flight.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.0.opened.load(Ordering::SeqCst) - self.0.closed.load(Ordering::SeqCst)
    }

    pub fn closed_connections(&self) -> usize {
        self.0.closed.load(Ordering::SeqCst)
    }

    /// Transport addresses in the order they were dialed.
    pub fn dialed(&self) -> Vec<Multiaddr> {
        self.0.dialed.lock().clone()
    }
}

/// Transport that answers from a script keyed by transport address.
///
/// Dials to addresses without a script fail immediately.
#[derive(Debug, Default)]
pub struct MockTransport {
    scripts: HashMap<Multiaddr, Script>,
    stats: MockStats,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }

    pub fn script(mut self, endpoint: &EndpointDescriptor, script: Script) -> Self {
        self.scripts.insert(endpoint.transport().clone(), script);
        self
    }

    /// Accept as the expected peer.
    pub fn accept(self, endpoint: &EndpointDescriptor, after: Duration) -> Self {
        let peer = endpoint.peer();
        self.script(endpoint, Script::Accept { peer, after })
    }

    /// Accept, but as a different peer than the one expected.
    pub fn accept_as(self, endpoint: &EndpointDescriptor, peer: PeerIdentity, after: Duration) -> Self {
        self.script(endpoint, Script::Accept { peer, after })
    }

    pub fn refuse(self, endpoint: &EndpointDescriptor, reason: &str, after: Duration) -> Self {
        let reason = reason.to_string();
        self.script(endpoint, Script::Refuse { reason, after })
    }

    pub fn fail(self, endpoint: &EndpointDescriptor, reason: &str, after: Duration) -> Self {
        let reason = reason.to_string();
        self.script(endpoint, Script::Fail { reason, after })
    }

    pub fn mismatch(self, endpoint: &EndpointDescriptor, obtained: PeerIdentity, after: Duration) -> Self {
        self.script(endpoint, Script::Mismatch { obtained, after })
    }

    pub fn hang(self, endpoint: &EndpointDescriptor) -> Self {
        self.script(endpoint, Script::Hang)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn dial(&self, endpoint: &EndpointDescriptor) -> Result<MockConnection, TransportError> {
        let script = self.scripts.get(endpoint.transport()).cloned().unwrap_or(Script::Fail {
            reason: "no route".to_string(),
            after: Duration::ZERO,
        });
        trace!(%endpoint, ?script, "Mock dial");

        let guard = DialGuard::start(&self.stats, endpoint.transport());
        let result = match script {
            Script::Accept { peer, after } => {
                tokio::time::sleep(after).await;
                Ok(MockConnection::open(peer, &self.stats))
            }
            Script::Refuse { reason, after } => {
                tokio::time::sleep(after).await;
                Err(TransportError::Refused(reason))
            }
            Script::Fail { reason, after } => {
                tokio::time::sleep(after).await;
                Err(TransportError::Failed(reason))
            }
            Script::Mismatch { obtained, after } => {
                tokio::time::sleep(after).await;
                Err(TransportError::IdentityMismatch { obtained })
            }
            Script::Hang => std::future::pending().await,
        };
        guard.complete();
        result
    }
}

/// Tracks one in-flight dial; dropping it unfinished counts a cancellation.
struct DialGuard {
    stats: MockStats,
    completed: bool,
}

impl DialGuard {
    fn start(stats: &MockStats, address: &Multiaddr) -> Self {
        let state = &stats.0;
        state.started.fetch_add(1, Ordering::SeqCst);
        state.dialed.lock().push(address.clone());
        let in_flight = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        Self {
            stats: stats.clone(),
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
        self.stats.0.completed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for DialGuard {
    fn drop(&mut self) {
        let state = &self.stats.0;
        state.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.completed {
            state.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Connection produced by [`MockTransport`]; dropping it counts a close.
#[derive(Debug)]
pub struct MockConnection {
    peer: PeerIdentity,
    stats: MockStats,
}

impl MockConnection {
    fn open(peer: PeerIdentity, stats: &MockStats) -> Self {
        stats.0.opened.fetch_add(1, Ordering::SeqCst);
        Self {
            peer,
            stats: stats.clone(),
        }
    }
}

impl PeerConnection for MockConnection {
    fn remote_identity(&self) -> PeerIdentity {
        self.peer
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.stats.0.closed.fetch_add(1, Ordering::SeqCst);
    }
}
