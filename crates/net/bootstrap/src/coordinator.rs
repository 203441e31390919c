//! Bootstrap round coordination.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::Duration,
};

use ant_net_dialer::{ConnectionOutcome, DialFailure, Dialer, Transport};
use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};
use parking_lot::Mutex;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{BootstrapError, BootstrapPolicy, PeerFailure};

/// Lifecycle of the most recent round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Idle,
    Dialing,
    Succeeded,
    Failed,
}

impl BootstrapState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A bootstrap peer with a verified connection.
#[derive(Debug)]
pub struct ConnectedPeer<C> {
    pub index: usize,
    pub endpoint: EndpointDescriptor,
    pub identity: PeerIdentity,
    pub connection: C,
    pub latency: Duration,
}

/// Outcome of a successful round.
#[derive(Debug)]
pub struct BootstrapResult<C> {
    /// Connected peers in input order, one per identity.
    pub connected: Vec<ConnectedPeer<C>>,
    /// Endpoints that failed before the round ended, in input order.
    pub failures: Vec<PeerFailure>,
}

impl<C> BootstrapResult<C> {
    pub fn peer_count(&self) -> usize {
        self.connected.len()
    }

    pub fn identities(&self) -> impl Iterator<Item = PeerIdentity> + '_ {
        self.connected.iter().map(|peer| peer.identity)
    }
}

/// Dials a set of bootstrap endpoints concurrently and decides the round.
#[derive(Debug)]
pub struct BootstrapCoordinator<T> {
    dialer: Dialer<T>,
    policy: BootstrapPolicy,
    state: Mutex<BootstrapState>,
}

impl<T: Transport> BootstrapCoordinator<T> {
    pub fn new(dialer: Dialer<T>, policy: BootstrapPolicy) -> Self {
        Self {
            dialer,
            policy,
            state: Mutex::new(BootstrapState::Idle),
        }
    }

    pub fn dialer(&self) -> &Dialer<T> {
        &self.dialer
    }

    pub fn policy(&self) -> &BootstrapPolicy {
        &self.policy
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.lock()
    }

    /// Run one round over `endpoints`.
    ///
    /// Succeeds once at least one endpoint connects. Stops early when the
    /// policy target is reached, cancelling every attempt still pending.
    /// Dropping the returned future cancels and aborts all dials.
    pub async fn bootstrap(
        &self,
        endpoints: &[EndpointDescriptor],
    ) -> Result<BootstrapResult<T::Connection>, BootstrapError> {
        let round = Round::begin(&self.state)?;

        if endpoints.is_empty() {
            warn!("No bootstrap peers configured");
            round.finish(BootstrapState::Failed);
            return Err(BootstrapError::NoPeersConfigured);
        }

        let result = self.run(endpoints).await;
        round.finish(if result.is_ok() {
            BootstrapState::Succeeded
        } else {
            BootstrapState::Failed
        });
        result
    }

    async fn run(
        &self,
        endpoints: &[EndpointDescriptor],
    ) -> Result<BootstrapResult<T::Connection>, BootstrapError> {
        let limit = self.policy.max_concurrent_dials();
        info!(
            count = endpoints.len(),
            limit,
            target = self.policy.target_connections(),
            "Connecting to bootstrap peers"
        );

        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();

        let mut queue: Vec<_> = endpoints.iter().cloned().enumerate().collect();
        self.policy.arrange(&mut queue);
        let mut queue = VecDeque::from(queue);

        let mut tasks = JoinSet::new();
        let mut running: HashMap<task::Id, (usize, EndpointDescriptor)> = HashMap::new();
        let mut connected = Vec::new();
        let mut identities = HashSet::new();
        let mut failures = Vec::new();

        loop {
            while tasks.len() < limit {
                let Some((index, endpoint)) = queue.pop_front() else {
                    break;
                };
                debug!(index, %endpoint, is_dns = endpoint.is_dns(), "Dialing bootstrap peer");
                let dialer = self.dialer.clone();
                let token = cancel.child_token();
                let target = endpoint.clone();
                let handle = tasks.spawn(async move { dialer.dial(&target, &token).await });
                running.insert(handle.id(), (index, endpoint));
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(err) => {
                    let id = err.id();
                    let reason = DialFailure::TransportRefused(format!("dial task failed: {err}"));
                    (id, ConnectionOutcome::Unreachable(reason))
                }
            };
            let Some((index, endpoint)) = running.remove(&id) else {
                continue;
            };

            match outcome {
                ConnectionOutcome::Connected(live) => {
                    if !identities.insert(live.identity) {
                        debug!(index, %endpoint, identity = %live.identity, "Duplicate bootstrap peer, closing");
                        continue;
                    }
                    info!(index, %endpoint, latency = ?live.latency, "Connected to bootstrap peer");
                    connected.push(ConnectedPeer {
                        index,
                        endpoint,
                        identity: live.identity,
                        connection: live.connection,
                        latency: live.latency,
                    });
                    if self.policy.target_reached(connected.len()) {
                        info!(connected = connected.len(), "Reached target bootstrap connections");
                        break;
                    }
                }
                ConnectionOutcome::Unreachable(reason) | ConnectionOutcome::Rejected(reason) => {
                    warn!(index, %endpoint, %reason, "Failed to connect to bootstrap peer");
                    failures.push(PeerFailure {
                        index,
                        endpoint,
                        reason,
                    });
                }
            }
        }

        cancel.cancel();
        tasks.shutdown().await;
        if !queue.is_empty() {
            debug!(skipped = queue.len(), "Bootstrap peers left undialed");
        }

        failures.sort_by_key(|failure| failure.index);
        if connected.is_empty() {
            warn!(failed = failures.len(), "All bootstrap peers unreachable");
            return Err(BootstrapError::AllPeersUnreachable(failures));
        }
        connected.sort_by_key(|peer| peer.index);
        Ok(BootstrapResult {
            connected,
            failures,
        })
    }
}

/// Marks the coordinator as dialing for the lifetime of one round.
struct Round<'a> {
    state: &'a Mutex<BootstrapState>,
    finished: bool,
}

impl<'a> Round<'a> {
    fn begin(state: &'a Mutex<BootstrapState>) -> Result<Self, BootstrapError> {
        let mut current = state.lock();
        if *current == BootstrapState::Dialing {
            return Err(BootstrapError::RoundInProgress);
        }
        *current = BootstrapState::Dialing;
        Ok(Self {
            state,
            finished: false,
        })
    }

    fn finish(mut self, outcome: BootstrapState) {
        *self.state.lock() = outcome;
        self.finished = true;
    }
}

impl Drop for Round<'_> {
    fn drop(&mut self) {
        // Abandoned round.
        if !self.finished {
            *self.state.lock() = BootstrapState::Idle;
        }
    }
}
