//! libp2p-backed [`Transport`].
//!
//! A background task owns the [`Swarm`] and serves dial and close commands.
//! Each established connection is handed out as a [`SwarmConnection`] that
//! closes the underlying libp2p connection when dropped.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    time::Duration,
};

use ant_net_multiaddr::{EndpointDescriptor, PeerIdentity};
use async_trait::async_trait;
use clap::Args;
use futures::StreamExt;
use libp2p::{
    Multiaddr, PeerId, Swarm, SwarmBuilder, noise, ping,
    swarm::{
        ConnectionId, DialError, SwarmEvent,
        dial_opts::{DialOpts, PeerCondition},
    },
    tcp, yamux,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::{PeerConnection, Transport, TransportError};

/// Default idle connection timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// libp2p transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
#[command(next_help_heading = "Transport")]
#[serde(default)]
pub struct SwarmConfig {
    /// Seconds a connection without active streams is kept open.
    #[arg(long = "transport.idle-timeout", default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl SwarmConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

type DialReply = oneshot::Sender<Result<SwarmConnection, TransportError>>;

struct PendingDial {
    peer: PeerId,
    reply: DialReply,
}

enum Command {
    Dial {
        opts: DialOpts,
        address: Multiaddr,
        peer: PeerId,
        reply: DialReply,
    },
    /// The dialing side went away before an answer.
    Abort {
        connection_id: ConnectionId,
        peer: PeerId,
    },
    Close {
        connection_id: ConnectionId,
    },
}

/// TCP and WebSocket transport with noise encryption and yamux multiplexing.
///
/// Must be created inside a tokio runtime. The swarm task stops once the
/// transport and every connection handle have been dropped.
#[derive(Clone)]
pub struct SwarmTransport {
    commands: mpsc::UnboundedSender<Command>,
    local_peer_id: PeerId,
}

impl fmt::Debug for SwarmTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwarmTransport")
            .field("local_peer_id", &self.local_peer_id)
            .finish_non_exhaustive()
    }
}

impl SwarmTransport {
    /// Build the swarm with a fresh identity and spawn its event loop.
    pub async fn new(config: &SwarmConfig) -> Result<Self, TransportError> {
        let idle_timeout = config.idle_timeout();
        let swarm = SwarmBuilder::with_new_identity()
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )
            .map_err(setup_error)?
            .with_dns()
            .map_err(setup_error)?
            .with_websocket(noise::Config::new, yamux::Config::default)
            .await
            .map_err(setup_error)?
            .with_behaviour(|_| ping::Behaviour::default())
            .map_err(setup_error)?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(idle_timeout))
            .build();

        let local_peer_id = *swarm.local_peer_id();
        info!(%local_peer_id, "Local peer ID");

        let (commands, receiver) = mpsc::unbounded_channel();
        let event_loop = EventLoop {
            swarm,
            commands: receiver,
            handle: commands.downgrade(),
            pending: HashMap::new(),
            aborted: HashSet::new(),
        };
        tokio::spawn(event_loop.run());

        Ok(Self {
            commands,
            local_peer_id,
        })
    }

    pub fn local_peer_id(&self) -> PeerIdentity {
        self.local_peer_id.into()
    }
}

#[async_trait]
impl Transport for SwarmTransport {
    type Connection = SwarmConnection;

    async fn dial(&self, endpoint: &EndpointDescriptor) -> Result<SwarmConnection, TransportError> {
        let address = endpoint.transport().clone();
        let peer = *endpoint.peer().peer_id();
        let opts = DialOpts::peer_id(peer)
            .addresses(vec![address.clone()])
            .condition(PeerCondition::Always)
            .build();
        let connection_id = opts.connection_id();

        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Dial {
                opts,
                address,
                peer,
                reply,
            })
            .map_err(|_| TransportError::Closed)?;

        // Dropped before an answer: the swarm tears the dial down.
        let abort = AbortOnDrop {
            commands: &self.commands,
            connection_id,
            peer,
            armed: true,
        };
        let result = response.await.map_err(|_| TransportError::Closed)?;
        abort.disarm();
        result
    }
}

/// Sends [`Command::Abort`] unless the dial got its answer.
struct AbortOnDrop<'a> {
    commands: &'a mpsc::UnboundedSender<Command>,
    connection_id: ConnectionId,
    peer: PeerId,
    armed: bool,
}

impl AbortOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbortOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.commands.send(Command::Abort {
                connection_id: self.connection_id,
                peer: self.peer,
            });
        }
    }
}

/// Handle to one established libp2p connection.
pub struct SwarmConnection {
    peer: PeerIdentity,
    connection_id: ConnectionId,
    remote_addr: Multiaddr,
    commands: mpsc::UnboundedSender<Command>,
}

impl SwarmConnection {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn remote_addr(&self) -> &Multiaddr {
        &self.remote_addr
    }
}

impl fmt::Debug for SwarmConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwarmConnection")
            .field("peer", &self.peer)
            .field("connection_id", &self.connection_id)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}

impl PeerConnection for SwarmConnection {
    fn remote_identity(&self) -> PeerIdentity {
        self.peer
    }
}

impl Drop for SwarmConnection {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Close {
            connection_id: self.connection_id,
        });
    }
}

struct EventLoop {
    swarm: Swarm<ping::Behaviour>,
    commands: mpsc::UnboundedReceiver<Command>,
    handle: mpsc::WeakUnboundedSender<Command>,
    pending: HashMap<ConnectionId, PendingDial>,
    /// Abandoned dials that may still complete.
    aborted: HashSet<ConnectionId>,
}

impl EventLoop {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                event = self.swarm.select_next_some() => self.handle_swarm_event(event),
            }
        }
        debug!("Swarm transport stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Dial {
                opts,
                address,
                peer,
                reply,
            } => {
                let connection_id = opts.connection_id();
                match self.swarm.dial(opts) {
                    Ok(()) => {
                        trace!(%peer, %address, ?connection_id, "Dial initiated");
                        self.pending.insert(connection_id, PendingDial { peer, reply });
                    }
                    Err(error) => {
                        debug!(%peer, %address, %error, "Dial rejected by swarm");
                        let _ = reply.send(Err(dial_error(error)));
                    }
                }
            }
            Command::Abort {
                connection_id,
                peer,
            } => {
                if self.pending.remove(&connection_id).is_none() {
                    return;
                }
                let shared = self.swarm.is_connected(&peer)
                    || self.pending.values().any(|dial| dial.peer == peer);
                if shared {
                    // Disconnecting would take the peer's other connections
                    // down too. Close this one if it completes.
                    self.aborted.insert(connection_id);
                } else {
                    let _ = self.swarm.disconnect_peer_id(peer);
                }
                debug!(%peer, ?connection_id, "Dial aborted");
            }
            Command::Close { connection_id } => {
                if self.swarm.close_connection(connection_id) {
                    trace!(?connection_id, "Closing connection");
                }
            }
        }
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<ping::Event>) {
        match event {
            SwarmEvent::ConnectionEstablished {
                peer_id,
                connection_id,
                endpoint,
                ..
            } => {
                if self.aborted.remove(&connection_id) {
                    trace!(%peer_id, ?connection_id, "Closing aborted dial");
                    self.swarm.close_connection(connection_id);
                    return;
                }
                let Some(PendingDial { reply, .. }) = self.pending.remove(&connection_id) else {
                    return;
                };
                let Some(commands) = self.handle.upgrade() else {
                    self.swarm.close_connection(connection_id);
                    return;
                };
                debug!(
                    %peer_id,
                    endpoint = %endpoint.get_remote_address(),
                    "Connection established"
                );
                let connection = SwarmConnection {
                    peer: peer_id.into(),
                    connection_id,
                    remote_addr: endpoint.get_remote_address().clone(),
                    commands,
                };
                if reply.send(Ok(connection)).is_err() {
                    debug!(%peer_id, "Dial abandoned, closing connection");
                }
            }
            SwarmEvent::OutgoingConnectionError {
                connection_id,
                peer_id,
                error,
                ..
            } => {
                self.aborted.remove(&connection_id);
                let Some(PendingDial { reply, .. }) = self.pending.remove(&connection_id) else {
                    return;
                };
                debug!(?peer_id, %error, "Outgoing connection error");
                let _ = reply.send(Err(dial_error(error)));
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                debug!(%peer_id, num_established, cause = ?cause, "Connection closed");
            }
            SwarmEvent::Behaviour(ping::Event { peer, result, .. }) => match result {
                Ok(rtt) => trace!(%peer, ?rtt, "Ping"),
                Err(error) => warn!(%peer, %error, "Ping failure"),
            },
            _ => {}
        }
    }
}

fn dial_error(error: DialError) -> TransportError {
    match error {
        DialError::WrongPeerId { obtained, .. } => TransportError::IdentityMismatch {
            obtained: obtained.into(),
        },
        error @ DialError::Transport(_) => TransportError::Refused(error.to_string()),
        other => TransportError::Failed(other.to_string()),
    }
}

fn setup_error(error: impl fmt::Display) -> TransportError {
    TransportError::Setup(error.to_string())
}
