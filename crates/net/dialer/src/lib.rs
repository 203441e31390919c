//! Connection attempts against a single bootstrap endpoint.
//!
//! A [`Dialer`] drives one endpoint through a [`Transport`] to exactly one
//! [`ConnectionOutcome`], bounded by a per-try timeout, optionally retried with
//! exponential backoff, and abandoned as soon as its [`CancellationToken`] fires.
//!
//! [`SwarmTransport`] is the production transport, backed by a libp2p swarm.

mod backoff;
mod dialer;
mod error;
mod metrics;
mod outcome;
mod swarm;
mod transport;

pub use backoff::{Backoff, MAX_BACKOFF};
pub use dialer::{
    DEFAULT_DIAL_ATTEMPTS, DEFAULT_DIAL_BACKOFF_MS, DEFAULT_DIAL_TIMEOUT_SECS, Dialer,
    DialerConfig,
};
pub use error::{DialFailure, TransportError};
pub use outcome::{ConnectionOutcome, LiveConnection};
pub use swarm::{DEFAULT_IDLE_TIMEOUT_SECS, SwarmConfig, SwarmConnection, SwarmTransport};
pub use tokio_util::sync::CancellationToken;
pub use transport::{PeerConnection, Transport};
