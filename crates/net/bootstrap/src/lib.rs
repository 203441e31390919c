//! Bootstrap rounds.
//!
//! A [`BootstrapCoordinator`] dials every configured endpoint concurrently,
//! bounded by [`BootstrapPolicy::max_concurrent_dials`], and resolves the round:
//!
//! - succeeds as soon as the target number of distinct peers is connected, or
//!   once every attempt has finished with at least one connection
//! - fails with [`BootstrapError::AllPeersUnreachable`] when nothing connects
//!
//! Attempts still pending when the round ends are cancelled before
//! [`BootstrapCoordinator::bootstrap`] returns.

mod args;
mod coordinator;
mod error;
mod policy;

pub use args::BootstrapArgs;
pub use coordinator::{BootstrapCoordinator, BootstrapResult, BootstrapState, ConnectedPeer};
pub use error::{BootstrapError, PeerFailure};
pub use policy::{BootstrapPolicy, DEFAULT_MAX_CONCURRENT_DIALS, DEFAULT_TARGET_CONNECTIONS};
