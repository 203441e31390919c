//! Dial a single endpoint with timeout, retry and cancellation.

use std::{sync::Arc, time::Duration};

use ant_net_multiaddr::EndpointDescriptor;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    Backoff, ConnectionOutcome, DialFailure, LiveConnection, PeerConnection, Transport,
    TransportError, metrics::DialerMetrics,
};

/// Default per-try dial timeout in seconds.
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 15;

/// Default number of tries per endpoint.
pub const DEFAULT_DIAL_ATTEMPTS: usize = 1;

/// Default initial delay between tries in milliseconds.
pub const DEFAULT_DIAL_BACKOFF_MS: u64 = 1_000;

/// Shortest pause before redialing a refusing endpoint within one try.
const MIN_REDIAL_DELAY: Duration = Duration::from_millis(100);

/// Longest per-try timeout honoured.
const MAX_DIAL_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerConfig {
    /// Bound on a single try, from dial start to verified connection.
    /// Refused dials are repeated until it elapses.
    pub timeout: Duration,
    /// Tries per endpoint. Zero is treated as one.
    pub attempts: usize,
    /// Initial delay between tries, doubled after each retry.
    pub backoff: Duration,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_DIAL_TIMEOUT_SECS),
            attempts: DEFAULT_DIAL_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_DIAL_BACKOFF_MS),
        }
    }
}

impl DialerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Dials endpoints through a shared transport.
///
/// Every dial ends in exactly one [`ConnectionOutcome`]. A connection whose
/// remote identity differs from the expected one is closed before returning.
pub struct Dialer<T> {
    transport: Arc<T>,
    config: DialerConfig,
    metrics: DialerMetrics,
}

impl<T> Clone for Dialer<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Dialer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialer").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<T: Transport> Dialer<T> {
    pub fn new(transport: T, config: DialerConfig) -> Self {
        Self::from_arc(Arc::new(transport), config)
    }

    pub fn from_arc(transport: Arc<T>, config: DialerConfig) -> Self {
        Self {
            transport,
            config,
            metrics: DialerMetrics::default(),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Dial `endpoint` until it connects, is rejected, runs out of tries or
    /// `cancel` fires.
    pub async fn dial(
        &self,
        endpoint: &EndpointDescriptor,
        cancel: &CancellationToken,
    ) -> ConnectionOutcome<T::Connection> {
        let attempts = self.config.attempts.max(1);
        let mut backoff = Backoff::new(self.config.backoff);
        let mut attempt = 1;

        loop {
            let outcome = self.try_once(endpoint, cancel).await;
            let failure = match outcome {
                ConnectionOutcome::Unreachable(failure)
                    if failure.is_retryable() && attempt < attempts =>
                {
                    failure
                }
                outcome => return outcome,
            };

            let delay = backoff.next_delay();
            debug!(%endpoint, attempt, ?delay, reason = %failure, "Retrying dial");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.metrics.inc_cancelled();
                    return ConnectionOutcome::Unreachable(DialFailure::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    async fn try_once(
        &self,
        endpoint: &EndpointDescriptor,
        cancel: &CancellationToken,
    ) -> ConnectionOutcome<T::Connection> {
        self.metrics.inc_started();
        let started = Instant::now();
        let deadline = started + self.config.timeout.min(MAX_DIAL_TIMEOUT);
        trace!(%endpoint, "Dialing");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.metrics.inc_cancelled();
                debug!(%endpoint, "Dial cancelled");
                return ConnectionOutcome::Unreachable(DialFailure::Cancelled);
            }
            result = self.dial_until(endpoint, deadline) => result,
        };

        let expected = endpoint.peer();
        let outcome = match result {
            None => ConnectionOutcome::Unreachable(DialFailure::TimedOut),
            Some(Err(TransportError::IdentityMismatch { obtained })) => {
                ConnectionOutcome::Rejected(DialFailure::IdentityMismatch { expected, obtained })
            }
            Some(Err(TransportError::Refused(reason) | TransportError::Failed(reason))) => {
                ConnectionOutcome::Unreachable(DialFailure::TransportRefused(reason))
            }
            Some(Err(err)) => {
                ConnectionOutcome::Unreachable(DialFailure::TransportRefused(err.to_string()))
            }
            Some(Ok(connection)) => {
                let obtained = connection.remote_identity();
                if obtained == expected {
                    ConnectionOutcome::Connected(LiveConnection {
                        connection,
                        identity: obtained,
                        latency: started.elapsed(),
                    })
                } else {
                    drop(connection);
                    ConnectionOutcome::Rejected(DialFailure::IdentityMismatch { expected, obtained })
                }
            }
        };

        match outcome.failure() {
            None => {
                self.metrics.inc_connected();
                debug!(%endpoint, latency = ?started.elapsed(), "Dial succeeded");
            }
            Some(failure) => {
                self.metrics.inc_failed();
                debug!(%endpoint, reason = %failure, "Dial failed");
            }
        }
        outcome
    }

    /// Dial until the transport answers with anything but a refusal.
    ///
    /// Refused dials are repeated with backoff. Returns `None` once `deadline`
    /// passes without an answer.
    async fn dial_until(
        &self,
        endpoint: &EndpointDescriptor,
        deadline: Instant,
    ) -> Option<Result<T::Connection, TransportError>> {
        let mut redial = Backoff::new(self.config.backoff.max(MIN_REDIAL_DELAY));
        let mut last_refusal = None;

        loop {
            match tokio::time::timeout_at(deadline, self.transport.dial(endpoint)).await {
                Ok(Err(TransportError::Refused(reason))) => {
                    trace!(%endpoint, %reason, "Dial refused, redialing");
                    last_refusal = Some(reason);
                }
                Ok(result) => return Some(result),
                Err(_) => break,
            }

            let wake = Instant::now() + redial.next_delay();
            if wake >= deadline {
                tokio::time::sleep_until(deadline).await;
                break;
            }
            tokio::time::sleep_until(wake).await;
        }

        if let Some(reason) = last_refusal {
            debug!(%endpoint, %reason, "Refused until timeout");
        }
        None
    }
}
