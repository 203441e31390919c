//! Dialer Metrics

use metrics::Counter;

/// Dialer Metrics
#[derive(Clone, Debug)]
pub(crate) struct DialerMetrics {
    /// Number of individual dial tries started
    started_total: Counter,
    /// Number of tries that produced a verified connection
    connected_total: Counter,
    /// Number of tries that ended unreachable or rejected
    failed_total: Counter,
    /// Number of tries abandoned through cancellation
    cancelled_total: Counter,
}

impl Default for DialerMetrics {
    fn default() -> Self {
        Self {
            started_total: metrics::counter!("dialer.dials_started_total"),
            connected_total: metrics::counter!("dialer.dials_connected_total"),
            failed_total: metrics::counter!("dialer.dials_failed_total"),
            cancelled_total: metrics::counter!("dialer.dials_cancelled_total"),
        }
    }
}

impl DialerMetrics {
    pub(crate) fn inc_started(&self) {
        self.started_total.increment(1);
    }

    pub(crate) fn inc_connected(&self) {
        self.connected_total.increment(1);
    }

    pub(crate) fn inc_failed(&self) {
        self.failed_total.increment(1);
    }

    pub(crate) fn inc_cancelled(&self) {
        self.cancelled_total.increment(1);
    }
}
