//! Bootstrap round policy.

use rand::seq::SliceRandom;

/// Default number of distinct peers after which a round stops early.
pub const DEFAULT_TARGET_CONNECTIONS: usize = 1;

/// Default bound on simultaneous dials.
pub const DEFAULT_MAX_CONCURRENT_DIALS: usize = 8;

/// Controls how a round fans out and when it stops.
///
/// A round succeeds when at least one endpoint connects. `target_connections`
/// only decides how early it may stop: `0` waits for every endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPolicy {
    target_connections: usize,
    max_concurrent_dials: usize,
    shuffle: bool,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            target_connections: DEFAULT_TARGET_CONNECTIONS,
            max_concurrent_dials: DEFAULT_MAX_CONCURRENT_DIALS,
            shuffle: false,
        }
    }
}

impl BootstrapPolicy {
    pub fn with_target_connections(mut self, target: usize) -> Self {
        self.target_connections = target;
        self
    }

    pub fn with_max_concurrent_dials(mut self, limit: usize) -> Self {
        self.max_concurrent_dials = limit;
        self
    }

    /// Dial endpoints in random order to spread load across bootstrap peers.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn target_connections(&self) -> usize {
        self.target_connections
    }

    /// Effective concurrency bound, never below one.
    pub fn max_concurrent_dials(&self) -> usize {
        self.max_concurrent_dials.max(1)
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Whether `connected` distinct peers end the round early.
    pub fn target_reached(&self, connected: usize) -> bool {
        self.target_connections > 0 && connected >= self.target_connections
    }

    /// Put `items` into dial order.
    pub(crate) fn arrange<T>(&self, items: &mut [T]) {
        if self.shuffle {
            items.shuffle(&mut rand::rng());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = BootstrapPolicy::default();
        assert_eq!(policy.target_connections(), 1);
        assert_eq!(policy.max_concurrent_dials(), 8);
        assert!(!policy.shuffle());
    }

    #[test]
    fn zero_concurrency_is_one() {
        let policy = BootstrapPolicy::default().with_max_concurrent_dials(0);
        assert_eq!(policy.max_concurrent_dials(), 1);
    }

    #[test]
    fn target_reached() {
        let policy = BootstrapPolicy::default().with_target_connections(2);
        assert!(!policy.target_reached(1));
        assert!(policy.target_reached(2));

        let unbounded = BootstrapPolicy::default().with_target_connections(0);
        assert!(!unbounded.target_reached(100));
    }

    #[test]
    fn arrange_keeps_order_without_shuffle() {
        let mut items = vec![1, 2, 3, 4];
        BootstrapPolicy::default().arrange(&mut items);
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn arrange_shuffle_is_permutation() {
        let mut items: Vec<_> = (0..32).collect();
        BootstrapPolicy::default().with_shuffle(true).arrange(&mut items);
        items.sort_unstable();
        assert_eq!(items, (0..32).collect::<Vec<_>>());
    }
}
