use std::{sync::Arc, time::Duration};

use ant_net_bootstrap::{BootstrapCoordinator, BootstrapError, BootstrapPolicy, BootstrapState};
use ant_net_dialer::{DialFailure, Dialer, DialerConfig};
use ant_net_multiaddr::PeerIdentity;
use ant_test_utils::{MockTransport, endpoint, endpoint_for, init_tracing};
use assert_matches::assert_matches;
use tokio::time::Instant;

const MS: Duration = Duration::from_millis(1);

fn coordinator(
    transport: MockTransport,
    policy: BootstrapPolicy,
) -> BootstrapCoordinator<MockTransport> {
    let config = DialerConfig::default().with_timeout(Duration::from_secs(1));
    BootstrapCoordinator::new(Dialer::new(transport, config), policy)
}

#[tokio::test(start_paused = true)]
async fn empty_input_dials_nothing() {
    init_tracing();
    let transport = MockTransport::new();
    let stats = transport.stats();
    let coordinator = coordinator(transport, BootstrapPolicy::default());

    let result = coordinator.bootstrap(&[]).await;

    assert_matches!(result, Err(BootstrapError::NoPeersConfigured));
    assert_eq!(stats.started(), 0);
    assert_eq!(coordinator.state(), BootstrapState::Failed);
}

#[tokio::test(start_paused = true)]
async fn all_failures_reported_in_input_order() {
    let endpoints = [endpoint(4001), endpoint(4002), endpoint(4003)];
    let impostor = PeerIdentity::random();
    let transport = MockTransport::new()
        .fail(&endpoints[0], "refused", MS * 300)
        .hang(&endpoints[1])
        .accept_as(&endpoints[2], impostor, MS * 10);
    let coordinator = coordinator(transport, BootstrapPolicy::default());

    let result = coordinator.bootstrap(&endpoints).await;

    let failures = assert_matches!(result, Err(BootstrapError::AllPeersUnreachable(f)) => f);
    let indices: Vec<_> = failures.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(failures[0].endpoint, endpoints[0]);
    assert_eq!(failures[0].reason, DialFailure::TransportRefused("refused".into()));
    assert_eq!(failures[1].reason, DialFailure::TimedOut);
    assert_eq!(
        failures[2].reason,
        DialFailure::IdentityMismatch {
            expected: endpoints[2].peer(),
            obtained: impostor,
        }
    );
    assert_eq!(coordinator.state(), BootstrapState::Failed);
}

#[tokio::test(start_paused = true)]
async fn early_stop_cancels_pending_dials() {
    let endpoints = [endpoint(4001), endpoint(4002), endpoint(4003)];
    let transport = MockTransport::new()
        .hang(&endpoints[0])
        .accept(&endpoints[1], MS * 10)
        .accept(&endpoints[2], MS * 500);
    let stats = transport.stats();
    let coordinator = coordinator(transport, BootstrapPolicy::default());

    let result = coordinator.bootstrap(&endpoints).await.unwrap();

    assert_eq!(result.peer_count(), 1);
    assert_eq!(result.connected[0].index, 1);
    assert_eq!(result.connected[0].identity, endpoints[1].peer());
    assert!(result.failures.is_empty());
    assert_eq!(stats.in_flight(), 0);
    assert_eq!(stats.cancelled(), 2);
    assert_eq!(stats.open_connections(), 1);
    assert_eq!(coordinator.state(), BootstrapState::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn partial_success_below_target() {
    let endpoints = [endpoint(4001), endpoint(4002), endpoint(4003)];
    let transport = MockTransport::new()
        .fail(&endpoints[0], "refused", MS)
        .accept(&endpoints[1], MS * 20)
        .fail(&endpoints[2], "refused", MS * 5);
    let policy = BootstrapPolicy::default().with_target_connections(3);
    let coordinator = coordinator(transport, policy);

    let result = coordinator.bootstrap(&endpoints).await.unwrap();

    assert_eq!(result.identities().collect::<Vec<_>>(), vec![endpoints[1].peer()]);
    let failed: Vec<_> = result.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![0, 2]);
}

#[tokio::test(start_paused = true)]
async fn duplicate_identity_is_closed() {
    let peer = PeerIdentity::random();
    let endpoints = [endpoint_for(4001, peer), endpoint_for(4002, peer), endpoint(4003)];
    let transport = MockTransport::new()
        .accept(&endpoints[0], MS * 10)
        .accept(&endpoints[1], MS * 20)
        .accept(&endpoints[2], MS * 30);
    let stats = transport.stats();
    let policy = BootstrapPolicy::default().with_target_connections(0);
    let coordinator = coordinator(transport, policy);

    let result = coordinator.bootstrap(&endpoints).await.unwrap();

    let indices: Vec<_> = result.connected.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(stats.open_connections(), 2);
    assert_eq!(stats.closed_connections(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrency_is_bounded() {
    let endpoints: Vec<_> = (0..6).map(|i| endpoint(4001 + i)).collect();
    let transport = endpoints
        .iter()
        .fold(MockTransport::new(), |t, e| t.accept(e, MS * 100));
    let stats = transport.stats();
    let policy = BootstrapPolicy::default()
        .with_target_connections(0)
        .with_max_concurrent_dials(2);
    let coordinator = coordinator(transport, policy);

    let started = Instant::now();
    let result = coordinator.bootstrap(&endpoints).await.unwrap();

    assert_eq!(result.peer_count(), 6);
    assert_eq!(stats.max_in_flight(), 2);
    assert!(started.elapsed() >= MS * 300);
}

#[tokio::test(start_paused = true)]
async fn dials_run_concurrently() {
    let endpoints: Vec<_> = (0..4).map(|i| endpoint(4001 + i)).collect();
    let transport = endpoints.iter().fold(MockTransport::new(), |t, e| t.hang(e));
    let coordinator = coordinator(transport, BootstrapPolicy::default());

    let started = Instant::now();
    let result = coordinator.bootstrap(&endpoints).await;

    assert_matches!(result, Err(BootstrapError::AllPeersUnreachable(f)) if f.len() == 4);
    // Four one-second timeouts overlap.
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn shuffle_keeps_reported_order() {
    let endpoints: Vec<_> = (0..8).map(|i| endpoint(4001 + i)).collect();
    let transport = endpoints
        .iter()
        .fold(MockTransport::new(), |t, e| t.fail(e, "refused", MS));
    let stats = transport.stats();
    let policy = BootstrapPolicy::default()
        .with_shuffle(true)
        .with_max_concurrent_dials(1);
    let coordinator = coordinator(transport, policy);

    let failures = assert_matches!(
        coordinator.bootstrap(&endpoints).await,
        Err(BootstrapError::AllPeersUnreachable(f)) => f
    );

    let indices: Vec<_> = failures.iter().map(|f| f.index).collect();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
    assert_eq!(stats.started(), 8);
}

#[tokio::test(start_paused = true)]
async fn dropping_round_cancels_dials() {
    let endpoints = [endpoint(4001), endpoint(4002)];
    let transport = MockTransport::new().hang(&endpoints[0]).hang(&endpoints[1]);
    let stats = transport.stats();
    let config = DialerConfig::default().with_timeout(Duration::from_secs(60));
    let coordinator =
        BootstrapCoordinator::new(Dialer::new(transport, config), BootstrapPolicy::default());

    let timed_out = tokio::time::timeout(MS * 100, coordinator.bootstrap(&endpoints)).await;
    assert!(timed_out.is_err());

    // Let the runtime drop the aborted tasks.
    tokio::time::sleep(MS).await;
    assert_eq!(stats.started(), 2);
    assert_eq!(stats.in_flight(), 0);
    assert_eq!(stats.cancelled(), 2);
    assert_eq!(coordinator.state(), BootstrapState::Idle);
}

#[tokio::test(start_paused = true)]
async fn new_round_after_terminal_state() {
    let good = endpoint(4001);
    let bad = endpoint(4002);
    let transport = MockTransport::new()
        .accept(&good, MS)
        .fail(&bad, "refused", MS);
    let coordinator = coordinator(transport, BootstrapPolicy::default());
    assert_eq!(coordinator.state(), BootstrapState::Idle);

    let first = coordinator.bootstrap(std::slice::from_ref(&good)).await;
    assert!(first.is_ok());
    assert_eq!(coordinator.state(), BootstrapState::Succeeded);

    let second = coordinator.bootstrap(std::slice::from_ref(&bad)).await;
    assert_matches!(second, Err(BootstrapError::AllPeersUnreachable(_)));
    assert_eq!(coordinator.state(), BootstrapState::Failed);
}

#[tokio::test(start_paused = true)]
async fn overlapping_round_is_refused() {
    let hung = endpoint(4001);
    let other = endpoint(4002);
    let transport = MockTransport::new().hang(&hung).accept(&other, MS);
    let stats = transport.stats();
    let coordinator = Arc::new(coordinator(transport, BootstrapPolicy::default()));

    let running = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.bootstrap(&[hung]).await.map(|result| result.peer_count()) }
    });
    tokio::time::sleep(MS * 10).await;
    assert_eq!(coordinator.state(), BootstrapState::Dialing);

    let second = coordinator.bootstrap(std::slice::from_ref(&other)).await;
    assert_matches!(second, Err(BootstrapError::RoundInProgress));
    assert_eq!(stats.started(), 1);
    assert_eq!(coordinator.state(), BootstrapState::Dialing);

    let first = running.await.unwrap();
    assert_matches!(first, Err(BootstrapError::AllPeersUnreachable(f)) if f.len() == 1);
    assert_eq!(coordinator.state(), BootstrapState::Failed);
}
