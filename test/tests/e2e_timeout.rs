/// E2E: silent peers are timed out, pings keep live ones around.

use std::time::Duration;

use peerlink_engine::{WorkerConfig, WorkerState};
use peerlink_test::{Recorder, TestNetwork};

fn config(ping_interval: Duration) -> WorkerConfig {
    WorkerConfig {
        spawn_heartbeat_thread: false,
        ping_interval,
        player_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

#[test]
fn silent_peers_time_out_on_both_sides() {
    let mut network = TestNetwork::with_config(config(Duration::ZERO));
    let index = network.connect_client();
    let server_timeouts = Recorder::attach(&network.server().events().player_timeout);
    let client_timeouts = Recorder::attach(&network.client(index).worker().events().player_timeout);
    let client_disconnected = Recorder::attach(&network.client(index).worker().events().disconnected);

    network.run_for(Duration::from_millis(400));
    assert!(server_timeouts.is_empty());
    assert!(client_timeouts.is_empty());

    network.run_for(Duration::from_millis(200));

    assert_eq!(server_timeouts.len(), 1);
    assert_eq!(
        server_timeouts.items()[0].network_id(),
        network.client(index).remote.network_id()
    );
    assert!(network.server().players().is_empty());
    assert_eq!(
        network.server.transport.disconnected_players(),
        vec![(network.client(index).remote.network_id(), true)]
    );

    assert_eq!(client_timeouts.len(), 1);
    assert_eq!(client_disconnected.items(), vec![true]);
    assert_eq!(network.client(index).worker().state(), WorkerState::Disposed);
}

#[test]
fn pings_keep_players_connected() {
    let mut network = TestNetwork::with_config(config(Duration::from_millis(100)));
    let index = network.connect_client();
    let server_timeouts = Recorder::attach(&network.server().events().player_timeout);
    let pongs = Recorder::attach(&network.server().events().pong_received);

    network.run_for(Duration::from_secs(2));

    assert!(server_timeouts.is_empty());
    assert!(!pongs.is_empty());
    assert_eq!(network.server().players().len(), 1);
    assert!(network.client(index).worker().is_bound());
}

#[test]
fn timeout_is_disabled_by_zero() {
    let mut network = TestNetwork::with_config(WorkerConfig {
        spawn_heartbeat_thread: false,
        ping_interval: Duration::ZERO,
        player_timeout: Duration::ZERO,
        ..Default::default()
    });
    network.connect_client();
    let server_timeouts = Recorder::attach(&network.server().events().player_timeout);

    network.run_for(Duration::from_secs(1));

    assert!(server_timeouts.is_empty());
    assert_eq!(network.server().players().len(), 1);
}
