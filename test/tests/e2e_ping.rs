/// E2E: round-trip measurement and timestep synchronization.

use std::time::Duration;

use peerlink_test::{Recorder, TestNetwork};

#[test]
fn pong_reports_round_trip_latency() {
    let mut network = TestNetwork::new();
    let index = network.connect_client();
    let pongs = Recorder::attach(&network.server().events().pong_received);

    network.server().ping();
    network.clock.advance(Duration::from_millis(40));
    network.pump();

    let remote = &network.client(index).remote;
    assert_eq!(pongs.len(), 1);
    assert_eq!(pongs.items()[0].latency, Duration::from_millis(40));
    assert_eq!(remote.round_trip_latency(), Duration::from_millis(40));
}

#[test]
fn client_measures_the_server() {
    let mut network = TestNetwork::new();
    let index = network.connect_client();
    let client = network.client(index).worker();
    let pongs = Recorder::attach(&client.events().pong_received);

    client.ping();
    network.clock.advance(Duration::from_millis(15));
    network.pump();

    assert_eq!(pongs.len(), 1);
    assert_eq!(
        network.client(index).server_player().round_trip_latency(),
        Duration::from_millis(15)
    );
}

#[test]
fn pings_are_unreliable() {
    let network = TestNetwork::new();
    let ping = network.server().generate_ping();
    assert!(!ping.reliable);
}

#[test]
fn acceptance_synchronizes_the_client_timestep() {
    let mut network = TestNetwork::new();
    network.clock.advance(Duration::from_secs(3));
    let index = network.add_client();
    let client = network.client(index).worker();
    assert!(!client.time().is_synced());

    client.identify(&[]).unwrap();
    network.pump();

    assert!(client.time().is_synced());
    assert!(client.time().timestep() >= 3_000);
    assert_eq!(client.time().timestep(), network.server().time().timestep());

    network.clock.advance(Duration::from_millis(250));
    assert_eq!(client.time().timestep(), network.server().time().timestep());
}
