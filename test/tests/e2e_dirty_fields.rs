/// E2E: owners stream dirty fields on their heartbeat, the server relays
/// them and refuses them from anyone else.

use std::time::Duration;

use peerlink_engine::object::rpc::{self, DIRTY_FIELDS_SUB_ROUTER};
use peerlink_engine::{BinaryMessage, Frame, Receivers, RouterId, HEARTBEAT_TICK};
use peerlink_test::{BehaviorEvent, BehaviorLog, TestNetwork};

const CODE: u32 = 6;

fn dirty_data(log: &BehaviorLog, network_id: u32) -> Vec<Vec<u8>> {
    log.events_for(network_id)
        .into_iter()
        .filter_map(|event| match event {
            BehaviorEvent::DirtyFields { data, .. } => Some(data),
            _ => None,
        })
        .collect()
}

fn network_with_logs(clients: usize) -> (TestNetwork, BehaviorLog, Vec<BehaviorLog>) {
    let mut network = TestNetwork::new();
    let server_log = BehaviorLog::new();
    server_log.install(network.server(), CODE);

    let mut logs = Vec::new();
    for _ in 0..clients {
        let index = network.connect_client();
        let log = BehaviorLog::new();
        log.install(network.client(index).worker(), CODE);
        logs.push(log);
    }
    (network, server_log, logs)
}

#[test]
fn server_owned_object_streams_on_its_interval() {
    let (network, server_log, logs) = network_with_logs(2);
    let object = network.server().create_object(CODE, Vec::new()).unwrap();
    object.set_update_interval(Duration::from_millis(50));
    network.pump();

    server_log.set_dirty(vec![7, 7]);
    network.tick(HEARTBEAT_TICK);
    server_log.set_dirty(vec![8]);
    network.run_for(Duration::from_millis(30));

    for log in &logs {
        assert_eq!(dirty_data(log, object.network_id()), vec![vec![7, 7]]);
    }

    network.run_for(Duration::from_millis(30));
    for log in &logs {
        assert_eq!(dirty_data(log, object.network_id()), vec![vec![7, 7], vec![8]]);
    }
    assert!(dirty_data(&server_log, object.network_id()).is_empty());
}

#[test]
fn dirty_fields_carry_the_sender_timestep() {
    let (network, server_log, logs) = network_with_logs(1);
    let object = network.server().create_object(CODE, Vec::new()).unwrap();
    object.set_update_interval(Duration::from_millis(10));
    network.pump();

    network.clock.advance(Duration::from_millis(500));
    server_log.set_dirty(vec![1]);
    network.tick(HEARTBEAT_TICK);

    let timesteps: Vec<u64> = logs[0]
        .events_for(object.network_id())
        .into_iter()
        .filter_map(|event| match event {
            BehaviorEvent::DirtyFields { timestep, .. } => Some(timestep),
            _ => None,
        })
        .collect();
    assert_eq!(timesteps, vec![510]);
}

#[test]
fn client_owned_object_is_relayed_by_the_server() {
    let (network, server_log, logs) = network_with_logs(2);
    let object = network
        .client(0)
        .worker()
        .create_object(CODE, Vec::new())
        .unwrap();
    network.pump();
    object.set_update_interval(Duration::from_millis(20));

    logs[0].set_dirty(vec![3]);
    network.tick(HEARTBEAT_TICK);

    let network_id = object.network_id();
    assert_eq!(dirty_data(&server_log, network_id), vec![vec![3]]);
    assert_eq!(dirty_data(&logs[1], network_id), vec![vec![3]]);
    assert!(dirty_data(&logs[0], network_id).is_empty());
}

#[test]
fn dirty_fields_from_a_non_owner_are_dropped() {
    let (network, server_log, logs) = network_with_logs(2);
    let object = network
        .client(0)
        .worker()
        .create_object(CODE, Vec::new())
        .unwrap();
    network.pump();

    let forged = Frame::binary(
        0,
        BinaryMessage::new(
            RouterId::BinaryData,
            object.network_id(),
            rpc::encode_binary_data(DIRTY_FIELDS_SUB_ROUTER, &[9]),
        ),
    )
    .with_receivers(Receivers::Others);
    network
        .client(1)
        .worker()
        .send_to(&network.client(1).server_player(), &forged)
        .unwrap();
    network.pump();

    assert!(dirty_data(&server_log, object.network_id()).is_empty());
    assert!(dirty_data(&logs[0], object.network_id()).is_empty());
}

#[test]
fn authority_mode_lets_the_server_stream_client_objects() {
    let (network, server_log, logs) = network_with_logs(1);
    let object = network
        .client(0)
        .worker()
        .create_object(CODE, Vec::new())
        .unwrap();
    network.pump();

    let on_server = network.server().objects().get(object.network_id()).unwrap();
    on_server.set_authority_update_mode(true);
    server_log.set_dirty(vec![5]);
    network.tick(HEARTBEAT_TICK);

    assert_eq!(dirty_data(&logs[0], object.network_id()), vec![vec![5]]);
}
