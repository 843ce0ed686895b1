/// E2E: a player accepted at time T receives every object initialized before
/// T in its AcceptMulti batch and every later object through the create
/// broadcast, never both and never neither.

use std::collections::HashMap;
use std::thread;

use peerlink_engine::codec::{ByteReader, Serde};
use peerlink_engine::{CreatePayload, Frame, NetworkId, RouterId};
use peerlink_test::{Recorder, TestNetwork};

/// How many times each object id was announced in `frames`
fn announcements(frames: &[Frame]) -> HashMap<NetworkId, usize> {
    let mut counts = HashMap::new();
    for frame in frames {
        let Some(message) = frame.as_binary() else {
            continue;
        };
        match message.router_id {
            RouterId::NetworkObject => {
                *counts.entry(message.network_id).or_insert(0) += 1;
            }
            RouterId::AcceptMulti => {
                let mut reader = ByteReader::new(&message.payload);
                let count = u32::de(&mut reader).unwrap();
                for _ in 0..count {
                    let network_id = u32::de(&mut reader).unwrap();
                    CreatePayload::de(&mut reader).unwrap();
                    *counts.entry(network_id).or_insert(0) += 1;
                }
            }
            _ => {}
        }
    }
    counts
}

fn accept_multi_batches(frames: &[Frame]) -> usize {
    frames
        .iter()
        .filter_map(|frame| frame.as_binary())
        .filter(|message| message.router_id == RouterId::AcceptMulti)
        .count()
}

#[test]
fn late_joiner_receives_existing_objects_in_one_batch() {
    let mut network = TestNetwork::new();
    let first = network.server().create_object(7, vec![1]).unwrap();
    let second = network.server().create_object(7, vec![2]).unwrap();

    let index = network.add_client();
    let created = Recorder::attach(&network.client(index).worker().events().object_created);
    network.client(index).worker().identify(&[]).unwrap();
    network.pump();

    let client = network.client(index).worker();
    assert!(client.me().is_accepted());
    assert_eq!(client.me().network_id(), network.client(index).remote.network_id());

    let ids: Vec<NetworkId> = created
        .items()
        .iter()
        .map(|event| event.object.network_id())
        .collect();
    assert_eq!(ids, vec![first.network_id(), second.network_id()]);

    let replica = client.objects().get(second.network_id()).unwrap();
    assert_eq!(replica.metadata().to_vec(), vec![2]);
    assert_eq!(replica.create_code(), 7);
    assert!(!replica.is_owner());
    assert!(replica.is_confirmed());

    let sent = network
        .server
        .transport
        .sent_to(network.client(index).remote.network_id());
    assert_eq!(accept_multi_batches(&sent), 1);
}

#[test]
fn objects_created_after_accept_use_the_broadcast() {
    let mut network = TestNetwork::new();
    network.server().create_object(1, Vec::new()).unwrap();
    let index = network.connect_client();

    let later = network.server().create_object(1, Vec::new()).unwrap();
    network.pump();

    let remote_id = network.client(index).remote.network_id();
    let sent = network.server.transport.sent_to(remote_id);
    let counts = announcements(&sent);

    assert_eq!(accept_multi_batches(&sent), 1);
    assert_eq!(counts.len(), 2);
    assert!(counts.values().all(|count| *count == 1));
    assert!(network
        .client(index)
        .worker()
        .objects()
        .contains(later.network_id()));
}

#[test]
fn empty_world_sends_no_batch() {
    let mut network = TestNetwork::new();
    let index = network.connect_client();

    let sent = network
        .server
        .transport
        .sent_to(network.client(index).remote.network_id());
    assert_eq!(accept_multi_batches(&sent), 0);
    assert!(network.client(index).worker().objects().is_empty());
}

#[test]
fn concurrent_creation_during_accept_announces_each_object_once() {
    const OBJECTS: usize = 40;

    for _ in 0..10 {
        let mut network = TestNetwork::new();
        let index = network.add_client();

        let server = network.server().clone();
        let creator = thread::spawn(move || {
            for i in 0..OBJECTS {
                server.create_object(1, vec![i as u8]).unwrap();
            }
        });

        network.client(index).worker().identify(&[]).unwrap();
        network.pump();
        creator.join().unwrap();
        network.pump();

        let remote_id = network.client(index).remote.network_id();
        let counts = announcements(&network.server.transport.sent_to(remote_id));

        assert_eq!(counts.len(), OBJECTS, "every object reaches the new player");
        assert!(
            counts.values().all(|count| *count == 1),
            "no object is announced twice: {:?}",
            counts
        );
        assert_eq!(network.client(index).worker().objects().len(), OBJECTS);
    }
}
