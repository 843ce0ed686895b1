/// E2E: application frames that do not address an object.

use peerlink_engine::{BinaryMessage, Frame, FrameBody, GroupId, Receivers, RouterId};
use peerlink_test::{Recorder, TestNetwork};

#[test]
fn client_text_is_relayed_to_others() {
    let mut network = TestNetwork::new();
    let sender = network.connect_client();
    let other = network.connect_client();
    let on_server = Recorder::attach(&network.server().events().text_message_received);
    let on_other = Recorder::attach(&network.client(other).worker().events().text_message_received);
    let on_sender = Recorder::attach(&network.client(sender).worker().events().text_message_received);

    let client = network.client(sender).worker();
    let frame = client
        .frame(GroupId::Application(30), FrameBody::Text("gg".to_string()))
        .with_receivers(Receivers::Others);
    client.send_to(&network.client(sender).server_player(), &frame).unwrap();
    network.pump();

    assert_eq!(on_server.len(), 1);
    assert_eq!(on_server.items()[0].text, "gg");
    assert_eq!(
        on_server.items()[0].player.network_id(),
        network.client(sender).remote.network_id()
    );
    assert_eq!(on_other.len(), 1);
    assert!(on_sender.is_empty());
}

#[test]
fn targeted_raw_frames_stay_on_the_server() {
    let mut network = TestNetwork::new();
    let sender = network.connect_client();
    let other = network.connect_client();
    let on_server = Recorder::attach(&network.server().events().message_received);
    let on_other = Recorder::attach(&network.client(other).worker().events().message_received);

    let client = network.client(sender).worker();
    let frame = client.frame(GroupId::Application(31), FrameBody::Raw(vec![1, 2, 3]));
    client.send_to(&network.client(sender).server_player(), &frame).unwrap();
    network.pump();

    assert_eq!(on_server.len(), 1);
    assert_eq!(on_server.items()[0].frame.body, FrameBody::Raw(vec![1, 2, 3]));
    assert!(on_other.is_empty());
}

#[test]
fn application_router_reaches_every_client() {
    let mut network = TestNetwork::new();
    let first = network.connect_client();
    let second = network.connect_client();
    let recorders = [first, second]
        .map(|index| Recorder::attach(&network.client(index).worker().events().binary_message_received));

    let frame = Frame::binary(0, BinaryMessage::new(RouterId::Other(40), 0, vec![6]));
    network.server().broadcast(&frame, None);
    network.pump();

    for recorder in &recorders {
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.items()[0].message.router_id, RouterId::Other(40));
        assert_eq!(recorder.items()[0].message.payload, vec![6]);
    }
}

#[test]
fn server_broadcast_can_skip_a_player() {
    let mut network = TestNetwork::new();
    let skipped = network.connect_client();
    let reached = network.connect_client();
    let on_skipped = Recorder::attach(&network.client(skipped).worker().events().text_message_received);
    let on_reached = Recorder::attach(&network.client(reached).worker().events().text_message_received);

    let frame = network
        .server()
        .frame(GroupId::Application(16), FrameBody::Text("hi".to_string()));
    network
        .server()
        .broadcast(&frame, Some(network.client(skipped).remote.network_id()));
    network.pump();

    assert!(on_skipped.is_empty());
    assert_eq!(on_reached.len(), 1);
}

#[test]
fn bandwidth_is_counted_both_ways() {
    let mut network = TestNetwork::new();
    let index = network.connect_client();

    let server_bandwidth = network.server.session.bandwidth();
    let client_bandwidth = network.client(index).peer.session.bandwidth();
    assert!(server_bandwidth.bytes_in() > 0);
    assert!(server_bandwidth.bytes_out() > 0);
    assert_eq!(server_bandwidth.bytes_in(), client_bandwidth.bytes_out());
    assert_eq!(server_bandwidth.bytes_out(), client_bandwidth.bytes_in());
}
