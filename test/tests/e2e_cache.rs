/// E2E: clients read the server's cache by key.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use peerlink_engine::cache::CachedValue;
use peerlink_engine::WorkerError;
use peerlink_test::TestNetwork;

type Answers = Arc<Mutex<Vec<Option<CachedValue>>>>;

fn request(network: &TestNetwork, index: usize, key: &str, answers: &Answers) {
    let sink = answers.clone();
    network
        .client(index)
        .worker()
        .cache_request(key, move |value| sink.lock().unwrap().push(value))
        .unwrap();
}

#[test]
fn client_reads_server_cache() {
    let mut network = TestNetwork::new();
    let index = network.connect_client();
    network.server().cache().set("motd", "hello", None);
    network.server().cache().set("round", 3i64, None);

    let answers: Answers = Arc::default();
    request(&network, index, "motd", &answers);
    request(&network, index, "round", &answers);
    request(&network, index, "missing", &answers);
    network.pump();

    assert_eq!(
        *answers.lock().unwrap(),
        vec![
            Some(CachedValue::Text("hello".to_string())),
            Some(CachedValue::Int(3)),
            None,
        ]
    );
}

#[test]
fn expired_entries_are_not_served() {
    let mut network = TestNetwork::new();
    let index = network.connect_client();
    network
        .server()
        .cache()
        .set("token", vec![1u8, 2], Some(Duration::from_millis(100)));

    let answers: Answers = Arc::default();
    request(&network, index, "token", &answers);
    network.pump();
    network.tick(Duration::from_millis(150));
    request(&network, index, "token", &answers);
    network.pump();

    assert_eq!(
        *answers.lock().unwrap(),
        vec![Some(CachedValue::Bytes(vec![1, 2])), None]
    );
    assert!(network.server().cache().is_empty());
}

#[test]
fn only_clients_issue_cache_requests() {
    let network = TestNetwork::new();
    assert_eq!(
        network.server().cache_request("motd", |_| {}),
        Err(WorkerError::WrongHostType {
            operation: "cache_request"
        })
    );
}
