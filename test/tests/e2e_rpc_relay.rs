/// E2E: rpc and binary data routing between a server and two clients,
/// for every receivers mode, plus the ownership rules the server enforces.

use std::sync::Arc;

use peerlink_engine::codec::{ByteWriter, Serde};
use peerlink_engine::object::rpc::{self, ASSIGN_OWNERSHIP_RPC, DESTROY_RPC};
use peerlink_engine::{
    BinaryMessage, Frame, NetworkObject, Receivers, RouterId, WorkerError, SERVER_PLAYER_ID,
};
use peerlink_test::{BehaviorEvent, BehaviorLog, TestNetwork};

const CODE: u32 = 2;

struct Scene {
    network: TestNetwork,
    server_log: BehaviorLog,
    logs: [BehaviorLog; 2],
    object: Arc<NetworkObject>,
}

impl Scene {
    /// Server-owned object known to a server and two clients
    fn new() -> Self {
        let mut network = TestNetwork::new();
        let server_log = BehaviorLog::new();
        server_log.install(network.server(), CODE);

        let logs = [BehaviorLog::new(), BehaviorLog::new()];
        for log in &logs {
            let index = network.add_client();
            log.install(network.client(index).worker(), CODE);
            network.client(index).worker().identify(&[]).unwrap();
            network.pump();
        }

        let object = network.server().create_object(CODE, Vec::new()).unwrap();
        network.pump();

        Self {
            network,
            server_log,
            logs,
            object,
        }
    }

    fn id(&self) -> u32 {
        self.object.network_id()
    }

    fn replica(&self, index: usize) -> Arc<NetworkObject> {
        self.network
            .client(index)
            .worker()
            .objects()
            .get(self.id())
            .unwrap()
    }

    fn player_id(&self, index: usize) -> u32 {
        self.network.client(index).remote.network_id()
    }

    fn client_rpc(&self, index: usize, method: u8, receivers: Receivers) {
        let replica = self.replica(index);
        self.network
            .client(index)
            .worker()
            .send_rpc(&replica, method, &[method], receivers)
            .unwrap();
        self.network.pump();
    }
}

#[test]
fn server_rpc_to_all_runs_everywhere() {
    let scene = Scene::new();
    scene
        .network
        .server()
        .send_rpc(&scene.object, 10, &[1, 2], Receivers::All)
        .unwrap();
    scene.network.pump();

    assert_eq!(scene.server_log.rpc_methods(scene.id()), vec![10]);
    for log in &scene.logs {
        assert_eq!(
            log.events_for(scene.id()),
            vec![
                BehaviorEvent::Confirmed,
                BehaviorEvent::Rpc {
                    method: 10,
                    args: vec![1, 2],
                    sender: SERVER_PLAYER_ID,
                },
            ]
        );
    }
}

#[test]
fn client_rpc_to_others_skips_the_sender() {
    let scene = Scene::new();
    scene.client_rpc(0, 11, Receivers::Others);

    assert!(scene.logs[0].rpc_methods(scene.id()).is_empty());
    assert_eq!(scene.logs[1].rpc_methods(scene.id()), vec![11]);
    assert_eq!(scene.server_log.rpc_methods(scene.id()), vec![11]);

    let on_server = scene.server_log.events_for(scene.id());
    assert!(on_server.contains(&BehaviorEvent::Rpc {
        method: 11,
        args: vec![11],
        sender: scene.player_id(0),
    }));
}

#[test]
fn client_rpc_to_all_includes_the_sender() {
    let scene = Scene::new();
    scene.client_rpc(0, 12, Receivers::All);

    assert_eq!(scene.logs[0].rpc_methods(scene.id()), vec![12]);
    assert_eq!(scene.logs[1].rpc_methods(scene.id()), vec![12]);
    assert_eq!(scene.server_log.rpc_methods(scene.id()), vec![12]);
}

#[test]
fn client_rpc_to_server_stays_on_the_server() {
    let scene = Scene::new();
    scene.client_rpc(1, 13, Receivers::Server);

    assert_eq!(scene.server_log.rpc_methods(scene.id()), vec![13]);
    assert!(scene.logs[0].rpc_methods(scene.id()).is_empty());
    assert!(scene.logs[1].rpc_methods(scene.id()).is_empty());
}

#[test]
fn owner_rpc_follows_ownership() {
    let scene = Scene::new();

    // the server owns it
    scene.client_rpc(0, 14, Receivers::Owner);
    assert_eq!(scene.server_log.rpc_methods(scene.id()), vec![14]);

    scene
        .network
        .server()
        .assign_ownership(&scene.object, scene.player_id(1))
        .unwrap();
    scene.network.pump();

    assert!(!scene.object.is_owner());
    assert_eq!(scene.object.owner_id(), scene.player_id(1));
    assert!(scene.replica(1).is_owner());
    assert!(!scene.replica(0).is_owner());
    assert_eq!(scene.replica(0).owner_id(), scene.player_id(1));
    assert!(scene.logs[1]
        .events_for(scene.id())
        .contains(&BehaviorEvent::OwnershipChanged(true)));

    scene.client_rpc(0, 15, Receivers::Owner);
    assert_eq!(scene.logs[1].rpc_methods(scene.id()), vec![15]);
    assert_eq!(scene.server_log.rpc_methods(scene.id()), vec![14]);
    assert!(scene.logs[0].rpc_methods(scene.id()).is_empty());

    // the owner addressing itself never leaves the process
    scene.network.client(1).transport().clear_history();
    scene.client_rpc(1, 16, Receivers::Owner);
    assert_eq!(scene.logs[1].rpc_methods(scene.id()), vec![15, 16]);
    assert!(scene.network.client(1).transport().sent_frames().is_empty());
}

#[test]
fn binary_data_reaches_other_peers() {
    let scene = Scene::new();
    let replica = scene.replica(0);
    scene
        .network
        .client(0)
        .worker()
        .send_binary_data(&replica, 7, &[4, 5], Receivers::Others)
        .unwrap();
    scene.network.pump();

    let expected = BehaviorEvent::BinaryData {
        sub_router: 7,
        data: vec![4, 5],
    };
    assert!(scene.logs[1].events_for(scene.id()).contains(&expected));
    assert!(scene.server_log.events_for(scene.id()).contains(&expected));
    assert!(!scene.logs[0].events_for(scene.id()).contains(&expected));
}

#[test]
fn reserved_methods_are_refused() {
    let scene = Scene::new();
    let server = scene.network.server();

    for method in [DESTROY_RPC, ASSIGN_OWNERSHIP_RPC, 2, 3] {
        assert_eq!(
            server.send_rpc(&scene.object, method, &[], Receivers::All),
            Err(WorkerError::ReservedRpcMethod { method })
        );
    }
    assert_eq!(
        server.send_binary_data(&scene.object, rpc::DIRTY_FIELDS_SUB_ROUTER, &[], Receivers::All),
        Err(WorkerError::ReservedRpcMethod { method: 1 })
    );
    assert_eq!(
        server.send_rpc(&scene.object, rpc::FIRST_APPLICATION_RPC, &[], Receivers::Server),
        Ok(())
    );
}

#[test]
fn unregistered_object_cannot_send() {
    let scene = Scene::new();
    let loose = Arc::new(NetworkObject::new(CODE, Vec::new()));
    assert_eq!(
        scene
            .network
            .server()
            .send_rpc(&loose, 20, &[], Receivers::All),
        Err(WorkerError::ObjectNotRegistered)
    );
}

#[test]
fn clients_cannot_take_or_destroy_what_they_do_not_own() {
    let scene = Scene::new();
    let client = scene.network.client(0).worker();
    let replica = scene.replica(0);

    assert_eq!(
        client.assign_ownership(&replica, scene.player_id(0)),
        Err(WorkerError::WrongHostType {
            operation: "assign_ownership"
        })
    );
    assert_eq!(
        client.destroy_object(&replica),
        Err(WorkerError::NotOwner {
            network_id: scene.id()
        })
    );

    // a hand-made ownership grab is dropped by the server
    let mut args = ByteWriter::new();
    scene.player_id(0).ser(&mut args);
    let grab = Frame::binary(
        0,
        BinaryMessage::new(
            RouterId::Rpc,
            scene.id(),
            rpc::encode_call(ASSIGN_OWNERSHIP_RPC, &args.to_bytes()),
        ),
    )
    .with_receivers(Receivers::All);
    client
        .send_to(&scene.network.client(0).server_player(), &grab)
        .unwrap();

    let forged_destroy = Frame::binary(
        0,
        BinaryMessage::new(RouterId::Rpc, scene.id(), rpc::encode_call(DESTROY_RPC, &[])),
    )
    .with_receivers(Receivers::Others);
    client
        .send_to(&scene.network.client(0).server_player(), &forged_destroy)
        .unwrap();
    scene.network.pump();

    assert_eq!(scene.object.owner_id(), SERVER_PLAYER_ID);
    assert!(scene.object.is_owner());
    assert!(!scene.object.is_destroyed());
    assert!(!scene.replica(1).is_destroyed());
}

#[test]
fn server_destroy_reaches_every_client() {
    let scene = Scene::new();
    scene.network.server().destroy_object(&scene.object).unwrap();
    scene.network.pump();

    assert!(scene.object.is_destroyed());
    assert!(scene.network.server().objects().get(scene.id()).is_none());
    for (index, log) in scene.logs.iter().enumerate() {
        assert!(scene
            .network
            .client(index)
            .worker()
            .objects()
            .get(scene.id())
            .is_none());
        assert_eq!(log.events_for(scene.id()).last(), Some(&BehaviorEvent::Destroyed));
    }
}
