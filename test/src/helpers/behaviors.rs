use std::sync::{Arc, Mutex};

use peerlink_engine::{NetWorker, NetworkId, NetworkObject, ObjectBehavior, PlayerId, RpcCall, Timestep};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BehaviorEvent {
    Rpc { method: u8, args: Vec<u8>, sender: PlayerId },
    BinaryData { sub_router: u8, data: Vec<u8> },
    DirtyFields { data: Vec<u8>, timestep: Timestep },
    Confirmed,
    OwnershipChanged(bool),
    Destroyed,
}

/// Shared record of what every `RecordingBehavior` of one factory saw
#[derive(Clone, Default)]
pub struct BehaviorLog {
    events: Arc<Mutex<Vec<(NetworkId, BehaviorEvent)>>>,
    dirty: Arc<Mutex<Option<Vec<u8>>>>,
}

impl BehaviorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(NetworkId, BehaviorEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, network_id: NetworkId) -> Vec<BehaviorEvent> {
        self.events()
            .into_iter()
            .filter(|(id, _)| *id == network_id)
            .map(|(_, event)| event)
            .collect()
    }

    /// Methods of every rpc `network_id` received, in order
    pub fn rpc_methods(&self, network_id: NetworkId) -> Vec<u8> {
        self.events_for(network_id)
            .into_iter()
            .filter_map(|event| match event {
                BehaviorEvent::Rpc { method, .. } => Some(method),
                _ => None,
            })
            .collect()
    }

    /// The next `write_dirty_fields` call returns these bytes
    pub fn set_dirty(&self, data: Vec<u8>) {
        *self.dirty.lock().unwrap() = Some(data);
    }

    fn record(&self, object: &NetworkObject, event: BehaviorEvent) {
        self.events
            .lock()
            .unwrap()
            .push((object.network_id(), event));
    }

    /// Registers a factory for `create_code` on `worker` whose behaviors all
    /// report to this log
    pub fn install(&self, worker: &NetWorker, create_code: u32) {
        let log = self.clone();
        worker.factories().register(create_code, move |_object: &NetworkObject| {
            Box::new(RecordingBehavior { log: log.clone() }) as Box<dyn ObjectBehavior>
        });
    }
}

pub struct RecordingBehavior {
    log: BehaviorLog,
}

impl RecordingBehavior {
    pub fn new(log: BehaviorLog) -> Self {
        Self { log }
    }
}

impl ObjectBehavior for RecordingBehavior {
    fn on_rpc(&mut self, object: &NetworkObject, call: &RpcCall) {
        self.log.record(
            object,
            BehaviorEvent::Rpc {
                method: call.method,
                args: call.args.clone(),
                sender: call.sender,
            },
        );
    }

    fn on_binary_data(&mut self, object: &NetworkObject, sub_router: u8, data: &[u8]) {
        self.log.record(
            object,
            BehaviorEvent::BinaryData {
                sub_router,
                data: data.to_vec(),
            },
        );
    }

    fn write_dirty_fields(&mut self, _object: &NetworkObject) -> Option<Vec<u8>> {
        self.log.dirty.lock().unwrap().take()
    }

    fn read_dirty_fields(&mut self, object: &NetworkObject, data: &[u8], timestep: Timestep) {
        self.log.record(
            object,
            BehaviorEvent::DirtyFields {
                data: data.to_vec(),
                timestep,
            },
        );
    }

    fn on_create_confirmed(&mut self, object: &NetworkObject) {
        self.log.record(object, BehaviorEvent::Confirmed);
    }

    fn on_ownership_changed(&mut self, object: &NetworkObject, is_owner: bool) {
        self.log.record(object, BehaviorEvent::OwnershipChanged(is_owner));
    }

    fn on_destroyed(&mut self, object: &NetworkObject) {
        self.log.record(object, BehaviorEvent::Destroyed);
    }
}
