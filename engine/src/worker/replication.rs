use std::sync::Arc;

use log::{debug, info, warn};

use crate::{
    codec::{ByteReader, ByteWriter, Serde, SerdeErr},
    constants::SERVER_PLAYER_ID,
    error::WorkerError,
    events::ObjectCreatedEvent,
    frame::{BinaryMessage, Frame, Receivers, RouterId},
    object::{
        rpc::{self, ASSIGN_OWNERSHIP_RPC, DESTROY_RPC, DIRTY_FIELDS_SUB_ROUTER},
        CreateAction, NetworkObject,
    },
    player::NetworkingPlayer,
    types::{CreateCode, NetworkId, PlayerId},
    worker::{net_worker::encode, NetWorker, WorkerState},
};

/// Describes an object being created. Sent with the NetworkObject router
/// (the object's id travels in the frame header) and, prefixed with the id,
/// inside AcceptMulti batches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatePayload {
    pub create_code: CreateCode,
    pub owner_id: PlayerId,
    /// Nonzero on a client's creation request, echoed back by the server
    pub create_hash: u32,
    pub metadata: Vec<u8>,
}

impl Serde for CreatePayload {
    fn ser(&self, writer: &mut ByteWriter) {
        self.create_code.ser(writer);
        self.owner_id.ser(writer);
        self.create_hash.ser(writer);
        self.metadata.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            create_code: u32::de(reader)?,
            owner_id: u32::de(reader)?,
            create_hash: u32::de(reader)?,
            metadata: Vec::<u8>::de(reader)?,
        })
    }
}

fn decode<T: Serde>(bytes: &[u8]) -> Result<T, SerdeErr> {
    T::de(&mut ByteReader::new(bytes))
}

fn read_announced(reader: &mut ByteReader) -> Result<(NetworkId, CreatePayload), SerdeErr> {
    let network_id = u32::de(reader)?;
    let payload = CreatePayload::de(reader)?;
    Ok((network_id, payload))
}

impl NetWorker {
    // Registration

    /// Reserves an id for `object`: `force_id` if nonzero and never issued,
    /// otherwise the next free one. Returns `Ok(false)` only when the forced
    /// id is taken. Once registered, destroying the object removes it from
    /// this worker
    pub fn register_network_object(
        &self,
        object: &Arc<NetworkObject>,
        force_id: NetworkId,
    ) -> Result<bool, WorkerError> {
        if !object.claim_registrar(self.worker_key) {
            return Err(WorkerError::ObjectAlreadyRegistered {
                network_id: object.network_id(),
            });
        }
        if self.objects.reserve(object, force_id).is_none() {
            object.release_registrar(self.worker_key);
            return Ok(false);
        }

        let worker = self.weak_self.clone();
        object.on_destroy().register(move |network_id| {
            if let Some(worker) = worker.upgrade() {
                worker.objects.remove(*network_id);
            }
        });
        debug!("Registered network object {}", object.network_id());
        Ok(true)
    }

    /// Makes a registered object live: attaches its behavior from the factory,
    /// inserts it into the registry, marks it ready, announces it to accepted
    /// players (server), fires `object_created` and replays frames that
    /// arrived for it early. Returns false if it was already live
    pub fn complete_initialization(&self, object: &Arc<NetworkObject>) -> bool {
        self.activate_object(object, None)
    }

    /// Replays frames buffered for the object's id, in arrival order.
    /// Returns how many were replayed
    pub fn flush_create_actions(&self, object: &Arc<NetworkObject>) -> usize {
        let replayed = self.create_buffer.flush(object);
        if replayed > 0 {
            debug!("Replayed {} buffered frame(s) for object {}", replayed, object.network_id());
        }
        replayed
    }

    fn activate_object(&self, object: &Arc<NetworkObject>, except: Option<PlayerId>) -> bool {
        if !object.has_behavior() {
            if let Some(behavior) = self.factories.build(object) {
                object.attach_behavior(behavior);
            }
        }

        let is_server = self.is_server();
        let recipients = self.objects.complete_initialization(object, || {
            if is_server {
                self.players.accepted()
            } else {
                Vec::new()
            }
        });
        let Some(recipients) = recipients else {
            return false;
        };
        object.mark_ready();

        if is_server {
            let recipients: Vec<Arc<NetworkingPlayer>> = recipients
                .into_iter()
                .filter(|player| Some(player.network_id()) != except)
                .collect();
            if !recipients.is_empty() {
                let frame = self.create_frame(object, 0);
                self.send_to_all(&recipients, &frame);
            }
        }

        self.events.object_created.notify(&ObjectCreatedEvent {
            object: object.clone(),
        });
        self.flush_create_actions(object);
        true
    }

    fn create_frame(&self, object: &NetworkObject, create_hash: u32) -> Frame {
        let payload = CreatePayload {
            create_code: object.create_code(),
            owner_id: object.owner_id(),
            create_hash,
            metadata: object.metadata().to_vec(),
        };
        Frame::binary(
            self.time.timestep(),
            BinaryMessage::new(RouterId::NetworkObject, object.network_id(), encode(&payload)),
        )
    }

    // Creation

    /// Creates a new object of `create_code`.
    ///
    /// On a server the object is registered, initialized and announced right
    /// away. On a client a creation request goes to the server and the
    /// returned object becomes ready once the server's confirmation arrives
    pub fn create_object(
        &self,
        create_code: CreateCode,
        metadata: Vec<u8>,
    ) -> Result<Arc<NetworkObject>, WorkerError> {
        let actual = self.state();
        if !actual.accepts_traffic() {
            return Err(WorkerError::InvalidState {
                expected: WorkerState::Bound,
                actual,
            });
        }

        if self.is_server() {
            let object = Arc::new(NetworkObject::new(create_code, metadata));
            self.register_network_object(&object, 0)?;
            self.activate_object(&object, None);
            object.confirm_create();
            return Ok(object);
        }
        let server = self.require_server_player("create_object")?;

        let object = {
            let mut pending = self.lock_pending_creates();
            let mut create_hash = fastrand::u32(1..);
            while pending.contains_key(&create_hash) {
                create_hash = fastrand::u32(1..);
            }
            let object = Arc::new(NetworkObject::pending(create_code, metadata, create_hash));
            pending.insert(create_hash, object.clone());
            object
        };

        let payload = CreatePayload {
            create_code,
            owner_id: self.me.network_id(),
            create_hash: object.create_hash(),
            metadata: object.metadata().to_vec(),
        };
        let frame = Frame::binary(
            self.time.timestep(),
            BinaryMessage::new(RouterId::NetworkObject, 0, encode(&payload)),
        );
        if let Err(error) = self.send_to(&server, &frame) {
            self.lock_pending_creates().remove(&object.create_hash());
            return Err(error);
        }
        Ok(object)
    }

    /// Objects this client asked for that the server has not confirmed yet
    pub fn pending_create_count(&self) -> usize {
        self.lock_pending_creates().len()
    }

    pub(super) fn handle_network_object(&self, player: &Arc<NetworkingPlayer>, frame: &Frame) {
        let Some(message) = frame.as_binary() else {
            return;
        };
        let payload = match decode::<CreatePayload>(&message.payload) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("Malformed create from player {}: {}", player.network_id(), error);
                return;
            }
        };

        if self.is_server() {
            // SECURITY: clients request objects, only the server assigns ids
            if message.network_id != 0 {
                warn!("Player {} tried to announce object {}", player.network_id(), message.network_id);
                return;
            }
            self.create_requested_object(player, payload);
        } else {
            if message.network_id == 0 {
                warn!("Server announced an object without an id");
                return;
            }
            self.create_announced_object(message.network_id, payload);
        }
    }

    fn create_requested_object(&self, player: &Arc<NetworkingPlayer>, payload: CreatePayload) {
        let object = Arc::new(NetworkObject::remote(
            0,
            payload.create_code,
            player.network_id(),
            false,
            payload.metadata,
        ));
        match self.register_network_object(&object, 0) {
            Ok(true) => {}
            Ok(false) => return,
            Err(error) => {
                warn!("Unable to register object for player {}: {}", player.network_id(), error);
                return;
            }
        }

        // the requester learns the id first, everyone else gets the create
        let reply = Frame::binary(
            self.time.timestep(),
            BinaryMessage::new(
                RouterId::CreatedObject,
                object.network_id(),
                encode(&payload.create_hash),
            ),
        );
        if let Err(error) = self.send_to(player, &reply) {
            warn!("Unable to confirm object to player {}: {}", player.network_id(), error);
        }

        self.activate_object(&object, Some(player.network_id()));
        object.confirm_create();
        info!(
            "Player {} created object {} (code {})",
            player.network_id(),
            object.network_id(),
            object.create_code()
        );
    }

    fn create_announced_object(&self, network_id: NetworkId, payload: CreatePayload) {
        let is_owner = self.me.is_accepted() && payload.owner_id == self.me.network_id();
        let object = Arc::new(NetworkObject::remote(
            network_id,
            payload.create_code,
            payload.owner_id,
            is_owner,
            payload.metadata,
        ));
        match self.register_network_object(&object, network_id) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Object {} is already known", network_id);
                return;
            }
            Err(error) => {
                warn!("Unable to register announced object {}: {}", network_id, error);
                return;
            }
        }
        self.activate_object(&object, None);
        object.confirm_create();
    }

    pub(super) fn handle_accept_multi(&self, player: &Arc<NetworkingPlayer>, frame: &Frame) {
        if self.is_server() {
            warn!("Ignoring AcceptMulti from player {}", player.network_id());
            return;
        }
        let Some(message) = frame.as_binary() else {
            return;
        };

        let mut reader = ByteReader::new(&message.payload);
        let count = match u32::de(&mut reader) {
            Ok(count) => count,
            Err(error) => {
                warn!("Malformed AcceptMulti: {}", error);
                return;
            }
        };
        for _ in 0..count {
            match read_announced(&mut reader) {
                Ok((network_id, payload)) => self.create_announced_object(network_id, payload),
                Err(error) => {
                    warn!("Truncated AcceptMulti: {}", error);
                    return;
                }
            }
        }
    }

    pub(super) fn accept_multi_frame(&self, objects: &[Arc<NetworkObject>]) -> Frame {
        let mut writer = ByteWriter::new();
        (objects.len() as u32).ser(&mut writer);
        for object in objects {
            object.network_id().ser(&mut writer);
            CreatePayload {
                create_code: object.create_code(),
                owner_id: object.owner_id(),
                create_hash: 0,
                metadata: object.metadata().to_vec(),
            }
            .ser(&mut writer);
        }
        Frame::binary(
            self.time.timestep(),
            BinaryMessage::new(RouterId::AcceptMulti, 0, writer.to_bytes()),
        )
    }

    /// Client: the server assigned an id to one of our requests
    pub(super) fn resolve_pending_create(&self, frame: &Frame) {
        let Some(message) = frame.as_binary() else {
            return;
        };
        let create_hash = match decode::<u32>(&message.payload) {
            Ok(create_hash) => create_hash,
            Err(error) => {
                warn!("Malformed CreatedObject: {}", error);
                return;
            }
        };
        let Some(object) = self.lock_pending_creates().remove(&create_hash) else {
            debug!("CreatedObject for unknown request {}", create_hash);
            return;
        };

        object.set_owner(self.me.network_id(), true);
        match self.register_network_object(&object, message.network_id) {
            Ok(true) => {
                self.activate_object(&object, None);
            }
            Ok(false) => warn!("Server assigned id {} which is already in use", message.network_id),
            Err(error) => warn!("Unable to register created object: {}", error),
        }
    }

    // Object traffic

    /// Hands an object-targeted frame to its object, or buffers it until the
    /// object registers
    pub(super) fn dispatch_to_object(&self, player: &Arc<NetworkingPlayer>, frame: Frame) {
        let Some(network_id) = frame.as_binary().map(|message| message.network_id) else {
            return;
        };

        let worker = self.weak_self.clone();
        let sender = player.clone();
        let action: CreateAction = Box::new(move |object| {
            if let Some(worker) = worker.upgrade() {
                worker.handle_object_frame(object, &sender, &frame);
            }
        });

        let now = self.time.clock().now();
        let resolved = self.create_buffer.resolve_or_buffer(
            network_id,
            now,
            || self.objects.get(network_id),
            action,
        );
        match resolved {
            Some((object, action)) => action(&object),
            None => debug!("Buffered frame for object {} until it registers", network_id),
        }
    }

    fn handle_object_frame(&self, object: &Arc<NetworkObject>, sender: &Arc<NetworkingPlayer>, frame: &Frame) {
        let Some(message) = frame.as_binary() else {
            return;
        };
        if object.is_destroyed() {
            debug!("Dropping frame for destroyed object {}", object.network_id());
            return;
        }

        match message.router_id {
            RouterId::CreatedObject => {
                object.confirm_create();
                return;
            }
            RouterId::Rpc | RouterId::BinaryData => {}
            _ => return,
        }

        if self.is_server() {
            if !self.may_address(object, sender, message) {
                return;
            }
            if !self.relay_object_frame(object, sender, frame) {
                return;
            }
        }
        self.apply_object_frame(object, sender.network_id(), frame.timestamp, message);
    }

    /// SECURITY: clients may only destroy or stream state of objects they own,
    /// and never reassign ownership
    fn may_address(&self, object: &NetworkObject, sender: &NetworkingPlayer, message: &BinaryMessage) -> bool {
        let owns = object.owner_id() == sender.network_id();
        let allowed = match (message.router_id, message.payload.first().copied()) {
            (RouterId::Rpc, Some(DESTROY_RPC)) => owns,
            (RouterId::Rpc, Some(ASSIGN_OWNERSHIP_RPC)) => false,
            (RouterId::BinaryData, Some(DIRTY_FIELDS_SUB_ROUTER)) => owns,
            _ => true,
        };
        if !allowed {
            warn!(
                "Player {} is not allowed to send {:?} to object {}",
                sender.network_id(),
                message.router_id,
                object.network_id()
            );
        }
        allowed
    }

    /// Server: forwards a client's object frame according to its receivers.
    /// Returns whether the server should also apply it
    fn relay_object_frame(&self, object: &NetworkObject, sender: &NetworkingPlayer, frame: &Frame) -> bool {
        match frame.receivers {
            Receivers::Target | Receivers::Server => true,
            Receivers::All | Receivers::Others => {
                let targets = self.broadcast_targets(Some(sender.network_id()));
                self.send_to_all(&targets, frame);
                true
            }
            Receivers::Owner => {
                let owner_id = object.owner_id();
                if owner_id == SERVER_PLAYER_ID {
                    return true;
                }
                if owner_id != sender.network_id() {
                    if let Some(owner) = self.players.get(owner_id) {
                        self.send_to_all(&[owner], frame);
                    }
                }
                false
            }
        }
    }

    fn apply_object_frame(
        &self,
        object: &Arc<NetworkObject>,
        sender: PlayerId,
        timestamp: u64,
        message: &BinaryMessage,
    ) {
        match message.router_id {
            RouterId::Rpc => {
                let call = match rpc::decode_call(&message.payload, sender, timestamp) {
                    Ok(call) => call,
                    Err(error) => {
                        warn!("Malformed rpc for object {}: {}", object.network_id(), error);
                        return;
                    }
                };
                match call.method {
                    DESTROY_RPC => {
                        object.destroy();
                    }
                    ASSIGN_OWNERSHIP_RPC => match decode::<u32>(&call.args) {
                        Ok(owner_id) => {
                            let is_owner = owner_id == self.me.network_id() && !self.is_server();
                            object.set_owner(owner_id, is_owner);
                        }
                        Err(error) => warn!("Malformed ownership change: {}", error),
                    },
                    _ => {
                        object.dispatch(move |behavior, object| behavior.on_rpc(object, &call));
                    }
                }
            }
            RouterId::BinaryData => {
                let (sub_router, data) = match rpc::decode_binary_data(&message.payload) {
                    Ok(decoded) => decoded,
                    Err(error) => {
                        warn!("Malformed binary data for object {}: {}", object.network_id(), error);
                        return;
                    }
                };
                let data = data.to_vec();
                if sub_router == DIRTY_FIELDS_SUB_ROUTER {
                    object.dispatch(move |behavior, object| {
                        behavior.read_dirty_fields(object, &data, timestamp)
                    });
                } else {
                    object.dispatch(move |behavior, object| {
                        behavior.on_binary_data(object, sub_router, &data)
                    });
                }
            }
            _ => {}
        }
    }

    // Sending object traffic

    /// Calls `method` on the object on the peers selected by `receivers`.
    /// Methods below `rpc::FIRST_APPLICATION_RPC` are reserved
    pub fn send_rpc(
        &self,
        object: &Arc<NetworkObject>,
        method: u8,
        args: &[u8],
        receivers: Receivers,
    ) -> Result<(), WorkerError> {
        if rpc::is_reserved(method) {
            return Err(WorkerError::ReservedRpcMethod { method });
        }
        self.send_object_message(object, RouterId::Rpc, rpc::encode_call(method, args), receivers, true)
    }

    /// Sends raw bytes to the object's `on_binary_data` on the selected peers
    pub fn send_binary_data(
        &self,
        object: &Arc<NetworkObject>,
        sub_router: u8,
        data: &[u8],
        receivers: Receivers,
    ) -> Result<(), WorkerError> {
        if sub_router == DIRTY_FIELDS_SUB_ROUTER {
            return Err(WorkerError::ReservedRpcMethod { method: sub_router });
        }
        self.send_object_message(
            object,
            RouterId::BinaryData,
            rpc::encode_binary_data(sub_router, data),
            receivers,
            true,
        )
    }

    fn send_object_message(
        &self,
        object: &Arc<NetworkObject>,
        router_id: RouterId,
        payload: Vec<u8>,
        receivers: Receivers,
        reliable: bool,
    ) -> Result<(), WorkerError> {
        let network_id = self.require_live(object)?;
        let message = BinaryMessage::new(router_id, network_id, payload);
        let mut frame = Frame::binary(self.time.timestep(), message.clone()).with_receivers(receivers);
        if !reliable {
            frame = frame.unreliable();
        }

        let (apply_locally, targets) = self.outgoing_targets(object, receivers);
        self.send_to_all(&targets, &frame);
        if apply_locally {
            self.apply_object_frame(object, self.me.network_id(), frame.timestamp, &message);
        }
        Ok(())
    }

    fn outgoing_targets(
        &self,
        object: &NetworkObject,
        receivers: Receivers,
    ) -> (bool, Vec<Arc<NetworkingPlayer>>) {
        if let Some(server) = &self.server_player {
            return match receivers {
                Receivers::All => (true, vec![server.clone()]),
                Receivers::Owner if object.is_owner() => (true, Vec::new()),
                _ => (false, vec![server.clone()]),
            };
        }

        match receivers {
            Receivers::All => (true, self.players.accepted()),
            Receivers::Others => (false, self.players.accepted()),
            Receivers::Server | Receivers::Target => (true, Vec::new()),
            Receivers::Owner => match object.owner_id() {
                SERVER_PLAYER_ID => (true, Vec::new()),
                owner_id => (false, self.players.get(owner_id).into_iter().collect()),
            },
        }
    }

    fn require_live(&self, object: &NetworkObject) -> Result<NetworkId, WorkerError> {
        let network_id = object.network_id();
        if network_id == 0 || !self.objects.contains(network_id) {
            return Err(WorkerError::ObjectNotRegistered);
        }
        Ok(network_id)
    }

    // Destruction & ownership

    /// Destroys the object here and on every other peer. Clients may only
    /// destroy objects they own
    pub fn destroy_object(&self, object: &Arc<NetworkObject>) -> Result<(), WorkerError> {
        let network_id = self.require_live(object)?;
        if !self.is_server() && !object.is_owner() {
            return Err(WorkerError::NotOwner { network_id });
        }
        let frame = self.destroy_frame(network_id);
        self.broadcast(&frame, None);
        object.destroy();
        info!("Destroyed object {}", network_id);
        Ok(())
    }

    /// Server only: hands the object to `owner_id` (the server's own id takes
    /// it back) and tells every accepted player
    pub fn assign_ownership(&self, object: &Arc<NetworkObject>, owner_id: PlayerId) -> Result<(), WorkerError> {
        if !self.is_server() {
            return Err(WorkerError::WrongHostType {
                operation: "assign_ownership",
            });
        }
        let network_id = self.require_live(object)?;
        object.set_owner(owner_id, owner_id == SERVER_PLAYER_ID);

        let frame = Frame::binary(
            self.time.timestep(),
            BinaryMessage::new(
                RouterId::Rpc,
                network_id,
                rpc::encode_call(ASSIGN_OWNERSHIP_RPC, &encode(&owner_id)),
            ),
        )
        .with_receivers(Receivers::All);
        self.broadcast(&frame, None);
        Ok(())
    }

    fn destroy_frame(&self, network_id: NetworkId) -> Frame {
        Frame::binary(
            self.time.timestep(),
            BinaryMessage::new(RouterId::Rpc, network_id, rpc::encode_call(DESTROY_RPC, &[])),
        )
        .with_receivers(Receivers::Others)
    }

    /// Server: destroys every object `player_id` owned and tells the rest
    pub(super) fn destroy_objects_owned_by(&self, player_id: PlayerId) {
        for object in self.objects.snapshot() {
            if object.owner_id() != player_id || object.is_destroyed() {
                continue;
            }
            let frame = self.destroy_frame(object.network_id());
            self.broadcast(&frame, Some(player_id));
            object.destroy();
            debug!("Destroyed object {} owned by departed player {}", object.network_id(), player_id);
        }
    }

    // Heartbeat

    /// Replicates dirty fields of every object that is owned here with a
    /// positive update interval or, on a server, flagged for authority updates
    pub fn run_network_object_heartbeats(&self) {
        let now = self.time.ticks();
        let is_server = self.is_server();

        for object in self.objects.snapshot() {
            if !object.is_ready() {
                continue;
            }
            let owned = object.is_owner() && !object.update_interval().is_zero();
            let authoritative = is_server && object.authority_update_mode();
            if !owned && !authoritative {
                continue;
            }
            let Some(fields) = object.heartbeat(now) else {
                continue;
            };

            let frame = Frame::binary(
                self.time.timestep(),
                BinaryMessage::new(
                    RouterId::BinaryData,
                    object.network_id(),
                    rpc::encode_binary_data(DIRTY_FIELDS_SUB_ROUTER, &fields),
                ),
            )
            .with_receivers(Receivers::Others)
            .unreliable();
            self.broadcast(&frame, None);
        }
    }

    fn lock_pending_creates(
        &self,
    ) -> std::sync::MutexGuard<'_, std::collections::HashMap<u32, Arc<NetworkObject>>> {
        match self.pending_creates.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
