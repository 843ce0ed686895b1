use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, RwLock, Weak,
    },
    time::Duration,
};

use log::{debug, info, warn};

use crate::{
    cache::{Cache, CacheRequest, CachedValue},
    codec::{ByteWriter, Serde},
    constants::SERVER_PLAYER_ID,
    error::{TransportError, WorkerError},
    events::WorkerEvents,
    frame::{Frame, FrameBody, GroupId},
    object::{CreateBuffer, NetworkObject, NetworkObjectRegistry, ObjectFactory},
    player::{NetworkingPlayer, PlayerRegistry},
    scheduler::{Scheduler, SchedulerDriver, TaskHandle},
    session::SessionContext,
    time::TimeManager,
    transport::Transport,
    types::{HostType, PlayerId},
    worker::{Authenticator, IdentityRequest, WorkerConfig, WorkerState},
};

pub(super) type CacheCallback = Box<dyn FnOnce(Option<CachedValue>) + Send>;

/// The engine core: one per server, one per client connection.
///
/// A worker owns its players, its network objects and the buffer of frames
/// for objects it has not seen yet. Bytes from the transport enter through
/// `read_bytes` on any thread; outgoing frames leave through the bound
/// `Transport`. Each shared structure has its own lock, no lock is held while
/// application code runs, and nested locking always goes create buffer,
/// then objects, then players.
pub struct NetWorker {
    pub(super) host_type: HostType,
    pub(super) config: WorkerConfig,
    pub(super) session: Arc<SessionContext>,
    pub(super) worker_key: u64,
    pub(super) weak_self: Weak<NetWorker>,

    // Peers
    pub(super) me: Arc<NetworkingPlayer>,
    pub(super) server_player: Option<Arc<NetworkingPlayer>>,
    pub(super) players: PlayerRegistry,
    pub(super) authenticator: RwLock<Option<Arc<dyn Authenticator>>>,

    // Objects
    pub(super) objects: NetworkObjectRegistry,
    pub(super) create_buffer: CreateBuffer,
    pub(super) factories: ObjectFactory,
    pub(super) pending_creates: Mutex<HashMap<u32, Arc<NetworkObject>>>,

    // Cache
    pub(super) cache: Cache,
    pub(super) cache_requests: Mutex<HashMap<u32, CacheCallback>>,
    pub(super) next_cache_request: AtomicU32,

    // Time
    pub(super) time: TimeManager,
    pub(super) scheduler: Arc<Scheduler>,
    pub(super) heartbeat: Mutex<Option<TaskHandle>>,
    pub(super) driver: Mutex<Option<SchedulerDriver>>,
    pub(super) last_ping_ticks: AtomicU64,

    // Lifecycle
    pub(super) transport: RwLock<Option<Arc<dyn Transport>>>,
    pub(super) state: Mutex<WorkerState>,
    pub(super) disconnected: AtomicBool,
    pub(super) events: WorkerEvents,
}

impl NetWorker {
    pub fn new(host_type: HostType, config: WorkerConfig, session: Arc<SessionContext>) -> Arc<Self> {
        let clock = session.clock().clone();
        let worker_key = session.next_worker_key();

        let me = Arc::new(NetworkingPlayer::new(
            SERVER_PLAYER_ID,
            "0.0.0.0",
            0,
            host_type.is_server(),
        ));
        me.set_instance_guid(session.instance_guid());

        let server_player = match host_type {
            HostType::Server => None,
            HostType::Client => Some(Arc::new(NetworkingPlayer::new(
                SERVER_PLAYER_ID,
                "server",
                0,
                true,
            ))),
        };

        Arc::new_cyclic(|weak_self| Self {
            host_type,
            config,
            worker_key,
            weak_self: weak_self.clone(),
            me,
            server_player,
            players: PlayerRegistry::new(),
            authenticator: RwLock::new(None),
            objects: NetworkObjectRegistry::new(),
            create_buffer: CreateBuffer::new(),
            factories: ObjectFactory::new(),
            pending_creates: Mutex::new(HashMap::new()),
            cache: Cache::new(clock.clone()),
            cache_requests: Mutex::new(HashMap::new()),
            next_cache_request: AtomicU32::new(1),
            time: TimeManager::new(clock.clone()),
            scheduler: Arc::new(Scheduler::new(clock)),
            heartbeat: Mutex::new(None),
            driver: Mutex::new(None),
            last_ping_ticks: AtomicU64::new(0),
            transport: RwLock::new(None),
            state: Mutex::new(WorkerState::Unbound),
            disconnected: AtomicBool::new(false),
            events: WorkerEvents::new(),
            session,
        })
    }

    // Accessors

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn is_server(&self) -> bool {
        self.host_type.is_server()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// The local peer. On a client its id is 0 until the server accepts us
    pub fn me(&self) -> &Arc<NetworkingPlayer> {
        &self.me
    }

    /// Client only: the player representing the server connection. Feed the
    /// server's bytes to `read_bytes` together with this player
    pub fn server_player(&self) -> Option<&Arc<NetworkingPlayer>> {
        self.server_player.as_ref()
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn objects(&self) -> &NetworkObjectRegistry {
        &self.objects
    }

    pub fn create_buffer(&self) -> &CreateBuffer {
        &self.create_buffer
    }

    pub fn factories(&self) -> &ObjectFactory {
        &self.factories
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn time(&self) -> &TimeManager {
        &self.time
    }

    /// Runs the heartbeat and delayed sends. Drive it with `run_due` when
    /// `spawn_heartbeat_thread` is off
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn events(&self) -> &WorkerEvents {
        &self.events
    }

    pub fn state(&self) -> WorkerState {
        *self.lock_state()
    }

    pub fn is_bound(&self) -> bool {
        self.state() == WorkerState::Bound
    }

    /// A new player with a fresh id, for transports to hand to
    /// `on_player_connected`
    pub fn create_player(&self, address: &str, port: u16) -> Arc<NetworkingPlayer> {
        Arc::new(NetworkingPlayer::new(
            self.players.next_network_id(),
            address,
            port,
            false,
        ))
    }

    /// Installs the check run when a client identifies. Only allowed before
    /// the worker binds
    pub fn set_authenticator(&self, authenticator: Arc<dyn Authenticator>) -> Result<(), WorkerError> {
        if self.state() != WorkerState::Unbound {
            return Err(WorkerError::AuthenticatorWhileConnected);
        }
        if let Ok(mut slot) = self.authenticator.write() {
            *slot = Some(authenticator);
        }
        Ok(())
    }

    // Binding

    /// Attaches the transport produced by the caller, or reports why it could
    /// not be created. Fires `bind_success` or `bind_failure`
    pub fn bind(&self, transport: Result<Arc<dyn Transport>, TransportError>) -> Result<(), WorkerError> {
        let actual = self.state();
        if actual != WorkerState::Unbound {
            return Err(WorkerError::InvalidState {
                expected: WorkerState::Unbound,
                actual,
            });
        }

        let transport = match transport {
            Ok(transport) => transport,
            Err(error) => {
                warn!("{:?} worker failed to bind: {}", self.host_type, error);
                self.events.bind_failure.notify(&error.to_string());
                return Err(error.into());
            }
        };

        if let Ok(mut slot) = self.transport.write() {
            *slot = Some(transport);
        }
        *self.lock_state() = WorkerState::Bound;
        self.me.set_connected(true);

        if let Some(server) = &self.server_player {
            server.set_connected(true);
            server.mark_seen(self.time.ticks());
        }

        self.start_heartbeat();
        info!("{:?} worker bound", self.host_type);
        self.events.bind_success.notify(&());
        Ok(())
    }

    /// Client only: sends our instance guid and `credentials` to the server
    pub fn identify(&self, credentials: &[u8]) -> Result<(), WorkerError> {
        let server = self.require_server_player("identify")?;
        let request = IdentityRequest {
            instance_guid: self.session.instance_guid().to_string(),
            credentials: credentials.to_vec(),
        };
        let frame = self.frame(GroupId::Identity, FrameBody::Raw(encode(&request)));
        self.send_to(&server, &frame)
    }

    fn start_heartbeat(&self) {
        let weak = self.weak_self.clone();
        let handle = self
            .scheduler
            .schedule_every(self.config.heartbeat_interval, move || {
                if let Some(worker) = weak.upgrade() {
                    worker.heartbeat_tick();
                }
            });
        if let Ok(mut slot) = self.heartbeat.lock() {
            *slot = Some(handle);
        }

        if self.config.spawn_heartbeat_thread {
            let driver = SchedulerDriver::spawn(
                "peerlink-heartbeat",
                self.scheduler.clone(),
                self.config.heartbeat_interval,
            );
            if let Ok(mut slot) = self.driver.lock() {
                *slot = Some(driver);
            }
        }
    }

    fn stop_heartbeat(&self) {
        if let Some(handle) = self.heartbeat.lock().ok().and_then(|mut slot| slot.take()) {
            self.scheduler.cancel(&handle);
        }
        let driver = self.driver.lock().ok().and_then(|mut slot| slot.take());
        if let Some(mut driver) = driver {
            driver.stop();
        }
    }

    // Reading

    /// Decodes one frame and processes it. Safe to call from any thread
    pub fn read_bytes(&self, bytes: &[u8], player: &Arc<NetworkingPlayer>) -> Result<(), WorkerError> {
        self.session.bandwidth().record_in(bytes.len());
        let frame = Frame::from_bytes(bytes)?;
        self.fire_read(frame, player);
        Ok(())
    }

    /// Processes an already decoded frame from `player`
    pub fn fire_read(&self, frame: Frame, player: &Arc<NetworkingPlayer>) {
        if !self.state().accepts_traffic() {
            debug!("Dropping frame from player {}, worker is shut down", player.network_id());
            return;
        }
        player.mark_seen(self.time.ticks());
        self.on_message_received(player, frame);
    }

    // Sending

    /// A frame in `group_id`, stamped with the current timestep
    pub fn frame(&self, group_id: GroupId, body: FrameBody) -> Frame {
        Frame::new(group_id, self.time.timestep(), body)
    }

    /// Sends one frame to one player through the transport, applying the
    /// session's link conditioner if set
    pub fn send_to(&self, player: &Arc<NetworkingPlayer>, frame: &Frame) -> Result<(), WorkerError> {
        let transport = self.transport().ok_or_else(|| WorkerError::InvalidState {
            expected: WorkerState::Bound,
            actual: self.state(),
        })?;

        let bytes = frame.to_bytes();
        self.session.bandwidth().record_out(bytes.len());
        let reliable = frame.reliable;

        if let Some(conditioner) = self.session.link_conditioner() {
            if !reliable && conditioner.should_drop(fastrand::f32()) {
                debug!("Link conditioner dropped a frame to player {}", player.network_id());
                return Ok(());
            }
            let delay = conditioner.delay(fastrand::f32());
            if !delay.is_zero() {
                let player = player.clone();
                self.scheduler.schedule_once(delay, move || {
                    if let Err(error) = transport.send(&player, &bytes, reliable) {
                        warn!("Delayed send failed: {}", error);
                    }
                });
                return Ok(());
            }
        }

        transport.send(player, &bytes, reliable)?;
        Ok(())
    }

    /// Server: every accepted player except `except`. Client: the server
    pub fn broadcast(&self, frame: &Frame, except: Option<PlayerId>) {
        for player in self.broadcast_targets(except) {
            if let Err(error) = self.send_to(&player, frame) {
                warn!("Failed to send to player {}: {}", player.network_id(), error);
            }
        }
    }

    pub(super) fn send_to_all(&self, players: &[Arc<NetworkingPlayer>], frame: &Frame) {
        for player in players {
            if let Err(error) = self.send_to(player, frame) {
                warn!("Failed to send to player {}: {}", player.network_id(), error);
            }
        }
    }

    pub(super) fn broadcast_targets(&self, except: Option<PlayerId>) -> Vec<Arc<NetworkingPlayer>> {
        match &self.server_player {
            Some(server) => vec![server.clone()],
            None => self
                .players
                .accepted()
                .into_iter()
                .filter(|player| Some(player.network_id()) != except)
                .collect(),
        }
    }

    pub(super) fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.read().ok().and_then(|slot| slot.clone())
    }

    pub(super) fn require_server_player(&self, operation: &'static str) -> Result<Arc<NetworkingPlayer>, WorkerError> {
        self.server_player
            .clone()
            .ok_or(WorkerError::WrongHostType { operation })
    }

    // Heartbeat

    /// One pass of the heartbeat loop. Runs every `heartbeat_interval` while
    /// the worker is bound
    pub fn heartbeat_tick(&self) {
        if !self.is_bound() {
            return;
        }
        self.run_network_object_heartbeats();
        self.check_timeouts();
        self.ping_if_due();

        let now = self.time.clock().now();
        self.create_buffer
            .evict_expired(now, self.config.create_buffer_ttl);
        self.cache.clean_expired();
    }

    fn ping_if_due(&self) {
        if self.config.ping_interval.is_zero() {
            return;
        }
        let now = self.time.ticks();
        let last = self.last_ping_ticks.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.config.ping_interval.as_micros() as u64 {
            return;
        }
        self.last_ping_ticks.store(now, Ordering::Release);
        self.ping();
    }

    /// A Ping frame stamped with the current tick count
    pub fn generate_ping(&self) -> Frame {
        self.frame(GroupId::Ping, FrameBody::Ping(self.time.ticks()))
            .unreliable()
    }

    /// Pings the server (client) or every accepted player (server)
    pub fn ping(&self) {
        let ping = self.generate_ping();
        self.broadcast(&ping, None);
    }

    // Cache

    /// Client only: asks the server for `key`. `callback` gets the value, or
    /// None when the server has no such key
    pub fn cache_request<F>(&self, key: &str, callback: F) -> Result<(), WorkerError>
    where
        F: FnOnce(Option<CachedValue>) + Send + 'static,
    {
        let server = self.require_server_player("cache_request")?;
        let request_id = self.next_cache_request.fetch_add(1, Ordering::AcqRel);
        self.lock_cache_requests()
            .insert(request_id, Box::new(callback));

        let request = CacheRequest {
            request_id,
            key: key.to_string(),
        };
        let frame = self.frame(GroupId::Cache, FrameBody::Raw(encode(&request)));
        if let Err(error) = self.send_to(&server, &frame) {
            self.lock_cache_requests().remove(&request_id);
            return Err(error);
        }
        Ok(())
    }

    pub(super) fn lock_cache_requests(&self) -> MutexGuard<'_, HashMap<u32, CacheCallback>> {
        match self.cache_requests.lock() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Discovery

    /// Probes the local network on `port` for `window`. See
    /// `discovery::refresh_local_udp_listings`
    #[cfg(feature = "local_discovery")]
    pub fn refresh_local_udp_listings(
        &self,
        port: u16,
        window: Duration,
    ) -> std::thread::JoinHandle<Vec<crate::discovery::LocalEndpoint>> {
        crate::discovery::refresh_local_udp_listings(self.session.clone(), port, window)
    }

    /// Endpoints the most recent discovery run has found so far
    pub fn local_udp_listings(&self) -> Vec<crate::discovery::LocalEndpoint> {
        self.session.local_endpoints()
    }

    // Teardown

    /// Tears the worker down: stops the heartbeat, tells peers goodbye unless
    /// `forced`, closes the transport and drops every player and object.
    /// Only the first call has an effect; `disconnected` fires exactly once
    pub fn disconnect(&self, forced: bool) {
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return;
        }
        *self.lock_state() = WorkerState::EndingSession;
        self.stop_heartbeat();

        if !forced {
            let goodbye = self.frame(GroupId::Disconnect, FrameBody::Raw(Vec::new()));
            self.broadcast(&goodbye, None);
        }

        if let Some(transport) = self.transport.write().ok().and_then(|mut slot| slot.take()) {
            transport.close(forced);
        }

        for player in self.players.drain() {
            player.begin_disconnect();
            player.set_disconnected();
        }
        if let Some(server) = &self.server_player {
            server.set_disconnected();
        }
        self.me.set_connected(false);

        for object in self.objects.snapshot() {
            object.destroy();
        }
        if let Ok(mut pending) = self.pending_creates.lock() {
            pending.clear();
        }
        self.lock_cache_requests().clear();

        *self.lock_state() = WorkerState::Disposed;
        info!("{:?} worker disconnected (forced: {})", self.host_type, forced);
        self.events.disconnected.notify(&forced);
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub(super) fn encode<T: Serde>(value: &T) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    value.ser(&mut writer);
    writer.to_bytes()
}

pub(super) fn elapsed_since(now_ticks: u64, then_ticks: u64) -> Duration {
    Duration::from_micros(now_ticks.saturating_sub(then_ticks))
}
