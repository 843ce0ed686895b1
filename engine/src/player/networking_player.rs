use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        RwLock,
    },
    time::Duration,
};

use crate::types::PlayerId;

/// Where a player is in its connection lifecycle
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Connecting,
    PendingAccepted,
    Accepted,
    Authenticated,
    Rejected,
    Disconnected,
}

/// One peer connection, as seen by a worker.
///
/// Players are shared between the reader thread, the heartbeat thread and
/// callers, so every mutable attribute is atomic.
pub struct NetworkingPlayer {
    network_id: AtomicU32,
    address: String,
    port: u16,
    instance_guid: RwLock<String>,
    is_host: bool,
    connected: AtomicBool,
    accepted: AtomicBool,
    authenticated: AtomicBool,
    rejected: AtomicBool,
    pending_accepted: AtomicBool,
    disconnecting: AtomicBool,
    round_trip_micros: AtomicU64,
    last_seen_micros: AtomicU64,
}

impl NetworkingPlayer {
    pub fn new(network_id: PlayerId, address: &str, port: u16, is_host: bool) -> Self {
        Self {
            network_id: AtomicU32::new(network_id),
            address: address.to_string(),
            port,
            instance_guid: RwLock::new(String::new()),
            is_host,
            connected: AtomicBool::new(false),
            accepted: AtomicBool::new(false),
            authenticated: AtomicBool::new(false),
            rejected: AtomicBool::new(false),
            pending_accepted: AtomicBool::new(false),
            disconnecting: AtomicBool::new(false),
            round_trip_micros: AtomicU64::new(0),
            last_seen_micros: AtomicU64::new(0),
        }
    }

    // Identity

    pub fn network_id(&self) -> PlayerId {
        self.network_id.load(Ordering::Acquire)
    }

    /// Clients learn their id from the server's acceptance
    pub(crate) fn set_network_id(&self, network_id: PlayerId) {
        self.network_id.store(network_id, Ordering::Release);
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether this player represents the hosting (server) side
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn instance_guid(&self) -> String {
        self.instance_guid
            .read()
            .map(|guid| guid.clone())
            .unwrap_or_default()
    }

    pub fn set_instance_guid(&self, guid: &str) {
        if let Ok(mut current) = self.instance_guid.write() {
            *current = guid.to_string();
        }
    }

    // State

    pub fn state(&self) -> PlayerState {
        if !self.is_connected() {
            if self.is_rejected() {
                return PlayerState::Rejected;
            }
            if self.is_accepted() || self.is_disconnecting() {
                return PlayerState::Disconnected;
            }
            return PlayerState::Connecting;
        }
        if self.is_rejected() {
            return PlayerState::Rejected;
        }
        if self.is_authenticated() && self.is_accepted() {
            return PlayerState::Authenticated;
        }
        if self.is_accepted() {
            return PlayerState::Accepted;
        }
        if self.is_pending_accepted() {
            return PlayerState::PendingAccepted;
        }
        PlayerState::Connecting
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted.load(Ordering::Acquire)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected.load(Ordering::Acquire)
    }

    pub fn is_pending_accepted(&self) -> bool {
        self.pending_accepted.load(Ordering::Acquire)
    }

    pub fn is_disconnecting(&self) -> bool {
        self.disconnecting.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn set_pending_accepted(&self, pending: bool) {
        self.pending_accepted.store(pending, Ordering::Release);
    }

    pub(crate) fn set_accepted(&self) {
        self.pending_accepted.store(false, Ordering::Release);
        self.rejected.store(false, Ordering::Release);
        self.accepted.store(true, Ordering::Release);
    }

    pub(crate) fn set_rejected(&self) {
        self.pending_accepted.store(false, Ordering::Release);
        self.accepted.store(false, Ordering::Release);
        self.authenticated.store(false, Ordering::Release);
        self.rejected.store(true, Ordering::Release);
    }

    pub(crate) fn set_authenticated(&self) {
        self.authenticated.store(true, Ordering::Release);
    }

    /// Returns true only for the first caller, so teardown of a player runs once
    pub(crate) fn begin_disconnect(&self) -> bool {
        !self.disconnecting.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn set_disconnected(&self) {
        self.disconnecting.store(true, Ordering::Release);
        self.connected.store(false, Ordering::Release);
    }

    // Latency

    /// Most recent ping round-trip
    pub fn round_trip_latency(&self) -> Duration {
        Duration::from_micros(self.round_trip_micros.load(Ordering::Acquire))
    }

    pub(crate) fn set_round_trip_latency(&self, latency: Duration) {
        self.round_trip_micros
            .store(latency.as_micros() as u64, Ordering::Release);
    }

    /// Clock ticks (microseconds) at which the last frame from this player arrived
    pub fn last_seen_ticks(&self) -> u64 {
        self.last_seen_micros.load(Ordering::Acquire)
    }

    pub(crate) fn mark_seen(&self, ticks: u64) {
        self.last_seen_micros.fetch_max(ticks, Ordering::AcqRel);
    }
}

impl fmt::Debug for NetworkingPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkingPlayer")
            .field("network_id", &self.network_id())
            .field("address", &self.address)
            .field("port", &self.port)
            .field("state", &self.state())
            .finish()
    }
}
