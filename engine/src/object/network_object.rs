use std::{
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
    time::Duration,
};

use crate::{
    constants::SERVER_PLAYER_ID,
    events::Observers,
    object::ObjectBehavior,
    types::{CreateCode, NetworkId, PlayerId},
};

type DeferredHook = Box<dyn FnOnce(&mut dyn ObjectBehavior, &NetworkObject) + Send>;

#[derive(Default)]
struct BehaviorSlot {
    behavior: Option<Box<dyn ObjectBehavior>>,
    // set while a hook runs with the behavior taken out of the slot
    busy: bool,
    deferred: VecDeque<DeferredHook>,
    // bumped by attach/detach so a stale behavior is not put back
    generation: u64,
}

/// A replicated object shared between peers.
///
/// The object exists independently of the behavior attached to it; detaching
/// the behavior leaves the object registered and replicating.
pub struct NetworkObject {
    network_id: AtomicU32,
    create_code: CreateCode,
    metadata: Vec<u8>,
    owner_id: AtomicU32,
    is_owner: AtomicBool,
    authority_update_mode: AtomicBool,
    update_interval_micros: AtomicU64,
    last_heartbeat_micros: AtomicU64,
    // key of the worker this object is registered with, 0 when unregistered
    registrar: AtomicU64,
    // nonzero while a client waits for the server to confirm creation
    create_hash: u32,
    ready: AtomicBool,
    confirmed: AtomicBool,
    destroyed: AtomicBool,
    behavior: Mutex<BehaviorSlot>,
    on_destroy: Observers<NetworkId>,
}

impl NetworkObject {
    /// A locally created object, owned by the local peer
    pub fn new(create_code: CreateCode, metadata: Vec<u8>) -> Self {
        Self::build(0, create_code, metadata, SERVER_PLAYER_ID, true, 0)
    }

    /// An object announced by a remote peer
    pub(crate) fn remote(
        network_id: NetworkId,
        create_code: CreateCode,
        owner_id: PlayerId,
        is_owner: bool,
        metadata: Vec<u8>,
    ) -> Self {
        Self::build(network_id, create_code, metadata, owner_id, is_owner, 0)
    }

    /// A client-side object waiting for the server to assign its id
    pub(crate) fn pending(create_code: CreateCode, metadata: Vec<u8>, create_hash: u32) -> Self {
        Self::build(0, create_code, metadata, SERVER_PLAYER_ID, true, create_hash)
    }

    fn build(
        network_id: NetworkId,
        create_code: CreateCode,
        metadata: Vec<u8>,
        owner_id: PlayerId,
        is_owner: bool,
        create_hash: u32,
    ) -> Self {
        Self {
            network_id: AtomicU32::new(network_id),
            create_code,
            metadata,
            owner_id: AtomicU32::new(owner_id),
            is_owner: AtomicBool::new(is_owner),
            authority_update_mode: AtomicBool::new(false),
            update_interval_micros: AtomicU64::new(0),
            last_heartbeat_micros: AtomicU64::new(0),
            registrar: AtomicU64::new(0),
            create_hash,
            ready: AtomicBool::new(false),
            confirmed: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            behavior: Mutex::new(BehaviorSlot::default()),
            on_destroy: Observers::new(),
        }
    }

    // Identity

    /// 0 until the object is registered with a worker
    pub fn network_id(&self) -> NetworkId {
        self.network_id.load(Ordering::Acquire)
    }

    pub(crate) fn set_network_id(&self, network_id: NetworkId) {
        self.network_id.store(network_id, Ordering::Release);
    }

    pub fn create_code(&self) -> CreateCode {
        self.create_code
    }

    /// Opaque bytes fixed at creation, e.g. an initial transform
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub(crate) fn create_hash(&self) -> u32 {
        self.create_hash
    }

    // Ownership & authority

    pub fn owner_id(&self) -> PlayerId {
        self.owner_id.load(Ordering::Acquire)
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner.load(Ordering::Acquire)
    }

    pub(crate) fn set_owner(&self, owner_id: PlayerId, is_owner: bool) {
        self.owner_id.store(owner_id, Ordering::Release);
        let previous = self.is_owner.swap(is_owner, Ordering::AcqRel);
        if previous != is_owner {
            self.dispatch(move |behavior, object| behavior.on_ownership_changed(object, is_owner));
        }
    }

    /// When set on a server, the server heartbeats this object even though a
    /// client owns it
    pub fn authority_update_mode(&self) -> bool {
        self.authority_update_mode.load(Ordering::Acquire)
    }

    pub fn set_authority_update_mode(&self, enabled: bool) {
        self.authority_update_mode.store(enabled, Ordering::Release);
    }

    /// Heartbeat cadence. Zero disables owner-driven replication
    pub fn update_interval(&self) -> Duration {
        Duration::from_micros(self.update_interval_micros.load(Ordering::Acquire))
    }

    pub fn set_update_interval(&self, interval: Duration) {
        self.update_interval_micros
            .store(interval.as_micros() as u64, Ordering::Release);
    }

    // Lifecycle

    pub fn is_registered(&self) -> bool {
        self.registrar.load(Ordering::Acquire) != 0
    }

    pub(crate) fn claim_registrar(&self, worker_key: u64) -> bool {
        self.registrar
            .compare_exchange(0, worker_key, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release_registrar(&self, worker_key: u64) {
        let _ = self
            .registrar
            .compare_exchange(worker_key, 0, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Registered, initialized, and with its behavior attached
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub(crate) fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Whether the server acknowledged this object's creation
    pub fn is_confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    pub(crate) fn confirm_create(&self) {
        if self.confirmed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatch(|behavior, object| behavior.on_create_confirmed(object));
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Observers run once, when the object is destroyed
    pub fn on_destroy(&self) -> &Observers<NetworkId> {
        &self.on_destroy
    }

    /// Tears the object down locally. Only the first call has an effect.
    /// Use `NetWorker::destroy_object` to also tell the other peers
    pub fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.ready.store(false, Ordering::Release);
        self.dispatch(|behavior, object| behavior.on_destroyed(object));
        self.on_destroy.notify(&self.network_id());
        true
    }

    // Behavior

    /// Attaches the object's handler, returning the one it replaces
    pub fn attach_behavior(&self, behavior: Box<dyn ObjectBehavior>) -> Option<Box<dyn ObjectBehavior>> {
        let mut slot = self.behavior_slot();
        slot.generation = slot.generation.wrapping_add(1);
        slot.behavior.replace(behavior)
    }

    /// Removes the handler. Returns None while a hook is running on it
    pub fn detach_behavior(&self) -> Option<Box<dyn ObjectBehavior>> {
        let mut slot = self.behavior_slot();
        slot.generation = slot.generation.wrapping_add(1);
        slot.deferred.clear();
        slot.behavior.take()
    }

    pub fn has_behavior(&self) -> bool {
        let slot = self.behavior_slot();
        slot.behavior.is_some() || slot.busy
    }

    /// Runs `f` with the attached behavior. Returns None if none is attached
    /// or a hook is already running on it.
    ///
    /// The slot is unlocked while `f` runs, so the handler may call back into
    /// this object (and into the worker). Hooks triggered from inside `f` are
    /// queued with `dispatch` and run before this returns.
    pub fn with_behavior<R>(
        &self,
        f: impl FnOnce(&mut dyn ObjectBehavior, &NetworkObject) -> R,
    ) -> Option<R> {
        let (mut behavior, generation) = self.take_behavior()?;
        let result = f(behavior.as_mut(), self);
        self.drain_deferred(behavior, generation);
        Some(result)
    }

    /// Runs a hook that returns nothing. If another hook is running on the
    /// behavior, `f` is queued and runs right after it, in call order
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn ObjectBehavior, &NetworkObject) + Send + 'static,
    {
        {
            let mut slot = self.behavior_slot();
            if slot.busy {
                slot.deferred.push_back(Box::new(f));
                return;
            }
        }
        self.with_behavior(f);
    }

    fn take_behavior(&self) -> Option<(Box<dyn ObjectBehavior>, u64)> {
        let mut slot = self.behavior_slot();
        if slot.busy {
            return None;
        }
        let behavior = slot.behavior.take()?;
        slot.busy = true;
        Some((behavior, slot.generation))
    }

    fn drain_deferred(&self, mut behavior: Box<dyn ObjectBehavior>, generation: u64) {
        loop {
            let next = {
                let mut slot = self.behavior_slot();
                match slot.deferred.pop_front() {
                    Some(next) => next,
                    None => {
                        slot.busy = false;
                        // a handler attached or detached meanwhile wins
                        if slot.generation == generation {
                            slot.behavior = Some(behavior);
                        }
                        return;
                    }
                }
            };
            next(behavior.as_mut(), self);
        }
    }

    fn behavior_slot(&self) -> MutexGuard<'_, BehaviorSlot> {
        match self.behavior.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Heartbeat

    /// Returns dirty-field bytes to replicate if the update interval has
    /// elapsed since the last heartbeat. A zero interval means every tick
    pub(crate) fn heartbeat(&self, now_ticks: u64) -> Option<Vec<u8>> {
        let interval = self.update_interval_micros.load(Ordering::Acquire);
        let last = self.last_heartbeat_micros.load(Ordering::Acquire);
        if interval > 0 && last != 0 && now_ticks.saturating_sub(last) < interval {
            return None;
        }
        self.last_heartbeat_micros.store(now_ticks.max(1), Ordering::Release);
        self.with_behavior(|behavior, object| behavior.write_dirty_fields(object))
            .flatten()
    }
}

impl fmt::Debug for NetworkObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkObject")
            .field("network_id", &self.network_id())
            .field("create_code", &self.create_code)
            .field("owner_id", &self.owner_id())
            .field("is_owner", &self.is_owner())
            .field("ready", &self.is_ready())
            .finish()
    }
}
