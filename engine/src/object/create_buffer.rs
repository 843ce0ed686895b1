use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::warn;

use crate::{object::NetworkObject, types::NetworkId};

/// Work deferred until the object it addresses is registered
pub type CreateAction = Box<dyn FnOnce(&Arc<NetworkObject>) + Send>;

struct PendingActions {
    // clock time of the first buffered frame, used for eviction
    first_buffered: Duration,
    actions: VecDeque<CreateAction>,
    flushing: bool,
}

/// Holds frames that arrived for object ids not registered yet.
///
/// Buffering and flushing share one lock, and while a flush for an id is
/// running new arrivals for that id are appended to it instead of being
/// dispatched directly, so replay order always equals arrival order.
pub struct CreateBuffer {
    pending: Mutex<HashMap<NetworkId, PendingActions>>,
}

impl CreateBuffer {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Looks the target up with `lookup`. If it resolves and nothing is
    /// queued for it, the object and the action are handed back to run
    /// immediately; otherwise the action is appended to the id's queue
    pub fn resolve_or_buffer(
        &self,
        network_id: NetworkId,
        now: Duration,
        lookup: impl FnOnce() -> Option<Arc<NetworkObject>>,
        action: CreateAction,
    ) -> Option<(Arc<NetworkObject>, CreateAction)> {
        let mut pending = self.lock();

        if let Some(entry) = pending.get_mut(&network_id) {
            entry.actions.push_back(action);
            return None;
        }

        if let Some(object) = lookup() {
            return Some((object, action));
        }

        let mut actions = VecDeque::new();
        actions.push_back(action);
        pending.insert(
            network_id,
            PendingActions {
                first_buffered: now,
                actions,
                flushing: false,
            },
        );
        None
    }

    /// Replays, in arrival order, every action buffered for the object's id.
    /// Actions run without the lock held. Returns how many ran; 0 when
    /// nothing was buffered or another flush for the id is in progress
    pub fn flush(&self, object: &Arc<NetworkObject>) -> usize {
        let network_id = object.network_id();
        let mut replayed = 0;
        let mut owns_flush = false;

        loop {
            let batch = {
                let mut pending = self.lock();
                let Some(entry) = pending.get_mut(&network_id) else {
                    return replayed;
                };
                if entry.flushing && !owns_flush {
                    return replayed;
                }
                if entry.actions.is_empty() {
                    pending.remove(&network_id);
                    return replayed;
                }
                entry.flushing = true;
                owns_flush = true;
                std::mem::take(&mut entry.actions)
            };

            for action in batch {
                action(object);
                replayed += 1;
            }
        }
    }

    /// Drops queues whose first frame is older than `ttl`. Returns how many
    /// ids were evicted
    pub fn evict_expired(&self, now: Duration, ttl: Duration) -> usize {
        let mut pending = self.lock();
        let expired: Vec<NetworkId> = pending
            .iter()
            .filter(|(_, entry)| !entry.flushing && now.saturating_sub(entry.first_buffered) >= ttl)
            .map(|(network_id, _)| *network_id)
            .collect();

        for network_id in &expired {
            if let Some(entry) = pending.remove(network_id) {
                warn!(
                    "Evicting {} buffered frame(s) for network object {} that never registered",
                    entry.actions.len(),
                    network_id
                );
            }
        }
        expired.len()
    }

    pub fn pending_count(&self, network_id: NetworkId) -> usize {
        self.lock()
            .get(&network_id)
            .map(|entry| entry.actions.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, network_id: NetworkId) -> bool {
        self.lock().contains_key(&network_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NetworkId, PendingActions>> {
        match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for CreateBuffer {
    fn default() -> Self {
        Self::new()
    }
}
