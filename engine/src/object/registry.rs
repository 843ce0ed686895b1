use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{constants::FIRST_NETWORK_ID, object::NetworkObject, types::NetworkId};

struct RegistryInner {
    by_id: HashMap<NetworkId, Arc<NetworkObject>>,
    ordered: Vec<Arc<NetworkObject>>,
    // every id handed out during this worker's lifetime
    issued: HashSet<NetworkId>,
    next_id: NetworkId,
}

/// Id assignment and lookup for the objects of one worker.
///
/// Registration is two-phase: `reserve` assigns the id, and
/// `complete_initialization` makes the object visible to lookups and
/// snapshots. An id is never handed out twice.
pub struct NetworkObjectRegistry {
    inner: Mutex<RegistryInner>,
}

impl NetworkObjectRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                by_id: HashMap::new(),
                ordered: Vec::new(),
                issued: HashSet::new(),
                next_id: FIRST_NETWORK_ID,
            }),
        }
    }

    /// Assigns `force_id` if nonzero and never issued, otherwise the next
    /// free id. Returns None only when the forced id is taken
    pub fn reserve(&self, object: &NetworkObject, force_id: NetworkId) -> Option<NetworkId> {
        let mut inner = self.lock();

        let network_id = if force_id != 0 {
            if inner.issued.contains(&force_id) {
                return None;
            }
            force_id
        } else {
            let mut candidate = inner.next_id;
            while candidate == 0 || inner.issued.contains(&candidate) {
                candidate = candidate.wrapping_add(1);
            }
            inner.next_id = candidate.wrapping_add(1);
            candidate
        };

        inner.issued.insert(network_id);
        object.set_network_id(network_id);
        Some(network_id)
    }

    /// Inserts the object into the id map and the ordered list. `then` runs
    /// inside the same critical section, after the insert. Returns None (and
    /// skips `then`) if the object is already present
    pub fn complete_initialization<R>(
        &self,
        object: &Arc<NetworkObject>,
        then: impl FnOnce() -> R,
    ) -> Option<R> {
        let mut inner = self.lock();
        let network_id = object.network_id();
        if inner.by_id.contains_key(&network_id) {
            return None;
        }
        inner.by_id.insert(network_id, object.clone());
        inner.ordered.push(object.clone());
        Some(then())
    }

    pub fn get(&self, network_id: NetworkId) -> Option<Arc<NetworkObject>> {
        self.lock().by_id.get(&network_id).cloned()
    }

    pub fn contains(&self, network_id: NetworkId) -> bool {
        self.lock().by_id.contains_key(&network_id)
    }

    /// Whether the id was ever handed out by this registry
    pub fn is_issued(&self, network_id: NetworkId) -> bool {
        self.lock().issued.contains(&network_id)
    }

    /// Removes from both the id map and the ordered list. The id stays issued
    pub fn remove(&self, network_id: NetworkId) -> Option<Arc<NetworkObject>> {
        let mut inner = self.lock();
        let object = inner.by_id.remove(&network_id)?;
        inner
            .ordered
            .retain(|existing| !Arc::ptr_eq(existing, &object));
        Some(object)
    }

    /// Point-in-time copy of the live objects, in initialization order
    pub fn snapshot(&self) -> Vec<Arc<NetworkObject>> {
        self.lock().ordered.clone()
    }

    /// Like `snapshot`, with `f` run inside the same critical section
    pub fn snapshot_with<R>(&self, f: impl FnOnce() -> R) -> (Vec<Arc<NetworkObject>>, R) {
        let inner = self.lock();
        let result = f();
        (inner.ordered.clone(), result)
    }

    pub fn len(&self) -> usize {
        self.lock().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for NetworkObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}
