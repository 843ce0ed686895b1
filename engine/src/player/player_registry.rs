use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex, MutexGuard,
};

use crate::{error::WorkerError, player::NetworkingPlayer, types::PlayerId};

/// The set of remote players known to a worker.
/// Every mutation and every full pass happens under one lock
pub struct PlayerRegistry {
    players: Mutex<Vec<Arc<NetworkingPlayer>>>,
    next_network_id: AtomicU32,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: Mutex::new(Vec::new()),
            // 0 belongs to the server's own player
            next_network_id: AtomicU32::new(1),
        }
    }

    /// Hands out the next player id, never reused within this registry
    pub fn next_network_id(&self) -> PlayerId {
        self.next_network_id.fetch_add(1, Ordering::AcqRel)
    }

    /// Fails if the same player instance, or another player with the same id, is present.
    /// The set is left untouched on failure
    pub fn add(&self, player: Arc<NetworkingPlayer>) -> Result<(), WorkerError> {
        let mut players = self.lock();
        let player_id = player.network_id();
        if players
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &player) || existing.network_id() == player_id)
        {
            return Err(WorkerError::DuplicatePlayer { player_id });
        }
        players.push(player);
        Ok(())
    }

    pub fn remove(&self, player_id: PlayerId) -> Option<Arc<NetworkingPlayer>> {
        let mut players = self.lock();
        let index = players
            .iter()
            .position(|player| player.network_id() == player_id)?;
        Some(players.remove(index))
    }

    /// Removes and returns every player
    pub fn drain(&self) -> Vec<Arc<NetworkingPlayer>> {
        std::mem::take(&mut *self.lock())
    }

    pub fn get(&self, player_id: PlayerId) -> Option<Arc<NetworkingPlayer>> {
        self.lock()
            .iter()
            .find(|player| player.network_id() == player_id)
            .cloned()
    }

    pub fn contains(&self, player: &Arc<NetworkingPlayer>) -> bool {
        self.lock().iter().any(|existing| Arc::ptr_eq(existing, player))
    }

    pub fn find_by_guid(&self, guid: &str) -> Option<Arc<NetworkingPlayer>> {
        self.lock()
            .iter()
            .find(|player| player.instance_guid() == guid)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<Arc<NetworkingPlayer>> {
        self.lock().clone()
    }

    /// Players that completed the acceptance handshake and are still connected
    pub fn accepted(&self) -> Vec<Arc<NetworkingPlayer>> {
        self.lock()
            .iter()
            .filter(|player| player.is_accepted() && !player.is_disconnecting())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<NetworkingPlayer>>> {
        match self.players.lock() {
            Ok(players) => players,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
