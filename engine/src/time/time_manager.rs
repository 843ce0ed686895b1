use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use log::debug;

use crate::{time::Clock, types::Timestep};

/// Produces the logical timestep stamped on every outgoing frame.
///
/// Before synchronization the timestep is the local clock in milliseconds.
/// The first accepted identification frame fixes an offset so that the
/// local timestep lines up with the remote one; later sync attempts are
/// ignored. Returned values never decrease.
pub struct TimeManager {
    clock: Arc<dyn Clock>,
    offset_millis: Mutex<Option<i64>>,
    last_timestep: AtomicU64,
}

impl TimeManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            offset_millis: Mutex::new(None),
            last_timestep: AtomicU64::new(0),
        }
    }

    pub fn timestep(&self) -> Timestep {
        let local = self.clock.now().as_millis() as i64;
        let offset = self
            .offset_millis
            .lock()
            .map(|offset| offset.unwrap_or(0))
            .unwrap_or(0);
        let candidate = (local + offset).max(0) as u64;

        let previous = self.last_timestep.fetch_max(candidate, Ordering::SeqCst);
        previous.max(candidate)
    }

    /// Aligns the local timestep with `remote`. Only the first call has any
    /// effect. Returns whether this call performed the synchronization
    pub fn sync_from(&self, remote: Timestep) -> bool {
        let Ok(mut offset) = self.offset_millis.lock() else {
            return false;
        };
        if offset.is_some() {
            return false;
        }
        let local = self.clock.now().as_millis() as i64;
        let new_offset = remote as i64 - local;
        *offset = Some(new_offset);
        debug!("Clock synchronized, offset {}ms", new_offset);
        true
    }

    pub fn is_synced(&self) -> bool {
        self.offset_millis
            .lock()
            .map(|offset| offset.is_some())
            .unwrap_or(false)
    }

    /// Current 64-bit tick count of the underlying clock
    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
