use std::{default::Default, time::Duration};

use crate::constants::{DEFAULT_DISCOVERY_PORT, HEARTBEAT_TICK};

/// Contains Config properties which will be used by a NetWorker
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// How often the heartbeat loop runs
    pub heartbeat_interval: Duration,
    /// How often a ping is sent to each connected peer. Zero disables pings
    pub ping_interval: Duration,
    /// A peer that has sent nothing for this long is timed out
    pub player_timeout: Duration,
    /// How long frames for an unknown network object are kept, measured from
    /// the first buffered frame for that object
    pub create_buffer_ttl: Duration,
    /// When a player leaves, the server destroys the objects it owned
    pub destroy_owned_objects_on_disconnect: bool,
    /// Spawn a background thread that drives the heartbeat. When false, the
    /// application calls `NetWorker::scheduler().run_due()` itself
    pub spawn_heartbeat_thread: bool,
    /// UDP port local discovery probes and answers on
    pub discovery_port: u16,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_TICK,
            ping_interval: Duration::from_secs(1),
            player_timeout: Duration::from_secs(10),
            create_buffer_ttl: Duration::from_secs(30),
            destroy_owned_objects_on_disconnect: true,
            spawn_heartbeat_thread: true,
            discovery_port: DEFAULT_DISCOVERY_PORT,
        }
    }
}
