use std::time::Duration;

/// Id of the server's own player on every worker
pub const SERVER_PLAYER_ID: u32 = 0;

/// Object ids start here, 0 means "not yet assigned"
pub const FIRST_NETWORK_ID: u32 = 1;

/// Period of the heartbeat loop
pub const HEARTBEAT_TICK: Duration = Duration::from_millis(10);

/// How long the ending-session flag stays set after teardown
pub const SESSION_END_COOLDOWN: Duration = Duration::from_millis(1000);

// Local discovery

pub const DEFAULT_DISCOVERY_PORT: u16 = 19375;
pub const DISCOVERY_PROBE: [u8; 3] = [0x2A, 0x18, 0x09];
pub const DISCOVERY_SERVER_CODE: u8 = 0x2A;
pub const DISCOVERY_CLIENT_CODE: u8 = 0x18;
