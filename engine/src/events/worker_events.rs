use std::{sync::Arc, time::Duration};

use crate::{
    events::Observers,
    frame::{BinaryMessage, Frame},
    object::NetworkObject,
    player::NetworkingPlayer,
};

/// A frame that no engine handler claimed
#[derive(Clone, Debug)]
pub struct MessageEvent {
    pub player: Arc<NetworkingPlayer>,
    pub frame: Frame,
}

/// A Binary frame on an application router
#[derive(Clone, Debug)]
pub struct BinaryMessageEvent {
    pub player: Arc<NetworkingPlayer>,
    pub message: BinaryMessage,
}

#[derive(Clone, Debug)]
pub struct TextMessageEvent {
    pub player: Arc<NetworkingPlayer>,
    pub text: String,
}

/// A network object was registered and made ready on this worker
#[derive(Clone, Debug)]
pub struct ObjectCreatedEvent {
    pub object: Arc<NetworkObject>,
}

#[derive(Clone, Debug)]
pub struct PongEvent {
    pub player: Arc<NetworkingPlayer>,
    pub latency: Duration,
}

/// Everything a worker reports to the application.
///
/// Each field is an independent observer list; register on the ones you
/// care about. Observers are called on whichever thread produced the event
/// (a transport reader, the heartbeat driver, or the caller), never with an
/// engine lock held.
#[derive(Default)]
pub struct WorkerEvents {
    // Player lifecycle
    pub player_connected: Observers<Arc<NetworkingPlayer>>,
    pub player_accepted: Observers<Arc<NetworkingPlayer>>,
    pub player_rejected: Observers<Arc<NetworkingPlayer>>,
    pub player_authenticated: Observers<Arc<NetworkingPlayer>>,
    pub player_disconnected: Observers<Arc<NetworkingPlayer>>,
    pub player_timeout: Observers<Arc<NetworkingPlayer>>,

    // Worker lifecycle
    pub bind_success: Observers<()>,
    pub bind_failure: Observers<String>,
    /// Carries whether the disconnect was forced
    pub disconnected: Observers<bool>,
    /// Client side: the server accepted us
    pub server_accepted: Observers<()>,

    // Traffic
    pub message_received: Observers<MessageEvent>,
    pub binary_message_received: Observers<BinaryMessageEvent>,
    pub text_message_received: Observers<TextMessageEvent>,
    pub object_created: Observers<ObjectCreatedEvent>,
    pub pong_received: Observers<PongEvent>,
}

impl WorkerEvents {
    pub fn new() -> Self {
        Self::default()
    }
}
