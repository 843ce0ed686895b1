/// In-memory transport for E2E testing
/// Queues outgoing payloads per worker; `TestNetwork::pump` delivers them

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use peerlink_engine::{Frame, NetworkingPlayer, PlayerId, Transport, TransportError};

/// One payload waiting for delivery
#[derive(Clone, Debug)]
pub struct Packet {
    pub to: PlayerId,
    pub payload: Vec<u8>,
}

#[derive(Default)]
pub struct LocalTransport {
    outbox: Mutex<VecDeque<Packet>>,
    sent: Mutex<Vec<(PlayerId, Frame)>>,
    disconnected: Mutex<Vec<(PlayerId, bool)>>,
    closed: AtomicBool,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued packet, oldest first
    pub fn drain(&self) -> Vec<Packet> {
        self.outbox.lock().unwrap().drain(..).collect()
    }

    /// Every frame this transport has sent, decoded, in send order
    pub fn sent_frames(&self) -> Vec<(PlayerId, Frame)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, player_id: PlayerId) -> Vec<Frame> {
        self.sent_frames()
            .into_iter()
            .filter(|(to, _)| *to == player_id)
            .map(|(_, frame)| frame)
            .collect()
    }

    pub fn clear_history(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// `(player id, forced)` for every `disconnect_player` call
    pub fn disconnected_players(&self) -> Vec<(PlayerId, bool)> {
        self.disconnected.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for LocalTransport {
    fn send(&self, player: &NetworkingPlayer, payload: &[u8], _reliable: bool) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let to = player.network_id();
        if let Ok(frame) = Frame::from_bytes(payload) {
            self.sent.lock().unwrap().push((to, frame));
        }
        self.outbox.lock().unwrap().push_back(Packet {
            to,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn disconnect_player(&self, player: &NetworkingPlayer, forced: bool) {
        self.disconnected
            .lock()
            .unwrap()
            .push((player.network_id(), forced));
    }

    fn close(&self, _forced: bool) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
