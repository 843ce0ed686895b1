use crate::{error::TransportError, player::NetworkingPlayer};

/// The byte pipe a worker sends through.
///
/// Implementations deliver `payload` to `player` and feed whatever arrives
/// back into the worker with `NetWorker::read_bytes`. They may be called
/// from any thread.
pub trait Transport: Send + Sync {
    fn send(&self, player: &NetworkingPlayer, payload: &[u8], reliable: bool) -> Result<(), TransportError>;

    /// Drops the connection to one player. `forced` skips any goodbye
    fn disconnect_player(&self, _player: &NetworkingPlayer, _forced: bool) {}

    /// Shuts the transport down
    fn close(&self, forced: bool);
}
