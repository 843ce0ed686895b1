use thiserror::Error;

use crate::{
    codec::SerdeErr,
    types::{NetworkId, PlayerId},
    worker::WorkerState,
};

/// Errors reported by a transport implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport could not be bound to its endpoint
    #[error("Failed to bind transport: {reason}")]
    BindFailed { reason: String },

    /// A payload could not be handed to the peer
    #[error("Failed to send {size} bytes to player {player_id}")]
    SendFailed { player_id: PlayerId, size: usize },

    /// The transport has already been closed
    #[error("Transport is closed")]
    Closed,
}

/// Faults surfaced to the caller of a worker operation. These indicate a
/// violated invariant upstream and are never swallowed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The player instance (or its id) was already added to this worker
    #[error("Player {player_id} is already connected to this worker")]
    DuplicatePlayer { player_id: PlayerId },

    /// The object is already registered, here or with another worker
    #[error("Network object {network_id} is already registered with a worker")]
    ObjectAlreadyRegistered { network_id: NetworkId },

    /// An authenticator may only be installed before the worker binds
    #[error("Cannot set an authenticator on a worker that is already connected")]
    AuthenticatorWhileConnected,

    /// The operation requires a different lifecycle state
    #[error("Operation requires the worker to be {expected:?}, but it is {actual:?}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },

    /// The operation is only meaningful on the other host type
    #[error("Operation '{operation}' is not available on this host type")]
    WrongHostType { operation: &'static str },

    /// Application rpc methods must not use the engine-reserved range
    #[error("RPC method {method} is reserved by the engine")]
    ReservedRpcMethod { method: u8 },

    /// Only the owner (or the server) may do this to the object
    #[error("Network object {network_id} is owned by another player")]
    NotOwner { network_id: NetworkId },

    /// The object has not been assigned an id yet
    #[error("Network object has not been registered yet")]
    ObjectNotRegistered,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serde(#[from] SerdeErr),
}
