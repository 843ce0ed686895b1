use crate::{
    object::NetworkObject,
    types::{PlayerId, Timestep},
};

/// A decoded remote procedure call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcCall {
    pub method: u8,
    pub args: Vec<u8>,
    /// Player the call came from, `SERVER_PLAYER_ID` for the server
    pub sender: PlayerId,
    pub timestep: Timestep,
}

/// The handler an application attaches to a network object.
///
/// Every method has a no-op default; implement the ones the object needs.
/// Hooks for one object never run concurrently. A handler may call back into
/// the worker for its own object; hooks that triggers run once it returns.
pub trait ObjectBehavior: Send {
    fn on_rpc(&mut self, _object: &NetworkObject, _call: &RpcCall) {}

    /// Raw payload sent with a non-reserved sub-router
    fn on_binary_data(&mut self, _object: &NetworkObject, _sub_router: u8, _data: &[u8]) {}

    /// Called on heartbeat for owned (or server-authoritative) objects.
    /// Returning bytes replicates them to the other peers
    fn write_dirty_fields(&mut self, _object: &NetworkObject) -> Option<Vec<u8>> {
        None
    }

    fn read_dirty_fields(&mut self, _object: &NetworkObject, _data: &[u8], _timestep: Timestep) {}

    fn on_create_confirmed(&mut self, _object: &NetworkObject) {}

    fn on_ownership_changed(&mut self, _object: &NetworkObject, _is_owner: bool) {}

    fn on_destroyed(&mut self, _object: &NetworkObject) {}
}
