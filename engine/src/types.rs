/// Replication id of a network object, unique within one worker
pub type NetworkId = u32;
/// Id of a player, assigned by the server. The server's own player is 0
pub type PlayerId = u32;
/// Application-defined sub-type selector used to pick an object factory
pub type CreateCode = u32;
/// Logical timestep in milliseconds, used to stamp frames
pub type Timestep = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }

    pub fn is_server(self) -> bool {
        self == HostType::Server
    }
}
