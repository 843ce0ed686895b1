/// Selects how a Binary frame is dispatched on arrival
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouterId {
    /// Remote procedure call on a network object
    Rpc,
    /// Raw payload delivered to a network object
    BinaryData,
    /// Server confirmation of an object a client asked to create
    CreatedObject,
    /// Single object creation (request from a client, or announcement from the server)
    NetworkObject,
    /// Bulk creation of every live object, sent once on acceptance
    AcceptMulti,
    /// Application-defined router, surfaced as a generic binary message
    Other(u8),
}

impl RouterId {
    pub fn to_u8(self) -> u8 {
        match self {
            RouterId::Rpc => 1,
            RouterId::BinaryData => 2,
            RouterId::CreatedObject => 3,
            RouterId::NetworkObject => 4,
            RouterId::AcceptMulti => 5,
            RouterId::Other(id) => id,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => RouterId::Rpc,
            2 => RouterId::BinaryData,
            3 => RouterId::CreatedObject,
            4 => RouterId::NetworkObject,
            5 => RouterId::AcceptMulti,
            id => RouterId::Other(id),
        }
    }

    /// Whether the wire payload carries a leading network id
    pub fn carries_network_id(self) -> bool {
        matches!(
            self,
            RouterId::Rpc | RouterId::BinaryData | RouterId::CreatedObject | RouterId::NetworkObject
        )
    }

    /// Whether frames with this router are delivered to an already registered object
    pub fn targets_object(self) -> bool {
        matches!(
            self,
            RouterId::Rpc | RouterId::BinaryData | RouterId::CreatedObject
        )
    }
}
