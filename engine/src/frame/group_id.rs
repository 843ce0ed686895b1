use crate::codec::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Group ids below this value are reserved for the engine
pub const START_OF_APPLICATION_GROUP_IDS: u32 = 16;

/// The group a frame belongs to. Used to classify incoming traffic before
/// looking at the frame body
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupId {
    // Identification on connect, and the server's acceptance reply
    Identity,
    // Round-trip measurement, must be answered with a Pong
    Ping,
    Pong,
    // Graceful disconnection notice
    Disconnect,
    // Network object traffic (rpc, binary data, creation)
    Replication,
    // Cache key requests and replies
    Cache,
    Application(u32),
}

impl GroupId {
    /// Returns an application group, or None if `id` lies in the reserved range
    pub fn application(id: u32) -> Option<Self> {
        if id < START_OF_APPLICATION_GROUP_IDS {
            return None;
        }
        Some(GroupId::Application(id))
    }

    pub fn to_u32(self) -> u32 {
        match self {
            GroupId::Identity => 1,
            GroupId::Ping => 2,
            GroupId::Pong => 3,
            GroupId::Disconnect => 4,
            GroupId::Replication => 5,
            GroupId::Cache => 6,
            GroupId::Application(id) => id,
        }
    }

    pub fn from_u32(value: u32) -> Result<Self, SerdeErr> {
        match value {
            1 => Ok(GroupId::Identity),
            2 => Ok(GroupId::Ping),
            3 => Ok(GroupId::Pong),
            4 => Ok(GroupId::Disconnect),
            5 => Ok(GroupId::Replication),
            6 => Ok(GroupId::Cache),
            id if id >= START_OF_APPLICATION_GROUP_IDS => Ok(GroupId::Application(id)),
            // SECURITY: unassigned reserved ids are rejected rather than guessed at
            _ => Err(SerdeErr::InvalidTag {
                kind: "group id",
                value,
            }),
        }
    }

    pub fn is_reserved(self) -> bool {
        !matches!(self, GroupId::Application(_))
    }
}

impl Serde for GroupId {
    fn ser(&self, writer: &mut ByteWriter) {
        self.to_u32().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Self::from_u32(u32::de(reader)?)
    }
}
