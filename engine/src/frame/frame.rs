use crate::{
    codec::{ByteReader, ByteWriter, Serde, SerdeErr},
    frame::{GroupId, Receivers, RouterId},
    types::{NetworkId, Timestep},
};

/// Payload of a Binary frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMessage {
    pub router_id: RouterId,
    /// Target object, 0 when the router does not address an object
    pub network_id: NetworkId,
    pub payload: Vec<u8>,
}

impl BinaryMessage {
    pub fn new(router_id: RouterId, network_id: NetworkId, payload: Vec<u8>) -> Self {
        Self {
            router_id,
            network_id,
            payload,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameBody {
    Binary(BinaryMessage),
    Text(String),
    /// Tick count of the sender at the moment the ping was generated
    Ping(u64),
    /// The tick count of the ping being answered, echoed unchanged
    Pong(u64),
    /// Engine-internal or application bytes without routing
    Raw(Vec<u8>),
}

/// The wire envelope every message travels in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub group_id: GroupId,
    pub timestamp: Timestep,
    /// Whether the transport should deliver this reliably (TCP-like)
    pub reliable: bool,
    pub receivers: Receivers,
    pub body: FrameBody,
}

impl Frame {
    pub fn new(group_id: GroupId, timestamp: Timestep, body: FrameBody) -> Self {
        Self {
            group_id,
            timestamp,
            reliable: true,
            receivers: Receivers::Target,
            body,
        }
    }

    pub fn binary(timestamp: Timestep, message: BinaryMessage) -> Self {
        Self::new(GroupId::Replication, timestamp, FrameBody::Binary(message))
    }

    pub fn with_receivers(mut self, receivers: Receivers) -> Self {
        self.receivers = receivers;
        self
    }

    pub fn unreliable(mut self) -> Self {
        self.reliable = false;
        self
    }

    pub fn as_binary(&self) -> Option<&BinaryMessage> {
        match &self.body {
            FrameBody::Binary(message) => Some(message),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = ByteReader::new(bytes);
        Self::de(&mut reader)
    }
}

impl Serde for Frame {
    fn ser(&self, writer: &mut ByteWriter) {
        self.group_id.ser(writer);
        self.timestamp.ser(writer);
        self.reliable.ser(writer);
        self.receivers.ser(writer);

        match &self.body {
            FrameBody::Binary(message) => {
                0u8.ser(writer);
                message.router_id.to_u8().ser(writer);
                if message.router_id.carries_network_id() {
                    message.network_id.ser(writer);
                }
                writer.write_bytes(&message.payload);
            }
            FrameBody::Text(text) => {
                1u8.ser(writer);
                writer.write_bytes(text.as_bytes());
            }
            FrameBody::Ping(ticks) => {
                2u8.ser(writer);
                ticks.ser(writer);
            }
            FrameBody::Pong(ticks) => {
                3u8.ser(writer);
                ticks.ser(writer);
            }
            FrameBody::Raw(bytes) => {
                4u8.ser(writer);
                writer.write_bytes(bytes);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let group_id = GroupId::de(reader)?;
        let timestamp = Timestep::de(reader)?;
        let reliable = bool::de(reader)?;
        let receivers = Receivers::de(reader)?;

        let body = match u8::de(reader)? {
            0 => {
                let router_id = RouterId::from_u8(u8::de(reader)?);
                let network_id = if router_id.carries_network_id() {
                    NetworkId::de(reader)?
                } else {
                    0
                };
                let payload = reader.read_to_end().to_vec();
                FrameBody::Binary(BinaryMessage::new(router_id, network_id, payload))
            }
            1 => {
                let text = String::from_utf8(reader.read_to_end().to_vec())
                    .map_err(|_| SerdeErr::InvalidUtf8)?;
                FrameBody::Text(text)
            }
            2 => FrameBody::Ping(u64::de(reader)?),
            3 => FrameBody::Pong(u64::de(reader)?),
            4 => FrameBody::Raw(reader.read_to_end().to_vec()),
            value => {
                return Err(SerdeErr::InvalidTag {
                    kind: "frame body",
                    value: value as u32,
                })
            }
        };

        Ok(Self {
            group_id,
            timestamp,
            reliable,
            receivers,
            body,
        })
    }
}
