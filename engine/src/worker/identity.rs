use crate::{
    codec::{ByteReader, ByteWriter, Serde, SerdeErr},
    types::PlayerId,
};

/// Sent by a client right after binding, as the Raw body of an Identity frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityRequest {
    pub instance_guid: String,
    pub credentials: Vec<u8>,
}

/// The server's acceptance, telling the client its player id. The frame's
/// timestamp is what the client synchronizes its clock from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityReply {
    pub player_id: PlayerId,
}

impl Serde for IdentityRequest {
    fn ser(&self, writer: &mut ByteWriter) {
        self.instance_guid.ser(writer);
        self.credentials.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            instance_guid: String::de(reader)?,
            credentials: Vec::<u8>::de(reader)?,
        })
    }
}

impl Serde for IdentityReply {
    fn ser(&self, writer: &mut ByteWriter) {
        self.player_id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            player_id: u32::de(reader)?,
        })
    }
}
