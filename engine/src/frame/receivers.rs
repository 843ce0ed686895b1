use crate::codec::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Who a frame is meant for. The server uses this to relay client traffic
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Receivers {
    /// A single, explicitly addressed player
    Target,
    /// Everyone, the sender included
    All,
    /// Everyone except the sender
    Others,
    /// Only the server
    Server,
    /// Only the owner of the targeted object
    Owner,
}

impl Serde for Receivers {
    fn ser(&self, writer: &mut ByteWriter) {
        let index: u8 = match self {
            Receivers::Target => 0,
            Receivers::All => 1,
            Receivers::Others => 2,
            Receivers::Server => 3,
            Receivers::Owner => 4,
        };
        index.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(Receivers::Target),
            1 => Ok(Receivers::All),
            2 => Ok(Receivers::Others),
            3 => Ok(Receivers::Server),
            4 => Ok(Receivers::Owner),
            value => Err(SerdeErr::InvalidTag {
                kind: "receivers",
                value: value as u32,
            }),
        }
    }
}
