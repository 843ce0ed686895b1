use crate::{
    cache::CachedValue,
    codec::{ByteReader, ByteWriter, Serde, SerdeErr},
};

/// Client asking the server for one cache key, sent as the Raw body of a
/// Cache group frame
#[derive(Clone, Debug, PartialEq)]
pub struct CacheRequest {
    pub request_id: u32,
    pub key: String,
}

/// Server reply, matched to its request by id
#[derive(Clone, Debug, PartialEq)]
pub struct CacheResponse {
    pub request_id: u32,
    pub value: Option<CachedValue>,
}

impl Serde for CacheRequest {
    fn ser(&self, writer: &mut ByteWriter) {
        self.request_id.ser(writer);
        self.key.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            request_id: u32::de(reader)?,
            key: String::de(reader)?,
        })
    }
}

impl Serde for CacheResponse {
    fn ser(&self, writer: &mut ByteWriter) {
        self.request_id.ser(writer);
        self.value.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            request_id: u32::de(reader)?,
            value: Option::<CachedValue>::de(reader)?,
        })
    }
}
