use crate::codec::{ByteReader, ByteWriter, Serde, SerdeErr};

/// A value stored in a worker's cache
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Serde for CachedValue {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            CachedValue::Bytes(bytes) => {
                0u8.ser(writer);
                bytes.ser(writer);
            }
            CachedValue::Text(text) => {
                1u8.ser(writer);
                text.ser(writer);
            }
            CachedValue::Int(value) => {
                2u8.ser(writer);
                value.ser(writer);
            }
            CachedValue::Float(value) => {
                3u8.ser(writer);
                value.ser(writer);
            }
            CachedValue::Bool(value) => {
                4u8.ser(writer);
                value.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let tag = u8::de(reader)?;
        match tag {
            0 => Ok(CachedValue::Bytes(Vec::<u8>::de(reader)?)),
            1 => Ok(CachedValue::Text(String::de(reader)?)),
            2 => Ok(CachedValue::Int(i64::de(reader)?)),
            3 => Ok(CachedValue::Float(f64::de(reader)?)),
            4 => Ok(CachedValue::Bool(bool::de(reader)?)),
            value => Err(SerdeErr::InvalidTag {
                kind: "CachedValue",
                value: value as u32,
            }),
        }
    }
}

impl From<Vec<u8>> for CachedValue {
    fn from(value: Vec<u8>) -> Self {
        CachedValue::Bytes(value)
    }
}

impl From<String> for CachedValue {
    fn from(value: String) -> Self {
        CachedValue::Text(value)
    }
}

impl From<&str> for CachedValue {
    fn from(value: &str) -> Self {
        CachedValue::Text(value.to_string())
    }
}

impl From<i64> for CachedValue {
    fn from(value: i64) -> Self {
        CachedValue::Int(value)
    }
}

impl From<f64> for CachedValue {
    fn from(value: f64) -> Self {
        CachedValue::Float(value)
    }
}

impl From<bool> for CachedValue {
    fn from(value: bool) -> Self {
        CachedValue::Bool(value)
    }
}
