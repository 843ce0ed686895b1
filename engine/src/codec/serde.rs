use super::{ByteReader, ByteWriter, SerdeErr};

/// A type that can be written to and read from the wire
pub trait Serde: Sized {
    fn ser(&self, writer: &mut ByteWriter);

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SerdeErr::InvalidTag {
                kind: "bool",
                value: value as u32,
            }),
        }
    }
}

macro_rules! impl_serde_for_number {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut ByteWriter) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    const SIZE: usize = std::mem::size_of::<$ty>();
                    let bytes = reader.read_bytes(SIZE)?;
                    let mut array = [0u8; SIZE];
                    array.copy_from_slice(bytes);
                    Ok(<$ty>::from_le_bytes(array))
                }
            }
        )*
    };
}

impl_serde_for_number!(u8, u16, u32, u64, i64, f64);

// Length-prefixed byte payload
impl Serde for Vec<u8> {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.len() as u32).ser(writer);
        writer.write_bytes(self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = u32::de(reader)? as usize;
        Ok(reader.read_bytes(length)?.to_vec())
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.len() as u32).ser(writer);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = u32::de(reader)? as usize;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::InvalidUtf8)
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Some(value) => {
                true.ser(writer);
                value.ser(writer);
            }
            None => false.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}
