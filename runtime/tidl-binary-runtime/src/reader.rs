use std::collections::BTreeMap;
use std::io::Read;

use tidl_core::wire::{FIELD_STOP, WireTag};

use crate::{DecodeError, Value};

/// Reads what [`BinaryProtocol`](crate::BinaryProtocol) writes.
///
/// Decoding is driven by the wire tags alone, so it needs no knowledge of the
/// schema that produced the bytes.
pub struct BinaryReader<R> {
    transport: R,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(transport: R) -> Self {
        BinaryReader { transport }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0; N];
        self.transport.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_tag(&mut self) -> Result<WireTag, DecodeError> {
        let [code] = self.take::<1>()?;
        WireTag::from_code(code).ok_or(DecodeError::UnknownWireType(code))
    }

    fn read_size(&mut self) -> Result<usize, DecodeError> {
        let size = self.read_i32()?;
        usize::try_from(size).map_err(|_| DecodeError::NegativeLength(size))
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let [byte] = self.take::<1>()?;
        Ok(byte != 0)
    }

    pub fn read_byte(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_be_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.take()?))
    }

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.take()?)))
    }

    pub fn read_binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        let size = self.read_size()?;
        let mut buf = vec![0; size];
        self.transport.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        Ok(String::from_utf8(self.read_binary()?)?)
    }

    /// Returns `None` on the field-stop marker.
    pub fn read_field_begin(&mut self) -> Result<Option<(WireTag, i16)>, DecodeError> {
        let [code] = self.take::<1>()?;
        if code == FIELD_STOP {
            return Ok(None);
        }
        let tag = WireTag::from_code(code).ok_or(DecodeError::UnknownWireType(code))?;
        Ok(Some((tag, self.read_i16()?)))
    }

    pub fn read_struct(&mut self) -> Result<BTreeMap<i16, Value>, DecodeError> {
        let mut fields = BTreeMap::new();
        while let Some((tag, id)) = self.read_field_begin()? {
            fields.insert(id, self.read_value(tag)?);
        }
        Ok(fields)
    }

    pub fn read_value(&mut self, tag: WireTag) -> Result<Value, DecodeError> {
        let value = match tag {
            WireTag::Bool => Value::Bool(self.read_bool()?),
            WireTag::Byte => Value::Byte(self.read_byte()?),
            WireTag::I16 => Value::I16(self.read_i16()?),
            WireTag::I32 => Value::I32(self.read_i32()?),
            WireTag::I64 => Value::I64(self.read_i64()?),
            WireTag::Double => Value::Double(self.read_double()?),
            // STRING carries both text and binary, tell them apart by content.
            WireTag::String => match String::from_utf8(self.read_binary()?) {
                Ok(text) => Value::String(text),
                Err(error) => Value::Binary(error.into_bytes()),
            },
            WireTag::Struct => Value::Struct(self.read_struct()?),
            WireTag::List | WireTag::Set => {
                let elem = self.read_tag()?;
                let size = self.read_size()?;
                let elems = (0..size)
                    .map(|_| self.read_value(elem))
                    .collect::<Result<Vec<_>, _>>()?;
                if tag == WireTag::List {
                    Value::List(elems)
                } else {
                    Value::Set(elems)
                }
            }
            WireTag::Map => {
                let key = self.read_tag()?;
                let value = self.read_tag()?;
                let size = self.read_size()?;
                let entries = (0..size)
                    .map(|_| -> Result<_, DecodeError> {
                        Ok((self.read_value(key)?, self.read_value(value)?))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Map(entries)
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryProtocol, Protocol};

    const I32_VALUES: [i32; 8] = [
        325,
        0,
        -1,
        -1073741825,
        -278,
        -4352388,
        i32::MIN,
        i32::MAX,
    ];
    const DOUBLE_VALUES: [f64; 5] = [f64::MIN_POSITIVE, -33.8755, 0.0, 3658.1279, f64::MAX];

    #[test]
    fn primitives_round_trip() {
        let mut protocol = BinaryProtocol::new(Vec::new());
        for value in I32_VALUES {
            protocol.write_i32(value).expect("writing into Vec is always ok");
        }
        for value in DOUBLE_VALUES {
            protocol.write_double(value).expect("writing into Vec is always ok");
        }
        protocol
            .write_i64(i64::MIN)
            .expect("writing into Vec is always ok");
        protocol
            .write_string("welcome to my test")
            .expect("writing into Vec is always ok");

        let bytes = protocol.into_inner();
        let mut reader = BinaryReader::new(bytes.as_slice());
        for value in I32_VALUES {
            assert_eq!(reader.read_i32().expect("i32"), value);
        }
        for value in DOUBLE_VALUES {
            assert_eq!(reader.read_double().expect("double"), value);
        }
        assert_eq!(reader.read_i64().expect("i64"), i64::MIN);
        assert_eq!(reader.read_string().expect("string"), "welcome to my test");
    }

    #[test]
    fn nonzero_bytes_read_as_true() {
        let mut reader = BinaryReader::new([0u8, 1, 14, 0xf2].as_slice());
        assert!(!reader.read_bool().expect("bool"));
        assert!(reader.read_bool().expect("bool"));
        assert!(reader.read_bool().expect("bool"));
        assert!(reader.read_bool().expect("bool"));
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let mut reader = BinaryReader::new([1u8, 0, 1].as_slice());
        assert!(matches!(
            reader.read_field_begin(),
            Err(DecodeError::UnknownWireType(1))
        ));
    }

    #[test]
    fn negative_lengths_are_rejected() {
        let mut reader = BinaryReader::new([0xffu8, 0xff, 0xff, 0xff].as_slice());
        assert!(matches!(
            reader.read_string(),
            Err(DecodeError::NegativeLength(-1))
        ));
    }

    #[test]
    fn truncated_input_is_an_io_error() {
        let mut reader = BinaryReader::new([0u8, 0].as_slice());
        assert!(matches!(reader.read_i32(), Err(DecodeError::Io(_))));
    }

    #[test]
    fn non_utf8_payloads_decode_as_binary() {
        let mut protocol = BinaryProtocol::new(Vec::new());
        protocol
            .write_binary(&[0xff, 0x00, 0xfe])
            .expect("writing into Vec is always ok");
        protocol
            .write_string("text")
            .expect("writing into Vec is always ok");

        let bytes = protocol.into_inner();
        let mut reader = BinaryReader::new(bytes.as_slice());
        let binary = reader.read_value(WireTag::String).expect("binary");
        assert_eq!(binary, Value::Binary(vec![0xff, 0x00, 0xfe]));
        assert_eq!(binary.tag(), WireTag::String);
        assert_eq!(
            reader.read_value(WireTag::String).expect("string"),
            Value::String("text".to_owned())
        );
    }
}
