use std::io::{self, Write};

use tidl_core::wire::{FIELD_STOP, WireTag};

/// Write side of a wire protocol.
///
/// Every call returns the number of bytes it put on the transport, the same
/// quantity generated writers accumulate in `xfer`.
pub trait Protocol {
    fn write_struct_begin(&mut self, name: &str) -> io::Result<usize>;
    fn write_struct_end(&mut self) -> io::Result<usize>;
    fn write_field_begin(&mut self, name: &str, tag: WireTag, id: i16) -> io::Result<usize>;
    fn write_field_end(&mut self) -> io::Result<usize>;
    fn write_field_stop(&mut self) -> io::Result<usize>;
    fn write_list_begin(&mut self, elem: WireTag, size: usize) -> io::Result<usize>;
    fn write_list_end(&mut self) -> io::Result<usize>;
    fn write_set_begin(&mut self, elem: WireTag, size: usize) -> io::Result<usize>;
    fn write_set_end(&mut self) -> io::Result<usize>;
    fn write_map_begin(&mut self, key: WireTag, value: WireTag, size: usize)
    -> io::Result<usize>;
    fn write_map_end(&mut self) -> io::Result<usize>;
    fn write_bool(&mut self, value: bool) -> io::Result<usize>;
    fn write_byte(&mut self, value: i8) -> io::Result<usize>;
    fn write_i16(&mut self, value: i16) -> io::Result<usize>;
    fn write_i32(&mut self, value: i32) -> io::Result<usize>;
    fn write_i64(&mut self, value: i64) -> io::Result<usize>;
    fn write_double(&mut self, value: f64) -> io::Result<usize>;
    fn write_string(&mut self, value: &str) -> io::Result<usize>;
    fn write_binary(&mut self, value: &[u8]) -> io::Result<usize>;
}

/// Big-endian binary encoding without message framing.
pub struct BinaryProtocol<W> {
    transport: W,
}

impl<W: Write> BinaryProtocol<W> {
    pub fn new(transport: W) -> Self {
        BinaryProtocol { transport }
    }

    pub fn into_inner(self) -> W {
        self.transport
    }

    fn put(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.transport.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn write_size(&mut self, size: usize) -> io::Result<usize> {
        let size = i32::try_from(size).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "collection is too large")
        })?;
        self.write_i32(size)
    }
}

impl<W: Write> Protocol for BinaryProtocol<W> {
    fn write_struct_begin(&mut self, _name: &str) -> io::Result<usize> {
        Ok(0)
    }

    fn write_struct_end(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn write_field_begin(&mut self, _name: &str, tag: WireTag, id: i16) -> io::Result<usize> {
        Ok(self.put(&[tag.code()])? + self.write_i16(id)?)
    }

    fn write_field_end(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn write_field_stop(&mut self) -> io::Result<usize> {
        self.put(&[FIELD_STOP])
    }

    fn write_list_begin(&mut self, elem: WireTag, size: usize) -> io::Result<usize> {
        Ok(self.put(&[elem.code()])? + self.write_size(size)?)
    }

    fn write_list_end(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn write_set_begin(&mut self, elem: WireTag, size: usize) -> io::Result<usize> {
        Ok(self.put(&[elem.code()])? + self.write_size(size)?)
    }

    fn write_set_end(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn write_map_begin(
        &mut self,
        key: WireTag,
        value: WireTag,
        size: usize,
    ) -> io::Result<usize> {
        Ok(self.put(&[key.code(), value.code()])? + self.write_size(size)?)
    }

    fn write_map_end(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn write_bool(&mut self, value: bool) -> io::Result<usize> {
        self.put(&[u8::from(value)])
    }

    fn write_byte(&mut self, value: i8) -> io::Result<usize> {
        self.put(&value.to_be_bytes())
    }

    fn write_i16(&mut self, value: i16) -> io::Result<usize> {
        self.put(&value.to_be_bytes())
    }

    fn write_i32(&mut self, value: i32) -> io::Result<usize> {
        self.put(&value.to_be_bytes())
    }

    fn write_i64(&mut self, value: i64) -> io::Result<usize> {
        self.put(&value.to_be_bytes())
    }

    fn write_double(&mut self, value: f64) -> io::Result<usize> {
        self.put(&value.to_bits().to_be_bytes())
    }

    fn write_string(&mut self, value: &str) -> io::Result<usize> {
        self.write_binary(value.as_bytes())
    }

    fn write_binary(&mut self, value: &[u8]) -> io::Result<usize> {
        Ok(self.write_size(value.len())? + self.put(value)?)
    }
}
