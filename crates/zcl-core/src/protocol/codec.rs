//! Shared error type and byte-level helpers for the ZCL codecs.
//!
//! ZCL is little-endian throughout.  Payload parsing walks the buffer with a
//! [`Reader`] cursor; every read is bounds-checked and reports how many bytes
//! were needed, so truncated radio frames never panic.

use thiserror::Error;

use crate::protocol::types::DataType;

/// Errors that can occur while encoding or decoding ZCL frames and payloads.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the field being read.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Frame type bits `10` and `11` are reserved by the ZCL specification.
    #[error("reserved frame type in frame control: 0b{0:02b}")]
    ReservedFrameType(u8),

    /// The attribute data type id is not one this codec understands.
    #[error("unknown data type: 0x{0:02X}")]
    UnknownDataType(u8),

    /// A [`Value`](crate::protocol::types::Value) variant cannot be written as this type.
    #[error("value does not match data type {0:?}")]
    TypeMismatch(DataType),

    /// The value does not fit in the wire width of the data type.
    #[error("value {value} is out of range for data type {data_type:?}")]
    ValueOutOfRange { data_type: DataType, value: i64 },

    /// A field required by the command schema was not supplied.
    #[error("missing command argument `{0}`")]
    MissingArgument(&'static str),

    /// An argument was supplied with the wrong shape for its schema field.
    #[error("argument `{0}` does not match its schema field")]
    ArgumentKind(&'static str),

    /// The payload could not be parsed (invalid UTF-8, oversized string, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// A bounds-checked little-endian cursor over a payload.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::InsufficientData {
                needed: self.pos + n,
                available: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes and returns everything left in the buffer.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u24(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a u8-length-prefixed byte string.
    pub fn short_bytes(&mut self) -> Result<&'a [u8], ProtocolError> {
        let len = self.u8()?;
        // 0xFF marks an invalid (absent) string.
        if len == 0xFF {
            return Ok(&[]);
        }
        self.take(len as usize)
    }
}

/// Writes a u8 length prefix followed by the bytes.
pub(crate) fn write_short_bytes(
    buf: &mut Vec<u8>,
    bytes: &[u8],
    data_type: DataType,
) -> Result<(), ProtocolError> {
    if bytes.len() > 0xFE {
        return Err(ProtocolError::ValueOutOfRange {
            data_type,
            value: bytes.len() as i64,
        });
    }
    buf.push(bytes.len() as u8);
    buf.extend_from_slice(bytes);
    Ok(())
}
