//! ZCL attribute data types and a dynamically typed attribute value.
//!
//! Attribute values travel with a one-byte type id.  [`DataType`] names the
//! subset of the ZCL type table this workspace uses; [`Value`] is the
//! in-memory form, encoded *against* a data type so one `Value::Unsigned` can
//! be written as `uint8`, `map8` or `enum8` depending on the attribute.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::{write_short_bytes, ProtocolError, Reader};

/// ZCL data type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    Bool = 0x10,
    Map8 = 0x18,
    Map16 = 0x19,
    Uint8 = 0x20,
    Uint16 = 0x21,
    Uint24 = 0x22,
    Uint32 = 0x23,
    Int8 = 0x28,
    Int16 = 0x29,
    Int24 = 0x2A,
    Int32 = 0x2B,
    Enum8 = 0x30,
    Enum16 = 0x31,
    OctetString = 0x41,
    CharString = 0x42,
    /// Seconds since 2000-01-01T00:00:00.
    Utc = 0xE2,
}

impl TryFrom<u8> for DataType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x10 => Ok(DataType::Bool),
            0x18 => Ok(DataType::Map8),
            0x19 => Ok(DataType::Map16),
            0x20 => Ok(DataType::Uint8),
            0x21 => Ok(DataType::Uint16),
            0x22 => Ok(DataType::Uint24),
            0x23 => Ok(DataType::Uint32),
            0x28 => Ok(DataType::Int8),
            0x29 => Ok(DataType::Int16),
            0x2A => Ok(DataType::Int24),
            0x2B => Ok(DataType::Int32),
            0x30 => Ok(DataType::Enum8),
            0x31 => Ok(DataType::Enum16),
            0x41 => Ok(DataType::OctetString),
            0x42 => Ok(DataType::CharString),
            0xE2 => Ok(DataType::Utc),
            other => Err(ProtocolError::UnknownDataType(other)),
        }
    }
}

/// An attribute or argument value, independent of its wire width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Unsigned(u32),
    Signed(i32),
    Bytes(Vec<u8>),
    Text(String),
}

impl Value {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Signed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Unsigned(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Unsigned(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Unsigned(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Signed(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Appends `value` to `buf` in the wire form of `data_type`.
///
/// # Errors
///
/// [`ProtocolError::TypeMismatch`] when the value variant cannot carry the
/// type, [`ProtocolError::ValueOutOfRange`] when it does not fit its width.
pub fn encode_value(buf: &mut Vec<u8>, data_type: DataType, value: &Value) -> Result<(), ProtocolError> {
    match (data_type, value) {
        (DataType::Bool, Value::Bool(b)) => buf.push(u8::from(*b)),
        (DataType::Map8 | DataType::Uint8 | DataType::Enum8, Value::Unsigned(v)) => {
            let v = unsigned_in_range(data_type, *v, 0xFF)?;
            buf.push(v as u8);
        }
        (DataType::Map16 | DataType::Uint16 | DataType::Enum16, Value::Unsigned(v)) => {
            let v = unsigned_in_range(data_type, *v, 0xFFFF)?;
            buf.extend_from_slice(&(v as u16).to_le_bytes());
        }
        (DataType::Uint24, Value::Unsigned(v)) => {
            let v = unsigned_in_range(data_type, *v, 0x00FF_FFFF)?;
            buf.extend_from_slice(&v.to_le_bytes()[..3]);
        }
        (DataType::Uint32 | DataType::Utc, Value::Unsigned(v)) => {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        (DataType::Int8, Value::Signed(v)) => {
            let v = signed_in_range(data_type, *v, i8::MIN.into(), i8::MAX.into())?;
            buf.push(v as i8 as u8);
        }
        (DataType::Int16, Value::Signed(v)) => {
            let v = signed_in_range(data_type, *v, i16::MIN.into(), i16::MAX.into())?;
            buf.extend_from_slice(&(v as i16).to_le_bytes());
        }
        (DataType::Int24, Value::Signed(v)) => {
            let v = signed_in_range(data_type, *v, -(1 << 23), (1 << 23) - 1)?;
            buf.extend_from_slice(&v.to_le_bytes()[..3]);
        }
        (DataType::Int32, Value::Signed(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (DataType::OctetString, Value::Bytes(b)) => write_short_bytes(buf, b, data_type)?,
        (DataType::CharString, Value::Text(s)) => write_short_bytes(buf, s.as_bytes(), data_type)?,
        _ => return Err(ProtocolError::TypeMismatch(data_type)),
    }
    Ok(())
}

/// Reads one value of `data_type` from the cursor.
pub fn decode_value(reader: &mut Reader<'_>, data_type: DataType) -> Result<Value, ProtocolError> {
    let value = match data_type {
        DataType::Bool => Value::Bool(reader.u8()? != 0),
        DataType::Map8 | DataType::Uint8 | DataType::Enum8 => Value::Unsigned(reader.u8()?.into()),
        DataType::Map16 | DataType::Uint16 | DataType::Enum16 => {
            Value::Unsigned(reader.u16()?.into())
        }
        DataType::Uint24 => Value::Unsigned(reader.u24()?),
        DataType::Uint32 | DataType::Utc => Value::Unsigned(reader.u32()?),
        DataType::Int8 => Value::Signed((reader.u8()? as i8).into()),
        DataType::Int16 => Value::Signed((reader.u16()? as i16).into()),
        // Shift the 24-bit value into the top of an i32 and back to sign-extend.
        DataType::Int24 => Value::Signed(((reader.u24()? << 8) as i32) >> 8),
        DataType::Int32 => Value::Signed(reader.u32()? as i32),
        DataType::OctetString => Value::Bytes(reader.short_bytes()?.to_vec()),
        DataType::CharString => {
            let bytes = reader.short_bytes()?;
            let text = std::str::from_utf8(bytes)
                .map_err(|e| ProtocolError::MalformedPayload(format!("string attribute: {e}")))?;
            Value::Text(text.to_string())
        }
    };
    Ok(value)
}

fn unsigned_in_range(data_type: DataType, v: u32, max: u32) -> Result<u32, ProtocolError> {
    if v > max {
        return Err(ProtocolError::ValueOutOfRange {
            data_type,
            value: v.into(),
        });
    }
    Ok(v)
}

fn signed_in_range(data_type: DataType, v: i32, min: i32, max: i32) -> Result<i32, ProtocolError> {
    if v < min || v > max {
        return Err(ProtocolError::ValueOutOfRange {
            data_type,
            value: v.into(),
        });
    }
    Ok(v)
}
