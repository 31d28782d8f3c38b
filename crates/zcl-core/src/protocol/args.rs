//! Command argument schemas and their payload codec.
//!
//! A command descriptor declares its arguments as a static slice of
//! [`Field`]s.  Encoding walks the schema and pulls each named [`Arg`] out of
//! an [`Args`] record; decoding walks it the other way and produces one.
//! List-shaped fields (attribute ids, attribute records) consume the rest of
//! the payload, as they do in the ZCL foundation commands.

use tracing::debug;

use crate::protocol::codec::{ProtocolError, Reader};
use crate::protocol::status::Status;
use crate::protocol::types::{decode_value, encode_value, DataType, Value};

/// How one schema field is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single value of a fixed data type (no type id on the wire).
    Data(DataType),
    /// A one-byte ZCL status code.
    Status,
    /// `u16` attribute ids until the end of the payload.
    AttributeIds,
    /// Read-attributes response records: `id, status, [type, value]`.
    ReadRecords,
    /// `id, type, value` records, used by write requests and attribute reports.
    WriteRecords,
    /// Write-attributes response records: `status, [id]`.
    WriteStatusRecords,
    /// Everything left in the payload, uninterpreted.
    Remaining,
}

/// A named field in a command's argument schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// One record of a read-attributes response.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRecord {
    pub id: u16,
    pub status: Status,
    /// Present only when `status` is success.
    pub value: Option<(DataType, Value)>,
}

/// One attribute id / type / value triple.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub id: u16,
    pub data_type: DataType,
    pub value: Value,
}

/// One record of a write-attributes response.
///
/// A device that accepted every attribute answers with a single success
/// record and no id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStatusRecord {
    pub status: Status,
    pub id: Option<u16>,
}

/// A decoded or to-be-encoded argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Status(Status),
    AttributeIds(Vec<u16>),
    ReadRecords(Vec<ReadRecord>),
    WriteRecords(Vec<WriteRecord>),
    WriteStatusRecords(Vec<WriteStatusRecord>),
    Bytes(Vec<u8>),
}

/// An ordered, name-keyed set of command arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Args {
    fields: Vec<(&'static str, Arg)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &'static str, arg: Arg) -> Self {
        self.insert(name, arg);
        self
    }

    /// Inserts or replaces the argument called `name`.
    pub fn insert(&mut self, name: &'static str, arg: Arg) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = arg,
            None => self.fields.push((name, arg)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, a)| a)
    }

    pub fn take(&mut self, name: &str) -> Option<Arg> {
        let index = self.fields.iter().position(|(n, _)| *n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn status(&self, name: &str) -> Option<Status> {
        match self.get(name)? {
            Arg::Status(s) => Some(*s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arg)> {
        self.fields.iter().map(|(n, a)| (*n, a))
    }
}

/// Serializes `args` according to `schema`.
///
/// # Errors
///
/// [`ProtocolError::MissingArgument`] when a schema field has no argument,
/// [`ProtocolError::ArgumentKind`] when the argument has the wrong shape.
pub fn encode_args(schema: &[Field], args: &Args) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    for field in schema {
        let arg = args
            .get(field.name)
            .ok_or(ProtocolError::MissingArgument(field.name))?;
        match (field.kind, arg) {
            (FieldKind::Data(data_type), Arg::Value(value)) => {
                encode_value(&mut buf, data_type, value)?;
            }
            (FieldKind::Status, Arg::Status(status)) => buf.push(status.as_u8()),
            (FieldKind::AttributeIds, Arg::AttributeIds(ids)) => {
                for id in ids {
                    buf.extend_from_slice(&id.to_le_bytes());
                }
            }
            (FieldKind::ReadRecords, Arg::ReadRecords(records)) => {
                for record in records {
                    buf.extend_from_slice(&record.id.to_le_bytes());
                    buf.push(record.status.as_u8());
                    if let (true, Some((data_type, value))) =
                        (record.status.is_success(), &record.value)
                    {
                        buf.push(*data_type as u8);
                        encode_value(&mut buf, *data_type, value)?;
                    }
                }
            }
            (FieldKind::WriteRecords, Arg::WriteRecords(records)) => {
                for record in records {
                    buf.extend_from_slice(&record.id.to_le_bytes());
                    buf.push(record.data_type as u8);
                    encode_value(&mut buf, record.data_type, &record.value)?;
                }
            }
            (FieldKind::WriteStatusRecords, Arg::WriteStatusRecords(records)) => {
                for record in records {
                    buf.push(record.status.as_u8());
                    if let Some(id) = record.id {
                        buf.extend_from_slice(&id.to_le_bytes());
                    }
                }
            }
            (FieldKind::Remaining, Arg::Bytes(bytes)) => buf.extend_from_slice(bytes),
            _ => return Err(ProtocolError::ArgumentKind(field.name)),
        }
    }
    Ok(buf)
}

/// Parses `payload` according to `schema`.
///
/// Trailing bytes after the last fixed-width field are ignored; some devices
/// pad their frames.
pub fn decode_args(schema: &[Field], payload: &[u8]) -> Result<Args, ProtocolError> {
    let mut reader = Reader::new(payload);
    let mut args = Args::new();
    for field in schema {
        let arg = match field.kind {
            FieldKind::Data(data_type) => Arg::Value(decode_value(&mut reader, data_type)?),
            FieldKind::Status => Arg::Status(Status::from_u8(reader.u8()?)),
            FieldKind::AttributeIds => {
                let mut ids = Vec::with_capacity(reader.remaining() / 2);
                while reader.remaining() >= 2 {
                    ids.push(reader.u16()?);
                }
                Arg::AttributeIds(ids)
            }
            FieldKind::ReadRecords => {
                let mut records = Vec::new();
                while !reader.is_empty() {
                    let id = reader.u16()?;
                    let status = Status::from_u8(reader.u8()?);
                    let value = if status.is_success() {
                        match DataType::try_from(reader.u8()?) {
                            Ok(data_type) => Some((data_type, decode_value(&mut reader, data_type)?)),
                            Err(ProtocolError::UnknownDataType(type_id)) => {
                                // The value's length is unknown, so nothing after it can be read.
                                debug!(attribute_id = id, type_id, "read record with unknown data type");
                                records.push(ReadRecord {
                                    id,
                                    status: Status::InvalidDataType,
                                    value: None,
                                });
                                reader.rest();
                                break;
                            }
                            Err(e) => return Err(e),
                        }
                    } else {
                        None
                    };
                    records.push(ReadRecord { id, status, value });
                }
                Arg::ReadRecords(records)
            }
            FieldKind::WriteRecords => {
                let mut records = Vec::new();
                while !reader.is_empty() {
                    let id = reader.u16()?;
                    let data_type = DataType::try_from(reader.u8()?)?;
                    let value = decode_value(&mut reader, data_type)?;
                    records.push(WriteRecord { id, data_type, value });
                }
                Arg::WriteRecords(records)
            }
            FieldKind::WriteStatusRecords => {
                let mut records = Vec::new();
                while !reader.is_empty() {
                    let status = Status::from_u8(reader.u8()?);
                    let id = if reader.remaining() >= 2 {
                        Some(reader.u16()?)
                    } else {
                        None
                    };
                    records.push(WriteStatusRecord { status, id });
                }
                Arg::WriteStatusRecords(records)
            }
            FieldKind::Remaining => Arg::Bytes(reader.rest().to_vec()),
        };
        args.insert(field.name, arg);
    }
    Ok(args)
}
