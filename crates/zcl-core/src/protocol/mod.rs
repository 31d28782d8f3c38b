//! ZCL wire protocol: frame header, attribute data types, command argument
//! schemas, status codes and the transaction sequence counter.

pub mod args;
pub mod codec;
pub mod frame;
pub mod sequence;
pub mod status;
pub mod types;

pub use args::{
    decode_args, encode_args, Arg, Args, Field, FieldKind, ReadRecord, WriteRecord,
    WriteStatusRecord,
};
pub use codec::{ProtocolError, Reader};
pub use frame::{Frame, FrameControl};
pub use sequence::SequenceCounter;
pub use status::Status;
pub use types::{DataType, Value};
