//! Profile-wide (global) commands shared by every cluster.

use super::{CommandDescriptor, Direction};
use crate::protocol::args::{Field, FieldKind};
use crate::protocol::frame::FrameControl;
use crate::protocol::types::DataType;

pub const READ_ATTRIBUTES_ID: u8 = 0x00;
pub const READ_ATTRIBUTES_RESPONSE_ID: u8 = 0x01;
pub const WRITE_ATTRIBUTES_ID: u8 = 0x02;
pub const WRITE_ATTRIBUTES_RESPONSE_ID: u8 = 0x04;
pub const WRITE_ATTRIBUTES_NO_RESPONSE_ID: u8 = 0x05;
pub const REPORT_ATTRIBUTES_ID: u8 = 0x0A;
pub const DEFAULT_RESPONSE_ID: u8 = 0x0B;

/// Name of the list argument carried by every attribute command.
pub const ATTRIBUTES_ARG: &str = "attributes";

pub static READ_ATTRIBUTES_RESPONSE: CommandDescriptor = CommandDescriptor {
    direction: Direction::ToClient,
    global: true,
    args: &[Field::new(ATTRIBUTES_ARG, FieldKind::ReadRecords)],
    is_response: true,
    ..CommandDescriptor::new("readAttributesResponse", READ_ATTRIBUTES_RESPONSE_ID)
};

pub static READ_ATTRIBUTES: CommandDescriptor = CommandDescriptor {
    global: true,
    args: &[Field::new(ATTRIBUTES_ARG, FieldKind::AttributeIds)],
    response: Some(&READ_ATTRIBUTES_RESPONSE),
    ..CommandDescriptor::new("readAttributes", READ_ATTRIBUTES_ID)
};

pub static WRITE_ATTRIBUTES_RESPONSE: CommandDescriptor = CommandDescriptor {
    direction: Direction::ToClient,
    global: true,
    args: &[Field::new(ATTRIBUTES_ARG, FieldKind::WriteStatusRecords)],
    is_response: true,
    ..CommandDescriptor::new("writeAttributesResponse", WRITE_ATTRIBUTES_RESPONSE_ID)
};

pub static WRITE_ATTRIBUTES: CommandDescriptor = CommandDescriptor {
    global: true,
    args: &[Field::new(ATTRIBUTES_ARG, FieldKind::WriteRecords)],
    response: Some(&WRITE_ATTRIBUTES_RESPONSE),
    ..CommandDescriptor::new("writeAttributes", WRITE_ATTRIBUTES_ID)
};

pub static WRITE_ATTRIBUTES_NO_RESPONSE: CommandDescriptor = CommandDescriptor {
    global: true,
    frame_control: Some(FrameControl::empty().with(FrameControl::DISABLE_DEFAULT_RESPONSE)),
    args: &[Field::new(ATTRIBUTES_ARG, FieldKind::WriteRecords)],
    ..CommandDescriptor::new("writeAttributesNoResponse", WRITE_ATTRIBUTES_NO_RESPONSE_ID)
};

pub static REPORT_ATTRIBUTES: CommandDescriptor = CommandDescriptor {
    direction: Direction::ToClient,
    global: true,
    args: &[Field::new(ATTRIBUTES_ARG, FieldKind::WriteRecords)],
    ..CommandDescriptor::new("reportAttributes", REPORT_ATTRIBUTES_ID)
};

pub static DEFAULT_RESPONSE: CommandDescriptor = CommandDescriptor {
    direction: Direction::ToClient,
    global: true,
    args: &[
        Field::new("cmdId", FieldKind::Data(DataType::Uint8)),
        Field::new("status", FieldKind::Status),
    ],
    is_response: true,
    ..CommandDescriptor::new("defaultResponse", DEFAULT_RESPONSE_ID)
};

pub static COMMANDS: &[&CommandDescriptor] = &[
    &READ_ATTRIBUTES,
    &READ_ATTRIBUTES_RESPONSE,
    &WRITE_ATTRIBUTES,
    &WRITE_ATTRIBUTES_RESPONSE,
    &WRITE_ATTRIBUTES_NO_RESPONSE,
    &REPORT_ATTRIBUTES,
    &DEFAULT_RESPONSE,
];
