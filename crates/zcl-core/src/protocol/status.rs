//! ZCL status codes, as carried by default responses and attribute records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A ZCL status code.
///
/// Codes the workspace does not name are preserved in [`Status::Unknown`] so a
/// device's answer is never lost in translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Success,
    Failure,
    NotAuthorized,
    MalformedCommand,
    UnsupportedClusterCommand,
    UnsupportedGeneralCommand,
    UnsupportedManufacturerClusterCommand,
    UnsupportedManufacturerGeneralCommand,
    InvalidField,
    UnsupportedAttribute,
    InvalidValue,
    ReadOnly,
    InsufficientSpace,
    NotFound,
    UnreportableAttribute,
    InvalidDataType,
    WriteOnly,
    Timeout,
    HardwareFailure,
    SoftwareFailure,
    UnsupportedCluster,
    Unknown(u8),
}

impl Status {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0x00 => Status::Success,
            0x01 => Status::Failure,
            0x7E => Status::NotAuthorized,
            0x80 => Status::MalformedCommand,
            0x81 => Status::UnsupportedClusterCommand,
            0x82 => Status::UnsupportedGeneralCommand,
            0x83 => Status::UnsupportedManufacturerClusterCommand,
            0x84 => Status::UnsupportedManufacturerGeneralCommand,
            0x85 => Status::InvalidField,
            0x86 => Status::UnsupportedAttribute,
            0x87 => Status::InvalidValue,
            0x88 => Status::ReadOnly,
            0x89 => Status::InsufficientSpace,
            0x8B => Status::NotFound,
            0x8C => Status::UnreportableAttribute,
            0x8D => Status::InvalidDataType,
            0x8F => Status::WriteOnly,
            0x94 => Status::Timeout,
            0xC0 => Status::HardwareFailure,
            0xC1 => Status::SoftwareFailure,
            0xC3 => Status::UnsupportedCluster,
            other => Status::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Status::Success => 0x00,
            Status::Failure => 0x01,
            Status::NotAuthorized => 0x7E,
            Status::MalformedCommand => 0x80,
            Status::UnsupportedClusterCommand => 0x81,
            Status::UnsupportedGeneralCommand => 0x82,
            Status::UnsupportedManufacturerClusterCommand => 0x83,
            Status::UnsupportedManufacturerGeneralCommand => 0x84,
            Status::InvalidField => 0x85,
            Status::UnsupportedAttribute => 0x86,
            Status::InvalidValue => 0x87,
            Status::ReadOnly => 0x88,
            Status::InsufficientSpace => 0x89,
            Status::NotFound => 0x8B,
            Status::UnreportableAttribute => 0x8C,
            Status::InvalidDataType => 0x8D,
            Status::WriteOnly => 0x8F,
            Status::Timeout => 0x94,
            Status::HardwareFailure => 0xC0,
            Status::SoftwareFailure => 0xC1,
            Status::UnsupportedCluster => 0xC3,
            Status::Unknown(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unknown(code) => write!(f, "UNKNOWN(0x{code:02X})"),
            other => write!(f, "{other:?}(0x{:02X})", other.as_u8()),
        }
    }
}
