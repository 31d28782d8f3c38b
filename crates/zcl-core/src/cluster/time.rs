//! Time cluster (0x000A) with the extra attributes Aqara devices expose.

use super::{AttributeDescriptor, ClusterSpec};
use crate::protocol::types::DataType;

pub const CLUSTER_ID: u16 = 0x000A;

pub const TIME_ATTRIBUTE_ID: u16 = 0x0000;
pub const TIME_ZONE_ATTRIBUTE_ID: u16 = 0x0002;

/// Seconds between 1970-01-01 and the ZCL epoch, 2000-01-01.
pub const ZCL_EPOCH_OFFSET_SECS: i64 = 946_684_800;

pub static TIME: ClusterSpec = ClusterSpec {
    id: CLUSTER_ID,
    name: "time",
    attributes: &[
        AttributeDescriptor::new("time", TIME_ATTRIBUTE_ID, DataType::Utc),
        AttributeDescriptor::new("timeStatus", 0x0001, DataType::Map8),
        AttributeDescriptor::new("timeZone", TIME_ZONE_ATTRIBUTE_ID, DataType::Int32),
        AttributeDescriptor::new("localTime", 0x0007, DataType::Uint32),
        AttributeDescriptor::new("lastSetTime", 0x0008, DataType::Uint32),
        AttributeDescriptor::new("privateTime", 0x1000, DataType::Uint32),
    ],
    client_attributes: &[
        AttributeDescriptor::new("time", TIME_ATTRIBUTE_ID, DataType::Utc),
        AttributeDescriptor::new("timezone", TIME_ZONE_ATTRIBUTE_ID, DataType::Int32),
    ],
    commands: &[],
};
