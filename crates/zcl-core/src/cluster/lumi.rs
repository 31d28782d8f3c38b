//! Aqara manufacturer-specific cluster (0xFCC0) as used by the E1 radiator
//! thermostat.
//!
//! Every attribute here is scoped to manufacturer code 0x115F, so reads and
//! writes go out as manufacturer-specific foundation frames.

use super::{AttributeDescriptor, ClusterSpec};
use crate::protocol::types::DataType;

pub const CLUSTER_ID: u16 = 0xFCC0;
pub const MANUFACTURER_ID: u16 = 0x115F;

/// Holds the 26-byte weekly schedule buffer.
pub const SCHEDULE_SETTINGS_ATTRIBUTE_ID: u16 = 0x0276;

const fn lumi(name: &'static str, id: u16, data_type: DataType) -> AttributeDescriptor {
    AttributeDescriptor::new(name, id, data_type).manufacturer(MANUFACTURER_ID)
}

pub static LUMI: ClusterSpec = ClusterSpec {
    id: CLUSTER_ID,
    name: "manuSpecificLumi",
    attributes: &[
        lumi("trvSystemMode", 0x0271, DataType::Uint8),
        lumi("trvPreset", 0x0272, DataType::Uint8),
        lumi("trvWindowOpenDetection", 0x0273, DataType::Uint8),
        lumi("trvValveDetection", 0x0274, DataType::Uint8),
        lumi(
            "trvScheduleSettings",
            SCHEDULE_SETTINGS_ATTRIBUTE_ID,
            DataType::OctetString,
        ),
        lumi("trvChildLock", 0x0277, DataType::Uint8),
        lumi("trvAwayPresetTemperature", 0x0279, DataType::Uint32),
        lumi("trvWindowOpen", 0x027A, DataType::Uint8),
        lumi("trvCalibrated", 0x027B, DataType::Uint8),
        lumi("trvSchedule", 0x027D, DataType::Uint8),
    ],
    client_attributes: &[],
    commands: &[],
};
