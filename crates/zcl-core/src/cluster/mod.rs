//! Static cluster, command and attribute descriptor tables.
//!
//! A cluster type is declared once as a [`ClusterSpec`] of `'static` data.
//! The bound-cluster engine builds its lookup tables from these at
//! construction; nothing here is mutated at runtime.

use std::fmt;

use crate::protocol::args::Field;
use crate::protocol::frame::FrameControl;
use crate::protocol::types::DataType;

pub mod foundation;
pub mod lumi;
pub mod time;

/// Which side of a cluster binding a command travels towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ToServer,
    ToClient,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::ToServer => Direction::ToClient,
            Direction::ToClient => Direction::ToServer,
        }
    }
}

/// A command a cluster understands, request or response.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub id: u8,
    pub direction: Direction,
    /// Profile-wide (foundation) command rather than a cluster-specific one.
    pub global: bool,
    pub manufacturer_id: Option<u16>,
    /// Replaces the computed frame control flags when present.
    pub frame_control: Option<FrameControl>,
    pub args: &'static [Field],
    pub response: Option<&'static CommandDescriptor>,
    /// Marks descriptors that only ever answer another command.
    pub is_response: bool,
}

impl CommandDescriptor {
    /// A cluster-specific command sent server→client with no arguments.
    /// Use struct update syntax to fill in the rest; commands a client sends
    /// set `direction: Direction::ToServer`.
    pub const fn new(name: &'static str, id: u8) -> Self {
        Self {
            name,
            id,
            direction: Direction::ToClient,
            global: false,
            manufacturer_id: None,
            frame_control: None,
            args: &[],
            response: None,
            is_response: false,
        }
    }

    /// True when the descriptor can describe an inbound frame with these
    /// header fields.
    ///
    /// The cluster-specific bit must be the inverse of `global`.  Global
    /// commands ignore manufacturer scope; cluster-specific ones must agree
    /// on both the flag and the id.
    pub fn matches(&self, control: FrameControl, manufacturer_id: Option<u16>) -> bool {
        if control.cluster_specific() == self.global {
            return false;
        }
        if self.global {
            return true;
        }
        control.manufacturer_specific() == self.manufacturer_id.is_some()
            && (!control.manufacturer_specific() || manufacturer_id == self.manufacturer_id)
    }
}

/// One attribute in a cluster's server or client namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: &'static str,
    pub id: u16,
    pub data_type: DataType,
    pub manufacturer_id: Option<u16>,
}

impl AttributeDescriptor {
    pub const fn new(name: &'static str, id: u16, data_type: DataType) -> Self {
        Self {
            name,
            id,
            data_type,
            manufacturer_id: None,
        }
    }

    pub const fn manufacturer(self, manufacturer_id: u16) -> Self {
        Self {
            manufacturer_id: Some(manufacturer_id),
            ..self
        }
    }
}

/// A cluster type: its id, attribute namespaces and cluster-specific commands.
///
/// Foundation commands are not listed here; every engine adds
/// [`foundation::COMMANDS`] on its own.
#[derive(Debug)]
pub struct ClusterSpec {
    pub id: u16,
    pub name: &'static str,
    /// Attributes hosted by the cluster server.
    pub attributes: &'static [AttributeDescriptor],
    /// Attributes hosted by the cluster client.
    pub client_attributes: &'static [AttributeDescriptor],
    pub commands: &'static [&'static CommandDescriptor],
}

impl ClusterSpec {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn client_attribute(&self, name: &str) -> Option<&'static AttributeDescriptor> {
        self.client_attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_by_id(&self, id: u16) -> Option<&'static AttributeDescriptor> {
        self.attributes.iter().find(|a| a.id == id)
    }

    pub fn client_attribute_by_id(&self, id: u16) -> Option<&'static AttributeDescriptor> {
        self.client_attributes.iter().find(|a| a.id == id)
    }
}

impl fmt::Display for ClusterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:04X})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PLAIN: CommandDescriptor = CommandDescriptor::new("plain", 0x01);
    static VENDOR: CommandDescriptor = CommandDescriptor {
        manufacturer_id: Some(0x115F),
        ..CommandDescriptor::new("vendor", 0x01)
    };

    #[test]
    fn test_global_command_ignores_manufacturer_scope() {
        let control = FrameControl::empty().with(FrameControl::MANUFACTURER_SPECIFIC);
        assert!(foundation::READ_ATTRIBUTES.matches(control, Some(0x1234)));
        assert!(foundation::READ_ATTRIBUTES.matches(FrameControl::empty(), None));
    }

    #[test]
    fn test_global_command_rejects_cluster_specific_frame() {
        let control = FrameControl::empty().with(FrameControl::CLUSTER_SPECIFIC);
        assert!(!foundation::READ_ATTRIBUTES.matches(control, None));
    }

    #[test]
    fn test_cluster_command_requires_matching_manufacturer() {
        let control = FrameControl::empty()
            .with(FrameControl::CLUSTER_SPECIFIC)
            .with(FrameControl::MANUFACTURER_SPECIFIC);

        assert!(VENDOR.matches(control, Some(0x115F)));
        assert!(!VENDOR.matches(control, Some(0x1037)));
        assert!(!PLAIN.matches(control, Some(0x115F)));
    }

    #[test]
    fn test_plain_cluster_command_rejects_manufacturer_frame_flag_absent_for_vendor() {
        let control = FrameControl::empty().with(FrameControl::CLUSTER_SPECIFIC);
        assert!(PLAIN.matches(control, None));
        assert!(!VENDOR.matches(control, None));
    }

    #[test]
    fn test_new_command_defaults_to_client_direction() {
        assert_eq!(PLAIN.direction, Direction::ToClient);
        assert!(!PLAIN.global);
        assert!(!PLAIN.is_response);
    }

    #[test]
    fn test_attribute_lookup_by_name_and_id() {
        let spec = &time::TIME;
        assert_eq!(spec.attribute("timeZone").map(|a| a.id), Some(0x0002));
        assert_eq!(spec.client_attribute_by_id(0x0002).map(|a| a.name), Some("timezone"));
        assert!(spec.attribute("nope").is_none());
    }

    #[test]
    fn test_display_shows_name_and_hex_id() {
        assert_eq!(lumi::LUMI.to_string(), "manuSpecificLumi(0xFCC0)");
    }
}
