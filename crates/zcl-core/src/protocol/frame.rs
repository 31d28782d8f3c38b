//! ZCL frame header encoding and decoding.
//!
//! Wire format:
//! ```text
//! [frame_control:1][manufacturer_id:2, only if manufacturer specific][seq:1][command_id:1][payload:N]
//! ```
//! All multi-byte integers are little-endian.

use std::fmt;

use crate::protocol::codec::{ProtocolError, Reader};

/// Frame control bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FrameControl(pub u8);

impl FrameControl {
    /// Frame type `01`: command is specific to the cluster (otherwise global).
    pub const CLUSTER_SPECIFIC: u8 = 1 << 0;
    pub const MANUFACTURER_SPECIFIC: u8 = 1 << 2;
    /// Direction bit: set when the frame travels server → client.
    pub const DIRECTION_TO_CLIENT: u8 = 1 << 3;
    pub const DISABLE_DEFAULT_RESPONSE: u8 = 1 << 4;

    const FRAME_TYPE_MASK: u8 = 0b11;
    const KNOWN_BITS: u8 = Self::FRAME_TYPE_MASK
        | Self::MANUFACTURER_SPECIFIC
        | Self::DIRECTION_TO_CLIENT
        | Self::DISABLE_DEFAULT_RESPONSE;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }

    pub const fn without(self, flag: u8) -> Self {
        Self(self.0 & !flag)
    }

    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn cluster_specific(self) -> bool {
        self.contains(Self::CLUSTER_SPECIFIC)
    }

    pub fn manufacturer_specific(self) -> bool {
        self.contains(Self::MANUFACTURER_SPECIFIC)
    }

    pub fn direction_to_client(self) -> bool {
        self.contains(Self::DIRECTION_TO_CLIENT)
    }

    pub fn disable_default_response(self) -> bool {
        self.contains(Self::DISABLE_DEFAULT_RESPONSE)
    }
}

impl fmt::Display for FrameControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.cluster_specific() {
            names.push("clusterSpecific");
        }
        if self.manufacturer_specific() {
            names.push("manufacturerSpecific");
        }
        if self.direction_to_client() {
            names.push("directionToClient");
        }
        if self.disable_default_response() {
            names.push("disableDefaultResponse");
        }
        write!(f, "[{}]", names.join(", "))
    }
}

/// One ZCL frame: header fields plus the still-encoded command payload.
///
/// The manufacturer-specific bit of [`Frame::frame_control`] always agrees
/// with [`Frame::manufacturer_id`]; [`Frame::new`] and [`Frame::decode`]
/// maintain that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_control: FrameControl,
    pub manufacturer_id: Option<u16>,
    pub sequence_number: u8,
    pub command_id: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Builds a frame, setting or clearing the manufacturer-specific bit from
    /// `manufacturer_id`.
    pub fn new(
        frame_control: FrameControl,
        manufacturer_id: Option<u16>,
        sequence_number: u8,
        command_id: u8,
        payload: Vec<u8>,
    ) -> Self {
        let frame_control = match manufacturer_id {
            Some(_) => frame_control.with(FrameControl::MANUFACTURER_SPECIFIC),
            None => frame_control.without(FrameControl::MANUFACTURER_SPECIFIC),
        };
        Self {
            frame_control,
            manufacturer_id,
            sequence_number,
            command_id,
            payload,
        }
    }

    /// Size of the header that precedes the payload.
    pub fn header_len(&self) -> usize {
        if self.manufacturer_id.is_some() {
            5
        } else {
            3
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header_len() + self.payload.len());
        buf.push(self.frame_control.0);
        if let Some(manufacturer_id) = self.manufacturer_id {
            buf.extend_from_slice(&manufacturer_id.to_le_bytes());
        }
        buf.push(self.sequence_number);
        buf.push(self.command_id);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decodes one frame occupying all of `bytes`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InsufficientData`] when the header is truncated and
    /// [`ProtocolError::ReservedFrameType`] for frame type `10`/`11`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = Reader::new(bytes);
        let raw_control = reader.u8()?;
        let frame_type = raw_control & FrameControl::FRAME_TYPE_MASK;
        if frame_type > 1 {
            return Err(ProtocolError::ReservedFrameType(frame_type));
        }
        // Bits 5–7 are reserved; drop them so re-encoding yields a clean header.
        let frame_control = FrameControl(raw_control & FrameControl::KNOWN_BITS);
        let manufacturer_id = if frame_control.manufacturer_specific() {
            Some(reader.u16()?)
        } else {
            None
        };
        let sequence_number = reader.u8()?;
        let command_id = reader.u8()?;
        Ok(Self {
            frame_control,
            manufacturer_id,
            sequence_number,
            command_id,
            payload: reader.rest().to_vec(),
        })
    }
}
