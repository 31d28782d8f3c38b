//! The boundary between the bound-cluster engine and the radio stack.
//!
//! The engine needs exactly two things from the outside world: a way to hand
//! an encoded frame to endpoint E / cluster C, and someone to receive the
//! frames and commands that no local caller is waiting for.  Both are traits
//! so the stack and the device driver can be swapped out in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use zcl_core::protocol::args::Args;
use zcl_core::protocol::types::Value;
use zcl_core::{ClusterSpec, CommandDescriptor};

/// Failure reported by a [`Transport`] when a frame could not be transmitted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Where an inbound frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameMeta {
    pub endpoint_id: u8,
    pub cluster_id: u16,
    /// Link quality indicator, when the stack reports one.
    pub link_quality: Option<u8>,
}

impl FrameMeta {
    pub fn new(endpoint_id: u8, cluster_id: u16) -> Self {
        Self {
            endpoint_id,
            cluster_id,
            link_quality: None,
        }
    }
}

/// Sends encoded ZCL frames to a device.
///
/// Implementations only report whether the frame left; correlation with the
/// device's answer is the engine's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_frame(
        &self,
        endpoint_id: u8,
        cluster_id: u16,
        frame: Vec<u8>,
    ) -> Result<(), TransportError>;
}

/// Receives what the engine cannot hand to a waiting caller.
#[cfg_attr(test, mockall::automock)]
pub trait InboundHandler: Send + Sync {
    /// An attribute report arrived; ids are already mapped to names.
    fn on_attributes_reported(
        &self,
        cluster: &'static ClusterSpec,
        attributes: &HashMap<&'static str, Value>,
        meta: &FrameMeta,
    );

    /// The device sent a command nobody was waiting for.
    ///
    /// Returning `Some` answers it when the command has a response defined.
    fn on_command(
        &self,
        command: &'static CommandDescriptor,
        args: &Args,
        meta: &FrameMeta,
    ) -> Option<Args>;
}
