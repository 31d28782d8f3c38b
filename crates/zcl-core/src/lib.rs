//! # zcl-core
//!
//! I/O-free building blocks for talking ZCL (Zigbee Cluster Library) to
//! Aqara devices.
//!
//! - **`protocol`** – the ZCL frame header, attribute data types, command
//!   argument schemas, status codes and the transaction sequence counter.
//!
//! - **`cluster`** – static descriptor tables: the foundation commands shared
//!   by every cluster, plus the Time and Aqara manufacturer-specific clusters.
//!
//! - **`domain`** – payload formats carried inside attributes, such as the
//!   radiator thermostat's 26-byte weekly schedule.
//!
//! The asynchronous request/response engine built on top of this lives in the
//! `zcl-bound` crate.

pub mod cluster;
pub mod domain;
pub mod protocol;

pub use cluster::{AttributeDescriptor, ClusterSpec, CommandDescriptor, Direction};
pub use domain::schedule::{Schedule, ScheduleError, ScheduleEvent, Weekday};
pub use protocol::args::{Arg, Args};
pub use protocol::codec::ProtocolError;
pub use protocol::frame::{Frame, FrameControl};
pub use protocol::status::Status;
pub use protocol::types::{DataType, Value};
