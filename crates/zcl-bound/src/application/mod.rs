//! Application layer: the bound-cluster engine and the device-facing use
//! cases built on it.
//!
//! - **`bound_cluster`** – sends commands, correlates responses by sequence
//!   number and dispatches unsolicited frames.
//! - **`retry`** – re-runs recoverable engine operations.
//! - **`time_server`** – answers a device's Time cluster reads and pushes the
//!   time to it.

pub mod bound_cluster;
pub mod retry;
pub mod time_server;
