//! zcl-bound library entry point.
//!
//! An asynchronous ZCL bound-cluster engine on top of `zcl_core`: commands
//! go out through a [`Transport`], responses are matched back to their
//! callers by transaction sequence number, and everything else is handed to
//! an [`InboundHandler`].

pub mod application;
pub mod infrastructure;

pub use application::bound_cluster::{BoundCluster, ClusterError, CommandTable, Role, SendOptions};
pub use application::retry::{with_retry, RetryPolicy};
pub use application::time_server::{push_time, Clock, FixedClock, SystemClock, TimeServer};
pub use infrastructure::config::{load_config, ConfigError, EngineConfig};
pub use infrastructure::router::{FrameRouter, RouteOutcome};
pub use infrastructure::transport::{FrameMeta, InboundHandler, Transport, TransportError};
