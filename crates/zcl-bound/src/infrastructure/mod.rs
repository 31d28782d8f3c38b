//! Infrastructure layer: the transport seam, frame routing and configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `zcl_core`, but the engine only ever sees the traits in [`transport`].

pub mod config;
pub mod router;
pub mod transport;
