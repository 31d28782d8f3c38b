//! zcl-tool library crate.
//!
//! The binary in `main.rs` only parses arguments and prints; everything it
//! runs lives here so it can be tested without spawning a process.
//!
//! ```text
//! zcl-tool
//!   ├── domain/       Report types printed by the commands
//!   └── application/  decode / encode / format / validate
//! ```

/// Domain layer: serializable command results.
pub mod domain;

/// Application layer: the schedule commands.
pub mod application;
