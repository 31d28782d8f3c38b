//! Device data formats that ride inside ZCL attributes.
//!
//! Nothing here knows about frames or transports; these are plain value types
//! with their own binary and text codecs.

pub mod schedule;

pub use schedule::{Schedule, ScheduleError, ScheduleEvent, Weekday};
