//! Results of the schedule commands, printable as text or JSON.

use serde::Serialize;
use zcl_core::Schedule;

/// What `decode` found in a raw schedule buffer.
///
/// Decoding never validates, so a device's malformed buffer is still shown;
/// `problem` carries the first rule it breaks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    /// The `days|h:mm,temp|...` form.
    pub text: String,
    pub schedule: Schedule,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl DecodeReport {
    pub fn new(schedule: Schedule) -> Self {
        let problem = schedule.validate().err().map(|e| e.to_string());
        Self {
            text: schedule.to_string(),
            valid: problem.is_none(),
            problem,
            schedule,
        }
    }
}

/// The buffer produced by `encode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    pub text: String,
    /// Lowercase hex of the 26-byte buffer.
    pub hex: String,
}
