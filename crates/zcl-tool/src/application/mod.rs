//! Schedule commands: pure functions from user input to reports.

use thiserror::Error;
use tracing::debug;
use zcl_core::{Schedule, ScheduleError};

use crate::domain::{DecodeReport, EncodeReport};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepts `042a01a4…`, `0x042a…` and hex split by spaces or colons.
fn parse_hex(input: &str) -> Result<Vec<u8>, ToolError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    Ok(hex::decode(digits)?)
}

/// Decodes a raw schedule buffer given as hex.
pub fn decode(input: &str) -> Result<DecodeReport, ToolError> {
    let bytes = parse_hex(input)?;
    debug!(len = bytes.len(), "decoding schedule buffer");
    Ok(DecodeReport::new(Schedule::decode(&bytes)?))
}

/// Parses and validates the text form, then encodes it.
pub fn encode(text: &str) -> Result<EncodeReport, ToolError> {
    let schedule = validate(text)?;
    let buffer = schedule.encode()?;
    Ok(EncodeReport {
        text: schedule.to_string(),
        hex: hex::encode(buffer),
    })
}

/// Normalizes the text form without checking the rules.
pub fn format(text: &str) -> Result<String, ToolError> {
    Ok(Schedule::parse(text)?.to_string())
}

/// Parses the text form and checks it against the thermostat's rules.
pub fn validate(text: &str) -> Result<Schedule, ToolError> {
    let schedule = Schedule::parse(text)?;
    schedule.validate()?;
    Ok(schedule)
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(value)?)
}
