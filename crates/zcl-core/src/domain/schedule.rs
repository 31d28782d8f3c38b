//! Weekly heating schedule of the radiator thermostat.
//!
//! The device stores one schedule: a set of weekdays and exactly four
//! time/temperature events.  On the wire it is a fixed 26-byte buffer:
//!
//! ```text
//! [tag:1][days:1]{[time:2][unused:2][temp:2]} x 4
//! ```
//!
//! Unlike the surrounding ZCL frame, the buffer is big-endian.  `days` has bit
//! `index + 1` set for each active weekday (Monday = index 0).  `time` carries
//! minutes since midnight in its low 15 bits and a "next day" flag in the top
//! bit; `temp` is degrees Celsius × 100.
//!
//! The human-editable form is `days|h:mm,temp|h:mm,temp|h:mm,temp|h:mm,temp`,
//! for example `mon,wed,fri|7:00,18.5|9:00,16.0|17:00,20.0|22:00,15.0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Size of the encoded schedule buffer.
pub const SCHEDULE_LEN: usize = 26;
/// Format tag written into byte 0.
pub const FORMAT_TAG: u8 = 0x04;
pub const EVENT_COUNT: usize = 4;

const DAYS_OFFSET: usize = 1;
const EVENTS_OFFSET: usize = 2;
const EVENT_LEN: usize = 6;
const TEMPERATURE_OFFSET: usize = 4;
const NEXT_DAY_FLAG: u16 = 1 << 15;

const MINUTES_PER_DAY: u16 = 24 * 60;
const MIN_GAP_MINUTES: u16 = 60;
const MIN_TEMPERATURE: f64 = 5.0;
const MAX_TEMPERATURE: f64 = 30.0;

const FRAGMENT_SEPARATOR: char = '|';
const VALUE_SEPARATOR: char = ',';

/// Errors produced while parsing, validating or encoding a schedule.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("invalid day selection: {0}")]
    InvalidDay(String),

    #[error("a schedule needs exactly 4 events, got {0}")]
    WrongEventCount(usize),

    #[error("event {index} is invalid: {reason}")]
    InvalidEvent { index: usize, reason: String },

    #[error("event {index} and the one after it are only {gap} minutes apart (minimum 60)")]
    EventsTooClose { index: usize, gap: u16 },

    #[error("schedule spans {total} minutes, more than 24 hours")]
    SpanTooLong { total: u32 },

    #[error("schedule buffer too short: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("cannot parse schedule: {0}")]
    Syntax(String),
}

/// Day of the week, in the order of the device's day bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }

    fn bit(self) -> u8 {
        1 << (self.index() + 1)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.name() == s)
            .ok_or_else(|| {
                ScheduleError::InvalidDay(format!(
                    "`{s}` is not a day (expected one of mon, tue, wed, thu, fri, sat, sun)"
                ))
            })
    }
}

/// One switch point: from `time` on, heat to `temperature`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// Minutes since midnight.
    pub time: u16,
    /// Degrees Celsius.
    pub temperature: f64,
    /// The event falls on the day after the schedule started.
    pub is_next_day: bool,
}

impl ScheduleEvent {
    pub fn new(time: u16, temperature: f64) -> Self {
        Self {
            time,
            temperature,
            is_next_day: false,
        }
    }
}

/// A weekly schedule: the active days and the events applied on each of them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub days: Vec<Weekday>,
    pub events: Vec<ScheduleEvent>,
}

impl Schedule {
    /// Builds a schedule, deriving each event's next-day flag from ordering:
    /// an event earlier in the day than its predecessor wraps past midnight.
    pub fn new(days: Vec<Weekday>, events: Vec<ScheduleEvent>) -> Self {
        let mut schedule = Self { days, events };
        schedule.infer_next_day();
        schedule
    }

    fn infer_next_day(&mut self) {
        let mut previous: Option<u16> = None;
        for event in &mut self.events {
            event.is_next_day = previous.is_some_and(|p| event.time < p);
            previous = Some(event.time);
        }
    }

    /// Parses a 26-byte schedule buffer.
    ///
    /// This is a structural parse only; call [`Schedule::validate`] to check
    /// the result.  Extra trailing bytes are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, ScheduleError> {
        if buf.len() < SCHEDULE_LEN {
            return Err(ScheduleError::InsufficientData {
                needed: SCHEDULE_LEN,
                available: buf.len(),
            });
        }
        if buf[0] != FORMAT_TAG {
            debug!(tag = buf[0], "unexpected schedule format tag");
        }

        let bitmap = buf[DAYS_OFFSET];
        let days = Weekday::ALL
            .into_iter()
            .filter(|day| bitmap & day.bit() != 0)
            .collect();

        let events = (0..EVENT_COUNT)
            .map(|i| {
                let offset = EVENTS_OFFSET + i * EVENT_LEN;
                let raw_time = read_u16_be(buf, offset);
                let raw_temp = read_u16_be(buf, offset + TEMPERATURE_OFFSET);
                ScheduleEvent {
                    time: raw_time & !NEXT_DAY_FLAG,
                    temperature: f64::from(raw_temp) / 100.0,
                    is_next_day: raw_time & NEXT_DAY_FLAG != 0,
                }
            })
            .collect();

        Ok(Self { days, events })
    }

    /// Writes the 26-byte buffer.
    ///
    /// Next-day flags are derived from event ordering, not taken from the
    /// events.  Temperatures are rounded to hundredths of a degree.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::WrongEventCount`] unless there are exactly four events,
    /// [`ScheduleError::InvalidEvent`] for a value the wire fields cannot hold.
    pub fn encode(&self) -> Result<[u8; SCHEDULE_LEN], ScheduleError> {
        if self.events.len() != EVENT_COUNT {
            return Err(ScheduleError::WrongEventCount(self.events.len()));
        }

        let mut buf = [0u8; SCHEDULE_LEN];
        buf[0] = FORMAT_TAG;
        buf[DAYS_OFFSET] = self.days.iter().fold(0, |bitmap, day| bitmap | day.bit());

        let mut previous: Option<u16> = None;
        for (index, event) in self.events.iter().enumerate() {
            if event.time >= MINUTES_PER_DAY {
                return Err(ScheduleError::InvalidEvent {
                    index,
                    reason: format!("time {} is past 23:59", format_time(event.time)),
                });
            }
            let centi = (event.temperature * 100.0).round();
            if !(0.0..=f64::from(u16::MAX)).contains(&centi) {
                return Err(ScheduleError::InvalidEvent {
                    index,
                    reason: format!("temperature {} cannot be encoded", event.temperature),
                });
            }

            let mut raw_time = event.time;
            if previous.is_some_and(|p| event.time < p) {
                raw_time |= NEXT_DAY_FLAG;
            }
            previous = Some(event.time);

            let offset = EVENTS_OFFSET + index * EVENT_LEN;
            buf[offset..offset + 2].copy_from_slice(&raw_time.to_be_bytes());
            let temp_at = offset + TEMPERATURE_OFFSET;
            buf[temp_at..temp_at + 2].copy_from_slice(&(centi as u16).to_be_bytes());
        }
        Ok(buf)
    }

    /// Checks the rules the thermostat enforces, in order: days, event count,
    /// per-event ranges, gaps between events, total span.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.days.is_empty() {
            return Err(ScheduleError::InvalidDay("no days selected".to_string()));
        }

        if self.events.len() != EVENT_COUNT {
            return Err(ScheduleError::WrongEventCount(self.events.len()));
        }

        for (index, event) in self.events.iter().enumerate() {
            if event.time >= MINUTES_PER_DAY {
                return Err(ScheduleError::InvalidEvent {
                    index,
                    reason: "time must be between 0:00 and 23:59".to_string(),
                });
            }
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&event.temperature) {
                return Err(ScheduleError::InvalidEvent {
                    index,
                    reason: format!(
                        "temperature {} must be between {MIN_TEMPERATURE} and {MAX_TEMPERATURE} °C",
                        event.temperature
                    ),
                });
            }
        }

        let mut total: u32 = 0;
        for (index, pair) in self.events.windows(2).enumerate() {
            let (previous, current) = (pair[0].time, pair[1].time);
            let gap = if current < previous {
                MINUTES_PER_DAY - previous + current
            } else {
                current - previous
            };
            if gap < MIN_GAP_MINUTES {
                return Err(ScheduleError::EventsTooClose { index, gap });
            }
            total += u32::from(gap);
        }

        // At most 24 hours also means at most one wrap past midnight.
        if total > u32::from(MINUTES_PER_DAY) {
            return Err(ScheduleError::SpanTooLong { total });
        }
        Ok(())
    }

    /// Parses the `days|h:mm,temp|...` text form.
    ///
    /// Only the syntax is checked; use [`Schedule::validate`] for the rules.
    /// An empty string is an empty schedule.
    pub fn parse(text: &str) -> Result<Self, ScheduleError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }

        let mut fragments = text.split(FRAGMENT_SEPARATOR);
        let days = fragments
            .next()
            .unwrap_or_default()
            .split(VALUE_SEPARATOR)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Weekday::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        let events = fragments
            .map(parse_event)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(days, events))
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<&str> = self.days.iter().map(|d| d.name()).collect();
        f.write_str(&days.join(","))?;
        for event in &self.events {
            write!(
                f,
                "{FRAGMENT_SEPARATOR}{}{VALUE_SEPARATOR}{}",
                format_time(event.time),
                format_temperature(event.temperature)
            )?;
        }
        Ok(())
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schedule::parse(s)
    }
}

fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// `h:mm`, hours unpadded.
fn format_time(minutes: u16) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Whole degrees keep a trailing `.0` so users see that decimals are accepted.
fn format_temperature(temperature: f64) -> String {
    if temperature.fract() == 0.0 {
        format!("{temperature:.1}")
    } else {
        temperature.to_string()
    }
}

fn parse_event(fragment: &str) -> Result<ScheduleEvent, ScheduleError> {
    let (time, temperature) = fragment
        .split_once(VALUE_SEPARATOR)
        .ok_or_else(|| ScheduleError::Syntax(format!("`{fragment}` is not `h:mm,temperature`")))?;
    let temperature = temperature
        .trim()
        .parse::<f64>()
        .map_err(|_| ScheduleError::Syntax(format!("`{temperature}` is not a temperature")))?;
    Ok(ScheduleEvent::new(parse_time(time.trim())?, temperature))
}

fn parse_time(text: &str) -> Result<u16, ScheduleError> {
    let syntax = || ScheduleError::Syntax(format!("`{text}` is not a time of day (h:mm)"));
    let (hours, minutes) = text.split_once(':').ok_or_else(syntax)?;
    let hours: u16 = hours.parse().map_err(|_| syntax())?;
    let minutes: u16 = minutes.parse().map_err(|_| syntax())?;
    if minutes >= 60 {
        return Err(syntax());
    }
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(syntax)
}
