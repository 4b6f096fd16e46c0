use chrono::{DateTime, NaiveDateTime, NaiveTime};
use common::types::config::TimeWindow;
use log::debug;
use std::fmt;
use std::fmt::Display;

/// What browsers send from `Date.toISOString()`
pub const TRIGGER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Reads the time a client asked for routes. Timestamps with an offset are taken at their own
/// wall-clock time, the offset is not applied.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TriggerError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TRIGGER_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|time| time.naive_local()))
        .map_err(|source| TriggerError::Unparsable { raw: raw.to_string(), source })
}

/// Without a window every time is accepted
pub fn check_window(timestamp: NaiveDateTime, window: Option<&TimeWindow>) -> Result<(), TriggerError> {
    match window {
        Some(window) if !window.contains(timestamp.time()) => Err(TriggerError::OutsideWindow {
            time: timestamp.time(),
            start: window.start,
            end: window.end,
        }),
        _ => Ok(()),
    }
}

/// Everything a trigger has to pass before a run is started
pub fn validate(raw: Option<&str>, window: Option<&TimeWindow>) -> Result<NaiveDateTime, TriggerError> {
    let timestamp = parse_timestamp(raw.ok_or(TriggerError::Missing)?)?;
    check_window(timestamp, window)?;
    debug!(target: "server", "Accepted trigger at {timestamp}");
    Ok(timestamp)
}

#[derive(thiserror::Error, Debug)]
pub enum TriggerError {
    Missing,
    Unparsable { raw: String, source: chrono::ParseError },
    OutsideWindow { time: NaiveTime, start: NaiveTime, end: NaiveTime },
}

impl Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TriggerError::Missing => write!(f, "Missing timestamp"),
            TriggerError::Unparsable { raw, source } => write!(f, "Invalid timestamp '{raw}': {source}"),
            TriggerError::OutsideWindow { time, start, end } => write!(
                f,
                "Routes can only be generated between {} and {}, not at {}",
                start.format("%H:%M"), end.format("%H:%M"), time.format("%H:%M")
            ),
        }
    }
}
