mod sources;

pub use sources::{DemandSource, FileDemandSource, RealtimeDbDemandSource, StaticDemandSource};

use common::types::StopId;
use log::{debug, warn};
use polars::df;
use polars::prelude::{col, len, IntoLazy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// Passengers waiting per stop for one run. May contain stops that are not in the catalog.
pub type Demand = BTreeMap<StopId, u32>;

/// One sign-up as stored by the clients
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AttendanceRecord {
    #[serde(rename = "stopID", default)]
    pub stop_id: Option<RawStopId>,
    #[serde(default)]
    pub coming: Option<String>,
}

impl AttendanceRecord {
    pub fn new(stop_id: impl Into<RawStopId>, coming: bool) -> Self {
        Self {
            stop_id: Some(stop_id.into()),
            coming: Some(if coming { "Yes" } else { "No" }.into()),
        }
    }

    pub fn is_attending(&self) -> bool {
        self.coming.as_deref() == Some("Yes")
    }
}

/// Stop id exactly as the client sent it. Resolved to a [StopId] after counting.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawStopId {
    Number(i64),
    Text(String),
}

impl Display for RawStopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawStopId::Number(id) => write!(f, "{id}"),
            RawStopId::Text(id) => write!(f, "{}", id.trim()),
        }
    }
}

impl From<u32> for RawStopId {
    fn from(value: u32) -> Self {
        RawStopId::Number(value as i64)
    }
}

impl From<&str> for RawStopId {
    fn from(value: &str) -> Self {
        RawStopId::Text(value.into())
    }
}

/// Count attending passengers per stop.
pub fn aggregate(records: &[AttendanceRecord]) -> Result<Demand, DemandError> {
    let (stop_ids, attending): (Vec<String>, Vec<bool>) = records.iter()
        .filter_map(|record| {
            record.stop_id.as_ref().map(|id| (id.to_string(), record.is_attending()))
        })
        .unzip();

    if stop_ids.is_empty() {
        return Ok(Demand::new());
    }

    let counts = df![
        "stop_id" => stop_ids,
        "attending" => attending,
    ]?
        .lazy()
        .filter(col("attending"))
        .group_by([col("stop_id")])
        .agg([len().alias("passengers")])
        .collect()?;

    let ids = counts.column("stop_id")?.str()?;
    let passengers = counts.column("passengers")?.u32()?;

    let mut demand = Demand::new();
    for (id, count) in ids.into_iter().zip(passengers.into_iter()) {
        let (Some(id), Some(count)) = (id, count) else { continue; };
        match StopId::from_str(id) {
            Ok(stop_id) => *demand.entry(stop_id).or_default() += count,
            Err(err) => warn!(target: "demand", "Ignoring {count} passenger(s): {err}"),
        }
    }

    debug!(target: "demand", "Passengers per stop: {demand:?}");

    Ok(demand)
}

#[derive(thiserror::Error, Debug)]
pub enum DemandError {
    Polars(#[from] polars::error::PolarsError),
    Http(#[from] reqwest::Error),
    Io(#[from] std::io::Error),
    Json(#[from] serde_json::Error),
    InvalidUrl(url::Url),
}

impl Display for DemandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DemandError::Polars(err) => write!(f, "{}", err),
            DemandError::Http(err) => write!(f, "{}", err),
            DemandError::Io(err) => write!(f, "{}", err),
            DemandError::Json(err) => write!(f, "{}", err),
            DemandError::InvalidUrl(url) => write!(f, "Cannot append a node to '{}'", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_only_attending() {
        let records = vec![
            AttendanceRecord::new(0u32, true),
            AttendanceRecord::new(0u32, true),
            AttendanceRecord::new(0u32, false),
            AttendanceRecord::new(3u32, true),
            AttendanceRecord { stop_id: Some(RawStopId::Number(5)), coming: None },
        ];

        assert_eq!(aggregate(&records).unwrap(), Demand::from([(StopId(0), 2), (StopId(3), 1)]));
    }

    #[test]
    fn test_numeric_and_text_ids_are_merged() {
        let records = vec![
            AttendanceRecord::new(2u32, true),
            AttendanceRecord::new("2", true),
            AttendanceRecord::new(" 2 ", true),
        ];

        assert_eq!(aggregate(&records).unwrap(), Demand::from([(StopId(2), 3)]));
    }

    #[test]
    fn test_invalid_ids_are_dropped() {
        let records = vec![
            AttendanceRecord::new("north gate", true),
            AttendanceRecord { stop_id: Some(RawStopId::Number(-1)), coming: Some("Yes".into()) },
            AttendanceRecord { stop_id: None, coming: Some("Yes".into()) },
            AttendanceRecord::new(1u32, true),
        ];

        assert_eq!(aggregate(&records).unwrap(), Demand::from([(StopId(1), 1)]));
    }

    #[test]
    fn test_nobody_attending() {
        assert!(aggregate(&[]).unwrap().is_empty());
        assert!(aggregate(&[AttendanceRecord::new(1u32, false)]).unwrap().is_empty());
    }

    #[test]
    fn test_record_format() {
        let record: AttendanceRecord = serde_json::from_str(
            r#"{ "name": "Ada", "stopID": "4", "coming": "Yes" }"#
        ).unwrap();
        assert_eq!(record, AttendanceRecord::new("4", true));
        assert!(record.is_attending());
    }
}
