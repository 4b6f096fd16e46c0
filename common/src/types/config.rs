pub mod features;
pub mod sources;

use crate::types::config::features::FeatureConfig;
use crate::types::config::sources::{DemandSourceConfig, TravelTimeConfig};
use crate::types::{Coordinates, StopId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1")]
    Version1(Settings),
}

impl Config {
    pub fn settings(&self) -> &Settings {
        match self {
            Config::Version1(settings) => settings,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub depot: DepotConfig,
    #[serde(default = "default_stops")]
    pub stops: BTreeMap<StopId, Coordinates>,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub trip: TripConfig,
    // `window: null` disables the check
    #[serde(default = "default_window")]
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub demand: DemandSourceConfig,
    #[serde(default)]
    pub travel_time: TravelTimeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depot: DepotConfig::default(),
            stops: default_stops(),
            fleet: FleetConfig::default(),
            trip: TripConfig::default(),
            window: default_window(),
            features: FeatureConfig::default(),
            demand: DemandSourceConfig::default(),
            travel_time: TravelTimeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// The pick-up points of the first deployment
fn default_stops() -> BTreeMap<StopId, Coordinates> {
    BTreeMap::from([
        (StopId(0), Coordinates::new(4.0060, 9.7600)),
        (StopId(1), Coordinates::new(4.0800, 9.7500)),
        (StopId(2), Coordinates::new(4.0500, 9.7000)),
        (StopId(3), Coordinates::new(4.0000, 9.7200)),
        (StopId(4), Coordinates::new(4.0300, 9.7800)),
        (StopId(5), Coordinates::new(4.1000, 9.6800)),
    ])
}

fn default_window() -> Option<TimeWindow> {
    Some(TimeWindow::default())
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DepotConfig {
    #[serde(default = "default_depot_label")]
    pub label: String,
    pub location: Coordinates,
}

fn default_depot_label() -> String {
    "College".into()
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            label: default_depot_label(),
            location: Coordinates::new(4.0511, 9.7679),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FleetConfig {
    /// Passengers a single vehicle can carry
    pub capacity: u32,
    /// Number of vehicles used when clustering without regard to capacity
    pub vehicles: u32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self { capacity: 50, vehicles: 3 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TripConfig {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

impl TripConfig {
    pub fn departure(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(2025, 4, 12).unwrap_or_default(),
            start_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap_or_default(),
        }
    }
}

/// Daily window in which routes may be generated. `start` is inclusive, `end` exclusive.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            // Window wraps around midnight
            time >= self.start || time < self.end
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:5000".into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::speed::Speed;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_bounds() {
        let window = TimeWindow::default();
        assert!(!window.contains(time(16, 59)));
        assert!(window.contains(time(17, 0)));
        assert!(window.contains(time(17, 30)));
        assert!(!window.contains(time(18, 0)));
    }

    #[test]
    fn test_window_across_midnight() {
        let window = TimeWindow { start: time(23, 0), end: time(1, 0) };
        assert!(window.contains(time(23, 30)));
        assert!(window.contains(time(0, 30)));
        assert!(!window.contains(time(12, 0)));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "version": "1" }"#).unwrap();
        let settings = config.settings();
        assert_eq!(settings.stops.len(), 6);
        assert_eq!(settings.fleet.capacity, 50);
        assert_eq!(settings.depot.label, "College");
        assert_eq!(settings.window, Some(TimeWindow::default()));
        assert!(settings.features.capacity_aware);
    }

    #[test]
    fn test_full_config() {
        let config: Config = serde_json::from_str(r#"{
            "version": "1",
            "depot": { "label": "Campus", "location": { "lng": 1.0, "lat": 2.0 } },
            "stops": { "7": { "lng": 1.5, "lat": 2.5 } },
            "fleet": { "capacity": 20, "vehicles": 2 },
            "trip": { "date": "2025-05-01", "start_time": "07:15:00" },
            "window": null,
            "features": { "compute_eta": false },
            "demand": { "url": "https://example.org/db" },
            "travel_time": { "live": false, "fallback_speed": "30km/h" }
        }"#).unwrap();
        let settings = config.settings();

        assert_eq!(settings.depot.label, "Campus");
        assert_eq!(settings.stops.get(&StopId(7)), Some(&Coordinates::new(1.5, 2.5)));
        assert_eq!(settings.window, None);
        assert!(settings.features.capacity_aware);
        assert!(!settings.features.compute_eta);
        assert_eq!(
            settings.trip.departure(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(7, 15, 0).unwrap()
        );
        assert!(matches!(&settings.demand, DemandSourceConfig::Url { node, .. } if node == "users"));
        assert_eq!(settings.travel_time.fallback_speed, Speed(30.0));
        assert_eq!(settings.travel_time.timeout_ms, 5_000);
    }
}
