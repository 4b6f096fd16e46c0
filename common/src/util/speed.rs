use crate::util::distance::Distance;
use chrono::{Duration, TimeDelta};
use either::Either;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Speed in km/h
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SerializedSpeed")]
pub struct Speed(pub f64);

/// Average speed assumed for a bus in city traffic when no live estimate is available
pub const FALLBACK_DRIVING_SPEED: Speed = Speed(40f64);

impl Speed {
    /// Whole milliseconds. Any distance above zero takes at least 1 ms.
    pub fn time_to_travel_distance(&self, distance: Distance) -> Duration {
        if !(distance.0 > 0.0) {
            return TimeDelta::zero();
        }
        let hours = (1.0 / self.0) * distance.kilometers();
        let millis = (hours * 60.0 * 60.0 * 1_000.0).round().clamp(1.0, i64::MAX as f64);
        TimeDelta::try_milliseconds(millis as i64).unwrap_or(TimeDelta::MAX)
    }
}

impl Display for Speed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} km/h", self.0)
    }
}

/// Serialized representation of a Speed
/// Either 40.0 (float) or "40km/h" (String)
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
struct SerializedSpeed {
    #[serde(with = "either::serde_untagged")]
    kmh: Either<f64, String>,
}

#[derive(thiserror::Error, Debug)]
pub struct SpeedError;

impl Display for SpeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wrong speed format. Example of valid format: 40km/h (must be greater than zero)")
    }
}

impl TryFrom<SerializedSpeed> for Speed {
    type Error = SpeedError;

    fn try_from(value: SerializedSpeed) -> Result<Self, Self::Error> {
        let kmh = match value.kmh {
            Either::Right(value) => {
                let regex = Regex::new(r"^(\d+\.?\d*)\s*(km/h)?$").map_err(|_| SpeedError)?;
                let cleaned_value = regex.captures(value.trim())
                    .map(|caps| Ok(caps[1].to_string()))
                    .unwrap_or(Err(SpeedError))?;

                f64::from_str(cleaned_value.as_str())
                    .map_err(|_| SpeedError)
            }
            Either::Left(value) => Ok(value)
        }?;

        // A speed of zero would make every estimate infinite
        if !(kmh > 0.0 && kmh.is_finite()) {
            return Err(SpeedError);
        }

        Ok(Self(kmh))
    }
}
