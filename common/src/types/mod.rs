use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use either::Either;
use geo::Point;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod errors;

// A stop of the catalog. Unlike the vehicle ids, stop ids are taken from the configuration and
// don't have to be continuous.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "SerializedStopId")]
pub struct StopId(pub u32);

impl Display for StopId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialized representation of a StopId
/// Either 3 (integer) or "3" (String), since sign-up records store whatever the client sent
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
struct SerializedStopId {
    #[serde(with = "either::serde_untagged")]
    id: Either<u32, String>,
}

#[derive(thiserror::Error, Debug)]
pub struct StopIdError(pub String);

impl Display for StopIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid stop id '{}', expected a non-negative integer", self.0)
    }
}

impl TryFrom<SerializedStopId> for StopId {
    type Error = StopIdError;

    fn try_from(value: SerializedStopId) -> Result<Self, Self::Error> {
        match value.id {
            Either::Left(id) => Ok(StopId(id)),
            Either::Right(id) => id.parse(),
        }
    }
}

impl FromStr for StopId {
    type Err = StopIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u32::from_str(s.trim())
            .map(StopId)
            .map_err(|_| StopIdError(s.to_string()))
    }
}

// Vehicles are numbered from 0. Overflow vehicles created while repairing capacity violations
// get the next unused number.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u32);

impl Display for VehicleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node a vehicle can visit: either one of the catalog stops or the depot every route ends at
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum StopKey {
    Stop(StopId),
    Depot,
}

impl StopKey {
    pub fn is_depot(&self) -> bool {
        matches!(self, StopKey::Depot)
    }
}

impl Display for StopKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StopKey::Stop(id) => write!(f, "Stop {}", id),
            StopKey::Depot => write!(f, "Depot"),
        }
    }
}

/// WGS84 position. Longitude first, as in GeoJSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinates {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(value: Coordinates) -> Self {
        Point::new(value.lng, value.lat)
    }
}
