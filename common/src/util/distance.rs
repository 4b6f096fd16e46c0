use crate::types::Coordinates;
use std::fmt::{Display, Formatter};

/// Mean earth radius used by the offline travel time estimate
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Distance(pub f64);

impl Distance {
    pub fn kilometers(&self) -> f64 {
        self.0 / 1_000.0
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}m", self.0)
    }
}

/// Great-circle distance between two positions on a sphere with radius [EARTH_RADIUS_KM]
pub fn haversine(from: Coordinates, to: Coordinates) -> Distance {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Distance(EARTH_RADIUS_KM * c * 1_000.0)
}
