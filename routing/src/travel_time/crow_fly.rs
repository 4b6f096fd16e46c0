use async_trait::async_trait;
use chrono::Duration;
use common::types::Coordinates;
use common::util::distance::haversine;
use common::util::speed::{Speed, FALLBACK_DRIVING_SPEED};
use crate::travel_time::{TravelTimeError, TravelTimeProvider};

/// Offline estimate: great-circle distance driven at a constant speed.
/// Underestimates real driving time, but needs nothing except the two positions.
#[derive(Debug, Clone, Copy)]
pub struct CrowFlyEstimator {
    speed: Speed,
}

impl CrowFlyEstimator {
    pub fn new(speed: Speed) -> Self {
        Self { speed }
    }

    pub fn estimate(&self, from: Coordinates, to: Coordinates) -> Duration {
        self.speed.time_to_travel_distance(haversine(from, to))
    }
}

impl Default for CrowFlyEstimator {
    fn default() -> Self {
        Self::new(FALLBACK_DRIVING_SPEED)
    }
}

#[async_trait]
impl TravelTimeProvider for CrowFlyEstimator {
    async fn travel_time(&self, from: Coordinates, to: Coordinates) -> Result<Duration, TravelTimeError> {
        Ok(self.estimate(from, to))
    }
}
