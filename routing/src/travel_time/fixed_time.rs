use async_trait::async_trait;
use chrono::Duration;
use common::types::Coordinates;
use crate::travel_time::{TravelTimeError, TravelTimeProvider};

/// Don't ask anybody, instead return hard-coded durations from a lookup table.
/// Useful for testing or replaying a recorded day. Durations may be asymmetric (a -> b different
/// from b -> a); unknown pairs fail with [TravelTimeError::NoRoute].
#[derive(Debug, Clone, Default)]
pub struct FixedTimeTravelTimeProvider {
    durations: Vec<((Coordinates, Coordinates), Duration)>,
}

impl FixedTimeTravelTimeProvider {
    pub fn with(mut self, from: Coordinates, to: Coordinates, duration: Duration) -> Self {
        self.durations.push(((from, to), duration));
        self
    }
}

#[async_trait]
impl TravelTimeProvider for FixedTimeTravelTimeProvider {
    async fn travel_time(&self, from: Coordinates, to: Coordinates) -> Result<Duration, TravelTimeError> {
        self.durations.iter()
            .find(|((a, b), _)| *a == from && *b == to)
            .map(|(_, duration)| *duration)
            .ok_or(TravelTimeError::NoRoute)
    }
}
