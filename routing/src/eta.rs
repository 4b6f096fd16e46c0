use crate::catalog::StopCatalog;
use crate::travel_time::crow_fly::CrowFlyEstimator;
use crate::travel_time::TravelTimeProvider;
use chrono::{Duration, NaiveDateTime};
use common::types::errors::UnknownStopError;
use common::types::{Coordinates, StopKey};
use log::{debug, warn};

/// Route with the time the vehicle arrives at each stop
pub type TimedRoute = Vec<(StopKey, NaiveDateTime)>;

pub const ETA_FORMAT: &str = "%H:%M";

/// Walks a route and adds up travel times. Every leg first asks the live provider (if any) and
/// falls back to the crow-fly estimate when it fails, returns nonsense or takes longer than
/// `timeout`. The fallback is never retried or skipped, so a run always finishes.
pub struct EtaPropagator {
    live: Option<Box<dyn TravelTimeProvider>>,
    fallback: CrowFlyEstimator,
    timeout: std::time::Duration,
}

impl EtaPropagator {
    pub fn new(
        live: Option<Box<dyn TravelTimeProvider>>,
        fallback: CrowFlyEstimator,
        timeout: std::time::Duration,
    ) -> Self {
        Self { live, fallback, timeout }
    }

    pub fn offline(fallback: CrowFlyEstimator) -> Self {
        Self::new(None, fallback, std::time::Duration::ZERO)
    }

    async fn leg_duration(&self, from: (StopKey, Coordinates), to: (StopKey, Coordinates)) -> Duration {
        let Some(live) = &self.live else {
            return self.fallback.estimate(from.1, to.1);
        };

        match tokio::time::timeout(self.timeout, live.travel_time(from.1, to.1)).await {
            Ok(Ok(duration)) if duration >= Duration::zero() => return duration,
            Ok(Ok(duration)) => {
                warn!(target: "eta", "Negative travel time {duration} for {} to {}. Using fallback.", from.0, to.0);
            }
            Ok(Err(err)) => {
                warn!(target: "eta", "Travel time lookup failed for {} to {}: {err}. Using fallback.", from.0, to.0);
            }
            Err(_) => {
                warn!(target: "eta", "Travel time lookup for {} to {} timed out after {:?}. Using fallback.", from.0, to.0, self.timeout);
            }
        }

        self.fallback.estimate(from.1, to.1)
    }

    /// The first stop is reached at `start`, every later one after the travel time from its
    /// predecessor. Arrival times never decrease.
    pub async fn propagate(
        &self,
        catalog: &StopCatalog,
        route: &[StopKey],
        start: NaiveDateTime,
    ) -> Result<TimedRoute, UnknownStopError> {
        let mut timed = Vec::with_capacity(route.len());
        let mut clock = start;
        let mut previous: Option<(StopKey, Coordinates)> = None;

        for &stop in route {
            let current = (stop, catalog.coordinates(stop)?);
            if let Some(previous) = previous {
                let duration = self.leg_duration(previous, current).await;
                clock = clock.checked_add_signed(duration).unwrap_or(NaiveDateTime::MAX);
            }
            timed.push((stop, clock));
            previous = Some(current);
        }

        debug!(
            target: "eta",
            "{}",
            timed.iter().map(|(stop, time)| format!("{stop} {}", time.format(ETA_FORMAT))).collect::<Vec<_>>().join(", ")
        );
        Ok(timed)
    }
}
