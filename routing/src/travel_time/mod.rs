pub mod crow_fly;
pub mod directions;
pub mod fixed_time;

use async_trait::async_trait;
use chrono::Duration;
use common::types::Coordinates;
use std::fmt;
use std::fmt::Display;

/// How long a vehicle needs to get from one position to another. Failures are returned, never
/// raised: the caller decides what to use instead.
#[async_trait]
pub trait TravelTimeProvider: Send + Sync {
    async fn travel_time(&self, from: Coordinates, to: Coordinates) -> Result<Duration, TravelTimeError>;
}

#[derive(thiserror::Error, Debug)]
pub enum TravelTimeError {
    Http(#[from] reqwest::Error),
    Service { status: String, message: Option<String> },
    NoRoute,
    MissingDuration,
}

impl Display for TravelTimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TravelTimeError::Http(err) => write!(f, "{}", err),
            TravelTimeError::Service { status, message: Some(message) } => write!(f, "{status}: {message}"),
            TravelTimeError::Service { status, message: None } => write!(f, "{status}"),
            TravelTimeError::NoRoute => write!(f, "No route found"),
            TravelTimeError::MissingDuration => write!(f, "Route has no usable traffic-aware duration"),
        }
    }
}
