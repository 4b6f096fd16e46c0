use async_trait::async_trait;
use chrono::Duration;
use common::types::Coordinates;
use log::trace;
use serde::Deserialize;
use url::Url;
use crate::travel_time::{TravelTimeError, TravelTimeProvider};

const DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Live driving time for departing right now, taken from the Google Directions API
pub struct DirectionsTravelTimeProvider {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl DirectionsTravelTimeProvider {
    pub fn new(api_key: String, timeout: std::time::Duration) -> Result<Self, TravelTimeError> {
        let endpoint = Url::parse(DIRECTIONS_ENDPOINT)
            .map_err(|err| TravelTimeError::Service { status: "INVALID_ENDPOINT".into(), message: Some(err.to_string()) })?;
        Self::with_endpoint(endpoint, api_key, timeout)
    }

    pub fn with_endpoint(endpoint: Url, api_key: String, timeout: std::time::Duration) -> Result<Self, TravelTimeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint, api_key })
    }
}

#[async_trait]
impl TravelTimeProvider for DirectionsTravelTimeProvider {
    async fn travel_time(&self, from: Coordinates, to: Coordinates) -> Result<Duration, TravelTimeError> {
        let response: DirectionsResponse = self.client.get(self.endpoint.clone())
            .query(&[
                ("origin", lat_lng(from)),
                ("destination", lat_lng(to)),
                ("mode", "driving".into()),
                ("departure_time", "now".into()),
                ("key", self.api_key.clone()),
            ])
            .send().await?
            .error_for_status()?
            .json().await?;

        let duration = response.traffic_duration()?;
        trace!(target: "eta", "Directions {} -> {}: {duration}", lat_lng(from), lat_lng(to));
        Ok(duration)
    }
}

// The API wants latitude first
fn lat_lng(position: Coordinates) -> String {
    format!("{},{}", position.lat, position.lng)
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    #[serde(default)]
    duration_in_traffic: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: i64,
}

impl DirectionsResponse {
    fn traffic_duration(self) -> Result<Duration, TravelTimeError> {
        match self.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" | "NOT_FOUND" => return Err(TravelTimeError::NoRoute),
            _ => return Err(TravelTimeError::Service { status: self.status, message: self.error_message }),
        }

        let leg = self.routes.into_iter()
            .next()
            .and_then(|route| route.legs.into_iter().next())
            .ok_or(TravelTimeError::NoRoute)?;

        leg.duration_in_traffic
            .and_then(|duration| Duration::try_seconds(duration.value))
            .ok_or(TravelTimeError::MissingDuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Duration, TravelTimeError> {
        serde_json::from_str::<DirectionsResponse>(body).unwrap().traffic_duration()
    }

    #[test]
    fn test_traffic_duration() {
        let body = r#"{
            "status": "OK",
            "routes": [{ "legs": [{
                "duration": { "text": "9 mins", "value": 540 },
                "duration_in_traffic": { "text": "12 mins", "value": 702 }
            }] }]
        }"#;
        assert_eq!(parse(body).unwrap(), Duration::seconds(702));
    }

    #[test]
    fn test_failures() {
        assert!(matches!(parse(r#"{ "status": "ZERO_RESULTS", "routes": [] }"#), Err(TravelTimeError::NoRoute)));
        assert!(matches!(parse(r#"{ "status": "OK", "routes": [] }"#), Err(TravelTimeError::NoRoute)));
        assert!(matches!(
            parse(r#"{ "status": "OK", "routes": [{ "legs": [{ "duration": { "value": 5 } }] }] }"#),
            Err(TravelTimeError::MissingDuration)
        ));
        assert!(matches!(
            parse(r#"{ "status": "REQUEST_DENIED", "error_message": "The provided API key is invalid." }"#),
            Err(TravelTimeError::Service { message: Some(_), .. })
        ));
    }

    #[test]
    fn test_duration_out_of_range() {
        let body = r#"{
            "status": "OK",
            "routes": [{ "legs": [{ "duration_in_traffic": { "value": 9223372036854775807 } }] }]
        }"#;
        assert!(matches!(parse(body), Err(TravelTimeError::MissingDuration)));
    }

    #[test]
    fn test_lat_lng_order() {
        assert_eq!(lat_lng(Coordinates::new(4.5, 9.25)), "9.25,4.5");
    }
}
