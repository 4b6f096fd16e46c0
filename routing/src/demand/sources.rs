use crate::demand::{AttendanceRecord, DemandError};
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::path::PathBuf;
use url::Url;

/// Where sign-ups come from. Every run calls [DemandSource::snapshot] exactly once and works on
/// the returned copy, so overlapping runs never observe each other's reads.
#[async_trait]
pub trait DemandSource: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<AttendanceRecord>, DemandError>;
}

/// Reads the sign-up node of a realtime database through its REST interface
/// (`GET <database>/<node>.json`).
pub struct RealtimeDbDemandSource {
    client: reqwest::Client,
    endpoint: Url,
    auth: Option<String>,
}

impl RealtimeDbDemandSource {
    pub fn new(database: &Url, node: &str, auth: Option<String>) -> Result<Self, DemandError> {
        let mut endpoint = database.clone();
        endpoint.path_segments_mut()
            .map_err(|_| DemandError::InvalidUrl(database.clone()))?
            .pop_if_empty()
            .push(&format!("{node}.json"));

        Ok(Self { client: reqwest::Client::new(), endpoint, auth })
    }
}

#[async_trait]
impl DemandSource for RealtimeDbDemandSource {
    async fn snapshot(&self) -> Result<Vec<AttendanceRecord>, DemandError> {
        let mut request = self.client.get(self.endpoint.clone());
        if let Some(auth) = &self.auth {
            request = request.query(&[("auth", auth)]);
        }

        let body = request.send().await?
            .error_for_status()?
            .text().await?;
        debug!(target: "demand", "Fetched {} bytes from {}", body.len(), self.endpoint);

        parse_snapshot(&body)
    }
}

/// A JSON export of the sign-up node on disk
pub struct FileDemandSource {
    path: PathBuf,
}

impl FileDemandSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DemandSource for FileDemandSource {
    async fn snapshot(&self) -> Result<Vec<AttendanceRecord>, DemandError> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        parse_snapshot(&body)
    }
}

#[derive(Clone, Default)]
pub struct StaticDemandSource(pub Vec<AttendanceRecord>);

#[async_trait]
impl DemandSource for StaticDemandSource {
    async fn snapshot(&self) -> Result<Vec<AttendanceRecord>, DemandError> {
        Ok(self.0.clone())
    }
}

/// The node is either `null` (nobody signed up yet), an object keyed by user id, or an array
/// when the database decided the keys look like indices. Malformed entries are skipped.
pub(crate) fn parse_snapshot(body: &str) -> Result<Vec<AttendanceRecord>, DemandError> {
    let entries = match serde_json::from_str::<Value>(body)? {
        Value::Null => vec![],
        Value::Object(users) => users.into_iter().map(|(_, user)| user).collect(),
        Value::Array(users) => users,
        other => {
            warn!(target: "demand", "Expected an object of users, got '{other}'");
            vec![]
        }
    };

    Ok(entries.into_iter()
        .filter(|entry| !entry.is_null())
        .filter_map(|entry| match serde_json::from_value::<AttendanceRecord>(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(target: "demand", "Skipping malformed sign-up: {err}");
                None
            }
        })
        .collect())
}
