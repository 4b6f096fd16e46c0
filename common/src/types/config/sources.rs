use crate::util::speed::{Speed, FALLBACK_DRIVING_SPEED};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(
    untagged,
    expecting = "Invalid or missing demand source. Specify either a realtime database with `url:` or a local JSON export with `path:` under `demand:`"
)]
pub enum DemandSourceConfig {
    Url {
        url: Url,
        // Node below the database root that holds the sign-ups
        #[serde(default = "default_node")]
        node: String,
    },
    File {
        path: String,
    },
}

fn default_node() -> String {
    "users".into()
}

impl Default for DemandSourceConfig {
    fn default() -> Self {
        DemandSourceConfig::File { path: "./data/users.json".into() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TravelTimeConfig {
    /// Ask the directions service before falling back to the crow-fly estimate
    #[serde(default = "default_live")]
    pub live: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_fallback_speed")]
    pub fallback_speed: Speed,
}

fn default_live() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_fallback_speed() -> Speed {
    FALLBACK_DRIVING_SPEED
}

impl TravelTimeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TravelTimeConfig {
    fn default() -> Self {
        Self {
            live: default_live(),
            timeout_ms: default_timeout_ms(),
            fallback_speed: default_fallback_speed(),
        }
    }
}
