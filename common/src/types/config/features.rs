use serde::{Deserialize, Serialize};

/// Switches between the pipeline variants. With everything turned off, the engine clusters stops
/// into a fixed number of vehicles and only orders them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeatureConfig {
    #[serde(default = "enabled")]
    pub capacity_aware: bool,
    #[serde(default = "enabled")]
    pub compute_eta: bool,
}

fn enabled() -> bool {
    true
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { capacity_aware: true, compute_eta: true }
    }
}
