use routing::pipeline::RoutePlan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRoutesRequest {
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateRoutesResponse {
    pub routes: RoutePlan,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self { error: error.to_string() }
    }
}
