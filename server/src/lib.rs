mod api;

use axum::routing::post;
use axum::Router;
use common::types::config::TimeWindow;
use log::info;
use routing::demand::DemandSource;
use routing::pipeline::RouteEngine;
use std::fmt::Display;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared by every request. Nothing in here is mutated after startup.
pub struct AppData {
    pub engine: RouteEngine,
    pub demand: Box<dyn DemandSource>,
    pub window: Option<TimeWindow>,
}

pub fn router(app_data: AppData) -> Router {
    Router::new()
        .route("/api/generate-routes", post(api::v1::routes::endpoint))
        .with_state(Arc::new(app_data))
}

pub async fn build(app_data: AppData, bind: &str) -> Result<(TcpListener, Router), ServerError> {
    let app = router(app_data);
    let listener = TcpListener::bind(bind).await?;
    info!(target: "server", "Listening on {}", listener.local_addr()?);

    Ok((listener, app))
}

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    Io(#[from] std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Io(err) => write!(f, "{}", err),
        }
    }
}
