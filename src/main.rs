pub mod bootstrap_config;
mod config;

use crate::config::load_config;
use bootstrap_config::BootstrapConfig;
use common::types::config::sources::DemandSourceConfig;
use common::types::config::Settings;
use common::util::logging;
use log::{debug, error, info, warn};
use routing::demand::{DemandError, DemandSource, FileDemandSource, RealtimeDbDemandSource};
use routing::pipeline::{PlanError, RouteEngine};
use routing::travel_time::directions::DirectionsTravelTimeProvider;
use routing::travel_time::{TravelTimeError, TravelTimeProvider};
use server::AppData;
use std::fmt::{Display, Formatter};
use tokio::signal;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() {
    let _ = run()
        .await
        .inspect_err(|err| error!(target: "main", "{}", err));
}

async fn run() -> Result<(), ShuttleError> {
    let bootstrap_config = BootstrapConfig::read();

    logging::init(bootstrap_config.log_level.clone().into());
    print_startup_message();

    let config = logging::run_with_spinner("main", "Reading config", || load_config(&bootstrap_config))?;
    let settings = config.settings();

    let engine = RouteEngine::from_settings(settings, live_provider(settings, &bootstrap_config)?);
    let demand = demand_source(settings, &bootstrap_config)?;
    debug!(target: "main", "{} stops, depot '{}'", engine.catalog().len(), settings.depot.label);

    if bootstrap_config.once {
        let plan = logging::run_with_spinner_async("main", "Planning routes", engine.generate(demand.as_ref())).await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let app_data = AppData { engine, demand, window: settings.window };
    let (listener, app) = server::build(app_data, &settings.server.bind).await?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let api_server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    signal::ctrl_c().await?;
    info!(target: "main", "Received shutdown signal");

    logging::run_with_spinner_async("main", "Shutting down server", async move {
        let _ = stop_tx.send(());
        api_server.await
    })
    .await??;
    debug!(target: "main", "API server stopped");

    Ok(())
}

fn live_provider(
    settings: &Settings,
    bootstrap_config: &BootstrapConfig,
) -> Result<Option<Box<dyn TravelTimeProvider>>, ShuttleError> {
    if !settings.travel_time.live {
        info!(target: "eta", "Live travel times disabled, estimating at {}", settings.travel_time.fallback_speed);
        return Ok(None);
    }

    match &bootstrap_config.maps_api_key {
        Some(key) => {
            let provider = DirectionsTravelTimeProvider::new(key.clone(), settings.travel_time.timeout())?;
            Ok(Some(Box::new(provider)))
        }
        None => {
            warn!(target: "eta", "No maps API key given, estimating every travel time at {}", settings.travel_time.fallback_speed);
            Ok(None)
        }
    }
}

fn demand_source(
    settings: &Settings,
    bootstrap_config: &BootstrapConfig,
) -> Result<Box<dyn DemandSource>, ShuttleError> {
    let source: Box<dyn DemandSource> = match &settings.demand {
        DemandSourceConfig::Url { url, node } => {
            info!(target: "demand", "Reading sign-ups from node '{node}' of {url}");
            Box::new(RealtimeDbDemandSource::new(url, node, bootstrap_config.demand_auth.clone())?)
        }
        DemandSourceConfig::File { path } => {
            info!(target: "demand", "Reading sign-ups from '{path}'");
            Box::new(FileDemandSource::new(path))
        }
    };
    Ok(source)
}

fn print_startup_message() {
    info!("\n       _           _   _   _      \n  ___ | |__  _   _| |_| |_| | ___ \n / __|| '_ \\| | | | __| __| |/ _ \\\n \\__ \\| | | | |_| | |_| |_| |  __/\n |___/|_| |_|\\__,_|\\__|\\__|_|\\___|\n                                  \n R O U T E   E N G I N E\n");
}

#[derive(thiserror::Error, Debug)]
pub enum ShuttleError {
    Config(#[from] config::ConfigError),
    Demand(#[from] DemandError),
    TravelTime(#[from] TravelTimeError),
    Plan(#[from] PlanError),
    Json(#[from] serde_json::Error),
    IO(#[from] std::io::Error),
    Join(#[from] tokio::task::JoinError),
    Server(#[from] server::ServerError),
}

impl Display for ShuttleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err: &dyn Display = match self {
            ShuttleError::Config(err) => err,
            ShuttleError::Demand(err) => err,
            ShuttleError::TravelTime(err) => err,
            ShuttleError::Plan(err) => err,
            ShuttleError::Json(err) => err,
            ShuttleError::IO(err) => err,
            ShuttleError::Join(err) => err,
            ShuttleError::Server(err) => err,
        };
        let prefix = match self {
            ShuttleError::Config(_) => "Reading config file",
            ShuttleError::Demand(_) => "Setting up demand source",
            ShuttleError::TravelTime(_) => "Setting up travel times",
            ShuttleError::Plan(_) => "Planning routes",
            ShuttleError::Json(_) => "Writing routes",
            ShuttleError::IO(_) => "Error during IO",
            ShuttleError::Join(_) => "Stopping server",
            ShuttleError::Server(_) => "Error in server",
        };
        write!(f, "{}: {}", prefix, err)
    }
}
