use crate::api::v1::types::{ErrorResponse, GenerateRoutesRequest, GenerateRoutesResponse};
use crate::AppData;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use log::{error, info, warn};
use routing::pipeline::PlanError;
use routing::trigger;
use routing::trigger::TriggerError;
use std::sync::Arc;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

pub(crate) async fn endpoint(
    State(app_data): State<Arc<AppData>>,
    request: Result<Json<GenerateRoutesRequest>, JsonRejection>,
) -> Result<Json<GenerateRoutesResponse>, ErrorReply> {
    let request = request
        .map(|Json(request)| request)
        .map_err(|rejection| {
            warn!(target: "server", "Rejected request: {}", rejection.body_text());
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(rejection.body_text())))
        })?;

    let timestamp = trigger::validate(request.timestamp.as_deref(), app_data.window.as_ref())
        .map_err(convert_trigger_error)?;
    info!(target: "server", "Generating routes for trigger at {timestamp}");

    let routes = app_data.engine
        .generate(app_data.demand.as_ref())
        .await
        .map_err(convert_plan_error)?;
    info!(target: "server", "Generated routes for {} vehicle(s)", routes.0.len());

    Ok(Json(GenerateRoutesResponse { routes }))
}

fn convert_trigger_error(err: TriggerError) -> ErrorReply {
    warn!(target: "server", "Rejected trigger: {err}");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(err)))
}

fn convert_plan_error(err: PlanError) -> ErrorReply {
    error!(target: "server", "{err}");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(err)))
}
