//! Status check and calendar scan endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::status::{DeadlineAlert, ExtensionCandidate};
use crate::workflow::StatusCheckReport;

#[derive(Deserialize)]
pub struct StatusCheckRequest {
    pub return_id: String,
}

/// Check one return and apply any recommended status change.
pub async fn check(
    State(ctx): State<AppContext>,
    Json(request): Json<StatusCheckRequest>,
) -> Result<Json<StatusCheckReport>, ApiError> {
    if request.return_id.is_empty() {
        return Err(ApiError::BadRequest("return_id is required".into()));
    }

    let report = ctx.tracker.check_return(&request.return_id).await;
    if let Some(error) = report.error {
        return Err(ApiError::Workflow(error));
    }
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct DeadlinesResponse {
    pub alerts: Vec<DeadlineAlert>,
    pub count: usize,
}

pub async fn deadlines(State(ctx): State<AppContext>) -> Result<Json<DeadlinesResponse>, ApiError> {
    let alerts = ctx.tracker.check_deadlines().await?;
    let count = alerts.len();
    Ok(Json(DeadlinesResponse { alerts, count }))
}

#[derive(Serialize)]
pub struct ExtensionsResponse {
    pub extensions_needed: Vec<ExtensionCandidate>,
    pub count: usize,
}

pub async fn extensions(
    State(ctx): State<AppContext>,
) -> Result<Json<ExtensionsResponse>, ApiError> {
    let extensions_needed = ctx.tracker.check_extensions().await?;
    let count = extensions_needed.len();
    Ok(Json(ExtensionsResponse {
        extensions_needed,
        count,
    }))
}
