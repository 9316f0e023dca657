//! Client notification trigger.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::AppContext;

#[derive(Deserialize)]
pub struct NotifyRequest {
    pub customer_id: String,
    pub status: String,
    #[serde(default)]
    pub return_id: Option<String>,
}

#[derive(Serialize)]
pub struct NotifyAccepted {
    pub status: &'static str,
    pub customer_id: String,
    pub message: String,
}

/// Queue a status-change notification. Delivery happens in the background.
pub async fn send(
    State(ctx): State<AppContext>,
    Json(request): Json<NotifyRequest>,
) -> Result<(StatusCode, Json<NotifyAccepted>), ApiError> {
    if request.customer_id.is_empty() {
        return Err(ApiError::BadRequest("customer_id is required".into()));
    }
    if request.status.is_empty() {
        return Err(ApiError::BadRequest("status is required".into()));
    }

    let notifier = ctx.notifier.clone();
    let customer_id = request.customer_id.clone();
    let status = request.status.clone();
    let return_id = request.return_id.clone();
    tokio::spawn(async move {
        let sent = notifier
            .notify_status_change(&customer_id, &status, return_id.as_deref())
            .await;
        if !sent {
            tracing::warn!(customer_id = %customer_id, status = %status, "queued notification was not sent");
        }
    });

    let message = format!("Notification for status '{}' queued", request.status);
    Ok((
        StatusCode::ACCEPTED,
        Json(NotifyAccepted {
            status: "queued",
            customer_id: request.customer_id,
            message,
        }),
    ))
}
