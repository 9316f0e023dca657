//! Document OCR triggers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::AppContext;
use crate::models::ExtractionOutcome;

#[derive(Deserialize)]
pub struct OcrRequest {
    pub document_id: String,
}

#[derive(Serialize)]
pub struct OcrAccepted {
    pub status: &'static str,
    pub document_id: String,
    pub message: &'static str,
}

/// Kick off OCR for a document and return immediately. The run continues
/// in the background; its outcome lands on the document record.
pub async fn process(
    State(ctx): State<AppContext>,
    Json(request): Json<OcrRequest>,
) -> Result<(StatusCode, Json<OcrAccepted>), ApiError> {
    if request.document_id.is_empty() {
        return Err(ApiError::BadRequest("document_id is required".into()));
    }

    let ocr = ctx.ocr.clone();
    let document_id = request.document_id.clone();
    tokio::spawn(async move {
        let outcome = ocr.process_document(&document_id).await;
        if !outcome.success {
            tracing::warn!(
                document_id = %document_id,
                error = outcome.error_message.as_deref().unwrap_or(""),
                "background OCR run failed"
            );
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(OcrAccepted {
            status: "processing",
            document_id: request.document_id,
            message: "Document OCR processing started",
        }),
    ))
}

/// Run OCR and wait for the result.
pub async fn process_sync(
    State(ctx): State<AppContext>,
    Json(request): Json<OcrRequest>,
) -> Result<Json<ExtractionOutcome>, ApiError> {
    if request.document_id.is_empty() {
        return Err(ApiError::BadRequest("document_id is required".into()));
    }

    let outcome = ctx.ocr.process_document(&request.document_id).await;
    if !outcome.success {
        return Err(ApiError::Workflow(
            outcome
                .error_message
                .unwrap_or_else(|| "extraction failed".to_string()),
        ));
    }
    Ok(Json(outcome))
}
