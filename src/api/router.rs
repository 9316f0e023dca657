//! HTTP trigger surface for the workflows.

use axum::routing::{get, post};
use axum::Router;

use super::endpoints;
use super::types::AppContext;

/// Build the application router. All workflow triggers live at the root;
/// `/health` is unauthenticated liveness.
pub fn app_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/ocr/process", post(endpoints::ocr::process))
        .route("/ocr/process-sync", post(endpoints::ocr::process_sync))
        .route("/communication/notify", post(endpoints::notify::send))
        .route("/status/check", post(endpoints::status::check))
        .route("/status/deadlines", get(endpoints::status::deadlines))
        .route(
            "/status/extensions-needed",
            get(endpoints::status::extensions),
        )
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::backend::{CustomerRecord, DocumentRecord, MockBackend, MockFetcher, TaxReturnRecord};
    use crate::extraction::DocumentExtractor;
    use crate::llm::MockModelClient;
    use crate::workflow::{NotifyWorkflow, OcrWorkflow, TrackerWorkflow};

    const W2_RESPONSE: &str =
        r#"{"document_type":"w2","confidence_score":0.9,"extracted_fields":{"wages":1000}}"#;

    fn context_with(backend: Arc<MockBackend>) -> AppContext {
        let model = Arc::new(MockModelClient::new(W2_RESPONSE));
        let ocr = Arc::new(OcrWorkflow::new(
            backend.clone(),
            Arc::new(MockFetcher::returning(vec![1, 2, 3])),
            DocumentExtractor::new(model.clone(), "vision-standard"),
            10 * 1024 * 1024,
        ));
        let notifier = Arc::new(NotifyWorkflow::new(
            backend.clone(),
            model,
            "chat-standard",
            "Beacon Tax Partners",
        ));
        let tracker = Arc::new(TrackerWorkflow::new(backend, notifier.clone()));
        AppContext::new(ocr, notifier, tracker)
    }

    fn seeded_backend() -> Arc<MockBackend> {
        Arc::new(
            MockBackend::new()
                .with_document(DocumentRecord {
                    id: "doc-1".into(),
                    customer_id: "cust-1".into(),
                    file_url: "https://files.example.com/doc-1.jpg".into(),
                    doc_type: Some("w2".into()),
                    status: Some("uploaded".into()),
                    tax_year: Some(2024),
                })
                .with_customer(CustomerRecord {
                    id: "cust-1".into(),
                    first_name: Some("Pat".into()),
                    last_name: Some("Morgan".into()),
                    email: Some("pat@example.com".into()),
                    phone: None,
                })
                .with_return(TaxReturnRecord {
                    id: "ret-1".into(),
                    customer_id: "cust-1".into(),
                    tax_year: Some(2024),
                    return_type: Some("1040".into()),
                    status: "intake".into(),
                    due_date: None,
                    extension_filed: None,
                }),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_service_and_version() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "taxdesk");
    }

    #[tokio::test]
    async fn ocr_process_accepts_and_returns_immediately() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(post_json("/ocr/process", serde_json::json!({"document_id": "doc-1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["status"], "processing");
        assert_eq!(json["document_id"], "doc-1");
    }

    #[tokio::test]
    async fn ocr_process_sync_returns_extraction() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(post_json(
                "/ocr/process-sync",
                serde_json::json!({"document_id": "doc-1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["extracted"]["document_type"], "w2");
    }

    #[tokio::test]
    async fn ocr_process_sync_failure_is_a_server_error() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(post_json(
                "/ocr/process-sync",
                serde_json::json!({"document_id": "ghost"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "WORKFLOW_FAILED");
    }

    #[tokio::test]
    async fn empty_document_id_is_a_bad_request() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(post_json("/ocr/process", serde_json::json!({"document_id": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notify_queues_in_background() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(post_json(
                "/communication/notify",
                serde_json::json!({"customer_id": "cust-1", "status": "documents_complete"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["status"], "queued");
    }

    #[tokio::test]
    async fn status_check_reports_progression() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .oneshot(post_json("/status/check", serde_json::json!({"return_id": "ret-1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["current_status"], "intake");
        assert_eq!(json["new_status"], "documents_pending");
        assert_eq!(json["status_changed"], true);
    }

    #[tokio::test]
    async fn status_check_failure_is_a_server_error() {
        let app = app_router(context_with(Arc::new(MockBackend::failing("down"))));
        let response = app
            .oneshot(post_json("/status/check", serde_json::json!({"return_id": "ret-1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn deadline_and_extension_scans_return_counts() {
        let app = app_router(context_with(seeded_backend()));
        let response = app
            .clone()
            .oneshot(Request::get("/status/deadlines").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 0);

        let response = app
            .oneshot(
                Request::get("/status/extensions-needed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["extensions_needed"], serde_json::json!([]));
    }
}
