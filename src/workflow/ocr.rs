//! Document OCR workflow: fetch metadata, download bytes, run the vision
//! extractor, write the result back to the document record.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;

use super::engine::{StepState, Transition, Workflow};
use super::{best_effort, run_workflow, StepError};
use crate::backend::{BackendApi, FileFetcher};
use crate::extraction::{classify_document_type, media_type_for, DocumentExtractor};
use crate::models::{DocumentType, ExtractedDocument, ExtractionOutcome};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OcrStep {
    FetchDocument,
    DownloadFile,
    ExtractData,
    UpdateDocument,
    HandleError,
}

#[derive(Default)]
pub struct OcrState {
    document_id: String,
    customer_id: String,
    file_url: String,
    hint: Option<DocumentType>,
    file_bytes: Option<Vec<u8>>,
    extracted: Option<ExtractedDocument>,
    error: Option<String>,
}

impl StepState for OcrState {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn record_error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

/// Runs the OCR pipeline for one document at a time.
pub struct OcrWorkflow {
    backend: Arc<dyn BackendApi>,
    fetcher: Arc<dyn FileFetcher>,
    extractor: DocumentExtractor,
    max_file_bytes: usize,
}

impl OcrWorkflow {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        fetcher: Arc<dyn FileFetcher>,
        extractor: DocumentExtractor,
        max_file_bytes: usize,
    ) -> Self {
        Self {
            backend,
            fetcher,
            extractor,
            max_file_bytes,
        }
    }

    /// Process one document end to end. Failures inside the run come back
    /// as a failed outcome, never as an `Err`.
    pub async fn process_document(&self, document_id: &str) -> ExtractionOutcome {
        let start = Instant::now();
        let mut state = OcrState {
            document_id: document_id.to_string(),
            ..Default::default()
        };

        run_workflow(self, &mut state).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Some(error) = state.error {
            return ExtractionOutcome::failure(document_id, state.customer_id, error, duration_ms);
        }
        match state.extracted {
            Some(extracted) => {
                ExtractionOutcome::success(document_id, state.customer_id, extracted, duration_ms)
            }
            None => ExtractionOutcome::failure(
                document_id,
                state.customer_id,
                "workflow produced no extraction",
                duration_ms,
            ),
        }
    }

    async fn fetch_document(&self, state: &mut OcrState) -> Result<(), StepError> {
        let doc = self.backend.get_document(&state.document_id).await?;
        if doc.file_url.is_empty() {
            return Err(StepError::Invalid("document has no file URL".into()));
        }
        state.customer_id = doc.customer_id;
        state.file_url = doc.file_url;
        state.hint = doc
            .doc_type
            .as_deref()
            .map(classify_document_type)
            .filter(|t| *t != DocumentType::Other);
        Ok(())
    }

    async fn download_file(&self, state: &mut OcrState) -> Result<(), StepError> {
        let bytes = self.fetcher.fetch(&state.file_url).await?;
        if bytes.len() > self.max_file_bytes {
            return Err(StepError::Invalid(format!(
                "file is {} bytes, over the {} byte limit",
                bytes.len(),
                self.max_file_bytes
            )));
        }
        state.file_bytes = Some(bytes);
        Ok(())
    }

    async fn extract_data(&self, state: &mut OcrState) -> Result<(), StepError> {
        let bytes = state
            .file_bytes
            .as_deref()
            .ok_or_else(|| StepError::Invalid("no file bytes downloaded".into()))?;
        let media_type = media_type_for(&state.file_url);
        let extracted = self
            .extractor
            .extract_from_image(bytes, media_type, state.hint)
            .await?;
        state.extracted = Some(extracted);
        Ok(())
    }

    /// Record the extraction on the document. Write-back failure does not
    /// fail an otherwise successful run.
    async fn update_document(&self, state: &mut OcrState) -> Result<(), StepError> {
        let Some(extracted) = &state.extracted else {
            return Ok(());
        };
        let patch = json!({
            "ocrExtracted": true,
            "extractedData": extracted,
            "status": "processed",
            "type": extracted.document_type.as_str(),
        });
        best_effort(
            "update_document",
            self.backend.update_document(&state.document_id, patch),
        )
        .await;
        Ok(())
    }

    async fn handle_error(&self, state: &mut OcrState) -> Result<(), StepError> {
        let patch = json!({
            "ocrExtracted": false,
            "status": "pending",
            "extractedData": { "error": state.error },
        });
        self.backend
            .update_document(&state.document_id, patch)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Workflow for OcrWorkflow {
    type State = OcrState;
    type Step = OcrStep;

    fn name(&self) -> &'static str {
        "document_ocr"
    }

    fn entry(&self) -> OcrStep {
        OcrStep::FetchDocument
    }

    fn recovery(&self) -> Option<OcrStep> {
        Some(OcrStep::HandleError)
    }

    fn step_name(step: OcrStep) -> &'static str {
        match step {
            OcrStep::FetchDocument => "fetch_document",
            OcrStep::DownloadFile => "download_file",
            OcrStep::ExtractData => "extract_data",
            OcrStep::UpdateDocument => "update_document",
            OcrStep::HandleError => "handle_error",
        }
    }

    fn route(&self, step: OcrStep, _state: &OcrState) -> Transition<OcrStep> {
        match step {
            OcrStep::FetchDocument => Transition::Next(OcrStep::DownloadFile),
            OcrStep::DownloadFile => Transition::Next(OcrStep::ExtractData),
            OcrStep::ExtractData => Transition::Next(OcrStep::UpdateDocument),
            OcrStep::UpdateDocument | OcrStep::HandleError => Transition::End,
        }
    }

    async fn apply(&self, step: OcrStep, state: &mut OcrState) -> Result<(), StepError> {
        match step {
            OcrStep::FetchDocument => self.fetch_document(state).await,
            OcrStep::DownloadFile => self.download_file(state).await,
            OcrStep::ExtractData => self.extract_data(state).await,
            OcrStep::UpdateDocument => self.update_document(state).await,
            OcrStep::HandleError => self.handle_error(state).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DocumentRecord, MockBackend, MockFetcher};
    use crate::llm::MockModelClient;

    fn document(file_url: &str) -> DocumentRecord {
        DocumentRecord {
            id: "doc-1".into(),
            customer_id: "cust-1".into(),
            file_url: file_url.into(),
            doc_type: Some("w2".into()),
            status: Some("uploaded".into()),
            tax_year: Some(2024),
        }
    }

    fn workflow_with(
        backend: Arc<MockBackend>,
        fetcher: MockFetcher,
        model_response: &str,
    ) -> OcrWorkflow {
        let model = Arc::new(MockModelClient::new(model_response));
        OcrWorkflow::new(
            backend,
            Arc::new(fetcher),
            DocumentExtractor::new(model, "vision-standard"),
            10 * 1024 * 1024,
        )
    }

    const W2_RESPONSE: &str = r#"{"document_type":"w2","confidence_score":0.92,"extracted_fields":{"wages":"$50,000.00"}}"#;

    #[tokio::test]
    async fn successful_run_patches_document_as_processed() {
        let backend = Arc::new(
            MockBackend::new().with_document(document("https://files.example.com/doc-1.jpg")),
        );
        let workflow = workflow_with(
            backend.clone(),
            MockFetcher::returning(vec![0xFF, 0xD8, 0xFF]),
            W2_RESPONSE,
        );

        let outcome = workflow.process_document("doc-1").await;
        assert!(outcome.success);
        assert_eq!(outcome.customer_id, "cust-1");
        let extracted = outcome.extracted.unwrap();
        assert_eq!(extracted.document_type, DocumentType::W2);
        assert_eq!(extracted.wage_data.unwrap().wages, Some(50000.0));

        let patches = backend.document_patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        let (id, patch) = &patches[0];
        assert_eq!(id, "doc-1");
        assert_eq!(patch["ocrExtracted"], true);
        assert_eq!(patch["status"], "processed");
        assert_eq!(patch["type"], "w2");
        assert_eq!(patch["extractedData"]["confidence_score"], 0.92f32);
    }

    #[tokio::test]
    async fn local_source_fails_and_marks_document_pending() {
        let backend =
            Arc::new(MockBackend::new().with_document(document("local://demo/sample-w2.jpg")));
        let workflow = workflow_with(
            backend.clone(),
            MockFetcher::returning(vec![1]),
            W2_RESPONSE,
        );

        let outcome = workflow.process_document("doc-1").await;
        assert!(!outcome.success);
        let message = outcome.error_message.unwrap();
        assert!(message.starts_with("download_file failed"), "{message}");
        assert!(message.contains("unsupported document source"));

        let patches = backend.document_patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1["ocrExtracted"], false);
        assert_eq!(patches[0].1["status"], "pending");
        assert!(patches[0].1["extractedData"]["error"].is_string());
    }

    #[tokio::test]
    async fn missing_document_reports_fetch_failure() {
        let backend = Arc::new(MockBackend::new());
        let workflow = workflow_with(backend, MockFetcher::returning(vec![1]), W2_RESPONSE);

        let outcome = workflow.process_document("ghost").await;
        assert!(!outcome.success);
        assert!(outcome
            .error_message
            .unwrap()
            .starts_with("fetch_document failed"));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let backend = Arc::new(
            MockBackend::new().with_document(document("https://files.example.com/doc-1.pdf")),
        );
        let model = Arc::new(MockModelClient::new(W2_RESPONSE));
        let workflow = OcrWorkflow::new(
            backend,
            Arc::new(MockFetcher::returning(vec![0u8; 32])),
            DocumentExtractor::new(model, "vision-standard"),
            16,
        );

        let outcome = workflow.process_document("doc-1").await;
        assert!(!outcome.success);
        assert!(outcome.error_message.unwrap().contains("byte limit"));
    }

    #[tokio::test]
    async fn unreadable_model_output_still_succeeds_with_zero_confidence() {
        let backend = Arc::new(
            MockBackend::new().with_document(document("https://files.example.com/doc-1.png")),
        );
        let workflow = workflow_with(
            backend.clone(),
            MockFetcher::returning(vec![1, 2, 3]),
            "I cannot make out this document at all.",
        );

        let outcome = workflow.process_document("doc-1").await;
        assert!(outcome.success);
        let extracted = outcome.extracted.unwrap();
        // The declared type hint survives even when parsing fails.
        assert_eq!(extracted.document_type, DocumentType::W2);
        assert_eq!(extracted.confidence_score, 0.0);

        let patches = backend.document_patches.lock().unwrap();
        assert_eq!(patches[0].1["status"], "processed");
    }

    #[tokio::test]
    async fn model_failure_routes_to_error_handling() {
        let backend = Arc::new(
            MockBackend::new().with_document(document("https://files.example.com/doc-1.jpg")),
        );
        let model = Arc::new(MockModelClient::failing("gateway timeout"));
        let workflow = OcrWorkflow::new(
            backend.clone(),
            Arc::new(MockFetcher::returning(vec![1])),
            DocumentExtractor::new(model, "vision-standard"),
            1024,
        );

        let outcome = workflow.process_document("doc-1").await;
        assert!(!outcome.success);
        assert!(outcome
            .error_message
            .unwrap()
            .starts_with("extract_data failed"));
        assert_eq!(backend.document_patches.lock().unwrap()[0].1["status"], "pending");
    }

    #[tokio::test]
    async fn backend_down_run_still_reports_instead_of_panicking() {
        let backend = Arc::new(MockBackend::failing("connection refused"));
        let workflow = workflow_with(backend.clone(), MockFetcher::returning(vec![1]), W2_RESPONSE);

        // Error-handler write-back also fails; that failure is swallowed.
        let outcome = workflow.process_document("doc-1").await;
        assert!(!outcome.success);
        assert!(backend.document_patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duration_is_reported() {
        let backend = Arc::new(
            MockBackend::new().with_document(document("https://files.example.com/doc-1.jpg")),
        );
        let workflow = workflow_with(backend, MockFetcher::returning(vec![1]), W2_RESPONSE);
        let outcome = workflow.process_document("doc-1").await;
        assert!(outcome.duration_ms.is_some());
    }
}
