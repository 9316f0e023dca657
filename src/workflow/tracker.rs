//! Status tracking workflow: inspect a return's documents, apply the
//! progression rules, write the new status back, and notify the client.
//! Also hosts the office-wide deadline and extension scans.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::engine::{StepState, Transition, Workflow};
use super::{run_workflow, NotifyWorkflow, StepError};
use crate::backend::{BackendApi, BackendError, DocumentRecord, TaxReturnRecord};
use crate::extraction::classify_document_type;
use crate::models::ReturnStatus;
use crate::status::{
    extensions_needed, recommend_next_status, scan_deadlines, DeadlineAlert, ExtensionCandidate,
    StatusSnapshot,
};

const RETURN_SCAN_LIMIT: usize = 100;
const STATUS_UPDATE_NOTE: &str = "Status updated automatically by status tracker";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerStep {
    FetchReturn,
    FetchDocuments,
    AnalyzeStatus,
    UpdateStatus,
    SendNotification,
}

#[derive(Default)]
pub struct TrackerState {
    return_id: String,
    return_data: Option<TaxReturnRecord>,
    documents: Vec<DocumentRecord>,
    current_status: String,
    recommended: Option<ReturnStatus>,
    status_changed: bool,
    notification_sent: bool,
    error: Option<String>,
}

impl StepState for TrackerState {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn record_error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

/// What one status check observed and did.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCheckReport {
    pub return_id: String,
    pub current_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
    pub status_changed: bool,
    pub notification_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Checks returns against the progression rules and the calendar.
pub struct TrackerWorkflow {
    backend: Arc<dyn BackendApi>,
    notifier: Arc<NotifyWorkflow>,
}

impl TrackerWorkflow {
    pub fn new(backend: Arc<dyn BackendApi>, notifier: Arc<NotifyWorkflow>) -> Self {
        Self { backend, notifier }
    }

    /// Check one return and apply any recommended status change.
    pub async fn check_return(&self, return_id: &str) -> StatusCheckReport {
        let mut state = TrackerState {
            return_id: return_id.to_string(),
            ..Default::default()
        };
        run_workflow(self, &mut state).await;

        StatusCheckReport {
            return_id: return_id.to_string(),
            current_status: state.current_status,
            new_status: state.recommended.map(|s| s.as_str().to_string()),
            status_changed: state.status_changed,
            notification_sent: state.notification_sent,
            error: state.error,
        }
    }

    /// Flag active returns that are overdue or due within two weeks.
    pub async fn check_deadlines(&self) -> Result<Vec<DeadlineAlert>, BackendError> {
        let returns = self.backend.list_returns(RETURN_SCAN_LIMIT).await?;
        Ok(scan_deadlines(&returns, Utc::now()))
    }

    /// Flag early-stage returns close enough to their due date to need a
    /// filing extension.
    pub async fn check_extensions(&self) -> Result<Vec<ExtensionCandidate>, BackendError> {
        let returns = self.backend.list_returns(RETURN_SCAN_LIMIT).await?;
        Ok(extensions_needed(&returns, Utc::now()))
    }

    async fn fetch_return(&self, state: &mut TrackerState) -> Result<(), StepError> {
        let ret = self.backend.get_return(&state.return_id).await?;
        state.current_status = ret.status.clone();
        state.return_data = Some(ret);
        Ok(())
    }

    async fn fetch_documents(&self, state: &mut TrackerState) -> Result<(), StepError> {
        let ret = state
            .return_data
            .as_ref()
            .ok_or_else(|| StepError::Invalid("no return data fetched".into()))?;
        state.documents = self
            .backend
            .list_documents(&ret.customer_id, ret.tax_year)
            .await?;
        Ok(())
    }

    fn analyze_status(&self, state: &mut TrackerState) {
        let Some(ret) = &state.return_data else {
            return;
        };

        let verified_types: BTreeSet<_> = state
            .documents
            .iter()
            .filter(|d| {
                matches!(d.status.as_deref(), Some("processed") | Some("verified"))
            })
            .filter_map(|d| d.doc_type.as_deref())
            .map(classify_document_type)
            .collect();

        let snapshot = StatusSnapshot {
            current_status: state.current_status.clone(),
            return_type: ret.return_type.clone().unwrap_or_else(|| "1040".to_string()),
            uploaded_count: state.documents.len(),
            verified_types,
        };
        state.recommended = recommend_next_status(&snapshot);
    }

    async fn update_status(&self, state: &mut TrackerState) -> Result<(), StepError> {
        let Some(recommended) = state.recommended else {
            return Ok(());
        };
        self.backend
            .update_return_status(&state.return_id, recommended.as_str(), STATUS_UPDATE_NOTE)
            .await?;
        state.status_changed = true;
        tracing::info!(
            return_id = %state.return_id,
            from = %state.current_status,
            to = %recommended,
            "return status updated"
        );
        Ok(())
    }

    /// Best-effort: a status change that fails to notify is still a
    /// status change, reported as changed-but-not-notified.
    async fn send_notification(&self, state: &mut TrackerState) {
        let (Some(ret), Some(recommended)) = (&state.return_data, state.recommended) else {
            return;
        };
        state.notification_sent = self
            .notifier
            .notify_status_change(&ret.customer_id, recommended.as_str(), Some(&state.return_id))
            .await;
    }
}

#[async_trait::async_trait]
impl Workflow for TrackerWorkflow {
    type State = TrackerState;
    type Step = TrackerStep;

    fn name(&self) -> &'static str {
        "status_tracker"
    }

    fn entry(&self) -> TrackerStep {
        TrackerStep::FetchReturn
    }

    fn recovery(&self) -> Option<TrackerStep> {
        None
    }

    fn step_name(step: TrackerStep) -> &'static str {
        match step {
            TrackerStep::FetchReturn => "fetch_return",
            TrackerStep::FetchDocuments => "fetch_documents",
            TrackerStep::AnalyzeStatus => "analyze_status",
            TrackerStep::UpdateStatus => "update_status",
            TrackerStep::SendNotification => "send_notification",
        }
    }

    fn route(&self, step: TrackerStep, state: &TrackerState) -> Transition<TrackerStep> {
        match step {
            TrackerStep::FetchReturn => Transition::Next(TrackerStep::FetchDocuments),
            TrackerStep::FetchDocuments => Transition::Next(TrackerStep::AnalyzeStatus),
            TrackerStep::AnalyzeStatus if state.recommended.is_some() => {
                Transition::Next(TrackerStep::UpdateStatus)
            }
            TrackerStep::UpdateStatus if state.status_changed => {
                Transition::Next(TrackerStep::SendNotification)
            }
            _ => Transition::End,
        }
    }

    async fn apply(&self, step: TrackerStep, state: &mut TrackerState) -> Result<(), StepError> {
        match step {
            TrackerStep::FetchReturn => self.fetch_return(state).await,
            TrackerStep::FetchDocuments => self.fetch_documents(state).await,
            TrackerStep::AnalyzeStatus => {
                self.analyze_status(state);
                Ok(())
            }
            TrackerStep::UpdateStatus => self.update_status(state).await,
            TrackerStep::SendNotification => {
                self.send_notification(state).await;
                Ok(())
            }
        }
    }
}
