//! Client notification workflow: look up the customer and return, build a
//! message from the status template (or the chat model when no template
//! exists), and hand it to the backend's communication API.

use std::sync::Arc;

use super::engine::{StepState, Transition, Workflow};
use super::{run_workflow, StepError};
use crate::backend::{BackendApi, CustomerRecord, TaxReturnRecord};
use crate::llm::GenerativeClient;
use crate::models::{template_for, ChannelKind, OutboundMessage, TemplateVars};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotifyStep {
    FetchData,
    GenerateMessage,
    SendMessage,
    HandleError,
}

#[derive(Default)]
pub struct NotifyState {
    customer_id: String,
    return_id: Option<String>,
    status: String,
    customer: Option<CustomerRecord>,
    tax_return: Option<TaxReturnRecord>,
    message: Option<OutboundMessage>,
    sent: bool,
    error: Option<String>,
}

impl StepState for NotifyState {
    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn record_error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

/// Sends status-change notifications to clients.
pub struct NotifyWorkflow {
    backend: Arc<dyn BackendApi>,
    model: Arc<dyn GenerativeClient>,
    model_name: String,
    firm_name: String,
}

impl NotifyWorkflow {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        model: Arc<dyn GenerativeClient>,
        model_name: &str,
        firm_name: &str,
    ) -> Self {
        Self {
            backend,
            model,
            model_name: model_name.to_string(),
            firm_name: firm_name.to_string(),
        }
    }

    /// Notify a customer that their return moved to `status`. Returns true
    /// when the message went out.
    pub async fn notify_status_change(
        &self,
        customer_id: &str,
        status: &str,
        return_id: Option<&str>,
    ) -> bool {
        let mut state = NotifyState {
            customer_id: customer_id.to_string(),
            return_id: return_id.map(String::from),
            status: status.to_string(),
            ..Default::default()
        };
        run_workflow(self, &mut state).await;
        state.sent
    }

    async fn fetch_data(&self, state: &mut NotifyState) -> Result<(), StepError> {
        state.customer = Some(self.backend.get_customer(&state.customer_id).await?);
        if let Some(return_id) = &state.return_id {
            state.tax_return = Some(self.backend.get_return(return_id).await?);
        }
        Ok(())
    }

    async fn generate_message(&self, state: &mut NotifyState) -> Result<(), StepError> {
        let customer = state
            .customer
            .as_ref()
            .ok_or_else(|| StepError::Invalid("no customer data fetched".into()))?;
        let customer_name = customer.display_name();
        let tax_year = state
            .tax_return
            .as_ref()
            .and_then(|r| r.tax_year)
            .map(|y| y.to_string())
            .unwrap_or_else(|| "2024".to_string());

        let (subject, body) = match template_for(&state.status) {
            Some(template) => {
                let vars = TemplateVars {
                    customer_name: &customer_name,
                    tax_year: &tax_year,
                    firm_name: &self.firm_name,
                    missing_items: "- Please check with our office",
                    refund_info: "Please check your return documents for refund details.",
                };
                template.render(&vars)
            }
            None => {
                let (subject, body) = self
                    .generate_ai_message(&customer_name, &state.status, &tax_year)
                    .await?;
                (Some(subject), body)
            }
        };

        state.message = Some(OutboundMessage {
            customer_id: state.customer_id.clone(),
            channel: ChannelKind::Email,
            subject,
            content: body,
            customer_name: Some(customer_name),
            customer_email: customer.email.clone(),
        });
        Ok(())
    }

    async fn generate_ai_message(
        &self,
        customer_name: &str,
        status: &str,
        tax_year: &str,
    ) -> Result<(String, String), StepError> {
        let system = format!(
            "You are a professional assistant for {firm}, a tax preparation firm.\n\
             Generate friendly, professional email communications for tax clients.\n\
             Keep messages concise but warm. Include relevant details about their tax return status.\n\
             Always sign off with \"Best regards, {firm} Team\".",
            firm = self.firm_name
        );
        let prompt = format!(
            "Generate an email for {customer_name} about their {tax_year} tax return.\n\
             Status: {}\n\n\
             Provide the email subject and body. Format:\n\
             Subject: [subject line]\n\
             Body:\n\
             [email body]",
            humanize_status(status)
        );

        let text = self
            .model
            .complete(&self.model_name, Some(&system), &prompt)
            .await?;
        Ok(parse_subject_body(&text, tax_year))
    }

    async fn send_message(&self, state: &mut NotifyState) -> Result<(), StepError> {
        let message = state
            .message
            .as_ref()
            .ok_or_else(|| StepError::Invalid("no message to send".into()))?;
        self.backend.send_communication(message).await?;
        state.sent = true;
        tracing::info!(
            customer_id = %state.customer_id,
            status = %state.status,
            "notification sent"
        );
        Ok(())
    }
}

/// "documents_complete" -> "Documents Complete".
fn humanize_status(status: &str) -> String {
    status
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a model reply into subject and body on the `Subject:` / `Body:`
/// markers it was asked to use. Falls back to a stock subject and the
/// whole reply when the markers are missing.
fn parse_subject_body(text: &str, tax_year: &str) -> (String, String) {
    let mut subject = String::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in text.trim().lines() {
        let lower = line.to_lowercase();
        if lower.starts_with("subject:") {
            subject = line["subject:".len()..].trim().to_string();
        } else if lower.starts_with("body:") {
            in_body = true;
        } else if in_body {
            body_lines.push(line);
        }
    }

    let body = body_lines.join("\n").trim().to_string();
    let body = if body.is_empty() {
        text.trim().to_string()
    } else {
        body
    };
    let subject = if subject.is_empty() {
        format!("Update on Your {tax_year} Tax Return")
    } else {
        subject
    };
    (subject, body)
}

#[async_trait::async_trait]
impl Workflow for NotifyWorkflow {
    type State = NotifyState;
    type Step = NotifyStep;

    fn name(&self) -> &'static str {
        "communication"
    }

    fn entry(&self) -> NotifyStep {
        NotifyStep::FetchData
    }

    fn recovery(&self) -> Option<NotifyStep> {
        Some(NotifyStep::HandleError)
    }

    fn step_name(step: NotifyStep) -> &'static str {
        match step {
            NotifyStep::FetchData => "fetch_data",
            NotifyStep::GenerateMessage => "generate_message",
            NotifyStep::SendMessage => "send_message",
            NotifyStep::HandleError => "handle_error",
        }
    }

    fn route(&self, step: NotifyStep, _state: &NotifyState) -> Transition<NotifyStep> {
        match step {
            NotifyStep::FetchData => Transition::Next(NotifyStep::GenerateMessage),
            NotifyStep::GenerateMessage => Transition::Next(NotifyStep::SendMessage),
            NotifyStep::SendMessage | NotifyStep::HandleError => Transition::End,
        }
    }

    async fn apply(&self, step: NotifyStep, state: &mut NotifyState) -> Result<(), StepError> {
        match step {
            NotifyStep::FetchData => self.fetch_data(state).await,
            NotifyStep::GenerateMessage => self.generate_message(state).await,
            NotifyStep::SendMessage => self.send_message(state).await,
            NotifyStep::HandleError => {
                tracing::warn!(
                    customer_id = %state.customer_id,
                    status = %state.status,
                    error = state.error.as_deref().unwrap_or(""),
                    "notification not sent"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::llm::MockModelClient;

    fn customer() -> CustomerRecord {
        CustomerRecord {
            id: "cust-1".into(),
            first_name: Some("Pat".into()),
            last_name: Some("Morgan".into()),
            email: Some("pat@example.com".into()),
            phone: None,
        }
    }

    fn tax_return(year: i32) -> TaxReturnRecord {
        TaxReturnRecord {
            id: "ret-1".into(),
            customer_id: "cust-1".into(),
            tax_year: Some(year),
            return_type: Some("1040".into()),
            status: "documents_complete".into(),
            due_date: None,
            extension_filed: None,
        }
    }

    fn workflow_with(backend: Arc<MockBackend>, model: Arc<MockModelClient>) -> NotifyWorkflow {
        NotifyWorkflow::new(backend, model, "chat-standard", "Beacon Tax Partners")
    }

    #[tokio::test]
    async fn templated_status_sends_without_model_call() {
        let backend =
            Arc::new(MockBackend::new().with_customer(customer()).with_return(tax_return(2024)));
        let model = Arc::new(MockModelClient::new("should not be called"));
        let workflow = workflow_with(backend.clone(), model.clone());

        let sent = workflow
            .notify_status_change("cust-1", "documents_complete", Some("ret-1"))
            .await;
        assert!(sent);
        assert!(model.prompts.lock().unwrap().is_empty());

        let messages = backend.sent_messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.customer_id, "cust-1");
        assert_eq!(message.channel, ChannelKind::Email);
        assert_eq!(
            message.subject.as_deref(),
            Some("Beacon Tax Partners - Documents Received for 2024")
        );
        assert!(message.content.contains("Dear Pat Morgan"));
        assert_eq!(message.customer_email.as_deref(), Some("pat@example.com"));
    }

    #[tokio::test]
    async fn untemplated_status_uses_the_model() {
        let backend = Arc::new(MockBackend::new().with_customer(customer()));
        let model = Arc::new(MockModelClient::new(
            "Subject: Quick update on your return\nBody:\nHi Pat, your return moved forward today.",
        ));
        let workflow = workflow_with(backend.clone(), model.clone());

        let sent = workflow
            .notify_status_change("cust-1", "in_preparation", None)
            .await;
        assert!(sent);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("In Preparation"));
        assert!(prompts[0].contains("Pat Morgan"));

        let messages = backend.sent_messages.lock().unwrap();
        assert_eq!(messages[0].subject.as_deref(), Some("Quick update on your return"));
        assert_eq!(
            messages[0].content,
            "Hi Pat, your return moved forward today."
        );
    }

    #[tokio::test]
    async fn unknown_customer_means_not_sent() {
        let backend = Arc::new(MockBackend::new());
        let model = Arc::new(MockModelClient::new("x"));
        let workflow = workflow_with(backend.clone(), model);

        let sent = workflow
            .notify_status_change("ghost", "documents_complete", None)
            .await;
        assert!(!sent);
        assert!(backend.sent_messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_means_not_sent() {
        let backend = Arc::new(MockBackend::new().with_customer(customer()));
        let model = Arc::new(MockModelClient::failing("gateway down"));
        let workflow = workflow_with(backend.clone(), model);

        let sent = workflow
            .notify_status_change("cust-1", "in_preparation", None)
            .await;
        assert!(!sent);
        assert!(backend.sent_messages.lock().unwrap().is_empty());
    }

    #[test]
    fn subject_body_parsing_with_markers() {
        let (subject, body) =
            parse_subject_body("Subject: Hello there\nBody:\nLine one\nLine two", "2024");
        assert_eq!(subject, "Hello there");
        assert_eq!(body, "Line one\nLine two");
    }

    #[test]
    fn subject_body_parsing_without_markers_falls_back() {
        let (subject, body) = parse_subject_body("Just a plain reply with no markers.", "2023");
        assert_eq!(subject, "Update on Your 2023 Tax Return");
        assert_eq!(body, "Just a plain reply with no markers.");
    }

    #[test]
    fn humanize_status_title_cases_words() {
        assert_eq!(humanize_status("documents_complete"), "Documents Complete");
        assert_eq!(humanize_status("intake"), "Intake");
        assert_eq!(humanize_status("ready_for_signing"), "Ready For Signing");
    }
}
