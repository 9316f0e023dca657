//! HTTP client for the office backend API, plus an in-memory mock for tests.

use async_trait::async_trait;
use serde_json::json;

use super::types::{CustomerRecord, DocumentRecord, Page, TaxReturnRecord};
use super::BackendError;
use crate::models::OutboundMessage;

/// Boundary trait for backend data access. Workflows depend on this, never
/// on a concrete client, so every step is testable without a network.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn get_document(&self, id: &str) -> Result<DocumentRecord, BackendError>;
    async fn update_document(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), BackendError>;
    async fn list_documents(
        &self,
        customer_id: &str,
        tax_year: Option<i32>,
    ) -> Result<Vec<DocumentRecord>, BackendError>;
    async fn get_customer(&self, id: &str) -> Result<CustomerRecord, BackendError>;
    async fn get_return(&self, id: &str) -> Result<TaxReturnRecord, BackendError>;
    async fn list_returns(&self, limit: usize) -> Result<Vec<TaxReturnRecord>, BackendError>;
    async fn update_return_status(
        &self,
        id: &str,
        status: &str,
        notes: &str,
    ) -> Result<(), BackendError>;
    async fn send_communication(&self, message: &OutboundMessage) -> Result<(), BackendError>;
}

/// reqwest-backed backend client with bearer-token auth.
pub struct HttpBackend {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if !self.token.is_empty() {
            builder = builder.bearer_auth(&self.token);
        }
        builder
    }

    async fn check(
        &self,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, BackendError> {
        let response = response.map_err(|e| {
            if e.is_connect() {
                BackendError::Connection(self.base_url.clone())
            } else {
                BackendError::Http(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .check(self.request(reqwest::Method::GET, path).query(query).send().await)
            .await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn patch_json(&self, path: &str, body: &serde_json::Value) -> Result<(), BackendError> {
        self.check(
            self.request(reqwest::Method::PATCH, path)
                .json(body)
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<(), BackendError> {
        self.check(
            self.request(reqwest::Method::POST, path)
                .json(body)
                .send()
                .await,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn get_document(&self, id: &str) -> Result<DocumentRecord, BackendError> {
        self.get_json(&format!("/api/documents/{id}"), &[]).await
    }

    async fn update_document(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), BackendError> {
        self.patch_json(&format!("/api/documents/{id}"), &patch).await
    }

    async fn list_documents(
        &self,
        customer_id: &str,
        tax_year: Option<i32>,
    ) -> Result<Vec<DocumentRecord>, BackendError> {
        let mut query = vec![("customerId", customer_id.to_string())];
        if let Some(year) = tax_year {
            query.push(("taxYear", year.to_string()));
        }
        let page: Page<DocumentRecord> = self.get_json("/api/documents", &query).await?;
        Ok(page.data)
    }

    async fn get_customer(&self, id: &str) -> Result<CustomerRecord, BackendError> {
        self.get_json(&format!("/api/customers/{id}"), &[]).await
    }

    async fn get_return(&self, id: &str) -> Result<TaxReturnRecord, BackendError> {
        self.get_json(&format!("/api/returns/{id}"), &[]).await
    }

    async fn list_returns(&self, limit: usize) -> Result<Vec<TaxReturnRecord>, BackendError> {
        let page: Page<TaxReturnRecord> = self
            .get_json("/api/returns", &[("limit", limit.to_string())])
            .await?;
        Ok(page.data)
    }

    async fn update_return_status(
        &self,
        id: &str,
        status: &str,
        notes: &str,
    ) -> Result<(), BackendError> {
        self.patch_json(
            &format!("/api/returns/{id}/status"),
            &json!({ "status": status, "notes": notes }),
        )
        .await
    }

    async fn send_communication(&self, message: &OutboundMessage) -> Result<(), BackendError> {
        let mut body = json!({
            "customerId": message.customer_id,
            "type": message.channel.as_str(),
            "content": message.content,
            "triggeredBy": "agent",
        });
        if let Some(subject) = &message.subject {
            body["subject"] = json!(subject);
        }
        self.post_json("/api/communications/send", &body).await
    }
}

/// In-memory backend for tests: preloaded records plus call recording.
#[derive(Default)]
pub struct MockBackend {
    pub documents: std::sync::Mutex<Vec<DocumentRecord>>,
    pub customers: std::sync::Mutex<Vec<CustomerRecord>>,
    pub returns: std::sync::Mutex<Vec<TaxReturnRecord>>,
    pub document_patches: std::sync::Mutex<Vec<(String, serde_json::Value)>>,
    pub status_updates: std::sync::Mutex<Vec<(String, String, String)>>,
    pub sent_messages: std::sync::Mutex<Vec<OutboundMessage>>,
    /// When set, every call fails with this message.
    pub fail_with: std::sync::Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, doc: DocumentRecord) -> Self {
        self.documents.lock().unwrap().push(doc);
        self
    }

    pub fn with_customer(self, customer: CustomerRecord) -> Self {
        self.customers.lock().unwrap().push(customer);
        self
    }

    pub fn with_return(self, ret: TaxReturnRecord) -> Self {
        self.returns.lock().unwrap().push(ret);
        self
    }

    pub fn failing(message: &str) -> Self {
        let mock = Self::default();
        *mock.fail_with.lock().unwrap() = Some(message.to_string());
        mock
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(BackendError::Http(message));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn get_document(&self, id: &str) -> Result<DocumentRecord, BackendError> {
        self.check_failure()?;
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                body: format!("document {id} not found"),
            })
    }

    async fn update_document(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), BackendError> {
        self.check_failure()?;
        self.document_patches
            .lock()
            .unwrap()
            .push((id.to_string(), patch));
        Ok(())
    }

    async fn list_documents(
        &self,
        customer_id: &str,
        tax_year: Option<i32>,
    ) -> Result<Vec<DocumentRecord>, BackendError> {
        self.check_failure()?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.customer_id == customer_id)
            .filter(|d| tax_year.is_none() || d.tax_year == tax_year)
            .cloned()
            .collect())
    }

    async fn get_customer(&self, id: &str) -> Result<CustomerRecord, BackendError> {
        self.check_failure()?;
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                body: format!("customer {id} not found"),
            })
    }

    async fn get_return(&self, id: &str) -> Result<TaxReturnRecord, BackendError> {
        self.check_failure()?;
        self.returns
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                body: format!("return {id} not found"),
            })
    }

    async fn list_returns(&self, limit: usize) -> Result<Vec<TaxReturnRecord>, BackendError> {
        self.check_failure()?;
        Ok(self
            .returns
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_return_status(
        &self,
        id: &str,
        status: &str,
        notes: &str,
    ) -> Result<(), BackendError> {
        self.check_failure()?;
        if let Some(ret) = self.returns.lock().unwrap().iter_mut().find(|r| r.id == id) {
            ret.status = status.to_string();
        }
        self.status_updates
            .lock()
            .unwrap()
            .push((id.to_string(), status.to_string(), notes.to_string()));
        Ok(())
    }

    async fn send_communication(&self, message: &OutboundMessage) -> Result<(), BackendError> {
        self.check_failure()?;
        self.sent_messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
