//! Generative model gateway client.
//!
//! The model is an opaque capability: we hand it a prompt (optionally with
//! an embedded image) and get unstructured text back. Invocation failures
//! are typed but never retried here — they surface as workflow step
//! failures and the caller decides what to do.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model gateway unreachable at {0}")]
    Connection(String),

    #[error("model gateway returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("failed to decode model response: {0}")]
    Decode(String),

    #[error("http error: {0}")]
    Http(String),
}

/// Boundary trait for generative text/vision invocation.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Plain text completion.
    async fn complete(
        &self,
        model: &str,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, ModelError>;

    /// Completion over an image plus an instruction prompt. `media_type`
    /// is the MIME type of the image payload.
    async fn complete_with_image(
        &self,
        model: &str,
        prompt: &str,
        image: &[u8],
        media_type: &str,
    ) -> Result<String, ModelError>;
}

const MAX_TOKENS: u32 = 4096;

/// HTTP client for a messages-style model gateway
/// (`POST {base}/v1/messages` with content blocks).
pub struct HttpModelClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpModelClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    async fn send(&self, body: &MessagesRequest<'_>) -> Result<String, ModelError> {
        let url = format!("{}/v1/messages", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                ModelError::Connection(self.base_url.clone())
            } else {
                ModelError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    media_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl GenerativeClient for HttpModelClient {
    async fn complete(
        &self,
        model: &str,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, ModelError> {
        let body = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock::Text { text: prompt }],
            }],
        };
        self.send(&body).await
    }

    async fn complete_with_image(
        &self,
        model: &str,
        prompt: &str,
        image: &[u8],
        media_type: &str,
    ) -> Result<String, ModelError> {
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        let body = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system: None,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type,
                            data,
                        },
                    },
                    ContentBlock::Text { text: prompt },
                ],
            }],
        };
        self.send(&body).await
    }
}

/// Mock model client for tests — returns a configurable response or error.
pub struct MockModelClient {
    response: Result<String, String>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl MockModelClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn respond(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(ModelError::Http(message.clone())),
        }
    }
}

#[async_trait]
impl GenerativeClient for MockModelClient {
    async fn complete(
        &self,
        _model: &str,
        _system: Option<&str>,
        prompt: &str,
    ) -> Result<String, ModelError> {
        self.respond(prompt)
    }

    async fn complete_with_image(
        &self,
        _model: &str,
        prompt: &str,
        _image: &[u8],
        _media_type: &str,
    ) -> Result<String, ModelError> {
        self.respond(prompt)
    }
}
