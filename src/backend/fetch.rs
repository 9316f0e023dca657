//! Document byte download from the storage URL on a document record.

use async_trait::async_trait;

use super::FetchError;

/// Boundary trait for fetching raw document bytes.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// reqwest-backed fetcher. `local://` references are office-desktop-only
/// paths and are rejected up front rather than attempted.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.starts_with("local://") {
            return Err(FetchError::UnsupportedSource(url.to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    FetchError::Connection(url.to_string())
                } else {
                    FetchError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Test fetcher returning canned bytes, or an error when configured to fail.
pub struct MockFetcher {
    bytes: Vec<u8>,
    fail: bool,
}

impl MockFetcher {
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self { bytes, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            bytes: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl FileFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.starts_with("local://") {
            return Err(FetchError::UnsupportedSource(url.to_string()));
        }
        if self.fail {
            return Err(FetchError::Http("mock fetch failure".into()));
        }
        Ok(self.bytes.clone())
    }
}
