pub mod client;
pub mod fetch;
pub mod types;

pub use client::{BackendApi, HttpBackend, MockBackend};
pub use fetch::{FileFetcher, HttpFetcher, MockFetcher};
pub use types::*;

use thiserror::Error;

/// Failures talking to the office backend API. Always recoverable from the
/// workflow's point of view: recorded on the run state, never retried here.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable at {0}")]
    Connection(String),

    #[error("backend returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("http error: {0}")]
    Http(String),
}

/// Failures downloading document bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported document source: {0}")]
    UnsupportedSource(String),

    #[error("document source unreachable: {0}")]
    Connection(String),

    #[error("document source returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("http error: {0}")]
    Http(String),
}
