//! Step-graph workflows.
//!
//! Each workflow is an explicit step enum, a typed run state, and a pure
//! routing function; the executor in [`engine`] drives them sequentially.
//! Runs own their state outright, so any number may execute concurrently
//! without shared locks.

mod engine;
mod notify;
mod ocr;
mod tracker;

pub use engine::{run_workflow, StepState, Transition, Workflow};
pub use notify::NotifyWorkflow;
pub use ocr::OcrWorkflow;
pub use tracker::{StatusCheckReport, TrackerWorkflow};

use std::future::Future;

use thiserror::Error;

use crate::backend::{BackendError, FetchError};
use crate::llm::ModelError;

/// A failure escaping one workflow step. The executor records it on the
/// run state and routes to the recovery step; steps never retry.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{0}")]
    Invalid(String),
}

/// Run a side effect whose failure must not fail the surrounding step.
/// The error is logged and discarded.
pub async fn best_effort<T, E, F>(context: &str, fut: F) -> Option<T>
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(context, error = %e, "best-effort operation failed");
            None
        }
    }
}
