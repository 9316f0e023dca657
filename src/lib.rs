//! taxdesk: workflow automation for a small tax office.
//!
//! Three step-graph workflows over an office backend API and a generative
//! model gateway:
//!
//! - **document OCR** — download an uploaded tax document, extract its
//!   fields with a vision model, and write the structured result back;
//! - **communication** — draft and send status-change notifications to
//!   clients, from templates or the chat model;
//! - **status tracker** — advance returns through the early intake stages
//!   based on document completeness, and scan the office for deadline and
//!   extension risk.
//!
//! Triggered over HTTP ([`api`]) or from the CLI.

pub mod api;
pub mod backend;
pub mod config;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod status;
pub mod workflow;

use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
