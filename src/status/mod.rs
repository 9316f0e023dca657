//! Status inference: progression rules plus deadline and extension
//! evaluation. Everything here is pure; the tracker workflow applies
//! the results against the backend.

mod deadlines;
mod rules;

pub use deadlines::{
    extensions_needed, scan_deadlines, DeadlineAlert, DeadlineKind, ExtensionCandidate,
};
pub use rules::{recommend_next_status, required_documents, StatusSnapshot};
