//! Return status progression rules.
//!
//! A pure rule table from a point-in-time snapshot of a return to an
//! optional recommended next status. Applying the recommendation is the
//! caller's job; nothing here touches external state.

use std::collections::BTreeSet;

use crate::models::{DocumentType, ReturnStatus};

/// Everything the rule engine needs to know about one return.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub current_status: String,
    pub return_type: String,
    /// All documents on file for the return, verified or not.
    pub uploaded_count: usize,
    /// Types of documents that have been processed or verified.
    pub verified_types: BTreeSet<DocumentType>,
}

/// Minimum document set per return type. Returns not listed here fall
/// back to "any verified document counts".
pub fn required_documents(return_type: &str) -> &'static [DocumentType] {
    match return_type {
        "1040" => &[DocumentType::W2],
        "1120" | "1120s" | "1065" => &[DocumentType::K1],
        "990" => &[],
        _ => &[],
    }
}

/// Recommend the next status for a return, or `None` to leave it alone.
///
/// Ordered rules, first match wins:
/// 1. `intake` with at least one uploaded document (verified or not)
///    moves to `documents_pending`.
/// 2. `documents_pending` with the required document set fully verified
///    moves to `documents_complete`. An empty required set is satisfied
///    by any verified document.
///
/// Nothing advances automatically past `documents_complete`; later
/// stages require preparer action.
pub fn recommend_next_status(snapshot: &StatusSnapshot) -> Option<ReturnStatus> {
    match ReturnStatus::parse(&snapshot.current_status)? {
        ReturnStatus::Intake if snapshot.uploaded_count > 0 => {
            Some(ReturnStatus::DocumentsPending)
        }
        ReturnStatus::DocumentsPending if has_required_documents(snapshot) => {
            Some(ReturnStatus::DocumentsComplete)
        }
        _ => None,
    }
}

fn has_required_documents(snapshot: &StatusSnapshot) -> bool {
    let required = required_documents(&snapshot.return_type);
    if required.is_empty() {
        !snapshot.verified_types.is_empty()
    } else {
        required.iter().all(|t| snapshot.verified_types.contains(t))
    }
}
