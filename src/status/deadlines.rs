//! Deadline and extension evaluation over return snapshots.
//!
//! Pure functions of the return list and an explicit `now`. Callers at
//! the boundary supply the clock; nothing here reads it ambiently, so
//! every threshold is testable at its exact boundary.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::backend::TaxReturnRecord;
use crate::models::ReturnStatus;

const UPCOMING_WINDOW_DAYS: i64 = 14;
const EXTENSION_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "alert_type", rename_all = "snake_case")]
pub enum DeadlineKind {
    Overdue { days_overdue: i64 },
    Upcoming { days_until_due: i64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadlineAlert {
    pub return_id: String,
    pub customer_id: String,
    pub due_date: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: DeadlineKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionCandidate {
    pub return_id: String,
    pub customer_id: String,
    pub tax_year: Option<i32>,
    pub return_type: String,
    pub due_date: DateTime<Utc>,
    pub current_status: String,
}

fn is_terminal(status: &str) -> bool {
    ReturnStatus::parse(status).is_some_and(|s| s.is_terminal())
}

/// Flag returns that are past due or due within the next two weeks.
pub fn scan_deadlines(returns: &[TaxReturnRecord], now: DateTime<Utc>) -> Vec<DeadlineAlert> {
    let warning_threshold = now + Duration::days(UPCOMING_WINDOW_DAYS);

    returns
        .iter()
        .filter(|r| !is_terminal(&r.status))
        .filter_map(|r| {
            let due = r.due_date?;
            let kind = if due < now {
                DeadlineKind::Overdue {
                    days_overdue: (now - due).num_days(),
                }
            } else if due < warning_threshold {
                DeadlineKind::Upcoming {
                    days_until_due: (due - now).num_days(),
                }
            } else {
                return None;
            };
            Some(DeadlineAlert {
                return_id: r.id.clone(),
                customer_id: r.customer_id.clone(),
                due_date: due,
                kind,
            })
        })
        .collect()
}

/// Flag early-stage returns close enough to their due date that an
/// extension should be filed.
pub fn extensions_needed(
    returns: &[TaxReturnRecord],
    now: DateTime<Utc>,
) -> Vec<ExtensionCandidate> {
    let window = Duration::days(EXTENSION_WINDOW_DAYS);

    returns
        .iter()
        .filter(|r| {
            !is_terminal(&r.status)
                && r.status != "extension_filed"
                && !r.extension_filed.unwrap_or(false)
        })
        .filter(|r| {
            ReturnStatus::parse(&r.status).is_some_and(|s| s.is_early_stage())
        })
        .filter_map(|r| {
            let due = r.due_date?;
            if due - now < window {
                Some(ExtensionCandidate {
                    return_id: r.id.clone(),
                    customer_id: r.customer_id.clone(),
                    tax_year: r.tax_year,
                    return_type: r.return_type.clone().unwrap_or_default(),
                    due_date: due,
                    current_status: r.status.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}
