//! Wire records exchanged with the office backend API.
//!
//! The backend speaks camelCase JSON; all fields the workflows do not need
//! are simply not modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub file_url: String,
    /// Declared document type, used as an extraction hint ("w2", "1099-int", ...).
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    /// Processing status ("uploaded", "processed", "verified", ...).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tax_year: Option<i32>,
}

/// A customer record, reduced to the fields notifications need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerRecord {
    /// "First Last", trimmed; empty string when neither name is present.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}

/// A tax return record as the backend reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxReturnRecord {
    pub id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub tax_year: Option<i32>,
    /// Form code of the return ("1040", "1120s", ...).
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extension_filed: Option<bool>,
}

/// Paginated list envelope used by the backend's list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}
