//! Typed extraction records for tax documents.
//!
//! Monetary fields are `Option<f64>` throughout: `None` means "not visible
//! or not extracted", which is distinct from an explicit zero on the form.
//! Identity numbers are reduced to their last four digits before they ever
//! land in one of these records.

use serde::{Deserialize, Serialize};

use super::enums::DocumentType;

/// Structured fields from a W-2 wage and tax statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WageStatement {
    pub employer_name: Option<String>,
    /// Employer EIN, last four digits only.
    pub employer_ein_last4: Option<String>,
    pub employer_address: Option<String>,
    pub employee_name: Option<String>,
    /// Employee SSN, last four digits only.
    pub employee_ssn_last4: Option<String>,
    pub employee_address: Option<String>,

    /// Box 1: wages, tips, other compensation.
    pub wages: Option<f64>,
    /// Box 2: federal income tax withheld.
    pub federal_tax_withheld: Option<f64>,
    pub social_security_wages: Option<f64>,
    pub social_security_tax: Option<f64>,
    pub medicare_wages: Option<f64>,
    pub medicare_tax: Option<f64>,

    /// Box 15: state.
    pub state: Option<String>,
    pub state_wages: Option<f64>,
    pub state_tax_withheld: Option<f64>,

    pub tax_year: Option<i32>,
}

/// Structured fields shared by the 1099 distribution statement family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStatement {
    /// Which 1099 variant this came from ("1099-int", "1099-r", ...).
    pub form_type: Option<String>,
    pub payer_name: Option<String>,
    /// Payer TIN, last four digits only.
    pub payer_tin_last4: Option<String>,
    pub recipient_name: Option<String>,
    /// Recipient SSN, last four digits only.
    pub recipient_ssn_last4: Option<String>,

    pub gross_distribution: Option<f64>,
    pub taxable_amount: Option<f64>,
    pub federal_tax_withheld: Option<f64>,
    /// 1099-INT.
    pub interest_income: Option<f64>,
    /// 1099-DIV.
    pub ordinary_dividends: Option<f64>,
    pub qualified_dividends: Option<f64>,
    /// 1099-NEC.
    pub nonemployee_compensation: Option<f64>,
    /// 1099-G.
    pub unemployment_compensation: Option<f64>,

    pub tax_year: Option<i32>,
}

/// Result of interpreting a single document image.
///
/// At most one of `wage_data` / `distribution_data` is populated, and the
/// populated variant always matches `document_type`. A confidence of 0.0
/// marks an unparseable model response; both payloads are then empty and
/// `notes` carries the diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wage_data: Option<WageStatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_data: Option<DistributionStatement>,
    pub confidence_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExtractedDocument {
    /// Zero-confidence fallback for a model response that could not be
    /// parsed. Never carries a payload.
    pub fn unparsed(hint: Option<DocumentType>, notes: impl Into<String>) -> Self {
        Self {
            document_type: hint.unwrap_or(DocumentType::Other),
            wage_data: None,
            distribution_data: None,
            confidence_score: 0.0,
            notes: Some(notes.into()),
        }
    }

    /// True when the payload variant agrees with the document type tag.
    pub fn payload_matches_type(&self) -> bool {
        match self.document_type {
            DocumentType::W2 => self.distribution_data.is_none(),
            t if t.is_distribution() => self.wage_data.is_none(),
            _ => self.wage_data.is_none() && self.distribution_data.is_none(),
        }
    }
}

/// Outcome of one extraction workflow run, as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub document_id: String,
    pub customer_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<ExtractedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ExtractionOutcome {
    pub fn success(
        document_id: impl Into<String>,
        customer_id: impl Into<String>,
        extracted: ExtractedDocument,
        duration_ms: u64,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            customer_id: customer_id.into(),
            success: true,
            extracted: Some(extracted),
            error_message: None,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn failure(
        document_id: impl Into<String>,
        customer_id: impl Into<String>,
        error_message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            customer_id: customer_id.into(),
            success: false,
            extracted: None,
            error_message: Some(error_message.into()),
            duration_ms: Some(duration_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsed_has_no_payload_and_zero_confidence() {
        let doc = ExtractedDocument::unparsed(Some(DocumentType::W2), "bad json");
        assert_eq!(doc.document_type, DocumentType::W2);
        assert_eq!(doc.confidence_score, 0.0);
        assert!(doc.wage_data.is_none());
        assert!(doc.distribution_data.is_none());
        assert_eq!(doc.notes.as_deref(), Some("bad json"));
        assert!(doc.payload_matches_type());
    }

    #[test]
    fn unparsed_without_hint_is_other() {
        let doc = ExtractedDocument::unparsed(None, "empty response");
        assert_eq!(doc.document_type, DocumentType::Other);
    }

    #[test]
    fn payload_mismatch_is_detected() {
        let doc = ExtractedDocument {
            document_type: DocumentType::Form1099Int,
            wage_data: Some(WageStatement::default()),
            distribution_data: None,
            confidence_score: 0.8,
            notes: None,
        };
        assert!(!doc.payload_matches_type());
    }

    #[test]
    fn outcome_success_invariant() {
        let outcome = ExtractionOutcome::success(
            "doc-1",
            "cust-1",
            ExtractedDocument::unparsed(None, "n/a"),
            12,
        );
        assert!(outcome.success);
        assert!(outcome.extracted.is_some());
        assert!(outcome.error_message.is_none());
    }

    #[test]
    fn outcome_failure_invariant() {
        let outcome = ExtractionOutcome::failure("doc-1", "", "fetch_document failed", 3);
        assert!(!outcome.success);
        assert!(outcome.extracted.is_none());
        assert!(outcome.error_message.is_some());
    }
}
