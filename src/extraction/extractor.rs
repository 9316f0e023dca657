//! Turning raw model output into a validated `ExtractedDocument`.
//!
//! `parse_model_response` is total: any text input — empty, garbage,
//! truncated JSON — produces a well-formed record. Malformed model output
//! is an expected condition, answered with a zero-confidence fallback and
//! diagnostic notes, never an error to the caller.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::classify::classify_document_type;
use super::normalize::normalize_amount;
use super::payload::find_json_payload;
use super::prompt::build_extraction_prompt;
use crate::llm::{GenerativeClient, ModelError};
use crate::models::{
    DistributionStatement, DocumentType, ExtractedDocument, WageStatement,
};

/// Parse a model response into a structured document record. Total.
pub fn parse_model_response(
    response: &str,
    hint: Option<DocumentType>,
) -> ExtractedDocument {
    let Some(payload) = find_json_payload(response) else {
        return ExtractedDocument::unparsed(hint, "no JSON payload found in model response");
    };

    let data: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            return ExtractedDocument::unparsed(
                hint,
                format!("failed to parse extraction payload: {e}"),
            )
        }
    };

    let document_type = data
        .get("document_type")
        .and_then(Value::as_str)
        .map(classify_document_type)
        .unwrap_or(DocumentType::Other);

    let empty = serde_json::Map::new();
    let fields = data
        .get("extracted_fields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let tax_year = data.get("tax_year").and_then(Value::as_i64).map(|y| y as i32);

    let mut wage_data = None;
    let mut distribution_data = None;
    if document_type == DocumentType::W2 {
        wage_data = Some(parse_wage_fields(fields, tax_year));
    } else if document_type.is_distribution() {
        distribution_data = Some(parse_distribution_fields(fields, document_type, tax_year));
    }

    let confidence_score = data
        .get("confidence_score")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(0.0);

    let notes = data
        .get("notes")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    ExtractedDocument {
        document_type,
        wage_data,
        distribution_data,
        confidence_score,
        notes,
    }
}

fn parse_wage_fields(
    fields: &serde_json::Map<String, Value>,
    tax_year: Option<i32>,
) -> WageStatement {
    WageStatement {
        employer_name: text_field(fields, "employer_name"),
        employer_ein_last4: id_field(fields, "employer_ein"),
        employer_address: text_field(fields, "employer_address"),
        employee_name: text_field(fields, "employee_name"),
        employee_ssn_last4: id_field(fields, "employee_ssn_last4"),
        employee_address: text_field(fields, "employee_address"),
        wages: amount_field(fields, "wages"),
        federal_tax_withheld: amount_field(fields, "federal_tax_withheld"),
        social_security_wages: amount_field(fields, "social_security_wages"),
        social_security_tax: amount_field(fields, "social_security_tax"),
        medicare_wages: amount_field(fields, "medicare_wages"),
        medicare_tax: amount_field(fields, "medicare_tax"),
        state: text_field(fields, "state"),
        state_wages: amount_field(fields, "state_wages"),
        state_tax_withheld: amount_field(fields, "state_tax_withheld"),
        tax_year,
    }
}

fn parse_distribution_fields(
    fields: &serde_json::Map<String, Value>,
    form: DocumentType,
    tax_year: Option<i32>,
) -> DistributionStatement {
    DistributionStatement {
        form_type: Some(form.as_str().to_string()),
        payer_name: text_field(fields, "payer_name"),
        payer_tin_last4: id_field(fields, "payer_tin"),
        recipient_name: text_field(fields, "recipient_name"),
        recipient_ssn_last4: id_field(fields, "recipient_ssn_last4"),
        gross_distribution: amount_field(fields, "gross_distribution"),
        taxable_amount: amount_field(fields, "taxable_amount"),
        federal_tax_withheld: amount_field(fields, "federal_tax_withheld"),
        interest_income: amount_field(fields, "interest_income"),
        ordinary_dividends: amount_field(fields, "ordinary_dividends"),
        qualified_dividends: amount_field(fields, "qualified_dividends"),
        nonemployee_compensation: amount_field(fields, "nonemployee_compensation"),
        unemployment_compensation: amount_field(fields, "unemployment_compensation"),
        tax_year,
    }
}

fn amount_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(|v| normalize_amount(v))
}

fn text_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Identity numbers are reduced to their last four digits no matter what
/// the model sent back. A full SSN/EIN/TIN never survives this function.
fn id_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .and_then(last_four_digits)
}

fn last_four_digits(raw: &str) -> Option<String> {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let start = digits.len().saturating_sub(4);
    Some(digits[start..].iter().collect())
}

/// Infer the image MIME type from the document's file URL.
pub fn media_type_for(file_url: &str) -> &'static str {
    let lower = file_url.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// Drives the vision model over a document image and parses its answer.
pub struct DocumentExtractor {
    model: Arc<dyn GenerativeClient>,
    model_name: String,
}

impl DocumentExtractor {
    pub fn new(model: Arc<dyn GenerativeClient>, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }

    /// Extract structured data from one document image.
    ///
    /// Model invocation failures propagate as `ModelError`; once the model
    /// has answered, parsing cannot fail — malformed answers come back as
    /// a zero-confidence record.
    pub async fn extract_from_image(
        &self,
        image: &[u8],
        media_type: &str,
        hint: Option<DocumentType>,
    ) -> Result<ExtractedDocument, ModelError> {
        let start = Instant::now();
        let prompt = build_extraction_prompt(hint);

        let response = self
            .model
            .complete_with_image(&self.model_name, &prompt, image, media_type)
            .await?;

        let extracted = parse_model_response(&response, hint);
        tracing::info!(
            model = %self.model_name,
            document_type = %extracted.document_type,
            confidence = extracted.confidence_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "document extraction complete"
        );
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockModelClient;
    use proptest::prelude::*;

    fn w2_response() -> &'static str {
        concat!(
            "Subject: here is what I found\n",
            "{\"document_type\":\"w2\",\"confidence_score\":0.9,",
            "\"extracted_fields\":{\"wages\":\"$50,000.00\"}}"
        )
    }

    #[test]
    fn wage_statement_end_to_end() {
        let doc = parse_model_response(w2_response(), None);
        assert_eq!(doc.document_type, DocumentType::W2);
        assert!((doc.confidence_score - 0.9).abs() < f32::EPSILON);
        let wage = doc.wage_data.as_ref().unwrap();
        assert_eq!(wage.wages, Some(50000.0));
        assert!(doc.distribution_data.is_none());
        assert!(doc.payload_matches_type());
    }

    #[test]
    fn distribution_statement_fields_populate() {
        let response = r#"```json
{
  "document_type": "1099-int",
  "confidence_score": 0.85,
  "tax_year": 2024,
  "notes": "slightly blurry scan",
  "extracted_fields": {
    "payer_name": "First National Bank",
    "payer_tin": "12-3456789",
    "recipient_ssn_last4": "6789",
    "interest_income": "$1,240.10",
    "federal_tax_withheld": null
  }
}
```"#;
        let doc = parse_model_response(response, None);
        assert_eq!(doc.document_type, DocumentType::Form1099Int);
        let dist = doc.distribution_data.as_ref().unwrap();
        assert_eq!(dist.form_type.as_deref(), Some("1099-int"));
        assert_eq!(dist.payer_name.as_deref(), Some("First National Bank"));
        assert_eq!(dist.payer_tin_last4.as_deref(), Some("6789"));
        assert_eq!(dist.interest_income, Some(1240.10));
        assert_eq!(dist.federal_tax_withheld, None);
        assert_eq!(dist.tax_year, Some(2024));
        assert_eq!(doc.notes.as_deref(), Some("slightly blurry scan"));
        assert!(doc.wage_data.is_none());
    }

    #[test]
    fn identity_numbers_never_survive_in_full() {
        let response = r#"{"document_type":"w2","confidence_score":0.8,
            "extracted_fields":{"employee_ssn_last4":"123-45-6789","employer_ein":"98-7654321"}}"#;
        let doc = parse_model_response(response, None);
        let wage = doc.wage_data.as_ref().unwrap();
        assert_eq!(wage.employee_ssn_last4.as_deref(), Some("6789"));
        assert_eq!(wage.employer_ein_last4.as_deref(), Some("4321"));
    }

    #[test]
    fn k1_has_no_payload_variant() {
        let response = r#"{"document_type":"k1","confidence_score":0.7,"extracted_fields":{"partner_name":"A"}}"#;
        let doc = parse_model_response(response, None);
        assert_eq!(doc.document_type, DocumentType::K1);
        assert!(doc.wage_data.is_none());
        assert!(doc.distribution_data.is_none());
        assert!(doc.payload_matches_type());
    }

    #[test]
    fn garbage_falls_back_to_hint_with_notes() {
        let doc = parse_model_response("I couldn't read this document, sorry!", Some(DocumentType::W2));
        assert_eq!(doc.document_type, DocumentType::W2);
        assert_eq!(doc.confidence_score, 0.0);
        assert!(doc.wage_data.is_none());
        assert!(doc.notes.as_deref().unwrap().contains("no JSON payload"));
    }

    #[test]
    fn truncated_payload_falls_back() {
        let doc = parse_model_response(r#"{"document_type": "w2", "extracted_fields": {"wages""#, None);
        assert_eq!(doc.document_type, DocumentType::Other);
        assert_eq!(doc.confidence_score, 0.0);
    }

    #[test]
    fn invalid_json_inside_braces_falls_back() {
        let doc = parse_model_response("{not valid json}", None);
        assert_eq!(doc.confidence_score, 0.0);
        assert!(doc.notes.as_deref().unwrap().contains("failed to parse"));
    }

    #[test]
    fn missing_confidence_defaults_to_zero() {
        let doc = parse_model_response(r#"{"document_type":"w2","extracted_fields":{}}"#, None);
        assert_eq!(doc.confidence_score, 0.0);
        assert!(doc.wage_data.is_some());
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let doc = parse_model_response(r#"{"document_type":"w2","confidence_score":1.7}"#, None);
        assert_eq!(doc.confidence_score, 1.0);
        let doc = parse_model_response(r#"{"document_type":"w2","confidence_score":-0.3}"#, None);
        assert_eq!(doc.confidence_score, 0.0);
    }

    #[test]
    fn unknown_fields_stay_null_not_zero() {
        let doc = parse_model_response(
            r#"{"document_type":"w2","confidence_score":0.9,"extracted_fields":{"wages":"unreadable"}}"#,
            None,
        );
        let wage = doc.wage_data.as_ref().unwrap();
        assert_eq!(wage.wages, None);
        assert_eq!(wage.federal_tax_withheld, None);
    }

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for("https://x/doc.PDF"), "application/pdf");
        assert_eq!(media_type_for("https://x/scan.png"), "image/png");
        assert_eq!(media_type_for("https://x/photo.jpg"), "image/jpeg");
        assert_eq!(media_type_for("https://x/photo"), "image/jpeg");
    }

    #[test]
    fn last_four_digit_extraction() {
        assert_eq!(last_four_digits("123-45-6789").as_deref(), Some("6789"));
        assert_eq!(last_four_digits("6789").as_deref(), Some("6789"));
        assert_eq!(last_four_digits("89").as_deref(), Some("89"));
        assert_eq!(last_four_digits("no digits"), None);
    }

    #[tokio::test]
    async fn extractor_drives_model_and_parses() {
        let model = Arc::new(MockModelClient::new(w2_response()));
        let extractor = DocumentExtractor::new(model.clone(), "vision-standard");
        let doc = extractor
            .extract_from_image(&[0xFF, 0xD8], "image/jpeg", Some(DocumentType::W2))
            .await
            .unwrap();
        assert_eq!(doc.document_type, DocumentType::W2);
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("expected to be a w2 form"));
    }

    #[tokio::test]
    async fn extractor_propagates_model_failure() {
        let model = Arc::new(MockModelClient::failing("gateway down"));
        let extractor = DocumentExtractor::new(model, "vision-standard");
        let err = extractor
            .extract_from_image(&[0], "image/jpeg", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Http(_)));
    }

    proptest! {
        // Totality: any text input yields a well-formed record, and the
        // payload variant always matches the type tag.
        #[test]
        fn extraction_is_total(input in ".{0,400}") {
            let doc = parse_model_response(&input, None);
            prop_assert!((0.0..=1.0).contains(&doc.confidence_score));
            prop_assert!(doc.payload_matches_type());
            if doc.confidence_score == 0.0 && doc.notes.is_some() {
                prop_assert!(doc.wage_data.is_none() && doc.distribution_data.is_none());
            }
        }

        #[test]
        fn variant_exclusivity(label in "[a-z0-9-]{0,12}", conf in 0.0f64..1.0) {
            let response = format!(
                "{{\"document_type\":\"{label}\",\"confidence_score\":{conf},\"extracted_fields\":{{}}}}"
            );
            let doc = parse_model_response(&response, None);
            let populated =
                doc.wage_data.is_some() as u8 + doc.distribution_data.is_some() as u8;
            prop_assert!(populated <= 1);
            prop_assert!(doc.payload_matches_type());
        }
    }
}
