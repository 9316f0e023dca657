//! Document data extraction pipeline.
//!
//! A document image goes to the vision model with a structured prompt;
//! the model's free-text answer is located, parsed, classified, and
//! normalized into an `ExtractedDocument`. Parsing is total: once the
//! model has answered, the pipeline always yields a well-formed record.

mod classify;
mod extractor;
mod normalize;
mod payload;
mod prompt;

pub use classify::classify_document_type;
pub use extractor::{media_type_for, parse_model_response, DocumentExtractor};
pub use normalize::normalize_amount;
pub use payload::find_json_payload;
pub use prompt::build_extraction_prompt;
