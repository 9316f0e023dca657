//! Document type classification from the model's declared type label.

use crate::models::DocumentType;

/// Map a free-text or hinted type label to a document kind.
///
/// Case-insensitive alias matching against a fixed table. There is
/// deliberately no fuzzy matching: an ambiguous label must land on
/// `Other`, never a guess.
pub fn classify_document_type(label: &str) -> DocumentType {
    match label.trim().to_lowercase().as_str() {
        "w2" | "w-2" => DocumentType::W2,
        "1099-r" => DocumentType::Form1099R,
        "1099-g" => DocumentType::Form1099G,
        "1099-int" => DocumentType::Form1099Int,
        "1099-div" => DocumentType::Form1099Div,
        "1099-nec" => DocumentType::Form1099Nec,
        "k1" | "k-1" => DocumentType::K1,
        _ => DocumentType::Other,
    }
}
