//! Extraction prompt sent with each document image.

use crate::models::DocumentType;

/// Build the extraction instruction for the vision model, optionally
/// anchored on the backend's declared document type.
pub fn build_extraction_prompt(hint: Option<DocumentType>) -> String {
    let type_hint = match hint {
        Some(t) if t != DocumentType::Other => {
            format!("This document is expected to be a {t} form. ")
        }
        _ => String::new(),
    };

    format!(
        "You are an expert tax document processor. {type_hint}Analyze this tax document image and extract all relevant information.\n\
        \n\
        First, identify the document type:\n\
        - W-2: Wage and Tax Statement\n\
        - 1099-R: Distributions from Pensions, Annuities, IRAs, etc.\n\
        - 1099-G: Government Payments (unemployment, state refunds)\n\
        - 1099-INT: Interest Income\n\
        - 1099-DIV: Dividends and Distributions\n\
        - 1099-NEC: Nonemployee Compensation\n\
        - K-1: Partner's/Shareholder's Share of Income\n\
        - Other: Any other tax document\n\
        \n\
        Then extract the following information in a structured format:\n\
        \n\
        For W-2:\n\
        - Employer information (name, EIN, address)\n\
        - Employee information (name, last 4 of SSN, address)\n\
        - Box 1: Wages\n\
        - Box 2: Federal tax withheld\n\
        - Box 3-6: Social Security and Medicare wages/taxes\n\
        - Box 15-17: State information\n\
        \n\
        For 1099 forms:\n\
        - Payer information\n\
        - Recipient information (last 4 of SSN only)\n\
        - All relevant box amounts based on form type\n\
        \n\
        IMPORTANT:\n\
        - Only extract the last 4 digits of any SSN for security\n\
        - If a field is not visible or unclear, mark it as null\n\
        - Include a confidence score (0-1) for your overall extraction\n\
        - Note any warnings or issues with the document quality\n\
        \n\
        Respond in this exact JSON format:\n\
        {{\n\
        \x20 \"document_type\": \"w2|1099-r|1099-g|1099-int|1099-div|1099-nec|k1|other\",\n\
        \x20 \"confidence_score\": 0.95,\n\
        \x20 \"tax_year\": 2024,\n\
        \x20 \"notes\": \"any warnings or issues\",\n\
        \x20 \"extracted_fields\": {{}}\n\
        }}"
    )
}
