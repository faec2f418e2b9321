//! Classification prompt sent with every page group.

const PREAMBLE: &str = "You are a document analysis expert. Analyze this XML content containing multiple pages and identify ALL separate documents within it.

CRITICAL REQUIREMENTS:
- Pages must NOT overlap between documents (each page belongs to exactly ONE document)
- Page ranges must be continuous and sequential within each document
- Every page in the XML must be assigned to a document (complete coverage)
- If uncertain about document boundaries, keep related pages together rather than splitting

DOCUMENT TYPE IDENTIFICATION GUIDE:

form_1008: Uniform Underwriting and Transmittal Summary
- Headers: \"Uniform Underwriting and Transmittal Summary\"
- Form numbers: \"Form 1077\", \"Form 1008\", \"Freddie Mac Form 1077\", \"Fannie Mae Form 1008\"
- Sections: Roman numerals I, II, III, IV (Borrower Info, Mortgage Info, Underwriting Info, Seller Info)
- Typical pages: 2-3 pages

bank_statement: Bank account statements
- Headers: Bank names (RBS, Chase, Wells Fargo, etc.), \"Statement\", \"Account Statement\"
- Content: Transaction tables, account numbers, balances, dates, \"Paid In\", \"Paid Out\"
- Identifiers: IBAN, Sort Code, account holder names, statement periods
- Typical pages: 1-3 pages per statement

form_1004: Uniform Residential Appraisal Report (URAR)
- Headers: \"Uniform Residential Appraisal Report\"
- Form numbers: \"Form 70\", \"Form 1004\", \"Freddie Mac Form 70\", \"Fannie Mae Form 1004\"
- Content: Property appraisal, comparable sales, appraiser certification
- Typical pages: 6-7 pages

loan_application: Uniform Residential Loan Application
- Headers: \"Uniform Residential Loan Application\"
- Form numbers: \"Form 65\", \"Form 1003\", \"Freddie Mac Form 65\", \"Fannie Mae Form 1003\"
- Content: 9 sections covering borrower info, financial details, demographics, military service
- Typical pages: 9 pages

us_driver_license: US Driver's License
- Headers: State names + \"Driver License\" or \"Driver's License\"
- Content: License numbers, photos, personal information, vehicle classifications
- Typical pages: 1-2 pages (front/back)

homebuyer_cert: Homebuyer Education Certificate
- Headers: \"Certificate of Achievement\", \"Homebuyer Education Program\"
- Content: MGIC or similar organization, completion certificates, education topics
- Typical pages: 1 page

other: Any document not matching above categories

ANALYSIS PROCESS:
1. Scan each page sequentially from 1 to total pages
2. Identify document start points by finding new headers/form numbers
3. Determine document end points before next document begins
4. Assign confidence based on clarity of identifying markers
5. Ensure all pages are covered with no gaps or overlaps

CONFIDENCE SCORING:
- 0.9-1.0: Clear form numbers/headers, definitive identification
- 0.7-0.8: Strong indicators present, minor ambiguity
- 0.5-0.6: Some identifying features, moderate uncertainty
- 0.3-0.4: Weak indicators, significant uncertainty
- 0.0-0.2: Very unclear, mostly guessing

XML CONTENT TO ANALYZE:
";

const RESPONSE_CONTRACT: &str = r#"

IMPORTANT: Respond with this EXACT JSON structure:
{
  "documents": [
    {
      "type": "form_1008",
      "confidence": 0.95,
      "page_start": 1,
      "page_end": 3,
      "page_range": "1-3",
      "key_indicators": ["Uniform Underwriting and Transmittal Summary", "Form 1008", "Section I", "Borrower Information"],
      "primary_identifier": "Uniform Underwriting and Transmittal Summary"
    },
    {
      "type": "bank_statement",
      "confidence": 0.92,
      "page_start": 4,
      "page_end": 4,
      "page_range": "4",
      "key_indicators": ["RBS Statement", "Account Number", "Transaction History"],
      "primary_identifier": "RBS Bank Statement"
    }
  ],
  "total_documents_found": 2,
  "analysis_confidence": 0.93,
  "validation": {
    "all_pages_covered": true,
    "no_overlaps": true,
    "sequential_ranges": true
  }
}

VALIDATION REQUIREMENTS:
- Every page number from 1 to [total] is assigned to exactly one document
- Page ranges are continuous (no gaps like 1-3, 5-7)
- No page appears in multiple documents
- Document types match actual content found
- Confidence scores reflect certainty of identification

Use only these document types: "#;

/// Builds the classification prompt around a structured context.
pub fn build_classification_prompt(structured_context: &str) -> String {
    let allowed = crate::normalize::DocumentType::CLASSIFIABLE
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::with_capacity(
        PREAMBLE.len() + structured_context.len() + RESPONSE_CONTRACT.len() + allowed.len(),
    );
    prompt.push_str(PREAMBLE);
    prompt.push_str(structured_context);
    prompt.push_str(RESPONSE_CONTRACT);
    prompt.push_str(&allowed);
    prompt
}
