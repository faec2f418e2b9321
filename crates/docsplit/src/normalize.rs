//! Validation of recovered classifications and page-range text splitting.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::recovery::{RecoveryMethod, RecoveryOutcome};

const DEFAULT_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Closed set of document labels a classified document can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "form_1008")]
    Form1008,
    #[serde(rename = "bank_statement")]
    BankStatement,
    #[serde(rename = "form_1004")]
    Form1004,
    #[serde(rename = "loan_application")]
    LoanApplication,
    #[serde(rename = "us_driver_license")]
    UsDriverLicense,
    #[serde(rename = "homebuyer_cert")]
    HomebuyerCert,
    #[serde(rename = "other")]
    Other,
    /// Only produced when no classification could be recovered.
    #[serde(rename = "unknown")]
    Unknown,
}

/// Synonyms seen in model output, mapped to canonical labels.
const ALIASES: &[(&str, DocumentType)] = &[
    ("bankStatement", DocumentType::BankStatement),
    ("loanApplication", DocumentType::LoanApplication),
    ("driversLicense", DocumentType::UsDriverLicense),
    ("homebuyerCert", DocumentType::HomebuyerCert),
    ("form1008", DocumentType::Form1008),
    ("form1004", DocumentType::Form1004),
    (
        "uniform_residential_loan_application",
        DocumentType::LoanApplication,
    ),
    (
        "uniform_underwriting_transmittal_summary",
        DocumentType::Form1008,
    ),
    ("uniform_residential_appraisal_report", DocumentType::Form1004),
];

impl DocumentType {
    /// Labels the model may answer with, in prompt order.
    pub const CLASSIFIABLE: [DocumentType; 7] = [
        DocumentType::Form1008,
        DocumentType::BankStatement,
        DocumentType::Form1004,
        DocumentType::LoanApplication,
        DocumentType::UsDriverLicense,
        DocumentType::HomebuyerCert,
        DocumentType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Form1008 => "form_1008",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::Form1004 => "form_1004",
            DocumentType::LoanApplication => "loan_application",
            DocumentType::UsDriverLicense => "us_driver_license",
            DocumentType::HomebuyerCert => "homebuyer_cert",
            DocumentType::Other => "other",
            DocumentType::Unknown => "unknown",
        }
    }

    /// Maps any label onto the closed set. Unrecognized labels become `Other`;
    /// an empty label becomes `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return DocumentType::Unknown;
        }
        if let Some((_, doc_type)) = ALIASES.iter().find(|(alias, _)| *alias == raw) {
            return *doc_type;
        }

        let normalized: String = raw
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        if normalized == "unknown" {
            return DocumentType::Unknown;
        }
        if let Some(doc_type) = Self::CLASSIFIABLE
            .into_iter()
            .find(|t| t.label() == normalized)
        {
            return doc_type;
        }
        ALIASES
            .iter()
            .find(|(alias, _)| alias.to_lowercase() == normalized)
            .map(|(_, doc_type)| *doc_type)
            .unwrap_or(DocumentType::Other)
    }

    /// `bank_statement` → `Bank Statement`.
    pub fn title(self) -> String {
        self.label()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One model-reported document after defaulting and clamping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedDocument {
    pub doc_type: DocumentType,
    /// Label as the model wrote it.
    pub source_label: String,
    pub confidence: f64,
    pub page_start: u32,
    pub page_end: u32,
    pub page_range: String,
    pub key_indicators: Vec<String>,
    pub primary_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResponse {
    pub documents: Vec<ValidatedDocument>,
    pub analysis_confidence: f64,
    pub method: Option<RecoveryMethod>,
    pub parsing_note: Option<String>,
}

impl NormalizedResponse {
    pub fn is_fallback(&self) -> bool {
        self.method.is_none()
    }
}

/// Validates a recovered payload, or builds the degraded single-document
/// response for a fallback.
pub fn normalize_documents(outcome: &RecoveryOutcome) -> NormalizedResponse {
    let (payload, method) = match outcome {
        RecoveryOutcome::Parsed { payload, method } => (payload, *method),
        RecoveryOutcome::Fallback { note } => return fallback_response(note.clone()),
    };

    let documents: Vec<ValidatedDocument> = payload["documents"]
        .as_array()
        .map(|docs| {
            docs.iter()
                .enumerate()
                .map(|(index, doc)| validate_document(doc, index))
                .collect()
        })
        .unwrap_or_default();

    let analysis_confidence = read_f64(&payload["analysis_confidence"])
        .map(clamp_unit)
        .unwrap_or(DEFAULT_CONFIDENCE);

    info!(documents = documents.len(), method = method.as_str(), "Validated model response");

    NormalizedResponse {
        documents,
        analysis_confidence,
        method: Some(method),
        parsing_note: payload["parsing_notes"].as_str().map(str::to_string),
    }
}

/// Page bounds are a placeholder until `split_group` stretches them over
/// the group.
fn fallback_response(note: String) -> NormalizedResponse {
    NormalizedResponse {
        documents: vec![ValidatedDocument {
            doc_type: DocumentType::Unknown,
            source_label: DocumentType::Unknown.label().to_string(),
            confidence: FALLBACK_CONFIDENCE,
            page_start: 1,
            page_end: 1,
            page_range: "1".to_string(),
            key_indicators: Vec::new(),
            primary_identifier: "Fallback Document".to_string(),
        }],
        analysis_confidence: FALLBACK_CONFIDENCE,
        method: None,
        parsing_note: Some(note),
    }
}

fn validate_document(doc: &Value, index: usize) -> ValidatedDocument {
    let source_label = doc["type"].as_str().unwrap_or("unknown").to_string();
    let doc_type = DocumentType::from_label(&source_label);

    let confidence = read_f64(&doc["confidence"])
        .map(clamp_unit)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
    let start = read_page(&doc["page_start"]);
    let end = read_page(&doc["page_end"]);
    let page_start = start.unwrap_or(position);
    let page_end = end.or(start).unwrap_or(position);
    let (page_start, page_end) = if page_end < page_start {
        (page_end, page_start)
    } else {
        (page_start, page_end)
    };

    let key_indicators = match doc["key_indicators"].as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        None => vec![format!("{} document", doc_type.label())],
    };

    let primary_identifier = doc["primary_identifier"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} Document", doc_type.title()));

    ValidatedDocument {
        doc_type,
        source_label,
        confidence,
        page_start,
        page_end,
        page_range: format_page_range(page_start, page_end),
        key_indicators,
        primary_identifier,
    }
}

/// Reads a number, accepting numeric strings.
fn read_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// Reads a one-based page number. Zero and negatives count as missing.
fn read_page(value: &Value) -> Option<u32> {
    read_f64(value)
        .filter(|v| *v >= 1.0 && *v <= f64::from(u32::MAX))
        .map(|v| v.trunc() as u32)
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub fn format_page_range(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

static PAGE_SECTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    match Regex::new(r#"(?s)<page number="(\d+)"[^>]*>(.*?)</page>"#) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(error = %e, "Invalid page section pattern");
            None
        }
    }
});

/// Re-assembles only the page sections numbered within `[start, end]` from
/// a structured context.
pub fn extract_page_range_text(context: &str, start: u32, end: u32) -> String {
    let Some(section) = Option::as_ref(&PAGE_SECTION) else {
        return format!("Error extracting pages {}-{}", start, end);
    };

    let mut pages: Vec<(u32, &str)> = section
        .captures_iter(context)
        .filter_map(|caps| {
            let number: u32 = caps.get(1)?.as_str().parse().ok()?;
            let content = caps.get(2)?.as_str().trim();
            (start..=end).contains(&number).then_some((number, content))
        })
        .collect();
    pages.sort_by_key(|(number, _)| *number);

    if pages.is_empty() {
        warn!(start, end, "No pages found in range");
        return format!("No content found for pages {}-{}", start, end);
    }

    let mut parts = Vec::with_capacity(pages.len() + 2);
    parts.push(format!("<document_segment pages=\"{}-{}\">", start, end));
    for (number, content) in pages {
        parts.push(format!("<page number=\"{}\">\n{}\n</page>", number, content));
    }
    parts.push("</document_segment>".to_string());
    parts.join("\n")
}

/// Range problems found in one group's classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeReport {
    /// Warnings per document, index-aligned with the input.
    pub per_document: Vec<Vec<String>>,
    /// Group pages no document claims.
    pub uncovered: Vec<u32>,
}

impl RangeReport {
    pub fn is_clean(&self) -> bool {
        self.uncovered.is_empty() && self.per_document.iter().all(Vec::is_empty)
    }
}

/// Checks model ranges against the group's pages for overlaps, gaps, and
/// pages outside the group. Ranges are reported, never rewritten. Work is
/// bounded by the group size and document count, not by range width.
pub fn validate_ranges(documents: &[ValidatedDocument], group_pages: &[u32]) -> RangeReport {
    let group: BTreeSet<u32> = group_pages.iter().copied().collect();
    let mut per_document = vec![Vec::new(); documents.len()];
    let mut covered = BTreeSet::new();

    for (i, doc) in documents.iter().enumerate() {
        let outside = outside_ranges(doc.page_start, doc.page_end, &group);
        if !outside.is_empty() {
            let rendered: Vec<String> = outside
                .iter()
                .map(|(start, end)| format_page_range(*start, *end))
                .collect();
            per_document[i].push(format!(
                "pages {} are outside the group",
                rendered.join(", ")
            ));
        }
        covered.extend(group.range(doc.page_start..=doc.page_end).copied());

        for (j, other) in documents.iter().enumerate().skip(i + 1) {
            let lo = doc.page_start.max(other.page_start);
            let hi = doc.page_end.min(other.page_end);
            if lo <= hi {
                let overlap = format_page_range(lo, hi);
                per_document[i].push(format!("pages {} overlap document {}", overlap, j + 1));
                per_document[j].push(format!("pages {} overlap document {}", overlap, i + 1));
            }
        }
    }

    let uncovered: Vec<u32> = group.difference(&covered).copied().collect();
    RangeReport {
        per_document,
        uncovered,
    }
}

/// Sub-ranges of `[start, end]` holding no group page.
fn outside_ranges(start: u32, end: u32, group: &BTreeSet<u32>) -> Vec<(u32, u32)> {
    let mut ranges = Vec::new();
    let mut next = Some(start);
    for &page in group.range(start..=end) {
        if let Some(from) = next {
            if page > from {
                ranges.push((from, page - 1));
            }
        }
        next = page.checked_add(1);
    }
    if let Some(from) = next {
        if from <= end {
            ranges.push((from, end));
        }
    }
    ranges
}

fn join_pages(pages: &[u32]) -> String {
    pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stretches a fallback's degraded document over the whole group.
fn span_group(documents: &[ValidatedDocument], group_pages: &[u32]) -> Vec<ValidatedDocument> {
    let first = group_pages.iter().min().copied();
    let last = group_pages.iter().max().copied();
    documents
        .iter()
        .cloned()
        .map(|mut doc| {
            if let (Some(first), Some(last)) = (first, last) {
                doc.page_start = first;
                doc.page_end = last;
                doc.page_range = format_page_range(first, last);
            }
            doc
        })
        .collect()
}

/// Model diagnostics attached to each document of the extract-then-classify
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub model: String,
    pub key_indicators: Vec<String>,
    pub split_detected: bool,
    pub original_document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_method: Option<RecoveryMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing_note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub range_warnings: Vec<String>,
}

/// Final output unit of either pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Label as reported upstream (model label or blueprint name).
    pub source_label: String,
    pub confidence: f64,
    pub text: String,
    pub page_start: u32,
    pub page_end: u32,
    pub page_range: String,
    pub page_count: u32,
    pub structured_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_analysis: Option<ModelAnalysis>,
}

/// Splits one classified group into documents, each carrying only the text
/// of its own page range.
pub fn split_group(
    group_id: &str,
    context: &str,
    group_pages: &[u32],
    response: &NormalizedResponse,
    model_id: &str,
) -> Vec<ClassifiedDocument> {
    let documents = if response.is_fallback() {
        span_group(&response.documents, group_pages)
    } else {
        response.documents.clone()
    };
    let report = validate_ranges(&documents, group_pages);
    if !report.is_clean() {
        warn!(
            group = group_id,
            uncovered = ?report.uncovered,
            "Model page ranges do not partition the group"
        );
    }
    let gap_warning = (!report.uncovered.is_empty()).then(|| {
        format!(
            "group pages {} are not assigned to any document",
            join_pages(&report.uncovered)
        )
    });

    documents
        .iter()
        .zip(report.per_document)
        .enumerate()
        .map(|(index, (doc, mut range_warnings))| {
            range_warnings.extend(gap_warning.clone());
            ClassifiedDocument {
                id: format!("{}-split-{}", group_id, index + 1),
                doc_type: doc.doc_type,
                source_label: doc.source_label.clone(),
                confidence: doc.confidence,
                text: extract_page_range_text(context, doc.page_start, doc.page_end),
                page_start: doc.page_start,
                page_end: doc.page_end,
                page_range: doc.page_range.clone(),
                page_count: (doc.page_end - doc.page_start).saturating_add(1),
                structured_data: json!({
                    "primary_identifier": doc.primary_identifier,
                    "page_range": doc.page_range,
                    "key_indicators": doc.key_indicators,
                }),
                document_class: None,
                model_analysis: Some(ModelAnalysis {
                    model: model_id.to_string(),
                    key_indicators: doc.key_indicators.clone(),
                    split_detected: !response.is_fallback(),
                    original_document: group_id.to_string(),
                    recovery_method: response.method,
                    parsing_note: response.parsing_note.clone(),
                    range_warnings,
                }),
            }
        })
        .collect()
}
