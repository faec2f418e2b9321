//! Result documents written by the extraction service.
//!
//! Every field is optional on the wire, so the types default generously and
//! callers decide what a missing value means.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `job_metadata.json`: the manifest of per-segment result locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub output_metadata: Vec<OutputMetadata>,
}

impl JobMetadata {
    /// Segments of the first (and for single-file input, only) asset.
    pub fn segments(&self) -> &[SegmentMetadata] {
        self.output_metadata
            .first()
            .map(|o| o.segment_metadata.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputMetadata {
    #[serde(default)]
    pub asset_id: Option<Value>,
    #[serde(default)]
    pub segment_metadata: Vec<SegmentMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentMetadata {
    #[serde(default)]
    pub standard_output_path: Option<String>,
    #[serde(default)]
    pub custom_output_path: Option<String>,
    #[serde(default)]
    pub custom_output_status: Option<String>,
    #[serde(default)]
    pub split_document: Option<SplitDocument>,
}

impl SegmentMetadata {
    pub fn is_custom_match(&self) -> bool {
        self.custom_output_status.as_deref() == Some("MATCH")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitDocument {
    /// Zero-based indices of the source pages in this segment.
    #[serde(default)]
    pub page_indices: Vec<u32>,
}

/// Standard output of one segment: document-level fields plus pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardOutput {
    #[serde(default)]
    pub document: DocumentLevel,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLevel {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub statistics: DocumentStatistics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatistics {
    #[serde(default)]
    pub table_count: u64,
    #[serde(default)]
    pub figure_count: u64,
    #[serde(default)]
    pub element_count: u64,
}

/// One extracted page. Immutable once read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Zero-based position in the source document.
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub representation: Representation,
    #[serde(default)]
    pub statistics: Option<PageStatistics>,
    /// Page number printed on the page, when the service detected one.
    #[serde(default)]
    pub detected_page_number: Option<u32>,
}

impl PageRecord {
    /// One-based page number used in contexts and page ranges.
    pub fn page_number(&self) -> u32 {
        self.page_index.saturating_add(1)
    }

    pub fn markdown(&self) -> &str {
        self.representation.markdown.as_deref().unwrap_or_default()
    }

    /// Word count reported by the service, or counted from the markdown
    /// when the service omitted statistics.
    pub fn word_count(&self) -> usize {
        match self.statistics.and_then(|s| s.word_count) {
            Some(count) => count as usize,
            None => self.markdown().split_whitespace().count(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStatistics {
    #[serde(default)]
    pub word_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl Representation {
    /// First non-empty of text, markdown, html.
    pub fn preferred_text(&self) -> &str {
        [&self.text, &self.markdown, &self.html]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }
}

/// Custom output of one segment matched against a blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomOutput {
    #[serde(default)]
    pub matched_blueprint: Option<MatchedBlueprint>,
    #[serde(default)]
    pub document_class: Option<DocumentClass>,
    #[serde(default)]
    pub document: Option<CustomDocumentBody>,
    #[serde(default)]
    pub inference_result: Option<Map<String, Value>>,
    #[serde(default)]
    pub split_document: Option<SplitDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchedBlueprint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub blueprint_name: Option<String>,
    #[serde(default, rename = "blueprintName")]
    pub blueprint_name_camel: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl MatchedBlueprint {
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.blueprint_name, &self.blueprint_name_camel]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentClass {
    #[serde(default, rename = "type")]
    pub class_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomDocumentBody {
    #[serde(default)]
    pub representation: Representation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_metadata_segments() {
        let metadata: JobMetadata = serde_json::from_value(json!({
            "output_metadata": [{
                "asset_id": 0,
                "segment_metadata": [
                    { "standard_output_path": "s3://b/0/standard_output/0/result.json" },
                    { "custom_output_path": "s3://b/0/custom_output/1/result.json",
                      "custom_output_status": "MATCH" }
                ]
            }]
        }))
        .unwrap();

        let segments = metadata.segments();
        assert_eq!(segments.len(), 2);
        assert!(!segments[0].is_custom_match());
        assert!(segments[1].is_custom_match());
        assert!(JobMetadata::default().segments().is_empty());
    }

    #[test]
    fn test_page_record_word_count_fallback() {
        let page: PageRecord = serde_json::from_value(json!({
            "page_index": 2,
            "representation": { "markdown": "# Title\nthree more words" }
        }))
        .unwrap();
        assert_eq!(page.page_number(), 3);
        assert_eq!(page.word_count(), 5);

        let counted: PageRecord = serde_json::from_value(json!({
            "page_index": 0,
            "statistics": { "word_count": 240 }
        }))
        .unwrap();
        assert_eq!(counted.word_count(), 240);
        assert_eq!(counted.markdown(), "");
    }

    #[test]
    fn test_preferred_text_order() {
        let repr = Representation {
            text: Some(String::new()),
            markdown: Some("md".to_string()),
            html: Some("<p>html</p>".to_string()),
        };
        assert_eq!(repr.preferred_text(), "md");
        assert_eq!(Representation::default().preferred_text(), "");
    }

    #[test]
    fn test_blueprint_name_variants() {
        let bp: MatchedBlueprint =
            serde_json::from_value(json!({ "blueprintName": "Payslip", "confidence": 0.7 }))
                .unwrap();
        assert_eq!(bp.display_name(), Some("Payslip"));

        let both: MatchedBlueprint =
            serde_json::from_value(json!({ "name": "W2", "blueprint_name": "Other" })).unwrap();
        assert_eq!(both.display_name(), Some("W2"));
    }
}
