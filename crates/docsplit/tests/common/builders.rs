//! Builders for extraction output, model replies and pipeline settings.

#![allow(dead_code)]

use serde_json::{json, Value};

use docsplit::config::Config;
use docsplit::extraction::{PageRecord, Representation};
use docsplit::pipeline::PipelineConfig;

pub const OUTPUT_ROOT: &str = "s3://test-bucket/output";
pub const SOURCE_URI: &str = "s3://test-bucket/input/loan-package.pdf";
pub const PROFILE_ARN: &str =
    "arn:aws:bedrock:us-west-2:123456789012:data-automation-profile/us.data-automation-v1";
pub const CUSTOM_PROJECT_ARN: &str =
    "arn:aws:bedrock:us-west-2:123456789012:data-automation-project/lending";

/// `count` words that match no content indicator.
pub fn filler(count: usize) -> String {
    vec!["lorem"; count].join(" ")
}

/// Builder for a single extracted page.
pub struct PageBuilder {
    page_number: u32,
    lines: Vec<String>,
    detected_page_number: Option<u32>,
}

impl PageBuilder {
    /// `page_number` is one-based.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            lines: Vec::new(),
            detected_page_number: None,
        }
    }

    /// Append a line of markdown.
    pub fn line(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    /// Append `count` filler words.
    pub fn words(mut self, count: usize) -> Self {
        self.lines.push(filler(count));
        self
    }

    pub fn detected_page_number(mut self, number: u32) -> Self {
        self.detected_page_number = Some(number);
        self
    }

    pub fn build(self) -> PageRecord {
        PageRecord {
            page_index: self.page_number - 1,
            representation: Representation {
                markdown: Some(self.lines.join("\n")),
                ..Representation::default()
            },
            statistics: None,
            detected_page_number: self.detected_page_number,
        }
    }
}

/// Bank statement, continuation, loan application.
pub fn loan_package_pages() -> Vec<PageRecord> {
    vec![
        PageBuilder::new(1)
            .line("# Bank Statement")
            .line("Statement period ALPHA-MARKER")
            .words(60)
            .build(),
        PageBuilder::new(2)
            .line("continuation text BRAVO-MARKER")
            .build(),
        PageBuilder::new(3)
            .line("# Loan Application")
            .line("Borrower information CHARLIE-MARKER")
            .words(60)
            .build(),
    ]
}

/// Standard output body for one segment.
pub fn standard_output(pages: &[PageRecord]) -> Value {
    json!({
        "document": {
            "summary": "Mortgage application package",
            "description": "Bank statement followed by a loan application",
            "statistics": { "table_count": 2, "figure_count": 0, "element_count": 40 }
        },
        "pages": pages,
    })
}

/// Custom output body for a segment matched against a blueprint.
pub fn custom_output(blueprint: &str, confidence: f64, fields: &[(&str, &str)]) -> Value {
    let inference: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    json!({
        "matched_blueprint": { "name": blueprint, "confidence": confidence },
        "document_class": { "type": blueprint },
        "document": { "representation": { "markdown": format!("# {}", blueprint) } },
        "inference_result": inference,
    })
}

/// One document entry in a model reply.
pub struct ReplyDoc {
    pub label: &'static str,
    pub confidence: f64,
    pub page_start: u32,
    pub page_end: u32,
}

impl ReplyDoc {
    pub fn new(label: &'static str, confidence: f64, page_start: u32, page_end: u32) -> Self {
        Self {
            label,
            confidence,
            page_start,
            page_end,
        }
    }
}

/// Clean JSON reply in the shape the prompt asks for.
pub fn documents_reply(docs: &[ReplyDoc]) -> String {
    let documents: Vec<Value> = docs
        .iter()
        .map(|d| {
            json!({
                "type": d.label,
                "confidence": d.confidence,
                "page_start": d.page_start,
                "page_end": d.page_end,
                "primary_identifier": format!("{} pages {}-{}", d.label, d.page_start, d.page_end),
                "key_indicators": [format!("{} header", d.label)],
            })
        })
        .collect();
    json!({
        "documents": documents,
        "analysis_confidence": 0.9,
        "parsing_notes": "clean",
    })
    .to_string()
}

/// Config with the extraction profile and custom project set.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.output_root = OUTPUT_ROOT.to_string();
    config.extraction.profile_arn = Some(PROFILE_ARN.to_string());
    config.extraction.custom_project_arn = Some(CUSTOM_PROJECT_ARN.to_string());
    config.extraction.poll_interval_secs = 1;
    config.extraction.max_poll_attempts = 5;
    config
}

pub fn test_pipeline_config() -> PipelineConfig {
    PipelineConfig::from_config(&test_config()).expect("test config is complete")
}
