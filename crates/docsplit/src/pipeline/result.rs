use serde::Serialize;

use super::cost::CostEstimate;
use crate::classify::TokenUsage;
use crate::normalize::ClassifiedDocument;

/// Output of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub documents: Vec<ClassifiedDocument>,
    pub total_pages: u32,
    pub document_count: usize,
    /// Extraction invocation that produced the documents.
    pub invocation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<usize>,
    pub cost: CostEstimate,
}

impl PipelineResult {
    pub fn new(invocation: impl Into<String>, documents: Vec<ClassifiedDocument>, total_pages: u32) -> Self {
        Self {
            document_count: documents.len(),
            documents,
            total_pages,
            invocation: invocation.into(),
            token_usage: None,
            field_count: None,
            cost: CostEstimate::default(),
        }
    }
}

/// Both pipelines' results for one source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub comparison_id: String,
    pub model_id: String,
    pub processing_time_ms: u64,
    pub standard: PipelineResult,
    pub custom: PipelineResult,
}

impl ComparisonResult {
    /// `standard+custom` invocation ids.
    pub fn invocation(&self) -> String {
        format!("{}+{}", self.standard.invocation, self.custom.invocation)
    }
}
