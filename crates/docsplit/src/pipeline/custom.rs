use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::result::PipelineResult;
use crate::error::PipelineError;
use crate::extraction::{
    find_job_metadata, wait_for_completion, CustomOutput, ExtractionService, InvocationRequest,
    ProjectBinding, SegmentMetadata,
};
use crate::normalize::{format_page_range, ClassifiedDocument, DocumentType};
use crate::sanitize::redact_uri;
use crate::storage::{get_json, ObjectStore, ObjectUri};

const DEFAULT_BLUEPRINT_CONFIDENCE: f64 = 0.9;

/// Extraction against the custom blueprint project; fields come straight
/// from the service.
pub struct CustomPipeline {
    extraction: Arc<dyn ExtractionService>,
    store: Arc<dyn ObjectStore>,
    config: Arc<PipelineConfig>,
}

impl CustomPipeline {
    pub fn new(
        extraction: Arc<dyn ExtractionService>,
        store: Arc<dyn ObjectStore>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            extraction,
            store,
            config,
        }
    }

    pub async fn run(&self, ctx: &PipelineContext) -> Result<PipelineResult, PipelineError> {
        let output = ctx.custom_output(&self.config.output_root);
        let mut request = InvocationRequest::new(
            &ctx.request.source_uri,
            &output.to_string(),
            &self.config.profile_arn,
        );
        if let Some(project) = &self.config.custom_project_arn {
            request = request.with_project(ProjectBinding::live(project));
        }

        let handle = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(PipelineError::Cancelled),
            submitted = self.extraction.submit(&request) => submitted?,
        };
        info!(invocation = %handle, output = %redact_uri(&output.to_string()), "Custom extraction started");

        wait_for_completion(self.extraction.as_ref(), &handle, self.config.poll, &ctx.cancel)
            .await?;
        let metadata = find_job_metadata(self.store.as_ref(), &output).await?;

        let mut documents = Vec::new();
        let mut total_pages: u32 = 0;
        let mut field_count = 0;

        for (index, segment) in metadata.segments().iter().enumerate() {
            let path = match segment.custom_output_path.as_deref() {
                Some(path) if segment.is_custom_match() => path,
                _ => {
                    debug!(
                        segment = index,
                        status = segment.custom_output_status.as_deref().unwrap_or("none"),
                        "Skipping unmatched segment"
                    );
                    continue;
                }
            };

            match self.load(path).await {
                Ok(custom) => {
                    let fields = custom.inference_result.as_ref().map_or(0, |r| r.len());
                    let document = custom_document(&custom, segment, index);
                    info!(
                        segment = index,
                        doc_type = %document.doc_type,
                        pages = %document.page_range,
                        "Custom document read"
                    );
                    total_pages = total_pages.saturating_add(document.page_count);
                    field_count = field_count.max(fields);
                    documents.push(document);
                }
                Err(e) => warn!(segment = index, error = %e, "Failed to process custom segment"),
            }
        }

        info!(documents = documents.len(), pages = total_pages, "Custom pipeline finished");

        let mut result = PipelineResult::new(handle.as_str(), documents, total_pages);
        result.field_count = Some(field_count);
        Ok(result)
    }

    async fn load(&self, path: &str) -> Result<CustomOutput, PipelineError> {
        let uri = ObjectUri::parse(path)?;
        Ok(get_json(self.store.as_ref(), &uri).await?)
    }
}

/// Maps one matched custom output onto a classified document. Page indices
/// come from the output's split, falling back to the segment's.
pub fn custom_document(
    output: &CustomOutput,
    segment: &SegmentMetadata,
    index: usize,
) -> ClassifiedDocument {
    let source_label = output
        .matched_blueprint
        .as_ref()
        .and_then(|b| b.display_name())
        .unwrap_or("unknown")
        .to_string();
    let confidence = output
        .matched_blueprint
        .as_ref()
        .and_then(|b| b.confidence)
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_BLUEPRINT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let indices = output
        .split_document
        .as_ref()
        .or(segment.split_document.as_ref())
        .map(|split| split.page_indices.as_slice())
        .filter(|indices| !indices.is_empty());

    let (page_start, page_end, page_count) = match indices {
        Some(indices) => {
            let first = indices.iter().min().copied().unwrap_or(0);
            let last = indices.iter().max().copied().unwrap_or(first);
            let count = u32::try_from(indices.len()).unwrap_or(u32::MAX);
            (first.saturating_add(1), last.saturating_add(1), count)
        }
        None => (1, 1, 1),
    };

    let text = output
        .document
        .as_ref()
        .map(|d| d.representation.preferred_text().to_string())
        .unwrap_or_default();

    ClassifiedDocument {
        id: format!("segment-{}", index),
        doc_type: DocumentType::from_label(&source_label),
        source_label,
        confidence,
        text,
        page_start,
        page_end,
        page_range: format_page_range(page_start, page_end),
        page_count,
        structured_data: Value::Object(output.inference_result.clone().unwrap_or_default()),
        document_class: output
            .document_class
            .as_ref()
            .and_then(|c| c.class_type.clone()),
        model_analysis: None,
    }
}
