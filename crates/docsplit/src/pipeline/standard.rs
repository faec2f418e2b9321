use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::progress::{Milestone, ProgressReporter};
use super::result::PipelineResult;
use crate::classify::{ClassificationInvoker, TokenUsage};
use crate::error::PipelineError;
use crate::extraction::{
    find_job_metadata, standard_overrides, wait_for_completion, ExtractionService,
    InvocationRequest, ProjectBinding, StandardOutput,
};
use crate::normalize::{normalize_documents, split_group, ClassifiedDocument};
use crate::recovery::recover;
use crate::sanitize::redact_uri;
use crate::segmentation::{build_structured_context, PageGroup, PageGrouper};
use crate::storage::{get_json, ObjectStore, ObjectUri};

#[derive(Debug, Default)]
struct SegmentOutcome {
    documents: Vec<ClassifiedDocument>,
    pages: u32,
    usage: TokenUsage,
}

/// Generic extraction followed by page grouping and model classification.
pub struct StandardPipeline {
    extraction: Arc<dyn ExtractionService>,
    store: Arc<dyn ObjectStore>,
    invoker: ClassificationInvoker,
    config: Arc<PipelineConfig>,
    grouper: PageGrouper,
}

impl StandardPipeline {
    pub fn new(
        extraction: Arc<dyn ExtractionService>,
        store: Arc<dyn ObjectStore>,
        invoker: ClassificationInvoker,
        config: Arc<PipelineConfig>,
    ) -> Self {
        let grouper = PageGrouper::new(&config.grouping);
        Self {
            extraction,
            store,
            invoker,
            config,
            grouper,
        }
    }

    pub async fn run(
        &self,
        ctx: &PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineResult, PipelineError> {
        let output = ctx.standard_output(&self.config.output_root);
        let request = InvocationRequest::new(
            &ctx.request.source_uri,
            &output.to_string(),
            &self.config.profile_arn,
        )
        .with_project(ProjectBinding::live(&self.config.standard_project_arn))
        .with_overrides(standard_overrides(ctx.request.enable_splitting));

        let handle = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(PipelineError::Cancelled),
            submitted = self.extraction.submit(&request) => submitted?,
        };
        info!(invocation = %handle, output = %redact_uri(&output.to_string()), "Standard extraction started");

        wait_for_completion(self.extraction.as_ref(), &handle, self.config.poll, &ctx.cancel)
            .await?;
        let metadata = find_job_metadata(self.store.as_ref(), &output).await?;

        progress.report(Milestone::ClassificationInFlight);

        let mut documents = Vec::new();
        let mut total_pages: u32 = 0;
        let mut usage = TokenUsage::default();

        for (index, segment) in metadata.segments().iter().enumerate() {
            let Some(path) = segment.standard_output_path.as_deref() else {
                debug!(segment = index, "Segment has no standard output");
                continue;
            };

            let span = info_span!("segment", index, path = %redact_uri(path));
            match self.process_segment(index, path, ctx).instrument(span).await {
                Ok(outcome) => {
                    documents.extend(outcome.documents);
                    total_pages = total_pages.saturating_add(outcome.pages);
                    usage += outcome.usage;
                }
                Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(e) => warn!(segment = index, error = %e, "Failed to process segment"),
            }
        }

        info!(
            documents = documents.len(),
            pages = total_pages,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Standard pipeline finished"
        );

        let mut result = PipelineResult::new(handle.as_str(), documents, total_pages);
        result.token_usage = Some(usage);
        Ok(result)
    }

    async fn process_segment(
        &self,
        index: usize,
        path: &str,
        ctx: &PipelineContext,
    ) -> Result<SegmentOutcome, PipelineError> {
        let uri = ObjectUri::parse(path)?;
        let output: StandardOutput = get_json(self.store.as_ref(), &uri).await?;

        if output.pages.is_empty() {
            warn!(segment = index, "No pages found in standard output");
            return Ok(SegmentOutcome::default());
        }

        let page_total = output.pages.len();
        let groups = self.grouper.group(output.pages);
        info!(segment = index, pages = page_total, groups = groups.len(), "Grouped pages");

        let mut outcome = SegmentOutcome {
            pages: u32::try_from(page_total).unwrap_or(u32::MAX),
            ..SegmentOutcome::default()
        };

        for (group_index, group) in groups.iter().enumerate() {
            let group_id = format!("segment-{}-doc-{}", index, group_index);
            let span = info_span!("group", id = %group_id, pages = %group.page_range());
            let classified = self
                .classify_group(&group_id, group, &output.document, ctx)
                .instrument(span)
                .await;

            match classified {
                Ok((documents, usage)) => {
                    outcome.documents.extend(documents);
                    outcome.usage += usage;
                }
                Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(e) => warn!(group = %group_id, error = %e, "Failed to classify group"),
            }
        }

        Ok(outcome)
    }

    async fn classify_group(
        &self,
        group_id: &str,
        group: &PageGroup,
        document: &crate::extraction::DocumentLevel,
        ctx: &PipelineContext,
    ) -> Result<(Vec<ClassifiedDocument>, TokenUsage), PipelineError> {
        let context = build_structured_context(group, document);
        debug!(group = group_id, context_chars = context.len(), "Built structured context");

        let classification = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(PipelineError::Cancelled),
            classified = self.invoker.classify(&ctx.request.model_id, &context) => classified?,
        };

        let outcome = recover(&classification.raw_text);
        let response = normalize_documents(&outcome);
        let documents = split_group(
            group_id,
            &context,
            &group.page_numbers(),
            &response,
            &ctx.request.model_id,
        );

        info!(group = group_id, documents = documents.len(), "Group classified");
        Ok((documents, classification.usage))
    }
}
