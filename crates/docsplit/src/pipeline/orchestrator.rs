use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, warn, Instrument};

use super::audit::write_audit_record;
use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::cost::{custom_cost, standard_cost};
use super::custom::CustomPipeline;
use super::progress::{Milestone, ProgressReporter};
use super::result::ComparisonResult;
use super::standard::StandardPipeline;
use crate::classify::{ClassificationInvoker, HttpModelRuntime, InferenceParams, ModelRuntime};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::extraction::ExtractionService;
use crate::sanitize::{hash_uri, redact_uri};
use crate::storage::{ObjectStore, ObjectUri};

/// Runs the standard and custom pipelines concurrently against one source
/// document and reconciles their results.
pub struct Orchestrator {
    standard: StandardPipeline,
    custom: CustomPipeline,
    store: Arc<dyn ObjectStore>,
    config: Arc<PipelineConfig>,
}

impl Orchestrator {
    pub fn new(
        extraction: Arc<dyn ExtractionService>,
        store: Arc<dyn ObjectStore>,
        runtime: Arc<dyn ModelRuntime>,
        params: InferenceParams,
        config: Arc<PipelineConfig>,
    ) -> Self {
        let invoker = ClassificationInvoker::new(runtime, params);
        Self {
            standard: StandardPipeline::new(
                Arc::clone(&extraction),
                Arc::clone(&store),
                invoker,
                Arc::clone(&config),
            ),
            custom: CustomPipeline::new(extraction, Arc::clone(&store), Arc::clone(&config)),
            store,
            config,
        }
    }

    /// Production constructor: resolves pipeline settings and builds the HTTP
    /// model runtime from config.
    pub fn from_config(
        config: &Config,
        extraction: Arc<dyn ExtractionService>,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self> {
        let pipeline_config = Arc::new(PipelineConfig::from_config(config)?);
        let runtime = Arc::new(HttpModelRuntime::from_config(config)?);
        Ok(Self::new(
            extraction,
            store,
            runtime,
            InferenceParams::from(&config.model),
            pipeline_config,
        ))
    }

    pub async fn run(
        &self,
        ctx: &PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> std::result::Result<ComparisonResult, PipelineError> {
        let span = info_span!("orchestrate",
            job_id = ctx.job_id.as_deref().unwrap_or("none"),
            model = %ctx.request.model_id,
            source = %redact_uri(&ctx.request.source_uri),
            source_hash = %hash_uri(&ctx.request.source_uri),
        );
        self.run_inner(ctx, progress).instrument(span).await
    }

    async fn run_inner(
        &self,
        ctx: &PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> std::result::Result<ComparisonResult, PipelineError> {
        ClassificationInvoker::adapter(&ctx.request.model_id)?;
        ObjectUri::parse(&ctx.request.source_uri)?;

        let started = Instant::now();
        progress.report(Milestone::ExtractionInFlight);

        // Either failure drops the other pipeline's future, abandoning its
        // in-flight calls.
        let (mut standard, mut custom) = tokio::try_join!(
            self.standard.run(ctx, progress),
            self.custom.run(ctx)
        )?;

        progress.report(Milestone::Finalizing);

        let pricing = &self.config.pricing;
        standard.cost = standard_cost(
            pricing,
            standard.total_pages,
            &ctx.request.model_id,
            standard.token_usage.unwrap_or_default(),
        );
        custom.cost = custom_cost(pricing, custom.total_pages, custom.field_count.unwrap_or(0));

        let result = ComparisonResult {
            comparison_id: ctx.comparison_id(),
            model_id: ctx.request.model_id.clone(),
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            standard,
            custom,
        };

        if let Err(e) = write_audit_record(
            self.store.as_ref(),
            &self.config.output_root,
            ctx.job_id.as_deref(),
            &result,
        )
        .await
        {
            warn!(error = %e, "Failed to save comparison results");
        }

        info!(
            comparison = %result.comparison_id,
            standard_documents = result.standard.document_count,
            custom_documents = result.custom.document_count,
            "Orchestration finished"
        );
        Ok(result)
    }
}
