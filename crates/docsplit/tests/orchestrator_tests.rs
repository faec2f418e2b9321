//! End-to-end orchestration against scripted services and a temp-dir store.

mod common;

use std::sync::{Arc, Mutex};

use common::{
    custom_output, documents_reply, loan_package_pages, standard_output, test_pipeline_config,
    FakeModelRuntime, InvocationKind, ReplyDoc, ScriptedExtraction, ScriptedSegment,
    CUSTOM_PROJECT_ARN, SOURCE_URI,
};
use docsplit::classify::InferenceParams;
use docsplit::error::{PipelineError, StorageError};
use docsplit::extraction::InvocationState;
use docsplit::normalize::DocumentType;
use docsplit::pipeline::audit::audit_location;
use docsplit::pipeline::{
    Milestone, Orchestrator, PipelineContext, ProcessRequest, ProgressReporter,
};
use docsplit::storage::{get_json, FsObjectStore, ObjectStore};
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingProgress {
    milestones: Mutex<Vec<Milestone>>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, milestone: Milestone) {
        self.milestones.lock().unwrap().push(milestone);
    }
}

struct Harness {
    _temp_dir: TempDir,
    store: Arc<FsObjectStore>,
    extraction: Arc<ScriptedExtraction>,
    runtime: Arc<FakeModelRuntime>,
    orchestrator: Orchestrator,
}

impl Harness {
    fn new(
        script: impl FnOnce(ScriptedExtraction) -> ScriptedExtraction,
        runtime: FakeModelRuntime,
    ) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FsObjectStore::new(temp_dir.path()));
        let extraction = Arc::new(script(ScriptedExtraction::new(store.clone())));
        let runtime = Arc::new(runtime);
        let orchestrator = Orchestrator::new(
            extraction.clone(),
            store.clone(),
            runtime.clone(),
            InferenceParams::default(),
            Arc::new(test_pipeline_config()),
        );
        Self {
            _temp_dir: temp_dir,
            store,
            extraction,
            runtime,
            orchestrator,
        }
    }
}

fn loan_package_script(service: ScriptedExtraction) -> ScriptedExtraction {
    service
        .with_segments(
            InvocationKind::Standard,
            vec![ScriptedSegment::Standard(standard_output(&loan_package_pages()))],
        )
        .with_segments(
            InvocationKind::Custom,
            vec![
                ScriptedSegment::matched(
                    custom_output(
                        "Bank Statement",
                        0.97,
                        &[("account_number", "123"), ("closing_balance", "10.00")],
                    ),
                    vec![0, 1],
                ),
                ScriptedSegment::unmatched(vec![2]),
            ],
        )
}

fn loan_package_replies() -> FakeModelRuntime {
    FakeModelRuntime::new()
        .reply(documents_reply(&[ReplyDoc::new("bank_statement", 0.95, 1, 2)]))
        .reply(documents_reply(&[ReplyDoc::new("loan_application", 0.9, 3, 3)]))
}

fn context(model_id: &str) -> PipelineContext {
    PipelineContext::new(ProcessRequest::new(SOURCE_URI, model_id), CancellationToken::new())
        .with_job_id("job-test")
}

#[tokio::test]
async fn test_loan_package_end_to_end() {
    let harness = Harness::new(loan_package_script, loan_package_replies());
    let progress = RecordingProgress::default();

    let result = harness
        .orchestrator
        .run(&context("nova-lite"), &progress)
        .await
        .unwrap();

    let standard = &result.standard;
    assert_eq!(standard.document_count, 2);
    assert_eq!(standard.total_pages, 3);
    let types: Vec<DocumentType> = standard.documents.iter().map(|d| d.doc_type).collect();
    assert_eq!(types, vec![DocumentType::BankStatement, DocumentType::LoanApplication]);
    assert_eq!(standard.documents[0].page_range, "1-2");
    assert_eq!(standard.documents[1].page_range, "3");
    assert_eq!(standard.documents[0].id, "segment-0-doc-0-split-1");
    let usage = standard.token_usage.unwrap();
    assert_eq!((usage.input_tokens, usage.output_tokens), (200, 100));
    assert!(standard.invocation.ends_with("/standard"));
    assert!(standard.cost.model_cost > 0.0);
    assert!((standard.cost.extraction_cost - 0.03).abs() < 1e-9);

    let custom = &result.custom;
    assert_eq!(custom.document_count, 1);
    assert_eq!(custom.total_pages, 2);
    assert_eq!(custom.field_count, Some(2));
    assert_eq!(custom.documents[0].doc_type, DocumentType::BankStatement);
    assert_eq!(custom.documents[0].page_range, "1-2");
    assert_eq!(custom.documents[0].confidence, 0.97);
    assert!((custom.cost.total_cost - 0.08).abs() < 1e-9);

    assert_eq!(result.model_id, "nova-lite");
    assert!(result.comparison_id.starts_with("parallel-"));
    assert_eq!(
        *progress.milestones.lock().unwrap(),
        vec![
            Milestone::ExtractionInFlight,
            Milestone::ClassificationInFlight,
            Milestone::Finalizing
        ]
    );
}

#[tokio::test]
async fn test_documents_carry_only_their_own_pages() {
    let harness = Harness::new(loan_package_script, loan_package_replies());

    let result = harness
        .orchestrator
        .run(&context("nova-lite"), &RecordingProgress::default())
        .await
        .unwrap();

    let first = &result.standard.documents[0].text;
    let second = &result.standard.documents[1].text;
    assert!(first.contains("ALPHA-MARKER") && first.contains("BRAVO-MARKER"));
    assert!(!first.contains("CHARLIE-MARKER"));
    assert!(second.contains("CHARLIE-MARKER"));
    assert!(!second.contains("ALPHA-MARKER") && !second.contains("BRAVO-MARKER"));

    let prompts = harness.runtime.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("ALPHA-MARKER") && !prompts[0].contains("CHARLIE-MARKER"));
    assert!(prompts[1].contains("CHARLIE-MARKER") && !prompts[1].contains("ALPHA-MARKER"));
}

#[tokio::test]
async fn test_invocation_requests() {
    let harness = Harness::new(loan_package_script, loan_package_replies());
    let mut ctx = context("nova-lite");
    ctx.request.enable_splitting = false;

    harness
        .orchestrator
        .run(&ctx, &RecordingProgress::default())
        .await
        .unwrap();

    let submitted = harness.extraction.submitted();
    assert_eq!(submitted.len(), 2);

    let standard = submitted
        .iter()
        .find(|r| r.override_configuration.is_some())
        .unwrap();
    let custom = submitted
        .iter()
        .find(|r| r.override_configuration.is_none())
        .unwrap();

    assert_eq!(standard.input_configuration.s3_uri, SOURCE_URI);
    assert!(standard.output_configuration.s3_uri.contains("/output/standard-"));
    assert!(custom.output_configuration.s3_uri.contains("/output/custom-"));
    assert!(standard
        .data_automation_configuration
        .as_ref()
        .unwrap()
        .data_automation_project_arn
        .ends_with("public-default"));
    assert_eq!(
        custom
            .data_automation_configuration
            .as_ref()
            .unwrap()
            .data_automation_project_arn,
        CUSTOM_PROJECT_ARN
    );
    let overrides = standard.override_configuration.as_ref().unwrap();
    assert_eq!(overrides["document"]["splitter"]["state"], "DISABLED");
}

#[tokio::test]
async fn test_audit_record_written() {
    let harness = Harness::new(loan_package_script, loan_package_replies());

    let result = harness
        .orchestrator
        .run(&context("nova-lite"), &RecordingProgress::default())
        .await
        .unwrap();

    let root = test_pipeline_config().output_root;
    let record: Value = get_json(
        harness.store.as_ref(),
        &audit_location(&root, &result.comparison_id),
    )
    .await
    .unwrap();

    assert_eq!(record["jobId"], "job-test");
    assert_eq!(record["summary"]["standard"]["documents"], 2);
    assert_eq!(record["summary"]["custom"]["pages"], 2);
    assert_eq!(record["results"]["comparisonId"], result.comparison_id.as_str());
    assert_eq!(record["results"]["standard"]["documents"][0]["type"], "bank_statement");
}

#[tokio::test]
async fn test_failing_group_is_skipped() {
    let runtime = FakeModelRuntime::new()
        .fail("throttled")
        .reply(documents_reply(&[ReplyDoc::new("loan_application", 0.9, 3, 3)]));
    let harness = Harness::new(loan_package_script, runtime);

    let result = harness
        .orchestrator
        .run(&context("nova-lite"), &RecordingProgress::default())
        .await
        .unwrap();

    assert_eq!(result.standard.document_count, 1);
    assert_eq!(result.standard.documents[0].doc_type, DocumentType::LoanApplication);
    assert_eq!(result.standard.total_pages, 3);
}

#[tokio::test]
async fn test_unparseable_reply_degrades_to_fallback() {
    let runtime = FakeModelRuntime::new()
        .reply("Sorry, I cannot help with that.")
        .reply(documents_reply(&[ReplyDoc::new("loan_application", 0.9, 3, 3)]));
    let harness = Harness::new(loan_package_script, runtime);

    let result = harness
        .orchestrator
        .run(&context("nova-lite"), &RecordingProgress::default())
        .await
        .unwrap();

    let fallback = &result.standard.documents[0];
    assert_eq!(fallback.doc_type, DocumentType::Unknown);
    assert_eq!(fallback.confidence, 0.3);
    let analysis = fallback.model_analysis.as_ref().unwrap();
    assert!(!analysis.split_detected);
    assert!(analysis.recovery_method.is_none());
    assert!(analysis.parsing_note.as_deref().unwrap().starts_with("Fallback parsing used"));
}

#[tokio::test]
async fn test_claude_adapter_round_trip() {
    let harness = Harness::new(loan_package_script, loan_package_replies());

    let result = harness
        .orchestrator
        .run(&context("claude-3-7-sonnet"), &RecordingProgress::default())
        .await
        .unwrap();

    assert_eq!(result.standard.document_count, 2);
    assert_eq!(result.model_id, "claude-3-7-sonnet");
}

#[tokio::test]
async fn test_one_pipeline_failure_fails_the_run() {
    let harness = Harness::new(
        |service| {
            loan_package_script(service).with_states(
                InvocationKind::Custom,
                vec![InvocationState::ClientError("Invalid blueprint".to_string())],
            )
        },
        loan_package_replies(),
    );

    let err = harness
        .orchestrator
        .run(&context("nova-lite"), &RecordingProgress::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Upstream { message, .. } => assert!(message.contains("Invalid blueprint")),
        other => panic!("unexpected error: {:?}", other),
    }

    let root = test_pipeline_config().output_root;
    let prefixes = harness.store.list_prefixes(&root).await.unwrap();
    assert!(prefixes.iter().all(|p| !p.key().contains("parallel-")));
}

#[tokio::test]
async fn test_unsupported_model_rejected_before_submission() {
    let harness = Harness::new(loan_package_script, loan_package_replies());

    let err = harness
        .orchestrator
        .run(&context("gpt-4"), &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnsupportedModel(ref id) if id == "gpt-4"));
    assert!(harness.extraction.submitted().is_empty());
}

#[tokio::test]
async fn test_malformed_source_uri_rejected() {
    let harness = Harness::new(loan_package_script, loan_package_replies());
    let ctx = PipelineContext::new(
        ProcessRequest::new("loan-package.pdf", "nova-lite"),
        CancellationToken::new(),
    );

    let err = harness
        .orchestrator
        .run(&ctx, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Storage(StorageError::InvalidUri(_))));
}

#[tokio::test]
async fn test_cancelled_run_stops_before_submission() {
    let harness = Harness::new(loan_package_script, loan_package_replies());
    let ctx = context("nova-lite");
    ctx.cancel.cancel();

    let err = harness
        .orchestrator
        .run(&ctx, &RecordingProgress::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled));
    assert!(harness.extraction.submitted().is_empty());
}
