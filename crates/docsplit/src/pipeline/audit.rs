use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::result::{ComparisonResult, PipelineResult};
use crate::error::StorageError;
use crate::sanitize::redact_uri;
use crate::storage::{ObjectStore, ObjectUri};

pub const AUDIT_FILE_NAME: &str = "comparison-results.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditRecord<'a> {
    timestamp: DateTime<Utc>,
    job_id: Option<&'a str>,
    results: &'a ComparisonResult,
    summary: AuditSummary,
}

#[derive(Debug, Serialize)]
struct AuditSummary {
    standard: PipelineSummary,
    custom: PipelineSummary,
}

#[derive(Debug, Serialize)]
struct PipelineSummary {
    documents: usize,
    pages: u32,
    cost: f64,
}

impl From<&PipelineResult> for PipelineSummary {
    fn from(result: &PipelineResult) -> Self {
        Self {
            documents: result.document_count,
            pages: result.total_pages,
            cost: result.cost.total_cost,
        }
    }
}

pub fn audit_location(root: &ObjectUri, comparison_id: &str) -> ObjectUri {
    root.join(comparison_id).join(AUDIT_FILE_NAME)
}

/// Writes the comparison and a per-pipeline summary under
/// `{root}/{comparison_id}/comparison-results.json`.
pub async fn write_audit_record(
    store: &dyn ObjectStore,
    root: &ObjectUri,
    job_id: Option<&str>,
    result: &ComparisonResult,
) -> Result<ObjectUri, StorageError> {
    let location = audit_location(root, &result.comparison_id);
    let record = AuditRecord {
        timestamp: Utc::now(),
        job_id,
        results: result,
        summary: AuditSummary {
            standard: PipelineSummary::from(&result.standard),
            custom: PipelineSummary::from(&result.custom),
        },
    };

    let body = serde_json::to_vec_pretty(&record).map_err(|e| StorageError::Write {
        uri: location.to_string(),
        source: std::io::Error::other(e),
    })?;
    store.put(&location, body, "application/json").await?;

    info!(location = %redact_uri(&location.to_string()), "Comparison results saved");
    Ok(location)
}
