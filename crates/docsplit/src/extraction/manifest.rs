use tracing::{debug, info};

use super::types::JobMetadata;
use crate::error::PipelineError;
use crate::sanitize::redact_uri;
use crate::storage::{get_json, ObjectStore, ObjectUri};

const MANIFEST_NAME: &str = "job_metadata.json";

/// Finds the job-metadata manifest under an invocation's output location.
///
/// The service writes into one sub-prefix per invocation, so each immediate
/// sub-prefix is tried in order and the first readable manifest wins.
pub async fn find_job_metadata(
    store: &dyn ObjectStore,
    output: &ObjectUri,
) -> Result<JobMetadata, PipelineError> {
    let prefixes = store.list_prefixes(output).await?;
    debug!(output = %redact_uri(&output.to_string()), count = prefixes.len(), "Listed output prefixes");

    for prefix in prefixes {
        let candidate = prefix.join(MANIFEST_NAME);
        match get_json::<JobMetadata>(store, &candidate).await {
            Ok(metadata) => {
                info!(
                    manifest = %redact_uri(&candidate.to_string()),
                    segments = metadata.segments().len(),
                    "Found job metadata"
                );
                return Ok(metadata);
            }
            Err(e) => {
                debug!(manifest = %redact_uri(&candidate.to_string()), error = %e, "No usable job metadata");
            }
        }
    }

    Err(PipelineError::upstream(
        "extraction service",
        format!("Could not find {} in extraction output", MANIFEST_NAME),
    ))
}
