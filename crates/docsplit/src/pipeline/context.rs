use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::classify::DEFAULT_MODEL;
use crate::storage::ObjectUri;

/// What a caller asks to have processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub source_uri: String,
    #[serde(default = "default_model")]
    pub model_id: String,
    #[serde(default = "default_enable_splitting")]
    pub enable_splitting: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_enable_splitting() -> bool {
    true
}

impl ProcessRequest {
    pub fn new(source_uri: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            model_id: model_id.into(),
            enable_splitting: true,
        }
    }
}

/// State of one orchestration run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub request: ProcessRequest,
    pub job_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub cancel: CancellationToken,
    /// Distinguishes runs started in the same millisecond. The job id when
    /// there is one.
    run_id: String,
}

impl PipelineContext {
    pub fn new(request: ProcessRequest, cancel: CancellationToken) -> Self {
        Self {
            request,
            job_id: None,
            started_at: Utc::now(),
            cancel,
            run_id: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        self.run_id = job_id.clone();
        self.job_id = Some(job_id);
        self
    }

    fn stamp(&self) -> String {
        format!("{}-{}", self.started_at.timestamp_millis(), self.run_id)
    }

    pub fn standard_output(&self, root: &ObjectUri) -> ObjectUri {
        root.join(&format!("standard-{}", self.stamp()))
    }

    pub fn custom_output(&self, root: &ObjectUri) -> ObjectUri {
        root.join(&format!("custom-{}", self.stamp()))
    }

    pub fn comparison_id(&self) -> String {
        format!("parallel-{}", self.stamp())
    }
}
