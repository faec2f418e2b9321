use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::PipelineError;

/// Asynchronous invocation request, serialized in the service's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub input_configuration: Location,
    pub output_configuration: Location,
    pub data_automation_profile_arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_automation_configuration: Option<ProjectBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_configuration: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub s3_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBinding {
    pub data_automation_project_arn: String,
    pub stage: String,
}

impl ProjectBinding {
    pub fn live(project_arn: impl Into<String>) -> Self {
        Self {
            data_automation_project_arn: project_arn.into(),
            stage: "LIVE".to_string(),
        }
    }
}

impl InvocationRequest {
    pub fn new(input_uri: &str, output_uri: &str, profile_arn: &str) -> Self {
        Self {
            input_configuration: Location {
                s3_uri: input_uri.to_string(),
            },
            output_configuration: Location {
                s3_uri: output_uri.to_string(),
            },
            data_automation_profile_arn: profile_arn.to_string(),
            data_automation_configuration: None,
            override_configuration: None,
        }
    }

    pub fn with_project(mut self, binding: ProjectBinding) -> Self {
        self.data_automation_configuration = Some(binding);
        self
    }

    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.override_configuration = Some(overrides);
        self
    }
}

/// Override block for the standard invocation: document, page and element
/// granularity, bounding boxes, generative fields and markdown text.
pub fn standard_overrides(enable_splitting: bool) -> Value {
    let splitter_state = if enable_splitting { "ENABLED" } else { "DISABLED" };
    json!({
        "document": {
            "extraction": {
                "granularity": { "types": ["DOCUMENT", "PAGE", "ELEMENT"] },
                "boundingBox": { "state": "ENABLED" }
            },
            "generativeField": { "state": "ENABLED" },
            "outputFormat": { "textFormat": { "types": ["MARKDOWN"] } },
            "splitter": { "state": splitter_state }
        }
    })
}

/// Opaque handle returned by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationHandle(pub String);

impl InvocationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InvocationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationState {
    InProgress,
    Success,
    ClientError(String),
    ServiceError(String),
}

impl InvocationState {
    pub fn label(&self) -> &'static str {
        match self {
            InvocationState::InProgress => "InProgress",
            InvocationState::Success => "Success",
            InvocationState::ClientError(_) => "ClientError",
            InvocationState::ServiceError(_) => "ServiceError",
        }
    }
}

/// Client for the managed document-extraction service.
///
/// `status` errors are treated as transient by the completion poller; a
/// definitive failure must be reported as `ClientError`/`ServiceError`.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn submit(&self, request: &InvocationRequest) -> Result<InvocationHandle, PipelineError>;

    async fn status(&self, handle: &InvocationHandle) -> Result<InvocationState, PipelineError>;
}
