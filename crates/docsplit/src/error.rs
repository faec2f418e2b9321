use std::path::PathBuf;
use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum DocsplitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Missing required setting '{0}'")]
    MissingSetting(&'static str),
}

/// Failures of one extraction pipeline. Any of these aborts the pipeline and
/// therefore the job that runs it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("{service} failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Job timed out after {attempts} status checks ({waited_secs} seconds)")]
    Timeout { attempts: u32, waited_secs: u64 },

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration invalid: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        PipelineError::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Short message safe to show on a job. Upstream detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::UnsupportedModel(_) | PipelineError::Cancelled => self.to_string(),
            PipelineError::Upstream { service, .. } => format!("{} failed", service),
            PipelineError::Timeout { .. } => "Processing timed out".to_string(),
            PipelineError::Storage(StorageError::InvalidUri(_)) => "Invalid source URI".to_string(),
            PipelineError::Storage(_) => "Storage access failed".to_string(),
            PipelineError::Config(_) => "Configuration invalid".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Malformed object URI '{0}'")]
    InvalidUri(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to read object '{uri}': {source}")]
    Read {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write object '{uri}': {source}")]
    Write {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list '{uri}': {source}")]
    List {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object '{uri}' is not valid JSON: {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} not completed yet (status: {status})")]
    NotCompleted { job_id: String, status: String },

    #[error("Invalid job request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type Result<T> = std::result::Result<T, DocsplitError>;
