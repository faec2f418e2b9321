pub mod categorizer;
pub mod classify;
pub mod config;
pub mod error;
pub mod extraction;
pub mod jobs;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod recovery;
pub mod sanitize;
pub mod secrets;
pub mod segmentation;
pub mod storage;

pub use classify::{ClassificationInvoker, HttpModelRuntime, ModelAdapter, ModelRuntime};
pub use config::{load_config, load_config_from_str, Config};
pub use error::{
    ConfigError, DocsplitError, JobError, PipelineError, Result, StorageError,
};
pub use extraction::ExtractionService;
pub use jobs::{InMemoryJobStore, JobManager, JobStatus, JobStatusView, JobStore};
pub use logging::init_logging;
pub use normalize::{ClassifiedDocument, DocumentType};
pub use pipeline::{ComparisonResult, Orchestrator, PipelineResult, ProcessRequest};
pub use secrets::{resolve_secret, SecretError};
pub use storage::{FsObjectStore, ObjectStore, ObjectUri};
