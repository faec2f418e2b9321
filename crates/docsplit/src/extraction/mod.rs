//! Boundary to the managed document-extraction service.

pub mod manifest;
pub mod poll;
pub mod service;
pub mod types;

pub use manifest::find_job_metadata;
pub use poll::{wait_for_completion, PollSettings};
pub use service::{
    standard_overrides, ExtractionService, InvocationHandle, InvocationRequest, InvocationState,
    Location, ProjectBinding,
};
pub use types::{
    CustomOutput, DocumentLevel, DocumentStatistics, JobMetadata, PageRecord, PageStatistics,
    Representation, SegmentMetadata, SplitDocument, StandardOutput,
};
