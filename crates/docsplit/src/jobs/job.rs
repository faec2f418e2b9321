use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::{ComparisonResult, Milestone, ProcessRequest};

pub const COMPLETED_STEP: &str = "Processing completed successfully!";
pub const FAILED_STEP: &str = "Processing failed";

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked orchestration run.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: String,
    pub request: ProcessRequest,
    pub status: JobStatus,
    /// 0 to 100.
    pub progress: u8,
    pub current_step: String,
    pub start_time: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub results: Option<Arc<ComparisonResult>>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, request: ProcessRequest) -> Self {
        Self {
            job_id: job_id.into(),
            request,
            status: JobStatus::Starting,
            progress: Milestone::Accepted.progress(),
            current_step: Milestone::Accepted.step().to_string(),
            start_time: Utc::now(),
            completed_at: None,
            error: None,
            results: None,
        }
    }

    /// Moves a running job to a milestone. Finished jobs are left alone.
    pub fn apply_milestone(&mut self, milestone: Milestone) {
        if self.status.is_finished() {
            return;
        }
        if milestone != Milestone::Accepted {
            self.status = JobStatus::Processing;
        }
        self.progress = milestone.progress();
        self.current_step = milestone.step().to_string();
    }

    pub fn complete(&mut self, results: Arc<ComparisonResult>) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.current_step = COMPLETED_STEP.to_string();
        self.completed_at = Some(Utc::now());
        self.results = Some(results);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Error;
        self.progress = 0;
        self.current_step = FAILED_STEP.to_string();
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
        self.results = None;
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Status without the result payload.
    pub fn view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.job_id.clone(),
            status: self.status,
            progress: self.progress,
            current_step: self.current_step.clone(),
            start_time: self.start_time,
            completed_at: self.completed_at,
            error: self.error.clone(),
            has_results: self.results.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub has_results: bool,
}
