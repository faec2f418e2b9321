//! Job progress broadcaster for real-time status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::job::{Job, JobStatus};
use super::store::JobStore;
use crate::pipeline::{Milestone, ProgressReporter};

/// Snapshot of a job published after each state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status,
            progress: job.progress,
            current_step: job.current_step.clone(),
            timestamp: Utc::now(),
            error: job.error.clone(),
        }
    }
}

/// Broadcasts job progress events for streaming.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers. No subscribers is fine.
    pub fn send(&self, event: JobProgressEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Applies changes to one job in the store and publishes the result.
pub struct JobTracker {
    job_id: String,
    store: Arc<dyn JobStore>,
    broadcaster: JobProgressBroadcaster,
}

impl JobTracker {
    pub fn new(
        job_id: impl Into<String>,
        store: Arc<dyn JobStore>,
        broadcaster: JobProgressBroadcaster,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            store,
            broadcaster,
        }
    }

    /// Replaces the job with a mutated copy and broadcasts it. Unknown jobs
    /// (already swept) are ignored.
    pub fn update(&self, mutate: &mut dyn FnMut(&mut Job)) {
        match self.store.update(&self.job_id, mutate) {
            Some(job) => self.broadcaster.send(JobProgressEvent::from_job(&job)),
            None => log::debug!("Job {} no longer tracked, dropping update", self.job_id),
        }
    }
}

impl ProgressReporter for JobTracker {
    fn report(&self, milestone: Milestone) {
        self.update(&mut |job| job.apply_milestone(milestone));
    }
}
