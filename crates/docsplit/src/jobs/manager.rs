use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::job::{Job, JobStatus, JobStatusView};
use super::progress::{JobProgressBroadcaster, JobProgressEvent, JobTracker};
use super::store::JobStore;
use crate::classify::ModelAdapter;
use crate::config::JobsConfig;
use crate::error::{JobError, PipelineError};
use crate::pipeline::{
    ComparisonResult, Milestone, Orchestrator, PipelineContext, ProcessRequest, ProgressReporter,
};

const MAX_RETENTION_HOURS: u64 = 24 * 365 * 100;

struct RunningJob {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

type TaskMap = Arc<Mutex<HashMap<String, RunningJob>>>;

fn lock_tasks(tasks: &Mutex<HashMap<String, RunningJob>>) -> MutexGuard<'_, HashMap<String, RunningJob>> {
    match tasks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Job task map lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Starts orchestration runs in the background and tracks them through
/// `starting → processing → completed | error`.
pub struct JobManager {
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn JobStore>,
    broadcaster: JobProgressBroadcaster,
    tasks: TaskMap,
    retention: chrono::Duration,
}

impl JobManager {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<dyn JobStore>, config: &JobsConfig) -> Self {
        let retention_hours = i64::try_from(config.retention_hours.min(MAX_RETENTION_HOURS)).unwrap_or(24);
        Self {
            orchestrator,
            store,
            broadcaster: JobProgressBroadcaster::new(config.progress_channel_capacity),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            retention: chrono::Duration::hours(retention_hours),
        }
    }

    /// Registers a job and spawns its orchestration. Returns the job id
    /// without waiting. Must be called from within a Tokio runtime.
    pub fn start(&self, request: ProcessRequest) -> Result<String, JobError> {
        if request.source_uri.trim().is_empty() {
            return Err(JobError::InvalidRequest("source URI is required".to_string()));
        }
        if ModelAdapter::lookup(&request.model_id).is_none() {
            return Err(PipelineError::UnsupportedModel(request.model_id).into());
        }

        let job_id = format!("job-{}", Uuid::new_v4());
        let job = Job::new(&job_id, request.clone());
        self.broadcaster.send(JobProgressEvent::from_job(&job));
        self.store.insert(job);

        let cancel = CancellationToken::new();
        let ctx = PipelineContext::new(request, cancel.clone()).with_job_id(&job_id);
        let tracker = JobTracker::new(&job_id, Arc::clone(&self.store), self.broadcaster.clone());
        let orchestrator = Arc::clone(&self.orchestrator);
        let tasks = Arc::clone(&self.tasks);
        let task_job_id = job_id.clone();

        info!(job_id = %job_id, model = %ctx.request.model_id, "Starting job");

        // Held across spawn so the task cannot deregister before it is registered.
        let mut running = lock_tasks(&self.tasks);
        let handle = tokio::spawn(async move {
            tracker.report(Milestone::AnalysisStarted);

            match orchestrator.run(&ctx, &tracker).await {
                Ok(result) => {
                    let result = Arc::new(result);
                    tracker.update(&mut |job| job.complete(Arc::clone(&result)));
                    info!(job_id = %task_job_id, "Job completed");
                }
                Err(e) => {
                    error!(job_id = %task_job_id, error = %e, "Job failed");
                    let message = e.user_message();
                    tracker.update(&mut |job| job.fail(message.clone()));
                }
            }

            lock_tasks(&tasks).remove(&task_job_id);
        });
        running.insert(job_id.clone(), RunningJob { handle, cancel });

        Ok(job_id)
    }

    pub fn status(&self, job_id: &str) -> Result<JobStatusView, JobError> {
        self.store
            .get(job_id)
            .map(|job| job.view())
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// Results of a completed job.
    pub fn result(&self, job_id: &str) -> Result<Arc<ComparisonResult>, JobError> {
        let job = self
            .store
            .get(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        match (job.status, job.results) {
            (JobStatus::Completed, Some(results)) => Ok(results),
            (status, _) => Err(JobError::NotCompleted {
                job_id: job_id.to_string(),
                status: status.to_string(),
            }),
        }
    }

    pub fn list(&self) -> Vec<JobStatusView> {
        self.store.list().iter().map(Job::view).collect()
    }

    /// Signals a running job to stop. Returns whether a running task was
    /// signalled; finished jobs are left as they are.
    pub fn cancel(&self, job_id: &str) -> Result<bool, JobError> {
        if self.store.get(job_id).is_none() {
            return Err(JobError::NotFound(job_id.to_string()));
        }
        let signalled = match lock_tasks(&self.tasks).get(job_id) {
            Some(running) => {
                running.cancel.cancel();
                true
            }
            None => false,
        };
        info!(job_id, signalled, "Cancel requested");
        Ok(signalled)
    }

    /// Discards jobs older than the retention window. Returns the count.
    pub fn cleanup(&self) -> usize {
        self.cleanup_before(Utc::now() - self.retention)
    }

    /// Discards jobs started before `cutoff`, cancelling any still running.
    pub fn cleanup_before(&self, cutoff: DateTime<Utc>) -> usize {
        let stale: Vec<String> = self
            .store
            .list()
            .into_iter()
            .filter(|job| job.start_time < cutoff)
            .map(|job| job.job_id)
            .collect();

        for job_id in &stale {
            self.store.remove(job_id);
            if let Some(running) = lock_tasks(&self.tasks).remove(job_id) {
                running.cancel.cancel();
            }
        }

        info!(removed = stale.len(), remaining = self.store.list().len(), "Job cleanup finished");
        stale.len()
    }

    pub fn running_count(&self) -> usize {
        lock_tasks(&self.tasks).len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.broadcaster.subscribe()
    }

    /// Cancels every running job and waits for the tasks to finish.
    pub async fn shutdown(&self) {
        let running: Vec<RunningJob> = lock_tasks(&self.tasks).drain().map(|(_, r)| r).collect();
        for job in &running {
            job.cancel.cancel();
        }
        for job in running {
            if let Err(e) = job.handle.await {
                warn!(error = %e, "Job task ended abnormally");
            }
        }
    }
}
