//! Job state storage.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::job::Job;

/// Key-value storage for jobs.
///
/// `update` must replace the stored job atomically: readers see either the
/// job before the mutation or after it, never a partial write.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: Job);

    fn get(&self, job_id: &str) -> Option<Job>;

    /// Applies `mutate` to a copy of the job and stores the copy. Returns the
    /// updated job, or `None` when the job is unknown.
    fn update(&self, job_id: &str, mutate: &mut dyn FnMut(&mut Job)) -> Option<Job>;

    fn remove(&self, job_id: &str) -> Option<Job>;

    fn list(&self) -> Vec<Job>;
}

/// Volatile job store. Jobs are lost when the process exits.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) {
        self.write().insert(job.job_id.clone(), job);
    }

    fn get(&self, job_id: &str) -> Option<Job> {
        self.read().get(job_id).cloned()
    }

    fn update(&self, job_id: &str, mutate: &mut dyn FnMut(&mut Job)) -> Option<Job> {
        let mut jobs = self.write();
        let mut updated = jobs.get(job_id)?.clone();
        mutate(&mut updated);
        jobs.insert(job_id.to_string(), updated.clone());
        Some(updated)
    }

    fn remove(&self, job_id: &str) -> Option<Job> {
        self.write().remove(job_id)
    }

    fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.read().values().cloned().collect();
        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        jobs
    }
}
