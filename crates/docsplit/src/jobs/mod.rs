//! Asynchronous job lifecycle around orchestration runs.

pub mod job;
pub mod manager;
pub mod progress;
pub mod store;

pub use job::{Job, JobStatus, JobStatusView};
pub use manager::JobManager;
pub use progress::{JobProgressBroadcaster, JobProgressEvent, JobTracker};
pub use store::{InMemoryJobStore, JobStore};
