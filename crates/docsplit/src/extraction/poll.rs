use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::{ExtractionService, InvocationHandle, InvocationState};
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSettings {
    pub fn new(interval_secs: u64, max_attempts: u32) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            max_attempts,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(10, 60)
    }
}

/// Polls an invocation until it succeeds, fails, or runs out of attempts.
///
/// A failed status check is retried on the next attempt. A terminal
/// `ClientError`/`ServiceError` is returned immediately. Cancellation is
/// observed while sleeping between attempts.
pub async fn wait_for_completion(
    service: &dyn ExtractionService,
    handle: &InvocationHandle,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<(), PipelineError> {
    info!(invocation = %handle, max_attempts = settings.max_attempts, "Waiting for extraction to complete");

    for attempt in 1..=settings.max_attempts {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        match service.status(handle).await {
            Ok(InvocationState::Success) => {
                info!(invocation = %handle, attempt, "Extraction completed");
                return Ok(());
            }
            Ok(InvocationState::ClientError(message))
            | Ok(InvocationState::ServiceError(message)) => {
                let message = if message.is_empty() {
                    "Unknown error".to_string()
                } else {
                    message
                };
                return Err(PipelineError::upstream(
                    "extraction service",
                    format!("Job failed: {}", message),
                ));
            }
            Ok(InvocationState::InProgress) => {
                debug!(invocation = %handle, attempt, max = settings.max_attempts, "Extraction still in progress");
            }
            Err(e) => {
                warn!(invocation = %handle, attempt, error = %e, "Status check failed");
            }
        }

        if attempt < settings.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                _ = tokio::time::sleep(settings.interval) => {}
            }
        }
    }

    Err(PipelineError::Timeout {
        attempts: settings.max_attempts,
        waited_secs: settings.interval.as_secs() * u64::from(settings.max_attempts),
    })
}
