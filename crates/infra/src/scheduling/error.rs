//! Scheduler error types

use slotwise_domain::SlotwiseError;
use thiserror::Error;

use crate::errors::InfraError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {0}")]
    CreationFailed(String),

    #[error("Failed to start scheduler: {0}")]
    StartFailed(String),

    #[error("Failed to stop scheduler: {0}")]
    StopFailed(String),

    /// The cron expression was rejected or the job could not be added
    #[error("Failed to register job: {0}")]
    JobRegistrationFailed(String),

    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<tokio::task::JoinError> for SchedulerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoinFailed(err.to_string())
    }
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let slotwise_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                SlotwiseError::Conflict(err.to_string())
            }
            _ => SlotwiseError::Internal(err.to_string()),
        };
        InfraError(slotwise_err)
    }
}

impl From<SchedulerError> for SlotwiseError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_conflict() {
        let err: SlotwiseError = SchedulerError::AlreadyRunning.into();
        assert_eq!(err, SlotwiseError::Conflict("Scheduler already running".into()));

        let err: SlotwiseError = SchedulerError::Timeout { seconds: 5 }.into();
        assert_eq!(err.kind(), "internal");
        assert!(err.message().contains("5s"));
    }
}
