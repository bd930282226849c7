//! Repository port for job persistence and lookup.

use crate::job::domain::{Job, JobDomainError, JobId, JobNumber, JobUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for job repository operations.
pub type JobRepositoryResult<T> = Result<T, JobRepositoryError>;

/// Job persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::DuplicateJob`] when the identifier
    /// already exists or [`JobRepositoryError::DuplicateJobNumber`] when the
    /// job number is taken.
    async fn insert(&self, job: &Job) -> JobRepositoryResult<()>;

    /// Applies `update` to the stored row and returns the job as written.
    ///
    /// The change is checked against the row as it is at write time, with
    /// concurrent writers to the same row serialized, and only the columns it
    /// names are written.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist
    /// and [`JobRepositoryError::Rejected`] when the stored row fails the
    /// change's checks.
    async fn apply_update(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job>;

    /// Finds a job by identifier.
    ///
    /// Returns `None` when the job does not exist.
    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>>;

    /// Returns every stored job in no particular order.
    async fn list_all(&self) -> JobRepositoryResult<Vec<Job>>;

    /// Removes a job. Removing a missing job succeeds.
    async fn delete(&self, id: JobId) -> JobRepositoryResult<()>;
}

/// Errors returned by job repository implementations.
#[derive(Debug, Clone, Error)]
pub enum JobRepositoryError {
    /// A job with the same identifier already exists.
    #[error("duplicate job identifier: {0}")]
    DuplicateJob(JobId),

    /// A job with the same job number already exists.
    #[error("duplicate job number: {0}")]
    DuplicateJobNumber(JobNumber),

    /// The job was not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The change failed validation against the stored row.
    #[error(transparent)]
    Rejected(#[from] JobDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
