//! Service layer for validated job creation and mutation.

use crate::job::{
    domain::{
        Job, JobChange, JobDetailsPatch, JobDomainError, JobId, JobNumber, JobPriority, JobStatus,
        JobUpdate, NewJob, PartNumber,
    },
    ports::{JobRepository, JobRepositoryError},
};
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateJobRequest {
    job_number: String,
    part_number: String,
    total_pieces: u32,
    pieces_completed: u32,
    status: JobStatus,
    title: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    eta_text: Option<String>,
    priority: Option<JobPriority>,
    shop_area: Option<String>,
    machine: Option<String>,
    date_received: Option<NaiveDate>,
}

impl CreateJobRequest {
    /// Creates a request with the required job fields.
    #[must_use]
    pub fn new(
        job_number: impl Into<String>,
        part_number: impl Into<String>,
        total_pieces: u32,
    ) -> Self {
        Self {
            job_number: job_number.into(),
            part_number: part_number.into(),
            total_pieces,
            pieces_completed: 0,
            status: JobStatus::Received,
            title: None,
            description: None,
            notes: None,
            eta_text: None,
            priority: None,
            shop_area: None,
            machine: None,
            date_received: None,
        }
    }

    /// Sets the number of pieces already completed.
    #[must_use]
    pub const fn with_pieces_completed(mut self, pieces_completed: u32) -> Self {
        self.pieces_completed = pieces_completed;
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the ETA text.
    #[must_use]
    pub fn with_eta(mut self, eta_text: impl Into<String>) -> Self {
        self.eta_text = Some(eta_text.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the shop area.
    #[must_use]
    pub fn with_shop_area(mut self, shop_area: impl Into<String>) -> Self {
        self.shop_area = Some(shop_area.into());
        self
    }

    /// Sets the machine.
    #[must_use]
    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = Some(machine.into());
        self
    }

    /// Sets the receipt date.
    #[must_use]
    pub const fn with_date_received(mut self, date_received: NaiveDate) -> Self {
        self.date_received = Some(date_received);
        self
    }

    fn into_new_job(self) -> Result<NewJob, JobDomainError> {
        Ok(NewJob {
            job_number: JobNumber::new(self.job_number)?,
            part_number: PartNumber::new(self.part_number)?,
            total_pieces: self.total_pieces,
            pieces_completed: self.pieces_completed,
            status: self.status,
            title: self.title,
            description: self.description,
            notes: self.notes,
            eta_text: self.eta_text,
            priority: self.priority,
            shop_area: self.shop_area,
            machine: self.machine,
            date_received: self.date_received,
        })
    }
}

/// Service-level errors for job mutations.
#[derive(Debug, Error)]
pub enum JobServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] JobDomainError),
    /// The target job does not exist.
    #[error("job not found: {0}")]
    NotFound(JobId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] JobRepositoryError),
}

impl JobServiceError {
    /// Message suitable for showing inline next to the form that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(err) | Self::Repository(JobRepositoryError::Rejected(err)) => {
                err.to_string()
            }
            Self::NotFound(_) | Self::Repository(JobRepositoryError::NotFound(_)) => {
                "Job not found".to_owned()
            }
            Self::Repository(JobRepositoryError::DuplicateJobNumber(_)) => {
                "Job number must be unique".to_owned()
            }
            Self::Repository(_) => "Could not save job changes".to_owned(),
        }
    }
}

/// Result type for job service operations.
pub type JobServiceResult<T> = Result<T, JobServiceError>;

/// Validated job mutation service.
#[derive(Clone)]
pub struct JobMutationService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> JobMutationService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new job mutation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Validates and stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Domain`] for invalid input and
    /// [`JobServiceError::Repository`] when the job number is taken or the
    /// store fails.
    pub async fn create_job(&self, request: CreateJobRequest) -> JobServiceResult<Job> {
        let new_job = request.into_new_job()?;
        let job = Job::create(new_job, &*self.clock)?;
        if let Err(err) = self.repository.insert(&job).await {
            warn!(job_number = %job.job_number(), error = %err, "job creation rejected");
            return Err(err.into());
        }
        info!(job_id = %job.id(), job_number = %job.job_number(), "job created");
        Ok(job)
    }

    /// Moves a job to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::NotFound`] for unknown jobs and
    /// [`JobServiceError::Domain`] when the move would go backwards.
    pub async fn update_status(&self, id: JobId, next: JobStatus) -> JobServiceResult<Job> {
        let job = self.apply(id, JobChange::Status(next)).await?;
        info!(job_id = %id, to = %next, "job status updated");
        Ok(job)
    }

    /// Records new piece counts for a job.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Domain`] when the completed count would
    /// decrease or exceed the total.
    pub async fn update_progress(
        &self,
        id: JobId,
        pieces_completed: u32,
        total_pieces: u32,
    ) -> JobServiceResult<Job> {
        let change = JobChange::Progress {
            pieces_completed,
            total_pieces,
        };
        let job = self.apply(id, change).await?;
        info!(
            job_id = %id,
            pieces_completed,
            total_pieces,
            percentage = job.percentage(),
            "job progress updated"
        );
        Ok(job)
    }

    /// Applies a partial detail edit.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Domain`] with
    /// [`JobDomainError::NoChanges`] for an empty patch, or the first failed
    /// bounds or transition check.
    pub async fn update_details(
        &self,
        id: JobId,
        patch: JobDetailsPatch,
    ) -> JobServiceResult<Job> {
        if patch.is_empty() {
            return Err(JobDomainError::NoChanges.into());
        }
        let job = self.apply(id, JobChange::Details(patch)).await?;
        info!(job_id = %id, "job details updated");
        Ok(job)
    }

    /// Removes a job. Deleting an unknown job succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Repository`] when the store fails.
    pub async fn delete_job(&self, id: JobId) -> JobServiceResult<()> {
        if let Err(err) = self.repository.delete(id).await {
            warn!(job_id = %id, error = %err, "job deletion failed");
            return Err(err.into());
        }
        info!(job_id = %id, "job deleted");
        Ok(())
    }

    /// Returns a job by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Repository`] when the lookup fails.
    pub async fn find_job(&self, id: JobId) -> JobServiceResult<Option<Job>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Returns every job, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Repository`] when the lookup fails.
    pub async fn list_jobs(&self) -> JobServiceResult<Vec<Job>> {
        let mut jobs = self.repository.list_all().await?;
        jobs.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(jobs)
    }

    /// Hands a change to the store, which checks it against the row as
    /// stored at write time.
    async fn apply(&self, id: JobId, change: JobChange) -> JobServiceResult<Job> {
        let update = JobUpdate::new(change, &*self.clock);
        self.repository
            .apply_update(id, &update)
            .await
            .map_err(|err| match err {
                JobRepositoryError::NotFound(missing) => JobServiceError::NotFound(missing),
                JobRepositoryError::Rejected(domain) => JobServiceError::Domain(domain),
                other => JobServiceError::Repository(other),
            })
    }
}
