//! Admin surface: the editable job list and its mutations.

use super::optimistic::{AdminRow, LedgerError, OptimisticLedger};
use crate::display::presentation::{DisplayOptions, page_count};
use crate::job::adapters::broadcast::JobSignal;
use crate::job::domain::{Job, JobDetailsPatch, JobId, JobStatus};
use crate::job::ports::JobRepository;
use crate::job::services::{
    CreateJobRequest, JobMutationService, JobServiceError, JobServiceResult,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by [`AdminBoard`].
#[derive(Debug, Error)]
pub enum AdminError {
    /// The mutation was rejected or could not be saved.
    #[error(transparent)]
    Service(#[from] JobServiceError),
    /// A second edit was started before the first one settled.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl AdminError {
    /// Message shown next to the control that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Service(err) => err.user_message(),
            Self::Ledger(err) => err.to_string(),
        }
    }
}

/// Result type for admin board operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// One page of the admin list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPage {
    /// Rows on the page.
    pub rows: Vec<AdminRow>,
    /// Zero-based page shown, clamped to the last page.
    pub page_index: usize,
    /// Total pages; at least one.
    pub page_count: usize,
    /// Rows matching the filter.
    pub total: usize,
}

/// Number of pieces that corresponds to `percentage` of `total_pieces`,
/// rounded half up.
#[must_use]
pub fn pieces_for_percentage(percentage: u8, total_pieces: u32) -> u32 {
    let scaled = u64::from(percentage.min(100)) * u64::from(total_pieces) * 2 + 100;
    u32::try_from(scaled.div_euclid(200)).unwrap_or(total_pieces)
}

/// Job list owned by the admin surface.
///
/// Every edit is shown locally first and then saved; a rejected save
/// restores the previous row. Each saved edit is announced on the
/// [`JobSignal`] so other surfaces re-fetch.
pub struct AdminBoard<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    service: JobMutationService<R, C>,
    clock: Arc<C>,
    signal: JobSignal,
    ledger: OptimisticLedger,
}

impl<R, C> AdminBoard<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    /// Creates an empty board; call [`Self::refresh`] to load jobs.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, signal: JobSignal) -> Self {
        Self {
            service: JobMutationService::new(repository, Arc::clone(&clock)),
            clock,
            signal,
            ledger: OptimisticLedger::default(),
        }
    }

    /// Reloads the list from the store, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Service`] when the store cannot be read.
    pub async fn refresh(&mut self) -> AdminResult<()> {
        let jobs = self.service.list_jobs().await?;
        debug!(count = jobs.len(), "admin list refreshed");
        self.ledger.replace_all(jobs);
        Ok(())
    }

    /// Rows in list order.
    #[must_use]
    pub fn rows(&self) -> &[AdminRow] {
        self.ledger.rows()
    }

    /// Local edit state.
    #[must_use]
    pub const fn ledger(&self) -> &OptimisticLedger {
        &self.ledger
    }

    /// Filters, orders and pages the rows.
    #[must_use]
    pub fn page(&self, options: DisplayOptions, page_index: usize) -> AdminPage {
        let mut rows: Vec<AdminRow> = self
            .ledger
            .rows()
            .iter()
            .filter(|row| options.filter.includes(row.job.status()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| options.sort.compare(&a.job, &b.job));
        let total = rows.len();
        let pages = page_count(total, options.page_size);
        let index = page_index.min(pages.saturating_sub(1));
        AdminPage {
            rows: rows
                .into_iter()
                .skip(index.saturating_mul(options.page_size))
                .take(options.page_size)
                .collect(),
            page_index: index,
            page_count: pages,
            total,
        }
    }

    /// Creates a job and adds it to the list.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Service`] for invalid input, a duplicate job
    /// number or a store failure.
    pub async fn create_job(&mut self, request: CreateJobRequest) -> AdminResult<Job> {
        let job = self.service.create_job(request).await?;
        self.ledger.insert_confirmed(job.clone());
        self.announce();
        Ok(job)
    }

    /// Moves a job to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Service`] when the job is unknown, the move goes
    /// backwards or the save fails.
    pub async fn change_status(&mut self, id: JobId, next: JobStatus) -> AdminResult<Job> {
        let mut staged = self.local(id)?;
        staged
            .transition_to(next, &*self.clock)
            .map_err(JobServiceError::from)?;
        self.ledger.stage_update(staged)?;
        let outcome = self.service.update_status(id, next).await;
        self.settle(id, outcome)
    }

    /// Records a new completed piece count.
    ///
    /// A job whose progress reaches 100% is also moved to
    /// [`JobStatus::Completed`]. When only that second step fails the saved
    /// progress is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Service`] when the count would decrease, exceeds
    /// the total or cannot be saved.
    pub async fn commit_progress(&mut self, id: JobId, pieces_completed: u32) -> AdminResult<Job> {
        let mut staged = self.local(id)?;
        let total = staged.total_pieces();
        staged
            .record_progress(pieces_completed, total, &*self.clock)
            .map_err(JobServiceError::from)?;
        let completes = staged.percentage() == 100 && !staged.status().is_terminal();
        if completes {
            staged
                .transition_to(JobStatus::Completed, &*self.clock)
                .map_err(JobServiceError::from)?;
        }
        self.ledger.stage_update(staged)?;

        let outcome = match self.service.update_progress(id, pieces_completed, total).await {
            Ok(saved) if completes => Ok(self.auto_complete(saved).await),
            other => other,
        };
        self.settle(id, outcome)
    }

    /// Records progress given as a percentage of the job's total pieces.
    ///
    /// # Errors
    ///
    /// As for [`Self::commit_progress`].
    pub async fn commit_percentage(&mut self, id: JobId, percentage: u8) -> AdminResult<Job> {
        let total = self.local(id)?.total_pieces();
        self.commit_progress(id, pieces_for_percentage(percentage, total))
            .await
    }

    /// Applies a partial detail edit.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Service`] for an empty patch, any failed check or
    /// a store failure.
    pub async fn edit_details(&mut self, id: JobId, patch: JobDetailsPatch) -> AdminResult<Job> {
        let mut staged = self.local(id)?;
        staged
            .apply_details(&patch, &*self.clock)
            .map_err(JobServiceError::from)?;
        self.ledger.stage_update(staged)?;
        let outcome = self.service.update_details(id, patch).await;
        self.settle(id, outcome)
    }

    /// Deletes a job. Deleting a job that is not listed still asks the store.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Service`] when the store fails; the row is then
    /// restored.
    pub async fn delete_job(&mut self, id: JobId) -> AdminResult<()> {
        if self.ledger.get(id).is_none() {
            self.service.delete_job(id).await?;
            self.announce();
            return Ok(());
        }
        self.ledger.stage_removal(id)?;
        if let Err(err) = self.service.delete_job(id).await {
            self.ledger.rollback(id)?;
            return Err(err.into());
        }
        self.ledger.confirm(id)?;
        self.announce();
        Ok(())
    }

    async fn auto_complete(&self, saved: Job) -> Job {
        match self
            .service
            .update_status(saved.id(), JobStatus::Completed)
            .await
        {
            Ok(completed) => {
                info!(job_id = %completed.id(), "job auto-completed at 100%");
                completed
            }
            Err(err) => {
                warn!(job_id = %saved.id(), error = %err, "auto-complete failed; progress kept");
                saved
            }
        }
    }

    fn settle(&mut self, id: JobId, outcome: JobServiceResult<Job>) -> AdminResult<Job> {
        match outcome {
            Ok(job) => {
                self.ledger.confirm_with(job.clone())?;
                self.announce();
                Ok(job)
            }
            Err(err) => {
                warn!(job_id = %id, error = %err, "admin edit rejected; restoring row");
                self.ledger.rollback(id)?;
                Err(err.into())
            }
        }
    }

    fn local(&self, id: JobId) -> AdminResult<Job> {
        self.ledger
            .get(id)
            .map(|row| row.job.clone())
            .ok_or_else(|| JobServiceError::NotFound(id).into())
    }

    fn announce(&self) {
        let listeners = self.signal.job_updated();
        debug!(listeners, "job-updated signal sent");
    }
}
