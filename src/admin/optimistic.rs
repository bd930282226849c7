//! Two-phase local edits for the admin job list.
//!
//! A mutation is first staged locally, holding the prior value, and then
//! either confirmed once the store accepts it or rolled back when it fails.

use crate::job::domain::{Job, JobId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Whether a row reflects the store or a staged local edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    /// Matches the last value the store acknowledged.
    Confirmed,
    /// Shows a local edit that is still being saved.
    Pending,
    /// Scheduled for deletion; still shown until the store confirms.
    Removing,
}

/// A job as presented on the admin surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRow {
    /// Job values, possibly staged.
    pub job: Job,
    /// Save state of the row.
    pub state: RowState,
}

impl AdminRow {
    /// Returns `true` while the row has an unconfirmed edit.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !matches!(self.state, RowState::Confirmed)
    }
}

/// Errors raised by misuse of the ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A staged edit for the job has not been resolved yet.
    #[error("job {0} already has a change being saved")]
    AlreadyPending(JobId),
    /// There is no staged edit to confirm or roll back.
    #[error("job {0} has no change being saved")]
    NotPending(JobId),
    /// The job is not on the local list.
    #[error("job {0} is not on the admin list")]
    UnknownJob(JobId),
}

#[derive(Debug, Clone)]
enum Staged {
    Update { prior: Option<Job> },
    Removal,
}

/// Local job list with optimistic staging.
#[derive(Debug, Clone, Default)]
pub struct OptimisticLedger {
    rows: Vec<AdminRow>,
    staged: HashMap<JobId, Staged>,
}

impl OptimisticLedger {
    /// Creates a ledger holding `jobs` as confirmed rows.
    #[must_use]
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            rows: jobs.into_iter().map(confirmed).collect(),
            staged: HashMap::new(),
        }
    }

    /// Replaces every row with a fresh list from the store.
    ///
    /// Staged edits are discarded.
    pub fn replace_all(&mut self, jobs: Vec<Job>) {
        if !self.staged.is_empty() {
            debug!(
                discarded = self.staged.len(),
                "staged admin edits replaced by refresh"
            );
        }
        self.staged.clear();
        self.rows = jobs.into_iter().map(confirmed).collect();
    }

    /// Every row in list order.
    #[must_use]
    pub fn rows(&self) -> &[AdminRow] {
        &self.rows
    }

    /// Returns the row for `id`.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<&AdminRow> {
        self.rows.iter().find(|row| row.job.id() == id)
    }

    /// Returns `true` when `id` has an unresolved staged edit.
    #[must_use]
    pub fn is_pending(&self, id: JobId) -> bool {
        self.staged.contains_key(&id)
    }

    /// Number of unresolved staged edits.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.staged.len()
    }

    /// Adds or replaces a row the store already holds.
    pub fn insert_confirmed(&mut self, job: Job) {
        let id = job.id();
        self.staged.remove(&id);
        self.upsert(confirmed(job));
    }

    /// Shows `job` locally and remembers the value it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyPending`] when the job already has a
    /// staged edit.
    pub fn stage_update(&mut self, job: Job) -> Result<(), LedgerError> {
        let id = job.id();
        self.ensure_idle(id)?;
        let prior = self.get(id).map(|row| row.job.clone());
        self.staged.insert(id, Staged::Update { prior });
        self.upsert(AdminRow {
            job,
            state: RowState::Pending,
        });
        Ok(())
    }

    /// Marks a row for deletion.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyPending`] when the job already has a
    /// staged edit, or [`LedgerError::UnknownJob`] when it is not listed.
    pub fn stage_removal(&mut self, id: JobId) -> Result<(), LedgerError> {
        self.ensure_idle(id)?;
        let row = self.row_mut(id).ok_or(LedgerError::UnknownJob(id))?;
        row.state = RowState::Removing;
        self.staged.insert(id, Staged::Removal);
        Ok(())
    }

    /// Accepts the staged edit for `id` as is.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotPending`] when nothing is staged for `id`.
    pub fn confirm(&mut self, id: JobId) -> Result<(), LedgerError> {
        match self.staged.remove(&id).ok_or(LedgerError::NotPending(id))? {
            Staged::Removal => self.rows.retain(|row| row.job.id() != id),
            Staged::Update { .. } => {
                if let Some(row) = self.row_mut(id) {
                    row.state = RowState::Confirmed;
                }
            }
        }
        Ok(())
    }

    /// Accepts the staged edit, replacing the row with the value the store
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotPending`] when nothing is staged for the
    /// job.
    pub fn confirm_with(&mut self, job: Job) -> Result<(), LedgerError> {
        let id = job.id();
        self.staged.remove(&id).ok_or(LedgerError::NotPending(id))?;
        self.upsert(confirmed(job));
        Ok(())
    }

    /// Restores the value held before the staged edit for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotPending`] when nothing is staged for `id`.
    pub fn rollback(&mut self, id: JobId) -> Result<(), LedgerError> {
        match self.staged.remove(&id).ok_or(LedgerError::NotPending(id))? {
            Staged::Removal => {
                if let Some(row) = self.row_mut(id) {
                    row.state = RowState::Confirmed;
                }
            }
            Staged::Update { prior: Some(job) } => self.upsert(confirmed(job)),
            Staged::Update { prior: None } => self.rows.retain(|row| row.job.id() != id),
        }
        debug!(job_id = %id, "staged admin edit rolled back");
        Ok(())
    }

    fn ensure_idle(&self, id: JobId) -> Result<(), LedgerError> {
        if self.is_pending(id) {
            return Err(LedgerError::AlreadyPending(id));
        }
        Ok(())
    }

    fn row_mut(&mut self, id: JobId) -> Option<&mut AdminRow> {
        self.rows.iter_mut().find(|row| row.job.id() == id)
    }

    fn upsert(&mut self, row: AdminRow) {
        if let Some(existing) = self.row_mut(row.job.id()) {
            *existing = row;
            return;
        }
        self.rows.push(row);
    }
}

const fn confirmed(job: Job) -> AdminRow {
    AdminRow {
        job,
        state: RowState::Confirmed,
    }
}
