//! Job aggregate root and the values used to create and edit it.

use super::{JobDomainError, JobId, JobNumber, JobPriority, JobStatus, PartNumber};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Maximum length of the free-form ETA text.
pub const ETA_MAX_LEN: usize = 50;
/// Maximum length of shop notes.
pub const NOTES_MAX_LEN: usize = 500;
/// Maximum length of the shop area and machine labels.
pub const LOCATION_MAX_LEN: usize = 100;
/// Maximum length of a job title.
pub const TITLE_MAX_LEN: usize = 200;
/// Maximum length of a job description.
pub const DESCRIPTION_MAX_LEN: usize = 2000;

/// Completion percentage for a piece count, rounded half up and clamped to
/// `0..=100`.
///
/// A non-positive total yields `0`.
#[must_use]
pub fn calculate_percentage(pieces_completed: i64, total_pieces: i64) -> u8 {
    if total_pieces <= 0 {
        return 0;
    }
    let numerator = i128::from(pieces_completed) * 200 + i128::from(total_pieces);
    let denominator = i128::from(total_pieces) * 2;
    let rounded = numerator.div_euclid(denominator).clamp(0, 100);
    u8::try_from(rounded).unwrap_or(0)
}

/// Trims a free-text value, mapping blank input to `None` and enforcing a
/// character limit.
///
/// # Errors
///
/// Returns [`JobDomainError::FieldTooLong`] when the trimmed value has more
/// than `max` characters.
pub fn normalize_text(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, JobDomainError> {
    let Some(trimmed) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > max {
        return Err(JobDomainError::FieldTooLong { field, max });
    }
    Ok(Some(trimmed.to_owned()))
}

/// Validated input for a brand new job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    /// Unique shop job number.
    pub job_number: JobNumber,
    /// Customer part number.
    pub part_number: PartNumber,
    /// Pieces ordered.
    pub total_pieces: u32,
    /// Pieces already finished at creation time.
    pub pieces_completed: u32,
    /// Initial lifecycle status.
    pub status: JobStatus,
    /// Optional short title.
    pub title: Option<String>,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional shop notes.
    pub notes: Option<String>,
    /// Optional free-form ETA.
    pub eta_text: Option<String>,
    /// Optional priority.
    pub priority: Option<JobPriority>,
    /// Optional shop area.
    pub shop_area: Option<String>,
    /// Optional machine.
    pub machine: Option<String>,
    /// Date the work arrived; defaults to the creation date.
    pub date_received: Option<NaiveDate>,
}

impl NewJob {
    /// Creates a job input with required fields and defaults elsewhere.
    #[must_use]
    pub const fn new(job_number: JobNumber, part_number: PartNumber, total_pieces: u32) -> Self {
        Self {
            job_number,
            part_number,
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
}

/// Partial edit of a job's details.
///
/// `None` leaves a field untouched. For the text fields `Some("")` clears the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetailsPatch {
    /// New lifecycle status.
    pub status: Option<JobStatus>,
    /// New completed piece count.
    pub pieces_completed: Option<u32>,
    /// New ETA text.
    pub eta_text: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

impl JobDetailsPatch {
    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.pieces_completed.is_none()
            && self.eta_text.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
    }
}

/// Column-scoped edit of a stored job.
///
/// Stores apply a change to the row as it is at write time and write back
/// only the columns the change names, plus `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobChange {
    /// Lifecycle move; writes `status`.
    Status(JobStatus),
    /// New piece counts; writes `pieces_completed` and `total_pieces`.
    Progress {
        /// Requested completed piece count.
        pieces_completed: u32,
        /// Requested total piece count.
        total_pieces: u32,
    },
    /// Partial detail edit; writes the fields the patch sets.
    Details(JobDetailsPatch),
}

/// A [`JobChange`] stamped with the instant it was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    /// Requested change.
    pub change: JobChange,
    /// New `updated_at` value.
    pub at: DateTime<Utc>,
}

impl JobUpdate {
    /// Stamps `change` with the current clock time.
    #[must_use]
    pub fn new(change: JobChange, clock: &impl Clock) -> Self {
        Self {
            change,
            at: clock.utc(),
        }
    }
}

/// Job aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    job_number: JobNumber,
    part_number: PartNumber,
    title: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    total_pieces: u32,
    pieces_completed: u32,
    status: JobStatus,
    eta_text: Option<String>,
    priority: Option<JobPriority>,
    shop_area: Option<String>,
    machine: Option<String>,
    date_received: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedJobData {
    /// Persisted job identifier.
    pub id: JobId,
    /// Persisted job number.
    pub job_number: JobNumber,
    /// Persisted part number.
    pub part_number: PartNumber,
    /// Persisted title.
    pub title: Option<String>,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted notes.
    pub notes: Option<String>,
    /// Persisted total piece count.
    pub total_pieces: u32,
    /// Persisted completed piece count.
    pub pieces_completed: u32,
    /// Persisted lifecycle status.
    pub status: JobStatus,
    /// Persisted ETA text.
    pub eta_text: Option<String>,
    /// Persisted priority.
    pub priority: Option<JobPriority>,
    /// Persisted shop area.
    pub shop_area: Option<String>,
    /// Persisted machine.
    pub machine: Option<String>,
    /// Persisted receipt date.
    pub date_received: NaiveDate,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new job from validated input.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError`] when the piece counts are out of range or a
    /// text field exceeds its limit.
    pub fn create(input: NewJob, clock: &impl Clock) -> Result<Self, JobDomainError> {
        if input.total_pieces == 0 {
            return Err(JobDomainError::InvalidTotalPieces);
        }
        check_bounds(input.pieces_completed, input.total_pieces)?;

        let timestamp = clock.utc();
        Ok(Self {
            id: JobId::new(),
            job_number: input.job_number,
            part_number: input.part_number,
            title: normalize_text(input.title.as_deref(), "title", TITLE_MAX_LEN)?,
            description: normalize_text(
                input.description.as_deref(),
                "description",
                DESCRIPTION_MAX_LEN,
            )?,
            notes: normalize_text(input.notes.as_deref(), "notes", NOTES_MAX_LEN)?,
            total_pieces: input.total_pieces,
            pieces_completed: input.pieces_completed,
            status: input.status,
            eta_text: normalize_text(input.eta_text.as_deref(), "ETA", ETA_MAX_LEN)?,
            priority: input.priority,
            shop_area: normalize_text(input.shop_area.as_deref(), "shop area", LOCATION_MAX_LEN)?,
            machine: normalize_text(input.machine.as_deref(), "machine", LOCATION_MAX_LEN)?,
            date_received: input
                .date_received
                .unwrap_or_else(|| timestamp.date_naive()),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            job_number: data.job_number,
            part_number: data.part_number,
            title: data.title,
            description: data.description,
            notes: data.notes,
            total_pieces: data.total_pieces,
            pieces_completed: data.pieces_completed,
            status: data.status,
            eta_text: data.eta_text,
            priority: data.priority,
            shop_area: data.shop_area,
            machine: data.machine,
            date_received: data.date_received,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the shop job number.
    #[must_use]
    pub const fn job_number(&self) -> &JobNumber {
        &self.job_number
    }

    /// Returns the customer part number.
    #[must_use]
    pub const fn part_number(&self) -> &PartNumber {
        &self.part_number
    }

    /// Returns the title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the shop notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the total piece count.
    #[must_use]
    pub const fn total_pieces(&self) -> u32 {
        self.total_pieces
    }

    /// Returns the completed piece count.
    #[must_use]
    pub const fn pieces_completed(&self) -> u32 {
        self.pieces_completed
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the ETA text, if any.
    #[must_use]
    pub fn eta_text(&self) -> Option<&str> {
        self.eta_text.as_deref()
    }

    /// Returns the priority, if any.
    #[must_use]
    pub const fn priority(&self) -> Option<JobPriority> {
        self.priority
    }

    /// Returns the shop area, if any.
    #[must_use]
    pub fn shop_area(&self) -> Option<&str> {
        self.shop_area.as_deref()
    }

    /// Returns the machine, if any.
    #[must_use]
    pub fn machine(&self) -> Option<&str> {
        self.machine.as_deref()
    }

    /// Returns the date the work was received.
    #[must_use]
    pub const fn date_received(&self) -> NaiveDate {
        self.date_received
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the completion percentage.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        calculate_percentage(
            i64::from(self.pieces_completed),
            i64::from(self.total_pieces),
        )
    }

    /// Moves the job to `next` when the lifecycle flow permits it.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStatusTransition`] when `next` ranks
    /// before the current status. The job is left untouched.
    pub fn transition_to(
        &mut self,
        next: JobStatus,
        clock: &impl Clock,
    ) -> Result<(), JobDomainError> {
        self.set_status(next, clock.utc())
    }

    /// Records new piece counts.
    ///
    /// The status is not changed, even when every piece is done.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError`] when the total is zero, the completed count
    /// exceeds the total, or the completed count would decrease.
    pub fn record_progress(
        &mut self,
        pieces_completed: u32,
        total_pieces: u32,
        clock: &impl Clock,
    ) -> Result<(), JobDomainError> {
        self.set_progress(pieces_completed, total_pieces, clock.utc())
    }

    /// Applies a partial detail edit atomically.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::NoChanges`] for an empty patch, or the first
    /// validation failure. Nothing is applied when any check fails.
    pub fn apply_details(
        &mut self,
        patch: &JobDetailsPatch,
        clock: &impl Clock,
    ) -> Result<(), JobDomainError> {
        self.set_details(patch, clock.utc())
    }

    /// Applies a stamped change with the same checks as the dedicated
    /// mutators. The job is left untouched when a check fails.
    ///
    /// # Errors
    ///
    /// Returns the [`JobDomainError`] of the first failed check.
    pub fn apply_update(&mut self, update: &JobUpdate) -> Result<(), JobDomainError> {
        match &update.change {
            JobChange::Status(next) => self.set_status(*next, update.at),
            JobChange::Progress {
                pieces_completed,
                total_pieces,
            } => self.set_progress(*pieces_completed, *total_pieces, update.at),
            JobChange::Details(patch) => self.set_details(patch, update.at),
        }
    }

    fn set_status(&mut self, next: JobStatus, at: DateTime<Utc>) -> Result<(), JobDomainError> {
        self.ensure_transition(next)?;
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    fn set_progress(
        &mut self,
        pieces_completed: u32,
        total_pieces: u32,
        at: DateTime<Utc>,
    ) -> Result<(), JobDomainError> {
        if total_pieces == 0 {
            return Err(JobDomainError::InvalidTotalPieces);
        }
        check_bounds(pieces_completed, total_pieces)?;
        self.ensure_monotonic(pieces_completed)?;

        self.pieces_completed = pieces_completed;
        self.total_pieces = total_pieces;
        self.updated_at = at;
        Ok(())
    }

    fn set_details(
        &mut self,
        patch: &JobDetailsPatch,
        at: DateTime<Utc>,
    ) -> Result<(), JobDomainError> {
        if patch.is_empty() {
            return Err(JobDomainError::NoChanges);
        }
        if let Some(next) = patch.status {
            self.ensure_transition(next)?;
        }
        if let Some(completed) = patch.pieces_completed {
            self.ensure_monotonic(completed)?;
            check_bounds(completed, self.total_pieces)?;
        }
        let eta_text = patch
            .eta_text
            .as_deref()
            .map(|value| normalize_text(Some(value), "ETA", ETA_MAX_LEN))
            .transpose()?;
        let title = patch
            .title
            .as_deref()
            .map(|value| normalize_text(Some(value), "title", TITLE_MAX_LEN))
            .transpose()?;
        let description = patch
            .description
            .as_deref()
            .map(|value| normalize_text(Some(value), "description", DESCRIPTION_MAX_LEN))
            .transpose()?;
        let notes = patch
            .notes
            .as_deref()
            .map(|value| normalize_text(Some(value), "notes", NOTES_MAX_LEN))
            .transpose()?;

        if let Some(next) = patch.status {
            self.status = next;
        }
        if let Some(completed) = patch.pieces_completed {
            self.pieces_completed = completed;
        }
        if let Some(value) = eta_text {
            self.eta_text = value;
        }
        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = notes {
            self.notes = value;
        }
        self.updated_at = at;
        Ok(())
    }

    const fn ensure_transition(&self, next: JobStatus) -> Result<(), JobDomainError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(JobDomainError::InvalidStatusTransition {
                job_id: self.id,
                from: self.status,
                to: next,
            })
        }
    }

    const fn ensure_monotonic(&self, requested: u32) -> Result<(), JobDomainError> {
        if requested < self.pieces_completed {
            return Err(JobDomainError::CompletedDecreased {
                current: self.pieces_completed,
                requested,
            });
        }
        Ok(())
    }
}

const fn check_bounds(completed: u32, total: u32) -> Result<(), JobDomainError> {
    if completed > total {
        return Err(JobDomainError::CompletedExceedsTotal { completed, total });
    }
    Ok(())
}
