//! Error types for job domain validation and parsing.

use super::{JobId, JobStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain job values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobDomainError {
    /// The job number does not follow the `V-<digits>` format.
    #[error("job number '{0}' must use the V-### format")]
    InvalidJobNumber(String),

    /// The part number does not start with `P-`.
    #[error("part number '{0}' must start with P-")]
    InvalidPartNumber(String),

    /// The total piece count is below one.
    #[error("total pieces must be at least 1")]
    InvalidTotalPieces,

    /// Completed pieces exceed the total piece count.
    #[error("pieces completed ({completed}) cannot exceed total pieces ({total})")]
    CompletedExceedsTotal {
        /// Requested completed piece count.
        completed: u32,
        /// Total piece count the value was checked against.
        total: u32,
    },

    /// Completed pieces would decrease below the stored value.
    #[error("completed pieces cannot decrease from {current} to {requested}")]
    CompletedDecreased {
        /// Currently stored completed piece count.
        current: u32,
        /// Requested completed piece count.
        requested: u32,
    },

    /// A free-text field exceeds its length limit.
    #[error("{field} must be {max} characters or fewer")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted character count.
        max: usize,
    },

    /// The status change would move the job backwards in its lifecycle.
    #[error("job {job_id} cannot move from {from} back to {to}")]
    InvalidStatusTransition {
        /// Job being transitioned.
        job_id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },

    /// A detail edit carried no recognised field.
    #[error("no changes to save")]
    NoChanges,
}

/// Error returned while parsing job statuses from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);

/// Error returned while parsing job priorities from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job priority: {0}")]
pub struct ParseJobPriorityError(pub String);
