//! Domain model for shop jobs.
//!
//! Jobs carry identity, piece-count progress and a lifecycle status. All
//! validation of those values lives here, outside any storage or transport
//! concern.

mod error;
mod ids;
mod job;
mod status;

pub use error::{JobDomainError, ParseJobPriorityError, ParseJobStatusError};
pub use ids::{JOB_NUMBER_MAX_LEN, JobId, JobNumber, PART_NUMBER_MAX_LEN, PartNumber};
pub use job::{
    DESCRIPTION_MAX_LEN, ETA_MAX_LEN, Job, JobChange, JobDetailsPatch, JobUpdate, LOCATION_MAX_LEN,
    NOTES_MAX_LEN, NewJob, PersistedJobData, TITLE_MAX_LEN, calculate_percentage, normalize_text,
};
pub use status::{JobPriority, JobStatus};
