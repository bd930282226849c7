//! Application services for job mutation.

mod mutations;

pub use mutations::{
    CreateJobRequest, JobMutationService, JobServiceError, JobServiceResult,
};
