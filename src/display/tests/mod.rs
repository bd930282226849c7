
use crate::job::domain::{
    Job, JobId, JobNumber, JobPriority, JobStatus, PartNumber, PersistedJobData,
};
use chrono::{DateTime, TimeDelta, Utc};

/// Fixed reference instant for deterministic tests.
fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).unwrap_or_default()
}

/// Builds a stored job last updated `age` before [`epoch`].
fn job_aged(number: u32, status: JobStatus, age: TimeDelta) -> Job {
    job_with(number, status, age, None)
}

fn job_with(
    number: u32,
    status: JobStatus,
    age: TimeDelta,
    priority: Option<JobPriority>,
) -> Job {
    let updated_at = epoch() - age;
    Job::from_persisted(PersistedJobData {
        id: JobId::new(),
        job_number: JobNumber::new(format!("V-{number}")).expect("valid job number"),
        part_number: PartNumber::new(format!("P-{number}")).expect("valid part number"),
        title: None,
        description: None,
        notes: None,
        total_pieces: 10,
        pieces_completed: 0,
        status,
        eta_text: None,
        priority,
        shop_area: None,
        machine: None,
        date_received: updated_at.date_naive(),
        created_at: updated_at,
        updated_at,
    })
}

fn numbers(jobs: &[Job]) -> Vec<String> {
    jobs.iter()
        .map(|job| job.job_number().as_str().to_owned())
        .collect()
}
