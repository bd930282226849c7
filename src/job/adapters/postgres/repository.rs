//! `PostgreSQL` repository implementation for job storage.

use super::{
    models::{JobChangeset, JobRow, NewJobRow},
    schema::jobs,
};
use crate::job::{
    domain::{
        Job, JobChange, JobId, JobNumber, JobPriority, JobStatus, JobUpdate, PartNumber,
        PersistedJobData,
    },
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by job adapters.
pub type JobPgPool = Pool<ConnectionManager<PgConnection>>;

/// Name of the unique constraint on `jobs.job_number`.
const JOB_NUMBER_UNIQUE_CONSTRAINT: &str = "jobs_job_number_key";

/// `PostgreSQL`-backed job repository.
#[derive(Debug, Clone)]
pub struct PostgresJobRepository {
    pool: JobPgPool,
}

impl PostgresJobRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> JobRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> JobRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(JobRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(JobRepositoryError::persistence)?
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn insert(&self, job: &Job) -> JobRepositoryResult<()> {
        let job_id = job.id();
        let job_number = job.job_number().clone();
        let new_row = to_new_row(job)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(jobs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| insert_error(err, job_id, &job_number))?;
            Ok(())
        })
        .await
    }

    async fn apply_update(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job> {
        let requested = update.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, JobRepositoryError, _>(|tx_conn| {
                let row = jobs::table
                    .filter(jobs::id.eq(id.into_inner()))
                    .select(JobRow::as_select())
                    .for_update()
                    .first::<JobRow>(tx_conn)
                    .optional()?;
                let (job, changeset) = updated_row(id, row, &requested)?;
                diesel::update(jobs::table.filter(jobs::id.eq(id.into_inner())))
                    .set(&changeset)
                    .execute(tx_conn)?;
                Ok(job)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        self.run_blocking(move |connection| {
            let row = jobs::table
                .filter(jobs::id.eq(id.into_inner()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn list_all(&self) -> JobRepositoryResult<Vec<Job>> {
        self.run_blocking(move |connection| {
            let rows = jobs::table
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }

    async fn delete(&self, id: JobId) -> JobRepositoryResult<()> {
        self.run_blocking(move |connection| {
            diesel::delete(jobs::table.filter(jobs::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(JobRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }
}

fn to_count(value: u32) -> JobRepositoryResult<i32> {
    i32::try_from(value).map_err(JobRepositoryError::persistence)
}

fn from_count(value: i32) -> JobRepositoryResult<u32> {
    u32::try_from(value).map_err(JobRepositoryError::persistence)
}

fn to_new_row(job: &Job) -> JobRepositoryResult<NewJobRow> {
    Ok(NewJobRow {
        id: job.id().into_inner(),
        job_number: job.job_number().as_str().to_owned(),
        part_number: job.part_number().as_str().to_owned(),
        title: job.title().map(str::to_owned),
        description: job.description().map(str::to_owned),
        notes: job.notes().map(str::to_owned),
        total_pieces: to_count(job.total_pieces())?,
        pieces_completed: to_count(job.pieces_completed())?,
        status: job.status().as_str().to_owned(),
        eta_text: job.eta_text().map(str::to_owned),
        priority: job.priority().map(|priority| priority.as_str().to_owned()),
        shop_area: job.shop_area().map(str::to_owned),
        machine: job.machine().map(str::to_owned),
        date_received: job.date_received(),
        created_at: job.created_at(),
        updated_at: job.updated_at(),
    })
}

/// Applies `update` to the locked `row`, returning the resulting job and the
/// columns to write.
fn updated_row(
    id: JobId,
    row: Option<JobRow>,
    update: &JobUpdate,
) -> JobRepositoryResult<(Job, JobChangeset)> {
    let mut job = row_to_job(row.ok_or(JobRepositoryError::NotFound(id))?)?;
    job.apply_update(update)?;
    let changeset = changeset_for(&update.change, &job)?;
    Ok((job, changeset))
}

/// Builds a changeset holding only the columns `change` writes, with values
/// taken from the already updated `job`.
fn changeset_for(change: &JobChange, job: &Job) -> JobRepositoryResult<JobChangeset> {
    let text = |value: Option<&str>| Some(value.map(str::to_owned));
    let mut changeset = JobChangeset {
        status: None,
        total_pieces: None,
        pieces_completed: None,
        eta_text: None,
        title: None,
        description: None,
        notes: None,
        updated_at: job.updated_at(),
    };
    match change {
        JobChange::Status(_) => changeset.status = Some(job.status().as_str().to_owned()),
        JobChange::Progress { .. } => {
            changeset.total_pieces = Some(to_count(job.total_pieces())?);
            changeset.pieces_completed = Some(to_count(job.pieces_completed())?);
        }
        JobChange::Details(patch) => {
            if patch.status.is_some() {
                changeset.status = Some(job.status().as_str().to_owned());
            }
            if patch.pieces_completed.is_some() {
                changeset.pieces_completed = Some(to_count(job.pieces_completed())?);
            }
            if patch.eta_text.is_some() {
                changeset.eta_text = text(job.eta_text());
            }
            if patch.title.is_some() {
                changeset.title = text(job.title());
            }
            if patch.description.is_some() {
                changeset.description = text(job.description());
            }
            if patch.notes.is_some() {
                changeset.notes = text(job.notes());
            }
        }
    }
    Ok(changeset)
}

fn row_to_job(row: JobRow) -> JobRepositoryResult<Job> {
    let JobRow {
        id,
        job_number,
        part_number,
        title,
        description,
        notes,
        total_pieces,
        pieces_completed,
        status: persisted_status,
        eta_text,
        priority: persisted_priority,
        shop_area,
        machine,
        date_received,
        created_at,
        updated_at,
    } = row;

    let status =
        JobStatus::try_from(persisted_status.as_str()).map_err(JobRepositoryError::persistence)?;
    let priority = persisted_priority
        .as_deref()
        .map(JobPriority::try_from)
        .transpose()
        .map_err(JobRepositoryError::persistence)?;

    let data = PersistedJobData {
        id: JobId::from_uuid(id),
        job_number: JobNumber::new(job_number).map_err(JobRepositoryError::persistence)?,
        part_number: PartNumber::new(part_number).map_err(JobRepositoryError::persistence)?,
        title,
        description,
        notes,
        total_pieces: from_count(total_pieces)?,
        pieces_completed: from_count(pieces_completed)?,
        status,
        eta_text,
        priority,
        shop_area,
        machine,
        date_received,
        created_at,
        updated_at,
    };
    Ok(Job::from_persisted(data))
}

fn insert_error(err: DieselError, job_id: JobId, job_number: &JobNumber) -> JobRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if is_job_number_unique_violation(info.as_ref()) =>
        {
            JobRepositoryError::DuplicateJobNumber(job_number.clone())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            JobRepositoryError::DuplicateJob(job_id)
        }
        _ => JobRepositoryError::persistence(err),
    }
}

impl From<DieselError> for JobRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

fn is_job_number_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == JOB_NUMBER_UNIQUE_CONSTRAINT)
}
